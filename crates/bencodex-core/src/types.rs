//! Bencodex value tree.
//!
//! Lists and dictionaries are distinct variants, so an empty container is
//! always unambiguous. A [`Dictionary`] keeps entries in insertion order, so a
//! decoded dictionary lists its keys in wire order. The canonical Bencodex
//! key order is the `Ord` of [`Key`] (every binary key before every text key,
//! byte-wise within each group) and is applied when encoding.

use bytes::Bytes;
use indexmap::IndexMap;
use num_bigint::BigInt;

/// A dictionary in insertion order.
///
/// Re-inserting an existing key replaces its value in place. Equality ignores
/// order.
pub type Dictionary = IndexMap<Key, Value>;

/// A dictionary key.
///
/// The derived `Ord` compares the variant first (`Binary` < `Text`) and then
/// the raw bytes; `String` ordering is UTF-8 byte ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Binary(Bytes),
    Text(String),
}

impl Key {
    /// Raw key bytes as they appear on the wire (UTF-8 for text keys).
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Key::Binary(b) => &b[..],
            Key::Text(t) => t.as_bytes(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Key::Text(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Key::Text(t) => Some(t.as_str()),
            Key::Binary(_) => None,
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(s.to_owned())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Text(s)
    }
}

impl From<&[u8]> for Key {
    fn from(b: &[u8]) -> Self {
        Key::Binary(Bytes::copy_from_slice(b))
    }
}

impl From<Vec<u8>> for Key {
    fn from(b: Vec<u8>) -> Self {
        Key::Binary(Bytes::from(b))
    }
}

impl From<Bytes> for Key {
    fn from(b: Bytes) -> Self {
        Key::Binary(b)
    }
}

/// A Bencodex value.
///
/// # Examples
///
/// ```
/// use bencodex_core::{Key, Value};
///
/// let value = Value::dictionary([
///     (Key::from("name"), Value::from("단팥")),
///     (Key::from(&b"\x00\x01"[..]), Value::from(42)),
/// ]);
/// assert_eq!(value.get("name").and_then(Value::as_text), Some("단팥"));
/// assert_eq!(value.get(&b"\x00\x01"[..]).and_then(Value::as_i64), Some(42));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Boolean(bool),
    /// Arbitrary-precision; never truncated on decode.
    Integer(BigInt),
    /// Opaque bytes, not necessarily text in any encoding.
    Binary(Bytes),
    /// Unicode text. A byte order mark is a leading `'\u{feff}'`.
    Text(String),
    List(Vec<Value>),
    Dictionary(Dictionary),
}

impl Value {
    /// Builds a dictionary value; later duplicates overwrite earlier ones.
    pub fn dictionary<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<Key>,
    {
        Value::Dictionary(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Binary(_) => "binary",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Dictionary(_) => "dictionary",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    /// Narrows an integer to `i64`; `None` for other variants and for
    /// integers outside the `i64` range.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(|i| i64::try_from(i).ok())
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) => Some(&b[..]),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l.as_slice()),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Looks up a key if this value is a dictionary.
    pub fn get<K: Into<Key>>(&self, key: K) -> Option<&Value> {
        self.as_dictionary()?.get(&key.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self {
                    Value::Integer(BigInt::from(i))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl From<BigInt> for Value {
    fn from(i: BigInt) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Binary(Bytes::copy_from_slice(b))
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Binary(Bytes::from(b))
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Binary(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl From<Dictionary> for Value {
    fn from(d: Dictionary) -> Self {
        Value::Dictionary(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Self {
        o.map_or(Value::Null, Into::into)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::List(iter.into_iter().collect())
    }
}

impl FromIterator<(Key, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        Value::Dictionary(iter.into_iter().collect())
    }
}
