//! Bencodex encoder: writes a [`Value`] tree in canonical form.
//!
//! Canonical form is bit-for-bit reproducible: integers have no leading zeros
//! or plus sign, and dictionary entries are emitted in [`Key`] order (all
//! binary keys, then all text keys, each group sorted byte-wise) no matter how
//! the entries were built.
//!
//! Besides typed values the encoder accepts *host strings*: raw bytes in the
//! configured text encoding. [`Encoder::string`] and [`Encoder::key`] decide
//! whether such bytes are text (they decode in that encoding) or binary
//! (they don't, or text detection is disabled).
//!
//! # Example
//! ```
//! use bencodex_core::{Encoder, MemoryWriter, Value};
//!
//! let encoder = Encoder::default();
//! let mut writer = MemoryWriter::new();
//! let value = Value::dictionary([
//!     ("foo", Value::from("bar")),
//!     ("baz", Value::List(vec![1.into(), 2.into(), 3.into()])),
//!     ("qux", Value::from(true)),
//! ]);
//! encoder.encode(&mut writer, &value).unwrap();
//! assert_eq!(writer.as_bytes(), b"du3:bazli1ei2ei3eeu3:foou3:baru3:quxte");
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::encoding::{self, TextEncoding, BOM};
use crate::error::Result;
use crate::io::Writer;
use crate::ser;
use crate::types::{Dictionary, Key, Value};

/// Encoder configuration, suitable for embedding in application config.
///
/// `None` for an encoding disables text detection for that role: strings
/// (or keys) are always written as binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderOptions {
    /// Encoding of host string payloads.
    pub text_encoding: Option<String>,
    /// Encoding of host dictionary keys.
    pub key_encoding: Option<String>,
    /// Only strings starting with a BOM count as text; the BOM is stripped.
    pub byte_order_mark: bool,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        EncoderOptions {
            text_encoding: Some("utf-8".to_owned()),
            key_encoding: Some("utf-8".to_owned()),
            byte_order_mark: false,
        }
    }
}

/// Encodes values into Bencodex data on a [`Writer`].
#[derive(Debug, Clone)]
pub struct Encoder {
    text_encoding: Option<TextEncoding>,
    key_encoding: Option<TextEncoding>,
    byte_order_mark: bool,
}

impl Default for Encoder {
    fn default() -> Self {
        Encoder {
            text_encoding: Some(TextEncoding::utf8()),
            key_encoding: Some(TextEncoding::utf8()),
            byte_order_mark: false,
        }
    }
}

impl Encoder {
    /// Creates an encoder; both labels are validated here, not during encode.
    pub fn new(
        text_encoding: Option<&str>,
        key_encoding: Option<&str>,
        byte_order_mark: bool,
    ) -> Result<Self> {
        let encoder = Encoder {
            text_encoding: encoding::resolve_optional(text_encoding)?,
            key_encoding: encoding::resolve_optional(key_encoding)?,
            byte_order_mark,
        };
        debug!(
            text_encoding = ?encoder.text_encoding,
            key_encoding = ?encoder.key_encoding,
            byte_order_mark,
            "configured Bencodex encoder"
        );
        Ok(encoder)
    }

    /// Builds an encoder from deserialized options, validating both labels.
    pub fn from_options(options: &EncoderOptions) -> Result<Self> {
        Self::new(
            options.text_encoding.as_deref(),
            options.key_encoding.as_deref(),
            options.byte_order_mark,
        )
    }

    /// Encoding of host text strings; `None` writes every string as binary.
    pub fn text_encoding(&self) -> Option<TextEncoding> {
        self.text_encoding
    }

    /// Encoding of host dictionary keys; `None` writes every key as binary.
    pub fn key_encoding(&self) -> Option<TextEncoding> {
        self.key_encoding
    }

    /// Whether only BOM-prefixed strings count as text.
    pub fn byte_order_mark(&self) -> bool {
        self.byte_order_mark
    }

    /// Encodes `value` in canonical form.
    ///
    /// On error the writer may hold a partial encoding of `value`; bytes for
    /// siblings written before it are complete.
    ///
    /// Nesting is not bounded here: each list or dictionary level takes one
    /// stack frame, so a value nested tens of thousands of levels deep can
    /// overflow the stack. Values produced by [`Decoder`](crate::Decoder) are
    /// already limited by its `max_depth`; check depth yourself before
    /// encoding untrusted values built another way.
    pub fn encode<W: Writer + ?Sized>(&self, writer: &mut W, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.encode_null(writer),
            Value::Boolean(b) => self.encode_boolean(writer, *b),
            Value::Integer(i) => self.encode_integer(writer, i),
            Value::Binary(b) => self.encode_binary(writer, b),
            Value::Text(t) => match self.text_payload(self.text_encoding, t) {
                Some(utf8) => self.encode_text(writer, utf8),
                None => self.encode_binary(writer, t.as_bytes()),
            },
            Value::List(l) => self.encode_list(writer, l),
            Value::Dictionary(d) => self.encode_dictionary(writer, d),
        }
    }

    /// Converts a `Serialize` value and encodes it.
    ///
    /// Unsupported shapes (floats, non-string map keys) fail before anything
    /// is written.
    pub fn encode_serialize<W, T>(&self, writer: &mut W, value: &T) -> Result<()>
    where
        W: Writer + ?Sized,
        T: Serialize + ?Sized,
    {
        let value = ser::to_value(value)?;
        self.encode(writer, &value)
    }

    /// Writes `n`.
    pub fn encode_null<W: Writer + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write(b"n")
    }

    /// Writes `t` or `f`.
    pub fn encode_boolean<W: Writer + ?Sized>(&self, writer: &mut W, boolean: bool) -> Result<()> {
        writer.write(if boolean { b"t" } else { b"f" })
    }

    /// Writes `i<decimal>e` with no leading zeros and no `-0`.
    pub fn encode_integer<W: Writer + ?Sized>(&self, writer: &mut W, integer: &BigInt) -> Result<()> {
        writer.write(format!("i{integer}e").as_bytes())
    }

    /// Writes `u<len>:<utf8>` without any BOM or encoding checks.
    pub fn encode_text<W: Writer + ?Sized>(&self, writer: &mut W, utf8: &str) -> Result<()> {
        writer.write(b"u")?;
        self.encode_binary(writer, utf8.as_bytes())
    }

    /// Writes `<len>:<bytes>` verbatim.
    pub fn encode_binary<W: Writer + ?Sized>(&self, writer: &mut W, binary: &[u8]) -> Result<()> {
        writer.write(format!("{}:", binary.len()).as_bytes())?;
        writer.write(binary)
    }

    /// Writes `l`, each element in order, then `e`.
    pub fn encode_list<W: Writer + ?Sized>(&self, writer: &mut W, list: &[Value]) -> Result<()> {
        writer.write(b"l")?;
        for value in list {
            self.encode(writer, value)?;
        }
        writer.write(b"e")
    }

    /// Encodes a host string in `encoding`: as text if it converts to UTF-8
    /// (and, under the BOM policy, starts with a BOM), otherwise as binary.
    pub fn encode_string<W: Writer + ?Sized>(
        &self,
        writer: &mut W,
        encoding: Option<TextEncoding>,
        raw: &[u8],
    ) -> Result<()> {
        match self.should_be_text(encoding, raw) {
            Some(utf8) => self.encode_text(writer, &utf8),
            None => self.encode_binary(writer, raw),
        }
    }

    /// Classifies a host string under the configured text encoding.
    pub fn string(&self, raw: &[u8]) -> Value {
        match self.should_be_text(self.text_encoding, raw) {
            Some(utf8) => Value::Text(utf8.into_owned()),
            None => Value::from(raw),
        }
    }

    /// Classifies a host dictionary key under the configured key encoding.
    pub fn key(&self, raw: &[u8]) -> Key {
        match self.should_be_text(self.key_encoding, raw) {
            Some(utf8) => Key::Text(utf8.into_owned()),
            None => Key::from(raw),
        }
    }

    /// Encodes a dictionary in canonical key order.
    ///
    /// Text keys go through the key encoding and BOM policy, so a text key
    /// may be written as binary. If two keys end up identical on the wire the
    /// one later in [`Key`] order wins.
    pub fn encode_dictionary<W: Writer + ?Sized>(
        &self,
        writer: &mut W,
        dictionary: &Dictionary,
    ) -> Result<()> {
        let mut sorted: Vec<(&Key, &Value)> = dictionary.iter().collect();
        sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));
        let entries = sorted.into_iter().map(|(key, value)| {
            let key = match key {
                Key::Binary(_) => key.clone(),
                Key::Text(t) => match self.text_payload(self.key_encoding, t) {
                    Some(utf8) => Key::Text(utf8.to_owned()),
                    None => Key::from(t.as_bytes()),
                },
            };
            (key, value)
        });
        self.write_entries(writer, entries.collect())
    }

    /// Encodes a mapping whose keys are host strings in the key encoding.
    ///
    /// Duplicate keys after classification resolve last-write-wins in
    /// iteration order.
    pub fn encode_map<'a, W, I, K>(&self, writer: &mut W, entries: I) -> Result<()>
    where
        W: Writer + ?Sized,
        I: IntoIterator<Item = (K, &'a Value)>,
        K: AsRef<[u8]>,
    {
        let entries = entries
            .into_iter()
            .map(|(key, value)| (self.key(key.as_ref()), value))
            .collect();
        self.write_entries(writer, entries)
    }

    fn write_entries<W: Writer + ?Sized>(
        &self,
        writer: &mut W,
        entries: BTreeMap<Key, &Value>,
    ) -> Result<()> {
        writer.write(b"d")?;
        for (key, value) in entries {
            match &key {
                Key::Binary(b) => self.encode_binary(writer, b)?,
                Key::Text(t) => self.encode_text(writer, t)?,
            }
            self.encode(writer, value)?;
        }
        writer.write(b"e")
    }

    /// Applies text detection and the BOM policy to Unicode text.
    fn text_payload<'a>(&self, encoding: Option<TextEncoding>, text: &'a str) -> Option<&'a str> {
        if encoding.is_none() {
            return None;
        }
        if !self.byte_order_mark {
            return Some(text);
        }
        let stripped = text.strip_prefix(BOM);
        if stripped.is_none() {
            trace!("text without a BOM written as binary");
        }
        stripped
    }

    fn should_be_text<'a>(
        &self,
        encoding: Option<TextEncoding>,
        raw: &'a [u8],
    ) -> Option<Cow<'a, str>> {
        let Some(encoding) = encoding else {
            return None;
        };
        let Some(utf8) = encoding.decode(raw) else {
            trace!(encoding = %encoding, len = raw.len(), "string is not valid text; written as binary");
            return None;
        };
        if !self.byte_order_mark {
            return Some(utf8);
        }
        match utf8 {
            Cow::Borrowed(s) => self.text_payload(Some(encoding), s).map(Cow::Borrowed),
            Cow::Owned(s) => self
                .text_payload(Some(encoding), &s)
                .map(|t| Cow::Owned(t.to_owned())),
        }
    }
}
