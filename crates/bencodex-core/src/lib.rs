//! # bencodex-core
//!
//! Pure-Rust encoder and decoder for **Bencodex**, a typed extension of
//! Bencode.
//!
//! Bencodex adds null, booleans, and Unicode text (tagged with `u`) to
//! Bencode's integers, byte strings, lists, and dictionaries. Integers are
//! arbitrary precision, and dictionary keys may be binary or text. The
//! encoding is canonical: every value has exactly one byte representation,
//! because dictionary entries are always written with binary keys first and
//! each key group sorted byte-wise.
//!
//! ## Quick start
//!
//! ```rust
//! use bencodex_core::{decode, encode, Value};
//!
//! let value = Value::dictionary([
//!     ("foo", Value::from("bar")),
//!     ("baz", Value::List(vec![1.into(), 2.into(), 3.into()])),
//!     ("qux", Value::from(true)),
//! ]);
//! let bytes = encode(&value).unwrap();
//! assert_eq!(bytes, b"du3:bazli1ei2ei3eeu3:foou3:baru3:quxte");
//!
//! let back = decode(&bytes).unwrap();
//! assert_eq!(back, value);
//! ```
//!
//! ## Modules
//!
//! - [`decoder`]: `Reader` → [`Value`]
//! - [`encoder`]: [`Value`] → `Writer`, canonical form
//! - [`encoding`]: text encoding validation and BOM handling
//! - [`io`]: `Reader`/`Writer` traits with in-memory and stream implementations
//! - [`ser`]: `serde::Serialize` → [`Value`]
//! - [`types`]: the [`Value`] tree
//! - [`error`]: error types for encode/decode failures

pub mod decoder;
pub mod encoder;
pub mod encoding;
pub mod error;
pub mod io;
pub mod ser;
pub mod types;

pub use decoder::{Decoder, DecoderOptions};
pub use encoder::{Encoder, EncoderOptions};
pub use encoding::{validate_text_encoding, TextEncoding};
pub use error::{CodecError, ErrorKind, Result};
pub use io::{MemoryReader, MemoryWriter, Reader, StreamReader, StreamWriter, Writer};
pub use ser::to_value;
pub use types::{Dictionary, Key, Value};

/// Encodes a value with the default configuration (UTF-8 text and keys, no
/// BOM policy).
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    encode_using(&Encoder::default(), value)
}

/// Encodes a value with explicit text/key encodings and BOM policy.
///
/// `None` for an encoding writes every string (or key) as binary.
pub fn encode_with(
    value: &Value,
    text_encoding: Option<&str>,
    key_encoding: Option<&str>,
    byte_order_mark: bool,
) -> Result<Vec<u8>> {
    let encoder = Encoder::new(text_encoding, key_encoding, byte_order_mark)?;
    encode_using(&encoder, value)
}

/// Converts a `Serialize` value and encodes it with the default configuration.
pub fn to_vec<T: serde::Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let value = ser::to_value(value)?;
    encode(&value)
}

fn encode_using(encoder: &Encoder, value: &Value) -> Result<Vec<u8>> {
    let mut buffer = MemoryWriter::new();
    encoder.encode(&mut buffer, value)?;
    Ok(buffer.into_inner())
}

/// Decodes one complete value with the default configuration.
pub fn decode(bencodex: &[u8]) -> Result<Value> {
    Decoder::default().decode(&mut MemoryReader::new(bytes::Bytes::copy_from_slice(bencodex)))
}

/// Decodes one complete value, checking text against `text_encoding` and
/// applying the BOM policy.
pub fn decode_with(bencodex: &[u8], text_encoding: &str, byte_order_mark: bool) -> Result<Value> {
    let decoder = Decoder::new(text_encoding, byte_order_mark)?;
    decoder.decode(&mut MemoryReader::new(bytes::Bytes::copy_from_slice(bencodex)))
}
