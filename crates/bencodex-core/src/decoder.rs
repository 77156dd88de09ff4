//! Bencodex decoder: parses a byte stream into a [`Value`] tree.
//!
//! A recursive-descent parser with one byte of lookahead. The decoder reads a
//! single value and then requires end of input, so `decode` is a total parse:
//! `tfn` is rejected even though `t` alone is a complete value.
//!
//! # Key design decisions
//!
//! - **Offsets from the reader**: every error records `Reader::tell` at the
//!   point of detection, measured from the start of the stream.
//! - **Bounded nesting**: lists and dictionaries nested deeper than
//!   `max_depth` fail with [`CodecError::NestingTooDeep`] instead of
//!   exhausting the call stack.
//! - **Exact integers**: digits are parsed straight into a `BigInt`.
//! - **Wire order**: dictionary entries are kept in the order they were read;
//!   a repeated key overwrites the earlier value in its original position.
//! - **Strict mode** additionally rejects well-formed but non-canonical input
//!   (leading zeros, negative zero, out-of-order or duplicate keys).

use bytes::Bytes;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::encoding::{self, TextEncoding};
use crate::error::{CodecError, Result};
use crate::io::Reader;
use crate::types::{Dictionary, Key, Value};

/// Default limit on container nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Decoder configuration, suitable for embedding in application config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderOptions {
    /// Encoding decoded text must be representable in.
    pub text_encoding: String,
    /// Normalize every decoded text value to start with a BOM.
    pub byte_order_mark: bool,
    /// Maximum nesting of lists and dictionaries.
    pub max_depth: usize,
    /// Reject well-formed input that is not in canonical form.
    pub strict: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        DecoderOptions {
            text_encoding: "utf-8".to_owned(),
            byte_order_mark: false,
            max_depth: DEFAULT_MAX_DEPTH,
            strict: false,
        }
    }
}

/// Decodes Bencodex data from a [`Reader`].
///
/// Configuration is validated once at construction; the decoder is then
/// immutable and can be reused for any number of `decode` calls.
#[derive(Debug, Clone)]
pub struct Decoder {
    text_encoding: TextEncoding,
    byte_order_mark: bool,
    max_depth: usize,
    strict: bool,
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder {
            text_encoding: TextEncoding::utf8(),
            byte_order_mark: false,
            max_depth: DEFAULT_MAX_DEPTH,
            strict: false,
        }
    }
}

impl Decoder {
    /// Creates a decoder for the given text encoding label and BOM policy.
    ///
    /// Fails with [`CodecError::UnsupportedEncoding`] if the label is unknown
    /// or cannot round-trip through UTF-8.
    pub fn new(text_encoding: &str, byte_order_mark: bool) -> Result<Self> {
        Self::from_options(&DecoderOptions {
            text_encoding: text_encoding.to_owned(),
            byte_order_mark,
            ..DecoderOptions::default()
        })
    }

    /// Builds a decoder from deserialized options, validating the encoding label.
    pub fn from_options(options: &DecoderOptions) -> Result<Self> {
        let text_encoding = TextEncoding::for_label(&options.text_encoding)?;
        debug!(
            text_encoding = %text_encoding,
            byte_order_mark = options.byte_order_mark,
            max_depth = options.max_depth,
            strict = options.strict,
            "configured Bencodex decoder"
        );
        Ok(Decoder {
            text_encoding,
            byte_order_mark: options.byte_order_mark,
            max_depth: options.max_depth,
            strict: options.strict,
        })
    }

    /// Sets how many lists and dictionaries may be open at once; one more
    /// fails with [`CodecError::NestingTooDeep`].
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enables rejection of non-canonical input with [`CodecError::NonCanonical`].
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Encoding every decoded text value must be representable in.
    pub fn text_encoding(&self) -> TextEncoding {
        self.text_encoding
    }

    /// Whether decoded text is prefixed with a BOM.
    pub fn byte_order_mark(&self) -> bool {
        self.byte_order_mark
    }

    /// Nesting limit for lists and dictionaries.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether non-canonical input is rejected.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Decodes exactly one value and requires the reader to be exhausted.
    ///
    /// On trailing input the reader is left positioned at the first extra
    /// byte.
    pub fn decode<R: Reader + ?Sized>(&self, reader: &mut R) -> Result<Value> {
        let value = self.decode_value(reader, 0)?;
        if let Some(byte) = reader.read_byte()? {
            let offset = reader.tell() - 1;
            reader.seek(-1)?;
            debug!(offset, "rejected trailing data after a complete value");
            return Err(CodecError::TrailingData { offset, byte });
        }
        Ok(value)
    }

    fn decode_value<R: Reader + ?Sized>(&self, reader: &mut R, depth: usize) -> Result<Value> {
        let head = next_byte(reader)?;
        match head {
            b'n' => Ok(Value::Null),
            b'f' => Ok(Value::Boolean(false)),
            b't' => Ok(Value::Boolean(true)),
            b'i' => self.decode_integer(reader).map(Value::Integer),
            b'0'..=b'9' => {
                reader.seek(-1)?;
                self.decode_binary(reader).map(|(binary, _)| Value::Binary(binary))
            }
            b'u' => self.decode_text(reader).map(Value::Text),
            b'l' => self.decode_list(reader, depth),
            b'd' => self.decode_dictionary(reader, depth),
            byte => Err(unexpected_byte(reader, byte)),
        }
    }

    /// Checks the nesting limit for a container whose tag was just read.
    fn enter<R: Reader + ?Sized>(&self, reader: &R, depth: usize) -> Result<()> {
        if depth >= self.max_depth {
            return Err(CodecError::NestingTooDeep {
                offset: reader.tell() - 1,
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }

    fn decode_list<R: Reader + ?Sized>(&self, reader: &mut R, depth: usize) -> Result<Value> {
        // Assumes the 'l' tag was already read.
        self.enter(reader, depth)?;
        let mut list = Vec::new();
        loop {
            match next_byte(reader)? {
                b'e' => break,
                _ => {
                    reader.seek(-1)?;
                    list.push(self.decode_value(reader, depth + 1)?);
                }
            }
        }
        Ok(Value::List(list))
    }

    fn decode_dictionary<R: Reader + ?Sized>(
        &self,
        reader: &mut R,
        depth: usize,
    ) -> Result<Value> {
        // Assumes the 'd' tag was already read.
        self.enter(reader, depth)?;
        let mut dict = Dictionary::new();
        let mut previous: Option<Key> = None;
        loop {
            let peek = next_byte(reader)?;
            let key_offset = reader.tell() - 1;
            let key = match peek {
                b'e' => break,
                b'0'..=b'9' => {
                    reader.seek(-1)?;
                    Key::Binary(self.decode_binary(reader)?.0)
                }
                b'u' => Key::Text(self.decode_text(reader)?),
                byte => return Err(unexpected_byte(reader, byte)),
            };
            if self.strict {
                if let Some(prev) = &previous {
                    if *prev >= key {
                        return Err(CodecError::NonCanonical {
                            offset: key_offset,
                            reason: "dictionary keys are not in ascending canonical order",
                        });
                    }
                }
                previous = Some(key.clone());
            }
            let value = self.decode_value(reader, depth + 1)?;
            dict.insert(key, value);
        }
        Ok(Value::Dictionary(dict))
    }

    fn decode_text<R: Reader + ?Sized>(&self, reader: &mut R) -> Result<String> {
        // Assumes the 'u' tag was already read.
        let (utf8, start) = self.decode_binary(reader)?;
        let text = match std::str::from_utf8(&utf8) {
            Ok(text) => text,
            Err(_) => {
                return Err(CodecError::InvalidUtf8 {
                    start,
                    end: reader.tell(),
                })
            }
        };
        let text = if self.byte_order_mark {
            encoding::with_bom(text).into_owned()
        } else {
            text.to_owned()
        };
        if !self.text_encoding.can_represent(&text) {
            return Err(CodecError::UnrepresentableText {
                encoding: self.text_encoding.name(),
                start,
                end: reader.tell(),
            });
        }
        Ok(text)
    }

    /// Reads `<length>:<bytes>`; returns the payload and its starting offset.
    fn decode_binary<R: Reader + ?Sized>(&self, reader: &mut R) -> Result<(Bytes, u64)> {
        let length = self.decode_length(reader)?;
        let start = reader.tell();
        let binary = reader.read(length)?;
        if binary.len() < length {
            return Err(CodecError::UnexpectedTermination {
                offset: reader.tell(),
            });
        }
        Ok((binary, start))
    }

    fn decode_length<R: Reader + ?Sized>(&self, reader: &mut R) -> Result<usize> {
        let start = reader.tell();
        let mut length: usize = 0;
        let mut digits = 0usize;
        loop {
            match next_byte(reader)? {
                b':' if digits > 0 => break,
                byte @ b'0'..=b'9' => {
                    if self.strict && digits == 1 && length == 0 {
                        return Err(CodecError::NonCanonical {
                            offset: start,
                            reason: "length prefix has a leading zero",
                        });
                    }
                    length = length
                        .checked_mul(10)
                        .and_then(|l| l.checked_add(usize::from(byte - b'0')))
                        .ok_or(CodecError::LengthOverflow { offset: start })?;
                    digits += 1;
                }
                byte => return Err(unexpected_byte(reader, byte)),
            }
        }
        Ok(length)
    }

    fn decode_integer<R: Reader + ?Sized>(&self, reader: &mut R) -> Result<BigInt> {
        // Assumes the 'i' tag was already read.
        let start = reader.tell();
        let mut digits: Vec<u8> = Vec::new();
        let mut negative = false;
        loop {
            match next_byte(reader)? {
                b'-' if digits.is_empty() && !negative => negative = true,
                byte @ b'0'..=b'9' => digits.push(byte),
                b'e' if !digits.is_empty() => break,
                byte => return Err(unexpected_byte(reader, byte)),
            }
        }
        if self.strict {
            if digits.len() > 1 && digits[0] == b'0' {
                return Err(CodecError::NonCanonical {
                    offset: start,
                    reason: "integer has a leading zero",
                });
            }
            if negative && digits == b"0" {
                return Err(CodecError::NonCanonical {
                    offset: start,
                    reason: "negative zero",
                });
            }
        }
        let magnitude = BigInt::parse_bytes(&digits, 10).ok_or(CodecError::UnexpectedByte {
            offset: start,
            byte: digits[0],
        })?;
        Ok(if negative { -magnitude } else { magnitude })
    }
}

fn next_byte<R: Reader + ?Sized>(reader: &mut R) -> Result<u8> {
    reader
        .read_byte()?
        .ok_or_else(|| CodecError::UnexpectedTermination {
            offset: reader.tell(),
        })
}

fn unexpected_byte<R: Reader + ?Sized>(reader: &R, byte: u8) -> CodecError {
    CodecError::UnexpectedByte {
        offset: reader.tell() - 1,
        byte,
    }
}
