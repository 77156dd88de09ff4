//! Error types for Bencodex encoding and decoding operations.

use std::fmt::Display;

use thiserror::Error;

/// Errors that can occur during Bencodex encoding or decoding.
///
/// Every decoding error carries the byte offset (from the start of the
/// stream) where the problem was detected, so diagnostics can point at the
/// exact position without holding on to the offending input.
#[derive(Error, Debug)]
pub enum CodecError {
    /// A byte that cannot start or continue the current grammar production.
    #[error("failed to decode Bencodex data at offset {offset}; an unexpected byte: 0x{byte:02x}")]
    UnexpectedByte { offset: u64, byte: u8 },

    /// The input ended where a value, tag, or payload byte was expected.
    #[error("failed to decode Bencodex data at offset {offset}; unexpected termination")]
    UnexpectedTermination { offset: u64 },

    /// A `u`-tagged payload that is not well-formed UTF-8.
    #[error("failed to decode Bencodex data; invalid UTF-8 sequence between offset {start} and {end}")]
    InvalidUtf8 { start: u64, end: u64 },

    /// A complete value was followed by more input.
    #[error("failed to decode Bencodex data at offset {offset}; trailing byte 0x{byte:02x} after a complete value")]
    TrailingData { offset: u64, byte: u8 },

    /// A length prefix too large to address in memory.
    #[error("failed to decode Bencodex data at offset {offset}; length prefix overflows")]
    LengthOverflow { offset: u64 },

    /// Containers nested deeper than the decoder allows.
    #[error("failed to decode Bencodex data at offset {offset}; nesting exceeds {max_depth} levels")]
    NestingTooDeep { offset: u64, max_depth: usize },

    /// Well-formed but not canonical (strict decoding only).
    #[error("non-canonical Bencodex data at offset {offset}: {reason}")]
    NonCanonical { offset: u64, reason: &'static str },

    /// The requested text encoding is unknown or cannot round-trip through UTF-8.
    #[error("invalid or unsupported text encoding: {name}")]
    UnsupportedEncoding { name: String },

    /// Valid UTF-8 text that has no representation in the configured output encoding.
    #[error(
        "failed to decode a UTF-8 string into the requested text encoding {encoding} \
         between offset {start} and {end}; try another text encoding which covers \
         the entire Unicode character set"
    )]
    UnrepresentableText {
        encoding: &'static str,
        start: u64,
        end: u64,
    },

    /// A value shape that has no Bencodex representation.
    #[error("the type cannot be serialized into Bencodex: {0}")]
    UnsupportedType(String),

    /// A message raised by a `Serialize` implementation.
    #[error("{0}")]
    Custom(String),

    /// The underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`CodecError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input bytes are not valid Bencodex.
    Malformed,
    /// A text encoding is unsupported, or text cannot be represented in it.
    TextEncoding,
    /// The caller handed over a value the format cannot express.
    Type,
    /// The reader or writer failed.
    Io,
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::UnexpectedByte { .. }
            | CodecError::UnexpectedTermination { .. }
            | CodecError::InvalidUtf8 { .. }
            | CodecError::TrailingData { .. }
            | CodecError::LengthOverflow { .. }
            | CodecError::NestingTooDeep { .. }
            | CodecError::NonCanonical { .. } => ErrorKind::Malformed,
            CodecError::UnsupportedEncoding { .. } | CodecError::UnrepresentableText { .. } => {
                ErrorKind::TextEncoding
            }
            CodecError::UnsupportedType(_) | CodecError::Custom(_) => ErrorKind::Type,
            CodecError::Io(_) => ErrorKind::Io,
        }
    }

    /// Offset into the input where a decoding error was detected, if any.
    pub fn offset(&self) -> Option<u64> {
        match self {
            CodecError::UnexpectedByte { offset, .. }
            | CodecError::UnexpectedTermination { offset }
            | CodecError::TrailingData { offset, .. }
            | CodecError::LengthOverflow { offset }
            | CodecError::NestingTooDeep { offset, .. }
            | CodecError::NonCanonical { offset, .. } => Some(*offset),
            CodecError::InvalidUtf8 { start, .. } | CodecError::UnrepresentableText { start, .. } => {
                Some(*start)
            }
            _ => None,
        }
    }
}

impl serde::ser::Error for CodecError {
    fn custom<T: Display>(msg: T) -> Self {
        CodecError::Custom(msg.to_string())
    }
}

/// Convenience alias used throughout bencodex-core.
pub type Result<T> = std::result::Result<T, CodecError>;
