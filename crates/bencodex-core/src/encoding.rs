//! Text encodings for host string payloads.
//!
//! Bencodex text is always UTF-8 on the wire. A [`TextEncoding`] names the
//! encoding that host strings are in, so the encoder can tell text from
//! binary and the decoder can reject text the host cannot represent. Labels
//! are resolved with the WHATWG rules implemented by `encoding_rs`; encodings
//! that `encoding_rs` can only decode (UTF-16, `replacement`) are rejected
//! because they cannot round-trip through UTF-8.
//!
//! WHATWG treats `ascii` and `latin1` as aliases of windows-1252. Those labels
//! resolve here to the real 7-bit and 8-bit repertoires instead, so `é` is not
//! ASCII and byte 0x80 in Latin-1 is U+0080.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use encoding_rs::Encoding;
use tracing::debug;

use crate::error::{CodecError, Result};

/// The UTF-8 byte order mark as a `char`.
pub const BOM: char = '\u{feff}';

/// The UTF-8 byte order mark as bytes.
pub const BOM_BYTES: &[u8] = b"\xef\xbb\xbf";

/// A validated text encoding.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TextEncoding(Charset);

#[derive(Clone, Copy, PartialEq, Eq)]
enum Charset {
    /// Any encoding `encoding_rs` can both decode and encode.
    Whatwg(&'static Encoding),
    /// 7-bit US-ASCII; bytes from 0x80 up are invalid.
    Ascii,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
}

const ASCII_LABELS: &[&str] = &["ascii", "us-ascii", "ansi_x3.4-1968", "iso-ir-6", "646"];

const LATIN1_LABELS: &[&str] = &[
    "iso-8859-1",
    "iso8859-1",
    "iso88591",
    "iso_8859-1",
    "iso_8859-1:1987",
    "latin1",
    "l1",
    "iso-ir-100",
    "csisolatin1",
    "cp819",
    "ibm819",
];

impl TextEncoding {
    pub fn utf8() -> Self {
        TextEncoding(Charset::Whatwg(encoding_rs::UTF_8))
    }

    /// Resolves an encoding label such as `"utf-8"`, `"EUC-KR"` or `"latin1"`.
    ///
    /// ASCII and ISO-8859-1 labels resolve to those exact repertoires rather
    /// than to windows-1252, which WHATWG aliases them to.
    pub fn for_label(label: &str) -> Result<Self> {
        let trimmed = label.trim();
        let is = |labels: &[&str]| labels.iter().any(|l| l.eq_ignore_ascii_case(trimmed));
        if is(ASCII_LABELS) {
            return Ok(TextEncoding(Charset::Ascii));
        }
        if is(LATIN1_LABELS) {
            return Ok(TextEncoding(Charset::Latin1));
        }
        match Encoding::for_label(trimmed.as_bytes()) {
            Some(encoding) if encoding.output_encoding() == encoding => {
                Ok(TextEncoding(Charset::Whatwg(encoding)))
            }
            _ => {
                debug!(label, "rejected text encoding");
                Err(CodecError::UnsupportedEncoding {
                    name: label.to_owned(),
                })
            }
        }
    }

    /// Canonical name of the encoding, e.g. `"UTF-8"` or `"EUC-KR"`.
    pub fn name(&self) -> &'static str {
        match self.0 {
            Charset::Whatwg(encoding) => encoding.name(),
            Charset::Ascii => "US-ASCII",
            Charset::Latin1 => "ISO-8859-1",
        }
    }

    pub fn is_utf8(&self) -> bool {
        self.0 == Charset::Whatwg(encoding_rs::UTF_8)
    }

    /// Converts host bytes in this encoding to UTF-8 text.
    ///
    /// Returns `None` when `raw` is not a valid sequence in this encoding.
    /// A leading BOM is kept as `'\u{feff}'`.
    pub fn decode<'a>(&self, raw: &'a [u8]) -> Option<Cow<'a, str>> {
        match self.0 {
            Charset::Whatwg(encoding) => encoding.decode_without_bom_handling_and_without_replacement(raw),
            Charset::Ascii if raw.is_ascii() => std::str::from_utf8(raw).ok().map(Cow::Borrowed),
            Charset::Ascii => None,
            Charset::Latin1 => Some(encoding_rs::mem::decode_latin1(raw)),
        }
    }

    /// Converts text to host bytes in this encoding.
    ///
    /// Returns `None` when some character has no mapping in this encoding.
    pub fn encode<'a>(&self, text: &'a str) -> Option<Cow<'a, [u8]>> {
        match self.0 {
            Charset::Whatwg(encoding) => {
                let (bytes, _, unmappable) = encoding.encode(text);
                if unmappable {
                    None
                } else {
                    Some(bytes)
                }
            }
            Charset::Ascii => text.is_ascii().then(|| Cow::Borrowed(text.as_bytes())),
            Charset::Latin1 => encoding_rs::mem::is_str_latin1(text)
                .then(|| encoding_rs::mem::encode_latin1_lossy(text)),
        }
    }

    /// Whether every character of `text` has a mapping in this encoding.
    pub fn can_represent(&self, text: &str) -> bool {
        match self.0 {
            Charset::Ascii => text.is_ascii(),
            Charset::Latin1 => encoding_rs::mem::is_str_latin1(text),
            Charset::Whatwg(_) => self.is_utf8() || self.encode(text).is_some(),
        }
    }
}

impl Default for TextEncoding {
    fn default() -> Self {
        TextEncoding::utf8()
    }
}

impl FromStr for TextEncoding {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        TextEncoding::for_label(s)
    }
}

impl fmt::Debug for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TextEncoding").field(&self.name()).finish()
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reports whether `label` names an encoding usable by the codec.
pub fn validate_text_encoding(label: &str) -> bool {
    TextEncoding::for_label(label).is_ok()
}

/// Resolves an optional label; `None` stays `None` (text detection disabled).
pub(crate) fn resolve_optional(label: Option<&str>) -> Result<Option<TextEncoding>> {
    label.map(TextEncoding::for_label).transpose()
}

/// Prepends a BOM unless `text` already starts with one.
pub(crate) fn with_bom(text: &str) -> Cow<'_, str> {
    if text.starts_with(BOM) {
        Cow::Borrowed(text)
    } else {
        let mut owned = String::with_capacity(text.len() + BOM.len_utf8());
        owned.push(BOM);
        owned.push_str(text);
        Cow::Owned(owned)
    }
}
