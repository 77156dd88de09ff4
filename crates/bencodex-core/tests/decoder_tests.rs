use bencodex_core::{
    decode, decode_with, encode, CodecError, Decoder, DecoderOptions, ErrorKind, Key, MemoryReader,
    Reader, Value,
};
use num_bigint::BigInt;

fn assert_malformed(input: &[u8]) {
    match decode(input) {
        Err(e) => assert_eq!(
            e.kind(),
            ErrorKind::Malformed,
            "input {:?} gave {e}",
            String::from_utf8_lossy(input)
        ),
        Ok(v) => panic!(
            "input {:?} decoded to {v:?}, expected an error",
            String::from_utf8_lossy(input)
        ),
    }
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn default_decoder_is_utf8_without_bom() {
    let d = Decoder::default();
    assert!(d.text_encoding().is_utf8());
    assert!(!d.byte_order_mark());
    assert!(!d.is_strict());
}

#[test]
fn decoder_accepts_known_encodings() {
    let d = Decoder::new("euc-kr", false).unwrap();
    assert_eq!(d.text_encoding().name(), "EUC-KR");
    let d = Decoder::new("ascii", true).unwrap();
    assert!(d.byte_order_mark());
}

#[test]
fn decoder_rejects_unknown_encoding_eagerly() {
    let err = Decoder::new("utf-1", false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TextEncoding);
    assert!(matches!(err, CodecError::UnsupportedEncoding { ref name } if name == "utf-1"));
}

#[test]
fn decoder_options_deserialize_with_defaults() {
    let options: DecoderOptions =
        serde_json::from_str(r#"{"text_encoding":"euc-kr","strict":true}"#).unwrap();
    assert_eq!(options.text_encoding, "euc-kr");
    assert!(options.strict);
    assert!(!options.byte_order_mark);
    assert_eq!(options.max_depth, DecoderOptions::default().max_depth);
    let d = Decoder::from_options(&options).unwrap();
    assert!(d.is_strict());
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn decode_null_and_booleans() {
    assert_eq!(decode(b"n").unwrap(), Value::Null);
    assert_eq!(decode(b"f").unwrap(), Value::Boolean(false));
    assert_eq!(decode(b"t").unwrap(), Value::Boolean(true));
}

#[test]
fn decode_integers() {
    assert_eq!(decode(b"i123e").unwrap(), Value::from(123));
    assert_eq!(decode(b"i-456e").unwrap(), Value::from(-456));
    assert_eq!(decode(b"i0e").unwrap(), Value::from(0));
}

#[test]
fn decode_integer_beyond_i64_is_exact() {
    let value = decode(b"i9223372036854775808e").unwrap();
    let expected: BigInt = "9223372036854775808".parse().unwrap();
    assert_eq!(value, Value::Integer(expected));
    assert_eq!(value.as_i64(), None);
}

#[test]
fn decode_huge_negative_integer() {
    let digits = "-".to_owned() + &"9".repeat(100);
    let input = format!("i{digits}e");
    let value = decode(input.as_bytes()).unwrap();
    assert_eq!(value.as_integer().map(ToString::to_string), Some(digits));
}

#[test]
fn decode_malformed_integers() {
    assert_malformed(b"i123");
    assert_malformed(b"i123z");
    assert_malformed(b"i12-3e");
    assert_malformed(b"ie");
}

// ============================================================================
// Binary and text
// ============================================================================

#[test]
fn decode_binary() {
    assert_eq!(decode(b"3:foo").unwrap(), Value::from(&b"foo"[..]));
    assert_eq!(decode(b"0:").unwrap(), Value::from(&b""[..]));
}

#[test]
fn decode_binary_that_is_not_utf8() {
    assert_eq!(decode(b"2:\xc3\x28").unwrap(), Value::from(&b"\xc3\x28"[..]));
}

#[test]
fn decode_binary_with_insufficient_bytes() {
    let err = decode(b"100:insufficient").unwrap_err();
    assert!(matches!(err, CodecError::UnexpectedTermination { offset: 16 }));
}

#[test]
fn decode_text() {
    assert_eq!(decode("u6:단팥".as_bytes()).unwrap(), Value::from("단팥"));
}

#[test]
fn decode_text_with_bom_policy_adds_bom() {
    let value = decode_with("u6:단팥".as_bytes(), "utf-8", true).unwrap();
    assert_eq!(value, Value::from("\u{feff}단팥"));
    assert_eq!(value.as_text().unwrap().as_bytes(), b"\xef\xbb\xbf\xeb\x8b\xa8\xed\x8c\xa5");
}

#[test]
fn decode_text_keeps_existing_bom() {
    let input = "u9:\u{feff}단팥".as_bytes();
    assert_eq!(decode(input).unwrap(), Value::from("\u{feff}단팥"));
    assert_eq!(decode_with(input, "utf-8", true).unwrap(), Value::from("\u{feff}단팥"));
}

#[test]
fn decode_text_in_euc_kr_target() {
    let value = decode_with("u6:단팥".as_bytes(), "euc-kr", false).unwrap();
    assert_eq!(value, Value::from("단팥"));
    let d = Decoder::new("euc-kr", false).unwrap();
    let encoded = d.text_encoding().encode(value.as_text().unwrap()).unwrap();
    assert_eq!(&*encoded, b"\xb4\xdc\xc6\xcf");
}

#[test]
fn decode_text_with_insufficient_bytes() {
    assert_malformed("u100:insufficient length; 너무 짧다".as_bytes());
}

#[test]
fn decode_text_rejects_invalid_utf8() {
    let err = decode(b"u4:\xb4\xdc\xc6\xcf").unwrap_err();
    assert!(matches!(err, CodecError::InvalidUtf8 { start: 3, end: 7 }));
    assert_eq!(err.kind(), ErrorKind::Malformed);
}

#[test]
fn decode_text_unrepresentable_in_target_encoding() {
    let err = decode_with("u6:단팥".as_bytes(), "ascii", false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TextEncoding);
    assert!(matches!(err, CodecError::UnrepresentableText { start: 3, end: 9, .. }));
}

#[test]
fn decode_latin_text_is_not_ascii() {
    let err = decode_with("u2:\u{e9}".as_bytes(), "ascii", false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TextEncoding);
    assert!(matches!(
        err,
        CodecError::UnrepresentableText { encoding: "US-ASCII", start: 3, end: 5 }
    ));
    assert_eq!(decode_with(b"u5:plain", "ascii", false).unwrap(), Value::from("plain"));
}

#[test]
fn decode_text_in_latin1_target() {
    let value = decode_with("u2:\u{e9}".as_bytes(), "latin1", false).unwrap();
    assert_eq!(value, Value::from("\u{e9}"));
    let err = decode_with("u3:\u{20ac}".as_bytes(), "latin1", false).unwrap_err();
    assert!(matches!(err, CodecError::UnrepresentableText { encoding: "ISO-8859-1", .. }));
}

// ============================================================================
// Containers
// ============================================================================

#[test]
fn decode_empty_list() {
    assert_eq!(decode(b"le").unwrap(), Value::List(vec![]));
}

#[test]
fn decode_mixed_list() {
    let value = decode("lu6:단팥ntfli123eee".as_bytes()).unwrap();
    assert_eq!(
        value,
        Value::List(vec![
            Value::from("단팥"),
            Value::Null,
            Value::Boolean(true),
            Value::Boolean(false),
            Value::List(vec![Value::from(123)]),
        ])
    );
}

#[test]
fn decode_empty_dictionary() {
    assert_eq!(decode(b"de").unwrap(), Value::Dictionary(Default::default()));
}

#[test]
fn decode_dictionary_with_binary_and_text_keys() {
    let input = [
        &b"d2:\xc3\x28d3:bari1e3:fooi2ee"[..],
        "u6:단팥li123eee".as_bytes(),
    ]
    .concat();
    let value = decode(&input).unwrap();
    let inner = Value::dictionary([
        (Key::from(&b"bar"[..]), Value::from(1)),
        (Key::from(&b"foo"[..]), Value::from(2)),
    ]);
    let expected = Value::dictionary([
        (Key::from(&b"\xc3\x28"[..]), inner),
        (Key::from("단팥"), Value::List(vec![Value::from(123)])),
    ]);
    assert_eq!(value, expected);
}

#[test]
fn decode_dictionary_duplicate_keys_last_wins() {
    let value = decode(b"du1:ai1eu1:ai2ee").unwrap();
    assert_eq!(value.get("a"), Some(&Value::from(2)));
    assert_eq!(value.as_dictionary().map(|d| d.len()), Some(1));
}

#[test]
fn decode_dictionary_keeps_wire_order() {
    let value = decode(b"du1:bi1eu1:ai2ee").unwrap();
    let keys: Vec<&Key> = value.as_dictionary().unwrap().keys().collect();
    assert_eq!(keys, [&Key::from("b"), &Key::from("a")]);
    assert_eq!(encode(&value).unwrap(), b"du1:ai2eu1:bi1ee");
}

#[test]
fn decode_dictionary_duplicate_key_keeps_first_position() {
    let value = decode(b"du1:bi1eu1:ai2eu1:bi3ee").unwrap();
    let entries: Vec<(&Key, &Value)> = value.as_dictionary().unwrap().iter().collect();
    assert_eq!(
        entries,
        [(&Key::from("b"), &Value::from(3)), (&Key::from("a"), &Value::from(2))]
    );
}

#[test]
fn decode_dictionary_binary_and_text_keys_are_distinct() {
    let value = decode(b"d1:ai1eu1:ai2ee").unwrap();
    assert_eq!(value.get(&b"a"[..]), Some(&Value::from(1)));
    assert_eq!(value.get("a"), Some(&Value::from(2)));
}

#[test]
fn decode_dictionary_rejects_non_string_key() {
    let err = decode(b"di1ei2ee").unwrap_err();
    assert!(matches!(err, CodecError::UnexpectedByte { offset: 1, byte: b'i' }));
}

#[test]
fn decode_unterminated_containers() {
    assert_malformed(b"l");
    assert_malformed(b"li1e");
    assert_malformed(b"d");
    assert_malformed(b"du1:a");
}

// ============================================================================
// Malformed input
// ============================================================================

#[test]
fn decode_empty_input() {
    let err = decode(b"").unwrap_err();
    assert!(matches!(err, CodecError::UnexpectedTermination { offset: 0 }));
}

#[test]
fn decode_unknown_tag() {
    let err = decode(b"z").unwrap_err();
    assert!(matches!(err, CodecError::UnexpectedByte { offset: 0, byte: b'z' }));
}

#[test]
fn decode_length_claiming_more_than_available() {
    assert_malformed(b"22:invalid-trailing-bytestfn");
}

#[test]
fn decode_rejects_trailing_data() {
    let err = decode(b"tfn").unwrap_err();
    assert!(matches!(err, CodecError::TrailingData { offset: 1, byte: b'f' }));
    assert_eq!(err.offset(), Some(1));
}

#[test]
fn decoder_rewinds_one_byte_on_trailing_data() {
    let mut reader = MemoryReader::new(&b"i1ei2e"[..]);
    assert!(Decoder::default().decode(&mut reader).is_err());
    assert_eq!(reader.tell(), 3);
}

#[test]
fn decoder_is_reusable() {
    let d = Decoder::default();
    for input in [&b"n"[..], &b"le"[..], &b"i1e"[..]] {
        assert!(d.decode(&mut MemoryReader::new(input)).is_ok());
    }
}

#[test]
fn deep_nesting_is_rejected_not_overflowed() {
    let depth = 100_000;
    let input = [vec![b'l'; depth], vec![b'e'; depth]].concat();
    let err = decode(&input).unwrap_err();
    assert!(matches!(err, CodecError::NestingTooDeep { .. }));
}
