//! Cross-form agreement: each fixture's literal bytes and literal text decode
//! to the same value, and that value encodes back to both literals.

use std::fmt::Debug;

use docwire::bson::{
    Array, Binary, BinarySubtype, BsonType, CString, DateTime, Document, Error, ObjectId, Regex,
    Timestamp, Value,
};

fn check<T: BsonType + PartialEq + Debug>(bin: &[u8], text: &str, expected: &T) {
    let from_bin = T::from_bytes(bin).unwrap();
    let from_text = T::from_json_str(text).unwrap();

    assert_eq!(&from_bin, expected, "binary fixture {bin:02x?}");
    assert_eq!(&from_text, expected, "text fixture {text}");
    assert_eq!(expected.to_bytes().unwrap().as_ref(), bin);
    assert_eq!(expected.to_json_string(), text);
}

#[test]
fn binary_user_subtype() {
    check(
        &[0x03, 0x00, 0x00, 0x00, 0x80, 0x66, 0x6f, 0x6f],
        r#"{"$b":"Zm9v","s":128}"#,
        &Binary::new(BinarySubtype::USER, b"foo".to_vec()),
    );
}

#[test]
fn binary_empty() {
    check(
        &[0x00, 0x00, 0x00, 0x00, 0x00],
        r#"{"$b":"","s":0}"#,
        &Binary::new(BinarySubtype::GENERIC, Vec::new()),
    );
}

#[test]
fn binary_unknown_subtype() {
    check(
        &[0x00, 0x00, 0x00, 0x00, 0xff],
        r#"{"$b":"","s":255}"#,
        &Binary::new(BinarySubtype(255), Vec::new()),
    );
}

#[test]
fn cstring() {
    let c = CString::from_json_str(r#"{"$c":"foo"}"#).unwrap();
    assert_eq!(c.to_bytes().unwrap().as_ref(), &[0x66, 0x6f, 0x6f, 0x00]);
    check(&[0x66, 0x6f, 0x6f, 0x00], r#"{"$c":"foo"}"#, &c);
}

#[test]
fn double() {
    check(
        &[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf8, 0x3f],
        r#"{"$f":"1.5"}"#,
        &1.5_f64,
    );
    check(
        &[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf0, 0xff],
        r#"{"$f":"-Infinity"}"#,
        &f64::NEG_INFINITY,
    );
}

#[test]
fn string() {
    check(
        &[0x04, 0x00, 0x00, 0x00, b'f', b'o', b'o', 0x00],
        r#""foo""#,
        &"foo".to_owned(),
    );
    check(&[0x01, 0x00, 0x00, 0x00, 0x00], r#""""#, &String::new());
}

#[test]
fn integers_and_bool() {
    check(&[0x01, 0x00, 0x00, 0x00], "1", &1_i32);
    check(&[0xff; 8], r#"{"$l":"-1"}"#, &-1_i64);
    check(&[0x01], "true", &true);
    check(&[0x00], "false", &false);
}

#[test]
fn datetime_and_timestamp() {
    check(
        &[0xe8, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        r#"{"$d":"1000"}"#,
        &DateTime(1000),
    );
    check(
        &[0x02, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00],
        r#"{"$t":"4294967298"}"#,
        &Timestamp::new(1, 2),
    );
}

#[test]
fn object_id() {
    let bytes = [
        0x62, 0x5e, 0x3c, 0x1a, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77,
    ];
    check(&bytes, r#"{"$o":"625e3c1a0011223344556677"}"#, &ObjectId(bytes));
}

#[test]
fn regex() {
    check(
        b"^a\0i\0",
        r#"{"$r":"^a","o":"i"}"#,
        &Regex {
            pattern: "^a".to_owned(),
            options: "i".to_owned(),
        },
    );
}

#[test]
fn document_with_nested_array() {
    let bytes = [
        31, 0, 0, 0, // length
        0x01, b'a', 0, 0, 0, 0, 0, 0, 0, 0xf8, 0x3f, // a: 1.5
        0x04, b'b', 0, // b: array
        12, 0, 0, 0, 0x08, b'0', 0, 1, 0x0a, b'1', 0, 0, // [true, null]
        0,
    ];
    let mut doc = Document::new();
    doc.push("a", 1.5);
    doc.push("b", Array::from(vec![Value::Boolean(true), Value::Null]));

    check(
        &bytes,
        r#"{"$k":["a","b"],"a":{"$f":"1.5"},"b":[true,null]}"#,
        &doc,
    );
}

#[test]
fn list_collections_reply() {
    let text = r#"{"$k":["cursor","ok"],"cursor":{"$k":["id","ns","firstBatch"],"id":{"$l":"0"},"ns":"test.$cmd.listCollections","firstBatch":[{"$k":["name","type"],"name":"foo","type":"collection"}]},"ok":{"$f":"1"}}"#;
    let doc = Document::from_json_str(text).unwrap();

    let cursor = doc.get("cursor").and_then(Value::as_document).unwrap();
    assert_eq!(cursor.get("id"), Some(&Value::Int64(0)));
    let batch = cursor.get("firstBatch").and_then(Value::as_array).unwrap();
    assert_eq!(batch.len(), 1);

    let bytes = doc.to_bytes().unwrap();
    assert_eq!(Document::from_bytes(&bytes).unwrap(), doc);
    assert_eq!(doc.to_json_string(), text);
}

#[test]
fn value_dispatches_on_marker() {
    let cases = [
        (r#"{"$f":"2"}"#, Value::Double(2.0)),
        (r#"{"$l":"2"}"#, Value::Int64(2)),
        (r#"{"$d":"2"}"#, Value::DateTime(DateTime(2))),
        (r#"{"$t":"2"}"#, Value::Timestamp(Timestamp(2))),
        ("2", Value::Int32(2)),
        ("null", Value::Null),
        (r#""2""#, Value::String("2".to_owned())),
    ];
    for (text, expected) in cases {
        assert_eq!(Value::from_json_str(text).unwrap(), expected, "{text}");
        assert_eq!(expected.to_json_string(), text);
    }
}

#[test]
fn null_is_never_a_wrapped_scalar() {
    for result in [
        f64::from_json_str("null").map(drop),
        i64::from_json_str("null").map(drop),
        Binary::from_json_str("null").map(drop),
        CString::from_json_str("null").map(drop),
        DateTime::from_json_str("null").map(drop),
        Timestamp::from_json_str("null").map(drop),
        ObjectId::from_json_str("null").map(drop),
        Regex::from_json_str("null").map(drop),
        Document::from_json_str("null").map(drop),
    ] {
        assert!(matches!(result, Err(Error::StrictTextDecodeViolation(_))));
    }
}

#[test]
fn strict_text_decode() {
    let rejected = [
        r#"{"$b":"Zm9v","s":128,"x":1}"#,
        r#"{"$b":"Zm9v"}"#,
        r#"{"$b":"Zm9v","s":128,"s":128}"#,
        r#"{"$b":"Zm9v","s":128} x"#,
        r#"{"$b":"Zm9v","s":256}"#,
        r#"{"$b":"!!","s":0}"#,
    ];
    for text in rejected {
        assert!(Binary::from_json_str(text).is_err(), "{text}");
    }

    // field order inside a wrapper is free
    assert_eq!(
        Binary::from_json_str(r#"{"s":128,"$b":"Zm9v"}"#).unwrap(),
        Binary::new(BinarySubtype::USER, b"foo".to_vec())
    );
}

#[test]
fn string_length_must_match_terminator() {
    // declared 3, terminator at 4
    let bytes = [0x03, 0x00, 0x00, 0x00, b'f', b'o', b'o', 0x00];
    assert!(matches!(
        String::from_bytes(&bytes),
        Err(Error::LengthMismatch { what: "string", .. })
    ));

    let bytes = [0x00, 0x00, 0x00, 0x00];
    assert!(String::from_bytes(&bytes).is_err());
}
