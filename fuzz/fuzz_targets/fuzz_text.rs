#![no_main]

use docwire::bson::{BsonType, Document, Value};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    let _ = Value::from_json_str(text);
    if let Ok(doc) = Document::from_json_str(text) {
        let _ = doc.to_bytes();
    }
});
