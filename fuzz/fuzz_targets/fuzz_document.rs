#![no_main]

use docwire::bson::{BsonType, Document};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Array keys are regenerated on encode, so compare after one pass
    if let Ok(doc) = Document::from_bytes(data) {
        let bytes = doc.to_bytes().expect("decoded document re-encodes");
        let again = Document::from_bytes(&bytes).expect("encoded document decodes");
        assert_eq!(again.to_bytes().expect("re-encodes"), bytes);

        let text = doc.to_json_string();
        let reparsed = Document::from_json_str(&text).expect("canonical text parses");
        assert_eq!(reparsed.to_json_string(), text);
    }
});
