#![no_main]

use bytes::BytesMut;
use docwire::wire::{Message, MessageCodec, WireConfig};
use libfuzzer_sys::fuzz_target;
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    let config = WireConfig::default();
    if let Ok(msg) = Message::decode(data, &config) {
        let _ = msg.to_json_string();
        let _ = msg.encode(&config);
    }

    let mut buf = BytesMut::from(data);
    let mut codec = MessageCodec::new(config);
    while let Ok(Some(_)) = codec.decode(&mut buf) {}
});
