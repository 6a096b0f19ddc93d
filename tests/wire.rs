//! Message framing over literal byte layouts

use bytes::BytesMut;
use docwire::bson::{BsonType, Document, Value};
use docwire::wire::{
    HEADER_SIZE, Message, MessageCodec, MsgBody, OpCode, OpMsg, OpMsgFlags, OpQuery, OpReply,
    Section, WireConfig, WireError, read_message, write_message,
};
use tokio_util::codec::{Decoder, Encoder};

fn raw_message(op_code: OpCode, body: &[u8]) -> Vec<u8> {
    let len = i32::try_from(HEADER_SIZE + body.len()).unwrap();
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&len.to_le_bytes());
    bytes.extend_from_slice(&11_i32.to_le_bytes());
    bytes.extend_from_slice(&0_i32.to_le_bytes());
    bytes.extend_from_slice(&op_code.as_i32().to_le_bytes());
    bytes.extend_from_slice(body);
    bytes
}

fn insert_command() -> OpMsg {
    let mut cmd = Document::new();
    cmd.push("insert", "users");
    cmd.push("$db", "test");
    let docs = vec![
        Document::from_iter([("_id", 1_i32)]),
        Document::from_iter([("_id", 2_i32)]),
    ];
    OpMsg::new(cmd).with_sequence("documents", docs)
}

#[test]
fn decode_hand_built_op_msg() {
    let doc = Document::from_iter([("ping", 1_i32)]).to_bytes().unwrap();
    let mut body = 0_u32.to_le_bytes().to_vec();
    body.push(0);
    body.extend_from_slice(&doc);

    let bytes = raw_message(OpCode::Msg, &body);
    let msg = Message::decode(&bytes, &WireConfig::default()).unwrap();

    assert_eq!(msg.header().request_id(), 11);
    let op = msg.op_msg().unwrap();
    assert_eq!(op.flags.bits(), 0);
    assert_eq!(op.sections, vec![Section::Body(Document::from_iter([("ping", 1_i32)]))]);
}

#[test]
fn sequence_sections_roundtrip() {
    let config = WireConfig::default();
    let msg = Message::new(3, 0, insert_command());
    let bytes = msg.encode(&config).unwrap();
    let decoded = Message::decode(&bytes, &config).unwrap();

    let op = decoded.op_msg().unwrap();
    assert_eq!(op.document().and_then(Document::command), Some("insert"));
    let ids: Vec<_> = op
        .documents()
        .filter_map(|d| d.get("_id").cloned())
        .collect();
    assert_eq!(ids, [Value::Int32(1), Value::Int32(2)]);
    assert_eq!(decoded.encode(&config).unwrap(), bytes);
}

#[test]
fn checksum_flag_with_undersized_body() {
    let config = WireConfig::default();
    let flags = OpMsgFlags::CHECKSUM_PRESENT.to_le_bytes();

    let bytes = raw_message(OpCode::Msg, &flags);
    assert!(matches!(
        Message::decode(&bytes, &config),
        Err(WireError::BufferUnderrun { .. })
    ));

    let mut body = flags.to_vec();
    body.extend_from_slice(&[0xaa, 0xbb]);
    let bytes = raw_message(OpCode::Msg, &body);
    assert!(matches!(
        Message::decode(&bytes, &config),
        Err(WireError::BufferUnderrun { .. })
    ));
}

#[test]
fn checksum_roundtrip_and_corruption() {
    let config = WireConfig::default();
    let op = insert_command().with_flags(OpMsgFlags::new().with(OpMsgFlags::CHECKSUM_PRESENT));
    let bytes = Message::new(9, 0, op.clone()).encode(&config).unwrap();

    let decoded = Message::decode(&bytes, &config).unwrap();
    assert_eq!(decoded.op_msg(), Some(&op));

    for offset in [HEADER_SIZE + 6, bytes.len() - 1] {
        let mut corrupt = bytes.to_vec();
        corrupt[offset] ^= 0x01;
        assert!(
            matches!(
                Message::decode(&corrupt, &config),
                Err(WireError::ChecksumMismatch { .. })
            ),
            "offset {offset}"
        );
    }
}

#[test]
fn checksum_header_coverage_must_agree() {
    let covering = WireConfig {
        checksum_covers_header: true,
        ..WireConfig::default()
    };
    let op = OpMsg::new(Document::from_iter([("ping", 1_i32)]))
        .with_flags(OpMsgFlags::new().with(OpMsgFlags::CHECKSUM_PRESENT));
    let bytes = Message::new(1, 0, op).encode(&covering).unwrap();

    assert!(Message::decode(&bytes, &covering).is_ok());
    assert!(matches!(
        Message::decode(&bytes, &WireConfig::default()),
        Err(WireError::ChecksumMismatch { .. })
    ));

    let tail = u32::from_le_bytes(bytes[bytes.len() - 4..].try_into().unwrap());
    assert_eq!(tail, crc32c::crc32c(&bytes[..bytes.len() - 4]));
}

#[test]
fn unknown_flag_bits_preserved() {
    let config = WireConfig::default();
    let flags = OpMsgFlags::from_bits(0x8000_0000 | OpMsgFlags::EXHAUST_ALLOWED | 1 << 5);
    let msg = Message::new(1, 0, OpMsg::new(Document::new()).with_flags(flags));

    let decoded = Message::decode(&msg.encode(&config).unwrap(), &config).unwrap();
    assert_eq!(decoded.op_msg().unwrap().flags, flags);
    assert_eq!(flags.to_string(), "[bit31, bit5, exhaustAllowed]");
}

#[test]
fn header_length_violations() {
    let config = WireConfig::default();
    let good = Message::new(1, 0, OpMsg::new(Document::new()))
        .encode(&config)
        .unwrap();

    assert!(Message::decode(&good[..10], &config).unwrap_err().is_length_error());
    assert!(Message::decode(&good[..good.len() - 1], &config).unwrap_err().is_length_error());

    let mut negative = good.to_vec();
    negative[..4].copy_from_slice(&(-1_i32).to_le_bytes());
    assert!(matches!(
        Message::decode(&negative, &config),
        Err(WireError::InvalidMessageLength { length: -1 })
    ));

    // length fits the buffer but the inner document runs past it
    let mut short_doc = good.to_vec();
    short_doc[HEADER_SIZE + 5] = 6;
    assert!(Message::decode(&short_doc, &config).unwrap_err().is_length_error());
}

#[test]
fn legacy_handshake_roundtrip() {
    let config = WireConfig::default();
    let query = OpQuery::command("admin", Document::from_iter([("isMaster", 1_i32)]));
    let request = Message::new(1, 0, query.clone());
    let bytes = request.encode(&config).unwrap();
    assert_eq!(&bytes[12..16], &2004_i32.to_le_bytes());

    let decoded = Message::decode(&bytes, &config).unwrap();
    assert_eq!(decoded.body(), &MsgBody::Query(query));

    let mut hello = Document::new();
    hello.push("ismaster", true);
    hello.push("maxWireVersion", 13_i32);
    hello.push("ok", 1.0);
    let reply = Message::reply_to(decoded.header(), OpReply::new(hello));
    let reply_bytes = reply.encode(&config).unwrap();
    let decoded = Message::decode(&reply_bytes, &config).unwrap();
    assert_eq!(decoded.header().response_to(), 1);
    assert!(matches!(decoded.body(), MsgBody::Reply(r) if r.documents.len() == 1));
}

#[test]
fn stream_read_write() {
    let config = WireConfig::default();
    let mut wire = Vec::new();
    write_message(&mut wire, &Message::new(1, 0, insert_command()), &config).unwrap();
    write_message(&mut wire, &Message::new(2, 0, OpMsg::new(Document::new())), &config).unwrap();

    let mut cursor = std::io::Cursor::new(&wire[..wire.len() - 3]);
    assert_eq!(read_message(&mut cursor, &config).unwrap().header().request_id(), 1);
    match read_message(&mut cursor, &config) {
        Err(WireError::Io(err)) => assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof),
        other => panic!("expected EOF, got {other:?}"),
    }
}

#[test]
fn stream_rejects_oversized_header() {
    let config = WireConfig {
        max_message_size: 1024,
        ..WireConfig::default()
    };
    let mut bytes = raw_message(OpCode::Msg, &[]);
    bytes[..4].copy_from_slice(&2048_i32.to_le_bytes());
    assert!(matches!(
        read_message(&mut std::io::Cursor::new(bytes), &config),
        Err(WireError::MessageTooLarge { length: 2048, max: 1024 })
    ));
}

#[test]
fn codec_handles_byte_at_a_time() {
    let mut codec = MessageCodec::default();
    let mut encoded = BytesMut::new();
    codec.encode(Message::new(5, 0, insert_command()), &mut encoded).unwrap();

    let mut buf = BytesMut::new();
    let mut decoded = None;
    for (i, byte) in encoded.iter().enumerate() {
        buf.extend_from_slice(&[*byte]);
        if let Some(msg) = codec.decode(&mut buf).unwrap() {
            assert_eq!(i, encoded.len() - 1);
            decoded = Some(msg);
        }
    }
    assert_eq!(decoded.unwrap().op_msg(), Some(&insert_command()));
}
