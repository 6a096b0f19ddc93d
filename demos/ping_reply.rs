//! Request/reply round trip through the framing layer, in memory

use docwire::bson::{BsonType, Document};
use docwire::wire::{
    CommandError, ErrorCode, Message, MsgHeader, OpMsg, WireConfig, read_message, serve,
    write_message,
};

fn handle(_: &MsgHeader, msg: &OpMsg) -> Result<OpMsg, CommandError> {
    match msg.document().and_then(Document::command) {
        Some("ping") => Ok(OpMsg::new(Document::from_iter([("ok", 1.0)]))),
        Some(name) => Err(CommandError::new(
            ErrorCode::CommandNotFound,
            format!("no such command: '{name}'"),
        )),
        None => Err(CommandError::new(ErrorCode::BadValue, "empty command")),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Docwire Ping/Reply Example");
    println!("==========================\n");

    let config = WireConfig::default();

    let mut ping = Document::new();
    ping.push("ping", 1_i32);
    ping.push("$db", "admin");
    println!("Request document: {}", ping.to_json_string());
    println!("Request document bytes: {:02x?}", ping.to_bytes()?.as_ref());

    // Client side: frame the request onto a byte stream
    let mut wire = Vec::new();
    write_message(&mut wire, &Message::new(1, 0, OpMsg::new(ping)), &config)?;
    println!("Framed request: {} bytes", wire.len());

    // Server side: read, dispatch, reply
    let request = read_message(&mut wire.as_slice(), &config)?;
    println!("Decoded request: {}", request.to_json_string());

    if let Some(reply) = serve(&handle, &request) {
        let bytes = reply.encode(&config)?;
        println!("Reply: {} bytes", bytes.len());
        println!("{}", Message::decode(&bytes, &config)?.to_json_string());
    }

    Ok(())
}
