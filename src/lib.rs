//! Docwire - BSON document codec and OP_MSG wire framing
//!
//! This library decodes and encodes the binary document format spoken by
//! MongoDB-compatible clients, and the message framing that carries those
//! documents over a connection. It is the wire layer of a server; command
//! semantics live behind the [`wire::Handler`] trait.
//!
//! # Quick Start
//!
//! ```rust
//! use docwire::{BsonType, Document, Message, OpMsg, WireConfig};
//!
//! let mut doc = Document::new();
//! doc.push("ping", 1_i32);
//! doc.push("$db", "admin");
//!
//! let msg = Message::new(1, 0, OpMsg::new(doc.clone()));
//! let bytes = msg.encode(&WireConfig::default())?;
//!
//! let decoded = Message::decode(&bytes, &WireConfig::default())?;
//! assert_eq!(decoded.op_msg().and_then(OpMsg::document), Some(&doc));
//!
//! // Canonical textual form
//! assert_eq!(doc.to_json_string(), r#"{"$k":["ping","$db"],"ping":1,"$db":"admin"}"#);
//! # Ok::<(), docwire::WireError>(())
//! ```
//!
//! # Features
//!
//! - **Three representations** - binary, canonical text and in-memory values
//!   round-trip losslessly, field order and duplicate keys included
//! - **Strict decoding** - every malformed input is a typed error, never a panic
//! - **OP_MSG framing** - sections, flag bits and CRC-32C checksums
//! - **Stateless** - decoders own their cursor, so connections share nothing

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_wrap)]

pub mod bson;
pub mod wire;

pub use bson::{Array, BsonType, Document, Value};
pub use wire::{Message, MsgHeader, OpCode, OpMsg, OpMsgFlags, WireConfig, WireError};
