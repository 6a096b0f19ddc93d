//! Message framing
//!
//! A message is a 16-byte [`MsgHeader`] followed by an op-code specific
//! body. OP_MSG is the primary body format; the legacy OP_QUERY and
//! OP_REPLY bodies are framed for the connection handshake.
//!
//! # Wire Format
//!
//! ```text
//! [HEADER (16 bytes)] [BODY (length - 16 bytes)]
//! ```
//!
//! All integers are little-endian.

mod codec;
mod config;
mod error;
mod flags;
mod handler;
mod header;
mod message;
mod op_msg;
mod op_query;
mod op_reply;

pub use codec::MessageCodec;
pub use config::WireConfig;
pub use error::{Result, WireError};
pub use flags::{OpMsgFlags, OpQueryFlags, OpReplyFlags};
pub use handler::{CommandError, ErrorCode, Handler, serve};
pub use header::{MsgHeader, OpCode};
pub use message::{Message, MsgBody, read_message, write_message};
pub use op_msg::{OpMsg, Section};
pub use op_query::OpQuery;
pub use op_reply::OpReply;

/// Header size in bytes
pub const HEADER_SIZE: usize = 16;

/// OP_MSG checksum size in bytes
pub const CHECKSUM_SIZE: usize = 4;

/// Largest message accepted by default, header included
pub const MAX_MESSAGE_SIZE: usize = 48_000_000;
