//! Boundary to the command layer
//!
//! A [`Handler`] sees fully decoded OP_MSG requests and returns the reply
//! body. [`serve`] frames the reply, or an error document when the handler
//! fails, so a handler never deals with lengths, ids or op codes.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use super::{Message, MsgBody, MsgHeader, OpMsg, OpReply, OpReplyFlags};
use crate::bson::Document;

/// Server error codes carried in error replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// Unexpected failure inside the server
    InternalError = 1,
    /// A command argument has the wrong type or value
    BadValue = 2,
    /// No handler for the command name
    CommandNotFound = 59,
    /// Recognised but unsupported request
    NotImplemented = 238,
}

impl ErrorCode {
    /// Numeric code
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Code name as sent in `codeName`
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::InternalError => "InternalError",
            Self::BadValue => "BadValue",
            Self::CommandNotFound => "CommandNotFound",
            Self::NotImplemented => "NotImplemented",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Command failure reported back to the client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct CommandError {
    code: ErrorCode,
    message: String,
}

impl CommandError {
    /// Create an error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Error code
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Error reply document: `{ok: 0.0, errmsg, code, codeName}`
    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut doc = Document::with_capacity(4);
        doc.push("ok", 0.0);
        doc.push("errmsg", self.message.as_str());
        doc.push("code", self.code.code());
        doc.push("codeName", self.code.name());
        doc
    }
}

/// Command layer entry point
pub trait Handler {
    /// Handle one decoded OP_MSG request
    fn handle(&self, header: &MsgHeader, msg: &OpMsg) -> Result<OpMsg, CommandError>;
}

impl<F> Handler for F
where
    F: Fn(&MsgHeader, &OpMsg) -> Result<OpMsg, CommandError>,
{
    fn handle(&self, header: &MsgHeader, msg: &OpMsg) -> Result<OpMsg, CommandError> {
        self(header, msg)
    }
}

/// Run `handler` on `request` and frame its reply
///
/// Returns `None` when no reply is due: the request set `moreToCome`, or it
/// is itself a reply. Legacy queries are answered with a query-failure
/// OP_REPLY without reaching the handler.
pub fn serve<H: Handler + ?Sized>(handler: &H, request: &Message) -> Option<Message> {
    let header = request.header();
    match request.body() {
        MsgBody::Msg(msg) => {
            let reply = match handler.handle(header, msg) {
                Ok(reply) => reply,
                Err(err) => {
                    debug!(request_id = header.request_id(), error = %err, "command failed");
                    OpMsg::new(err.to_document())
                }
            };
            if msg.flags.more_to_come() {
                return None;
            }
            Some(Message::reply_to(header, reply))
        }
        MsgBody::Query(query) => {
            debug!(
                request_id = header.request_id(),
                collection = %query.full_collection_name,
                "rejecting legacy query"
            );
            let err = CommandError::new(ErrorCode::NotImplemented, "OP_QUERY is not supported");
            let mut reply = OpReply::new(err.to_document());
            reply.flags = reply.flags.with(OpReplyFlags::QUERY_FAILURE);
            Some(Message::reply_to(header, reply))
        }
        MsgBody::Reply(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bson::Value;
    use crate::wire::{OpCode, OpMsgFlags, OpQuery};

    fn echo(_: &MsgHeader, msg: &OpMsg) -> Result<OpMsg, CommandError> {
        match msg.document().and_then(Document::command) {
            Some("ping") => Ok(OpMsg::new(Document::from_iter([("ok", 1.0)]))),
            Some(name) => Err(CommandError::new(
                ErrorCode::CommandNotFound,
                format!("no such command: '{name}'"),
            )),
            None => Err(CommandError::new(ErrorCode::BadValue, "empty command")),
        }
    }

    fn request(command: &str) -> Message {
        Message::new(42, 0, OpMsg::new(Document::from_iter([(command, 1_i32)])))
    }

    #[test]
    fn test_reply_is_framed_for_request() {
        let reply = serve(&echo, &request("ping")).unwrap();
        assert_eq!(reply.header().response_to(), 42);
        assert_eq!(reply.header().op_code(), Some(OpCode::Msg));
        let doc = reply.op_msg().and_then(OpMsg::document).unwrap();
        assert_eq!(doc.get("ok"), Some(&Value::Double(1.0)));
    }

    #[test]
    fn test_error_becomes_document() {
        let reply = serve(&echo, &request("frobnicate")).unwrap();
        let doc = reply.op_msg().and_then(OpMsg::document).unwrap();
        assert_eq!(
            doc.to_json_string(),
            r#"{"$k":["ok","errmsg","code","codeName"],"ok":{"$f":"0"},"errmsg":"no such command: 'frobnicate'","code":59,"codeName":"CommandNotFound"}"#
        );
    }

    #[test]
    fn test_more_to_come_suppresses_reply() {
        let msg = OpMsg::new(Document::from_iter([("ping", 1_i32)]))
            .with_flags(OpMsgFlags::new().with(OpMsgFlags::MORE_TO_COME));
        assert!(serve(&echo, &Message::new(42, 0, msg)).is_none());
    }

    #[test]
    fn test_legacy_query_rejected() {
        let query = OpQuery::command("admin", Document::from_iter([("isMaster", 1_i32)]));
        let reply = serve(&echo, &Message::new(5, 0, query)).unwrap();
        match reply.body() {
            MsgBody::Reply(r) => {
                assert!(r.flags.has(OpReplyFlags::QUERY_FAILURE));
                assert_eq!(r.documents[0].get("code"), Some(&Value::Int32(238)));
            }
            other => panic!("unexpected body {other:?}"),
        }
        assert_eq!(reply.header().response_to(), 5);
    }
}
