//! Message envelope and blocking stream I/O

use std::io::{self, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use super::{
    CHECKSUM_SIZE, HEADER_SIZE, MsgHeader, OpCode, OpMsg, OpQuery, OpReply, Result, WireConfig,
    WireError, op_msg,
};
use crate::bson::{self, Json};

/// Decoded message body, one variant per framed op code
#[derive(Debug, Clone, PartialEq)]
pub enum MsgBody {
    /// OP_MSG
    Msg(OpMsg),
    /// Legacy OP_QUERY
    Query(OpQuery),
    /// Legacy OP_REPLY
    Reply(OpReply),
}

impl MsgBody {
    /// Op code the body is framed with
    #[must_use]
    pub const fn op_code(&self) -> OpCode {
        match self {
            Self::Msg(_) => OpCode::Msg,
            Self::Query(_) => OpCode::Query,
            Self::Reply(_) => OpCode::Reply,
        }
    }

    fn write_body(&self, buf: &mut BytesMut) -> Result<()> {
        match self {
            Self::Msg(msg) => msg.write_body(buf),
            Self::Query(query) => query.write_body(buf),
            Self::Reply(reply) => reply.write_body(buf),
        }
    }

    /// Whether a trailing checksum is part of the encoding
    const fn checksum_present(&self) -> bool {
        match self {
            Self::Msg(msg) => msg.flags.checksum_present(),
            Self::Query(_) | Self::Reply(_) => false,
        }
    }

    /// Diagnostic textual form
    #[must_use]
    pub fn to_json(&self) -> Json {
        match self {
            Self::Msg(msg) => msg.to_json(),
            Self::Query(query) => query.to_json(),
            Self::Reply(reply) => reply.to_json(),
        }
    }
}

impl From<OpMsg> for MsgBody {
    fn from(msg: OpMsg) -> Self {
        Self::Msg(msg)
    }
}

impl From<OpQuery> for MsgBody {
    fn from(query: OpQuery) -> Self {
        Self::Query(query)
    }
}

impl From<OpReply> for MsgBody {
    fn from(reply: OpReply) -> Self {
        Self::Reply(reply)
    }
}

/// Header plus body
///
/// The header's op code always matches the body. Its length is computed on
/// encode and never taken from the in-memory header.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    header: MsgHeader,
    body: MsgBody,
}

impl Message {
    /// Create a message with explicit ids
    pub fn new(request_id: i32, response_to: i32, body: impl Into<MsgBody>) -> Self {
        let body = body.into();
        let header = MsgHeader::new(body.op_code(), request_id, response_to);
        Self { header, body }
    }

    /// Create a reply to `request` with a fresh request id
    pub fn reply_to(request: &MsgHeader, body: impl Into<MsgBody>) -> Self {
        Self::new(Self::generate_id(), request.request_id(), body)
    }

    /// Get header
    #[must_use]
    pub const fn header(&self) -> &MsgHeader {
        &self.header
    }

    /// Get body
    #[must_use]
    pub const fn body(&self) -> &MsgBody {
        &self.body
    }

    /// Consume into the body
    #[must_use]
    pub fn into_body(self) -> MsgBody {
        self.body
    }

    /// Get the OP_MSG body, if that is what this is
    #[must_use]
    pub const fn op_msg(&self) -> Option<&OpMsg> {
        match &self.body {
            MsgBody::Msg(msg) => Some(msg),
            MsgBody::Query(_) | MsgBody::Reply(_) => None,
        }
    }

    /// Generate a random non-negative request id
    fn generate_id() -> i32 {
        let uuid = Uuid::new_v4();
        let bytes = uuid.as_bytes();
        i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) & i32::MAX
    }

    /// Decode exactly one message from `bytes`
    ///
    /// The header's length must equal `bytes.len()`.
    pub fn decode(bytes: &[u8], config: &WireConfig) -> Result<Self> {
        let header = MsgHeader::from_bytes(bytes)?;
        let length = header.validate(config)?;
        if length != bytes.len() {
            return Err(WireError::LengthMismatch {
                what: "message",
                declared: i64::from(header.message_length()),
                actual: bytes.len() as i64,
            });
        }

        let mut raw_header = [0u8; HEADER_SIZE];
        raw_header.copy_from_slice(&bytes[..HEADER_SIZE]);
        Self::decode_parts(header, &raw_header, &bytes[HEADER_SIZE..], config)
    }

    fn decode_parts(
        header: MsgHeader,
        raw_header: &[u8; HEADER_SIZE],
        body: &[u8],
        config: &WireConfig,
    ) -> Result<Self> {
        let body = match header.op_code() {
            Some(OpCode::Msg) => MsgBody::Msg(OpMsg::decode(raw_header, body, config)?),
            Some(OpCode::Query) => MsgBody::Query(OpQuery::decode(body)?),
            Some(OpCode::Reply) => MsgBody::Reply(OpReply::decode(body)?),
            Some(op) => return Err(WireError::UnsupportedOpCode(op)),
            None => return Err(WireError::UnknownOpCode(header.op_code_raw())),
        };
        trace!(%header, "decoded message");
        Ok(Self { header, body })
    }

    /// Encode to bytes, computing the length and appending the checksum
    /// when the flags announce one
    pub fn encode(&self, config: &WireConfig) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + 64);
        buf.put_slice(&self.header.to_bytes());
        self.body.write_body(&mut buf)?;

        let checksum_present = self.body.checksum_present();
        let total = buf.len() + if checksum_present { CHECKSUM_SIZE } else { 0 };
        if total > config.max_message_size {
            return Err(WireError::MessageTooLarge {
                length: total,
                max: config.max_message_size,
            });
        }
        let length = bson::length_prefix(total, "message")?;
        buf[..HEADER_SIZE].copy_from_slice(&self.header.with_length(length).to_bytes());

        if checksum_present {
            let crc = op_msg::checksum(&buf[..HEADER_SIZE], &buf[HEADER_SIZE..], config);
            buf.put_u32_le(crc);
        }

        Ok(buf.freeze())
    }

    /// Diagnostic textual form: header fields and body
    #[must_use]
    pub fn to_json(&self) -> Json {
        let op = self
            .header
            .op_code()
            .map_or_else(|| self.header.op_code_raw().to_string(), |op| op.to_string());
        Json::Object(vec![
            ("requestId".to_owned(), Json::Number(self.header.request_id().into())),
            ("responseTo".to_owned(), Json::Number(self.header.response_to().into())),
            ("opCode".to_owned(), Json::String(op)),
            ("body".to_owned(), self.body.to_json()),
        ])
    }

    /// Render [`to_json`](Self::to_json) as a string
    #[must_use]
    pub fn to_json_string(&self) -> String {
        self.to_json().to_text()
    }
}

/// Read one message from a blocking stream
///
/// Reads the 16-byte header, checks its length against `config`, then reads
/// the rest of the message. A stream that ends early yields an I/O error of
/// kind `UnexpectedEof`.
#[instrument(level = "debug", skip_all)]
pub fn read_message<R: Read>(reader: &mut R, config: &WireConfig) -> Result<Message> {
    let mut raw_header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut raw_header)?;

    let header = MsgHeader::from_bytes(&raw_header)?;
    let length = header.validate(config).inspect_err(|err| {
        debug!(%header, error = %err, "rejecting message header");
    })?;

    // grow with the bytes that arrive, not with the declared length
    let expected = length - HEADER_SIZE;
    let mut body = Vec::new();
    reader.by_ref().take(expected as u64).read_to_end(&mut body)?;
    if body.len() < expected {
        debug!(%header, got = body.len(), "stream ended inside message body");
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
    }
    debug!(%header, "read message");

    Message::decode_parts(header, &raw_header, &body, config)
}

/// Encode and write one message to a blocking stream
#[instrument(level = "debug", skip_all, fields(request_id = message.header().request_id()))]
pub fn write_message<W: Write>(
    writer: &mut W,
    message: &Message,
    config: &WireConfig,
) -> Result<()> {
    let bytes = message.encode(config)?;
    writer.write_all(&bytes)?;
    debug!(len = bytes.len(), op = %message.body().op_code(), "wrote message");
    Ok(())
}
