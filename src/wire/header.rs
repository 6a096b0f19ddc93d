//! Message header
//!
//! The header is 16 bytes, little-endian.

use std::fmt;

use super::{HEADER_SIZE, Result, WireConfig, WireError};

/// Operation codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum OpCode {
    /// Reply to a legacy query
    Reply = 1,
    /// Legacy update
    Update = 2001,
    /// Legacy insert
    Insert = 2002,
    /// Legacy query
    Query = 2004,
    /// Legacy get-more
    GetMore = 2005,
    /// Legacy delete
    Delete = 2006,
    /// Legacy kill-cursors
    KillCursors = 2007,
    /// Compressed wrapper
    Compressed = 2012,
    /// Extensible message
    Msg = 2013,
}

impl OpCode {
    /// Convert from the raw header value
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Reply),
            2001 => Some(Self::Update),
            2002 => Some(Self::Insert),
            2004 => Some(Self::Query),
            2005 => Some(Self::GetMore),
            2006 => Some(Self::Delete),
            2007 => Some(Self::KillCursors),
            2012 => Some(Self::Compressed),
            2013 => Some(Self::Msg),
            _ => None,
        }
    }

    /// Convert to the raw header value
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reply => "OP_REPLY",
            Self::Update => "OP_UPDATE",
            Self::Insert => "OP_INSERT",
            Self::Query => "OP_QUERY",
            Self::GetMore => "OP_GET_MORE",
            Self::Delete => "OP_DELETE",
            Self::KillCursors => "OP_KILL_CURSORS",
            Self::Compressed => "OP_COMPRESSED",
            Self::Msg => "OP_MSG",
        };
        f.write_str(name)
    }
}

/// Message header (16 bytes)
///
/// # Wire Format
///
/// ```text
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                      Message Length (4)                       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                        Request ID (4)                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                       Response To (4)                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Op Code (4)                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgHeader {
    message_length: i32,
    request_id: i32,
    response_to: i32,
    op_code: i32,
}

impl MsgHeader {
    /// Create a header; the length is filled in when the message is encoded
    #[must_use]
    pub const fn new(op_code: OpCode, request_id: i32, response_to: i32) -> Self {
        Self {
            message_length: 0,
            request_id,
            response_to,
            op_code: op_code.as_i32(),
        }
    }

    pub(crate) const fn with_length(mut self, message_length: i32) -> Self {
        self.message_length = message_length;
        self
    }

    /// Total message length, header included
    #[must_use]
    pub const fn message_length(&self) -> i32 {
        self.message_length
    }

    /// Request identifier
    #[must_use]
    pub const fn request_id(&self) -> i32 {
        self.request_id
    }

    /// Identifier of the request this message answers
    #[must_use]
    pub const fn response_to(&self) -> i32 {
        self.response_to
    }

    /// Raw op code
    #[must_use]
    pub const fn op_code_raw(&self) -> i32 {
        self.op_code
    }

    /// Op code, if known
    #[must_use]
    pub const fn op_code(&self) -> Option<OpCode> {
        OpCode::from_i32(self.op_code)
    }

    /// Check the declared length against the header size and the configured
    /// maximum, returning the total message length
    pub fn validate(&self, config: &WireConfig) -> Result<usize> {
        let length = usize::try_from(self.message_length)
            .ok()
            .filter(|&len| len >= HEADER_SIZE)
            .ok_or(WireError::InvalidMessageLength {
                length: self.message_length,
            })?;

        if length > config.max_message_size {
            return Err(WireError::MessageTooLarge {
                length,
                max: config.max_message_size,
            });
        }

        Ok(length)
    }

    /// Convert to bytes (little-endian)
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];

        bytes[0..4].copy_from_slice(&self.message_length.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.request_id.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.response_to.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.op_code.to_le_bytes());

        bytes
    }

    /// Parse from the first 16 bytes (little-endian)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let Some(bytes) = bytes.first_chunk::<HEADER_SIZE>() else {
            return Err(WireError::BufferUnderrun {
                what: "message header",
                needed: HEADER_SIZE,
                got: bytes.len(),
            });
        };

        let word =
            |i: usize| i32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);

        Ok(Self {
            message_length: word(0),
            request_id: word(4),
            response_to: word(8),
            op_code: word(12),
        })
    }
}

impl fmt::Display for MsgHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "length: {}, id: {}, response_to: {}, opcode: ",
            self.message_length, self.request_id, self.response_to
        )?;
        match self.op_code() {
            Some(op) => write!(f, "{op}"),
            None => write!(f, "{}", self.op_code),
        }
    }
}
