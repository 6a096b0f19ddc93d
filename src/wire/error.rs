//! Wire framing error types

use thiserror::Error;

use super::OpCode;
use crate::bson;

/// Errors produced while framing or unframing messages
#[derive(Error, Debug)]
pub enum WireError {
    /// IO error on the underlying stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A document or field inside the body failed to decode or encode
    #[error(transparent)]
    Bson(#[from] bson::Error),

    /// Not enough bytes for a fixed-size part of the message
    #[error("buffer underrun reading {what}: need {needed} bytes, got {got}")]
    BufferUnderrun {
        /// Part being read
        what: &'static str,
        /// Bytes required
        needed: usize,
        /// Bytes available
        got: usize,
    },

    /// Header length disagrees with the bytes supplied
    #[error("{what} length mismatch: declared {declared}, actual {actual}")]
    LengthMismatch {
        /// Part carrying the length
        what: &'static str,
        /// Declared length
        declared: i64,
        /// Observed length
        actual: i64,
    },

    /// Header length smaller than the header itself
    #[error("invalid message length {length}")]
    InvalidMessageLength {
        /// Declared length
        length: i32,
    },

    /// Header length above the configured maximum
    #[error("message too large: {length} bytes (max {max})")]
    MessageTooLarge {
        /// Declared or encoded length
        length: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Trailing OP_MSG checksum does not match the message bytes
    #[error("checksum mismatch: expected {expected:#010x}, got {found:#010x}")]
    ChecksumMismatch {
        /// Computed checksum
        expected: u32,
        /// Checksum carried by the message
        found: u32,
    },

    /// Op code outside the known set
    #[error("unknown op code {0}")]
    UnknownOpCode(i32),

    /// Known op code this layer does not frame
    #[error("unsupported op code {0}")]
    UnsupportedOpCode(OpCode),

    /// OP_MSG section kind other than 0 or 1
    #[error("unknown section kind {0}")]
    UnknownSectionKind(u8),

    /// OP_MSG without any section
    #[error("OP_MSG has no sections")]
    NoSections,

    /// OP_REPLY document count disagrees with the documents present
    #[error("OP_REPLY declares {declared} documents, found {found}")]
    DocumentCountMismatch {
        /// Count in the reply header
        declared: i32,
        /// Documents decoded
        found: usize,
    },
}

impl WireError {
    /// Whether the error stems from a length field or truncated input
    #[must_use]
    pub fn is_length_error(&self) -> bool {
        match self {
            Self::Bson(err) => err.is_length_error(),
            Self::BufferUnderrun { .. }
            | Self::LengthMismatch { .. }
            | Self::InvalidMessageLength { .. } => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, WireError>;
