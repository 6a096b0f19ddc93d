//! BSON codec error types

use thiserror::Error;

/// Errors produced while reading, writing or translating BSON values.
#[derive(Error, Debug)]
pub enum Error {
    /// Not enough bytes left for a fixed-size field
    #[error("buffer underrun reading {what}: need {needed} bytes, got {got}")]
    BufferUnderrun {
        /// Field being read
        what: &'static str,
        /// Bytes required
        needed: usize,
        /// Bytes available
        got: usize,
    },

    /// Declared length disagrees with the bytes actually present or consumed
    #[error("{what} length mismatch: declared {declared}, actual {actual}")]
    LengthMismatch {
        /// Component carrying the length prefix
        what: &'static str,
        /// Length found on the wire
        declared: i64,
        /// Length observed
        actual: i64,
    },

    /// Input continued after a complete value
    #[error("{count} trailing bytes after value")]
    TrailingBytes {
        /// Number of unread bytes
        count: usize,
    },

    /// No NUL terminator before the end of the buffer
    #[error("unterminated cstring")]
    UnterminatedCString,

    /// Element type tag outside the supported set
    #[error("unknown type tag {tag:#04x}")]
    UnknownTypeTag {
        /// Tag byte
        tag: u8,
    },

    /// Boolean byte other than 0 or 1
    #[error("invalid boolean byte {byte:#04x}")]
    InvalidBoolean {
        /// Byte found
        byte: u8,
    },

    /// Key or string bytes are not valid UTF-8
    #[error("invalid UTF-8 in {what}")]
    InvalidUtf8 {
        /// Component being decoded
        what: &'static str,
    },

    /// A NUL byte inside a value whose wire form is NUL-terminated
    #[error("{what} contains an interior NUL byte")]
    InteriorNul {
        /// Component being encoded
        what: &'static str,
    },

    /// Documents nested deeper than [`MAX_NESTING_DEPTH`](super::MAX_NESTING_DEPTH)
    #[error("documents nested deeper than {max} levels")]
    NestingTooDeep {
        /// Maximum depth allowed
        max: usize,
    },

    /// Encoded size does not fit in the 32-bit length prefix
    #[error("{what} too large to encode: {size} bytes")]
    LengthOverflow {
        /// Component being encoded
        what: &'static str,
        /// Size in bytes
        size: usize,
    },

    /// Textual form broke the strict mapping rules
    #[error("strict text decode violation: {0}")]
    StrictTextDecodeViolation(String),

    /// Textual form is not well-formed JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Failure inside a named document field
    #[error("field {key:?}: {source}")]
    InField {
        /// Field key
        key: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn strict(message: impl Into<String>) -> Self {
        Self::StrictTextDecodeViolation(message.into())
    }

    pub(crate) fn in_field(key: &str, source: Self) -> Self {
        Self::InField {
            key: key.to_owned(),
            source: Box::new(source),
        }
    }

    /// Innermost error with field context stripped
    #[must_use]
    pub fn root(&self) -> &Self {
        let mut err = self;
        while let Self::InField { source, .. } = err {
            err = source;
        }
        err
    }

    /// Dotted path of the fields the error occurred in, outermost first
    #[must_use]
    pub fn field_path(&self) -> String {
        let mut path = Vec::new();
        let mut err = self;
        while let Self::InField { key, source } = err {
            path.push(key.as_str());
            err = source;
        }
        path.join(".")
    }

    /// Whether the error stems from a length prefix or truncated input
    #[must_use]
    pub fn is_length_error(&self) -> bool {
        matches!(
            self.root(),
            Self::BufferUnderrun { .. }
                | Self::LengthMismatch { .. }
                | Self::TrailingBytes { .. }
                | Self::UnterminatedCString
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_and_path() {
        let inner = Error::UnknownTypeTag { tag: 0x42 };
        let err = Error::in_field("cursor", Error::in_field("firstBatch", inner));

        assert!(matches!(err.root(), Error::UnknownTypeTag { tag: 0x42 }));
        assert_eq!(err.field_path(), "cursor.firstBatch");
        assert_eq!(
            err.to_string(),
            "field \"cursor\": field \"firstBatch\": unknown type tag 0x42"
        );
    }

    #[test]
    fn test_length_classification() {
        let err = Error::in_field(
            "a",
            Error::LengthMismatch {
                what: "document",
                declared: 10,
                actual: 9,
            },
        );
        assert!(err.is_length_error());
        assert!(!Error::strict("x").is_length_error());
    }
}
