//! Flag bitfields for OP_MSG, OP_QUERY and OP_REPLY
//!
//! Bits are stored as received. Bits without a name survive decode and
//! encode untouched and render as `bitN`.

use std::fmt;

use serde::ser::{Serialize, SerializeSeq, Serializer};

/// Names of the set bits, sorted
fn bit_names(bits: u32, known: &[(u32, &'static str)]) -> Vec<String> {
    let mut names: Vec<String> = (0..u32::BITS)
        .map(|i| 1_u32 << i)
        .filter(|bit| bits & bit != 0)
        .map(|bit| {
            known
                .iter()
                .find(|(b, _)| *b == bit)
                .map_or_else(
                    || format!("bit{}", bit.trailing_zeros()),
                    |(_, name)| (*name).to_owned(),
                )
        })
        .collect();
    names.sort();
    names
}

fn fmt_names(f: &mut fmt::Formatter<'_>, names: &[String]) -> fmt::Result {
    write!(f, "[{}]", names.join(", "))
}

fn serialize_names<S: Serializer>(names: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(names.len()))?;
    for name in names {
        seq.serialize_element(name)?;
    }
    seq.end()
}

/// OP_MSG flag bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OpMsgFlags(u32);

impl OpMsgFlags {
    /// Message ends with a CRC-32C checksum
    pub const CHECKSUM_PRESENT: u32 = 1 << 0;
    /// Another message follows without waiting for a reply
    pub const MORE_TO_COME: u32 = 1 << 1;
    /// Client accepts multiple replies to this request
    pub const EXHAUST_ALLOWED: u32 = 1 << 16;

    const NAMES: [(u32, &'static str); 3] = [
        (Self::CHECKSUM_PRESENT, "checksumPresent"),
        (Self::MORE_TO_COME, "moreToCome"),
        (Self::EXHAUST_ALLOWED, "exhaustAllowed"),
    ];

    /// Create empty flags
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Create from raw bits; unknown bits are kept
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Set a flag
    #[must_use]
    pub const fn with(mut self, flag: u32) -> Self {
        self.0 |= flag;
        self
    }

    /// Clear a flag
    #[must_use]
    pub const fn without(mut self, flag: u32) -> Self {
        self.0 &= !flag;
        self
    }

    /// Check if flag is set
    #[must_use]
    pub const fn has(self, flag: u32) -> bool {
        (self.0 & flag) != 0
    }

    /// Check if a checksum trails the message
    #[must_use]
    pub const fn checksum_present(self) -> bool {
        self.has(Self::CHECKSUM_PRESENT)
    }

    /// Check if more messages follow
    #[must_use]
    pub const fn more_to_come(self) -> bool {
        self.has(Self::MORE_TO_COME)
    }

    /// Check if exhaust replies are allowed
    #[must_use]
    pub const fn exhaust_allowed(self) -> bool {
        self.has(Self::EXHAUST_ALLOWED)
    }

    /// Names of the set bits, sorted
    #[must_use]
    pub fn names(self) -> Vec<String> {
        bit_names(self.0, &Self::NAMES)
    }
}

impl fmt::Display for OpMsgFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_names(f, &self.names())
    }
}

impl Serialize for OpMsgFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_names(&self.names(), serializer)
    }
}

/// OP_QUERY flag bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OpQueryFlags(u32);

impl OpQueryFlags {
    /// Cursor stays open after the last result
    pub const TAILABLE_CURSOR: u32 = 1 << 1;
    /// Query may run on a secondary
    pub const SECONDARY_OK: u32 = 1 << 2;
    /// Internal replication use
    pub const OPLOG_REPLAY: u32 = 1 << 3;
    /// Server must not time out idle cursors
    pub const NO_CURSOR_TIMEOUT: u32 = 1 << 4;
    /// Tailable cursor blocks for more data
    pub const AWAIT_DATA: u32 = 1 << 5;
    /// Stream all results without get-more
    pub const EXHAUST: u32 = 1 << 6;
    /// Partial results on shard failure
    pub const PARTIAL: u32 = 1 << 7;

    const NAMES: [(u32, &'static str); 7] = [
        (Self::TAILABLE_CURSOR, "TailableCursor"),
        (Self::SECONDARY_OK, "SlaveOk"),
        (Self::OPLOG_REPLAY, "OplogReplay"),
        (Self::NO_CURSOR_TIMEOUT, "NoCursorTimeout"),
        (Self::AWAIT_DATA, "AwaitData"),
        (Self::EXHAUST, "Exhaust"),
        (Self::PARTIAL, "Partial"),
    ];

    /// Create from raw bits; unknown bits are kept
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check if flag is set
    #[must_use]
    pub const fn has(self, flag: u32) -> bool {
        (self.0 & flag) != 0
    }

    /// Names of the set bits, sorted
    #[must_use]
    pub fn names(self) -> Vec<String> {
        bit_names(self.0, &Self::NAMES)
    }
}

impl fmt::Display for OpQueryFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_names(f, &self.names())
    }
}

impl Serialize for OpQueryFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_names(&self.names(), serializer)
    }
}

/// OP_REPLY flag bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OpReplyFlags(u32);

impl OpReplyFlags {
    /// Get-more named a cursor that does not exist
    pub const CURSOR_NOT_FOUND: u32 = 1 << 0;
    /// Query failed; the single document holds the error
    pub const QUERY_FAILURE: u32 = 1 << 1;
    /// Internal sharding use
    pub const SHARD_CONFIG_STALE: u32 = 1 << 2;
    /// Server supports await-data
    pub const AWAIT_CAPABLE: u32 = 1 << 3;

    const NAMES: [(u32, &'static str); 4] = [
        (Self::CURSOR_NOT_FOUND, "CursorNotFound"),
        (Self::QUERY_FAILURE, "QueryFailure"),
        (Self::SHARD_CONFIG_STALE, "ShardConfigStale"),
        (Self::AWAIT_CAPABLE, "AwaitCapable"),
    ];

    /// Create from raw bits; unknown bits are kept
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Set a flag
    #[must_use]
    pub const fn with(mut self, flag: u32) -> Self {
        self.0 |= flag;
        self
    }

    /// Check if flag is set
    #[must_use]
    pub const fn has(self, flag: u32) -> bool {
        (self.0 & flag) != 0
    }

    /// Names of the set bits, sorted
    #[must_use]
    pub fn names(self) -> Vec<String> {
        bit_names(self.0, &Self::NAMES)
    }
}

impl fmt::Display for OpReplyFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_names(f, &self.names())
    }
}

impl Serialize for OpReplyFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_names(&self.names(), serializer)
    }
}
