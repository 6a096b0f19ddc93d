//! Framing configuration

use super::MAX_MESSAGE_SIZE;

/// Framing options shared by the decoder and encoder
#[derive(Debug, Clone)]
pub struct WireConfig {
    /// Largest message accepted or produced, header included
    pub max_message_size: usize,
    /// Whether the OP_MSG checksum also covers the 16 header bytes.
    ///
    /// Off, the checksum covers the body bytes that precede it. MongoDB-family
    /// peers compute it over the whole message, so interop deployments turn
    /// this on.
    pub checksum_covers_header: bool,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
            checksum_covers_header: false,
        }
    }
}
