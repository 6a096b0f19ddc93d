//! Tokio codec for framing messages over a byte stream

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use super::{HEADER_SIZE, Message, MsgHeader, WireConfig, WireError};

/// Length-delimited message codec
///
/// The header length is checked as soon as 16 bytes are buffered, so an
/// oversized or negative length is rejected before its body arrives.
#[derive(Debug, Clone, Default)]
pub struct MessageCodec {
    config: WireConfig,
}

impl MessageCodec {
    /// Create a codec with the given limits
    #[must_use]
    pub const fn new(config: WireConfig) -> Self {
        Self { config }
    }

    /// Active limits
    #[must_use]
    pub const fn config(&self) -> &WireConfig {
        &self.config
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = WireError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, WireError> {
        if src.len() < HEADER_SIZE {
            return Ok(None);
        }

        let header = MsgHeader::from_bytes(src)?;
        let length = header.validate(&self.config)?;
        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }

        let frame = src.split_to(length);
        Message::decode(&frame, &self.config).map(Some)
    }
}

impl Encoder<&Message> for MessageCodec {
    type Error = WireError;

    fn encode(&mut self, item: &Message, dst: &mut BytesMut) -> Result<(), WireError> {
        let bytes = item.encode(&self.config)?;
        dst.extend_from_slice(&bytes);
        Ok(())
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = WireError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), WireError> {
        <Self as Encoder<&Message>>::encode(self, &item, dst)
    }
}
