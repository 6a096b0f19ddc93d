//! OP_MSG body
//!
//! # Wire Format
//!
//! ```text
//! uint32 flags
//! section+            kind 0: u8 0, document
//!                     kind 1: u8 1, int32 size, cstring identifier, document*
//! uint32 checksum     present iff flags bit 0 is set
//! ```
//!
//! The kind 1 size counts itself, the identifier and the documents.

use bytes::{BufMut, BytesMut};
use tracing::{debug, trace};

use super::{CHECKSUM_SIZE, HEADER_SIZE, OpMsgFlags, Result, WireConfig, WireError};
use crate::bson::{self, BsonType, Document, Json, Reader};

const KIND_BODY: u8 = 0;
const KIND_SEQUENCE: u8 = 1;
const SEQUENCE: &str = "document sequence";

fn sequence_mismatch(declared: usize, actual: usize) -> WireError {
    WireError::LengthMismatch {
        what: SEQUENCE,
        declared: declared as i64,
        actual: actual as i64,
    }
}

/// Length prefix of the document starting at `bytes`, if one fits
fn document_len(bytes: &[u8]) -> Option<usize> {
    let prefix: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
    usize::try_from(i32::from_le_bytes(prefix)).ok()
}

/// One part of an OP_MSG body
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    /// Kind 0: a single document
    Body(Document),
    /// Kind 1: a named run of documents
    Sequence {
        /// Sequence name, e.g. `documents` for an insert
        identifier: String,
        /// Documents in wire order
        documents: Vec<Document>,
    },
}

impl Section {
    /// Section kind byte
    #[must_use]
    pub const fn kind(&self) -> u8 {
        match self {
            Self::Body(_) => KIND_BODY,
            Self::Sequence { .. } => KIND_SEQUENCE,
        }
    }

    fn read_from(reader: &mut Reader<'_>) -> Result<Self> {
        match reader.read_u8("section kind")? {
            KIND_BODY => Ok(Self::Body(Document::read_from(reader)?)),
            KIND_SEQUENCE => {
                let len = reader
                    .read_length_prefix(SEQUENCE, 5)
                    .map_err(|err| match err {
                        bson::Error::LengthMismatch {
                            what,
                            declared,
                            actual,
                        } => WireError::LengthMismatch {
                            what,
                            declared,
                            actual,
                        },
                        other => other.into(),
                    })?;
                let declared = len + 4;
                let mut seq = reader.sub(len, SEQUENCE)?;
                let identifier = seq.read_cstr_utf8("section identifier")?.to_owned();
                let mut documents = Vec::new();
                while !seq.is_empty() {
                    // the size must not end the section inside a document
                    let needed = document_len(seq.rest()).unwrap_or(4);
                    if needed > seq.remaining() {
                        let consumed = declared - seq.remaining();
                        return Err(sequence_mismatch(declared, consumed + needed));
                    }
                    documents.push(Document::read_from(&mut seq)?);
                }
                // a short size leaves document bytes where the next kind byte belongs
                if let Some(&next) = reader.rest().first() {
                    if !matches!(next, KIND_BODY | KIND_SEQUENCE) {
                        let stray = document_len(reader.rest()).unwrap_or(reader.remaining());
                        return Err(sequence_mismatch(declared, declared + stray));
                    }
                }
                Ok(Self::Sequence {
                    identifier,
                    documents,
                })
            }
            kind => Err(WireError::UnknownSectionKind(kind)),
        }
    }

    fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u8(self.kind());
        match self {
            Self::Body(doc) => doc.write_to(buf)?,
            Self::Sequence {
                identifier,
                documents,
            } => {
                let start = buf.len();
                buf.put_i32_le(0);
                bson::put_cstr(buf, identifier, "section identifier")?;
                for doc in documents {
                    doc.write_to(buf)?;
                }
                let len = bson::length_prefix(buf.len() - start, "document sequence")?;
                buf[start..start + 4].copy_from_slice(&len.to_le_bytes());
            }
        }
        Ok(())
    }

    fn to_json(&self) -> Json {
        let kind = Json::Number(self.kind().into());
        match self {
            Self::Body(doc) => Json::Object(vec![
                ("kind".to_owned(), kind),
                ("document".to_owned(), doc.to_json()),
            ]),
            Self::Sequence {
                identifier,
                documents,
            } => Json::Object(vec![
                ("kind".to_owned(), kind),
                ("identifier".to_owned(), Json::String(identifier.clone())),
                (
                    "documents".to_owned(),
                    Json::Array(documents.iter().map(BsonType::to_json).collect()),
                ),
            ]),
        }
    }
}

/// Extensible message body
#[derive(Debug, Clone, PartialEq)]
pub struct OpMsg {
    /// Flag bits, unknown bits included
    pub flags: OpMsgFlags,
    /// Sections in wire order
    pub sections: Vec<Section>,
}

impl OpMsg {
    /// Message with a single body section and no flags
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            flags: OpMsgFlags::new(),
            sections: vec![Section::Body(document)],
        }
    }

    /// Set flag bits
    #[must_use]
    pub const fn with_flags(mut self, flags: OpMsgFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Append a document sequence section
    #[must_use]
    pub fn with_sequence(
        mut self,
        identifier: impl Into<String>,
        documents: Vec<Document>,
    ) -> Self {
        self.sections.push(Section::Sequence {
            identifier: identifier.into(),
            documents,
        });
        self
    }

    /// First kind 0 document, the command itself
    #[must_use]
    pub fn document(&self) -> Option<&Document> {
        self.sections.iter().find_map(|s| match s {
            Section::Body(doc) => Some(doc),
            Section::Sequence { .. } => None,
        })
    }

    /// Every document in every section, in wire order
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.sections.iter().flat_map(|s| match s {
            Section::Body(doc) => std::slice::from_ref(doc).iter(),
            Section::Sequence { documents, .. } => documents.iter(),
        })
    }

    /// Decode the body that follows `header`, verifying the trailing checksum
    /// when the flags announce one
    pub fn decode(header: &[u8; HEADER_SIZE], body: &[u8], config: &WireConfig) -> Result<Self> {
        let mut reader = Reader::new(body);
        let flags = OpMsgFlags::from_bits(reader.read_u32("OP_MSG flags")?);

        let sections_end = if flags.checksum_present() {
            if reader.remaining() < CHECKSUM_SIZE {
                return Err(WireError::BufferUnderrun {
                    what: "OP_MSG checksum",
                    needed: CHECKSUM_SIZE,
                    got: reader.remaining(),
                });
            }
            let end = body.len() - CHECKSUM_SIZE;
            let mut tail = [0u8; CHECKSUM_SIZE];
            tail.copy_from_slice(&body[end..]);
            let found = u32::from_le_bytes(tail);
            let expected = checksum(header, &body[..end], config);
            if expected != found {
                debug!(expected, found, "OP_MSG checksum mismatch");
                return Err(WireError::ChecksumMismatch { expected, found });
            }
            end
        } else {
            body.len()
        };

        let mut reader = Reader::new(&body[reader.position()..sections_end]);
        let mut sections = Vec::new();
        while !reader.is_empty() {
            let section = Section::read_from(&mut reader)?;
            trace!(kind = section.kind(), offset = reader.position(), "read section");
            sections.push(section);
        }
        if sections.is_empty() {
            return Err(WireError::NoSections);
        }

        Ok(Self { flags, sections })
    }

    /// Append flags and sections; the checksum is added by the message encoder
    pub fn write_body(&self, buf: &mut BytesMut) -> Result<()> {
        if self.sections.is_empty() {
            return Err(WireError::NoSections);
        }
        buf.put_u32_le(self.flags.bits());
        for section in &self.sections {
            section.write_to(buf)?;
        }
        Ok(())
    }

    /// Diagnostic textual form: flag names and sections
    #[must_use]
    pub fn to_json(&self) -> Json {
        let flags = self.flags.names().into_iter().map(Json::String).collect();
        Json::Object(vec![
            ("flags".to_owned(), Json::Array(flags)),
            (
                "sections".to_owned(),
                Json::Array(self.sections.iter().map(Section::to_json).collect()),
            ),
        ])
    }
}

/// CRC-32C over the checksummed bytes of a message
pub(crate) fn checksum(header: &[u8], body: &[u8], config: &WireConfig) -> u32 {
    let seed = if config.checksum_covers_header {
        crc32c::crc32c(header)
    } else {
        0
    };
    crc32c::crc32c_append(seed, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bson::Value;

    const HEADER: [u8; HEADER_SIZE] = [0; HEADER_SIZE];

    fn encode(msg: &OpMsg, config: &WireConfig) -> Vec<u8> {
        let mut buf = BytesMut::new();
        msg.write_body(&mut buf).unwrap();
        if msg.flags.checksum_present() {
            let crc = checksum(&HEADER, &buf, config);
            buf.put_u32_le(crc);
        }
        buf.to_vec()
    }

    #[test]
    fn test_body_section_roundtrip() {
        let msg = OpMsg::new(Document::from_iter([("ping", 1_i32)]));
        let bytes = encode(&msg, &WireConfig::default());

        assert_eq!(&bytes[..5], &[0, 0, 0, 0, 0]);
        let decoded = OpMsg::decode(&HEADER, &bytes, &WireConfig::default()).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.document().and_then(Document::command), Some("ping"));
    }

    #[test]
    fn test_sequence_section_layout() {
        let docs = vec![Document::new(), Document::new()];
        let msg = OpMsg::new(Document::from_iter([("insert", "c")]))
            .with_sequence("documents", docs.clone());
        let bytes = encode(&msg, &WireConfig::default());

        let decoded = OpMsg::decode(&HEADER, &bytes, &WireConfig::default()).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.documents().count(), 3);

        // size = 4 + "documents\0" + 2 * 5
        let command_len = Document::from_iter([("insert", "c")]).to_bytes().unwrap().len();
        let seq_start = 4 + 1 + command_len;
        assert_eq!(bytes[seq_start], KIND_SEQUENCE);
        let size = i32::from_le_bytes(bytes[seq_start + 1..seq_start + 5].try_into().unwrap());
        assert_eq!(size, 4 + 10 + 10);
    }

    #[test]
    fn test_empty_sequence_allowed() {
        let msg = OpMsg::new(Document::new()).with_sequence("documents", Vec::new());
        let bytes = encode(&msg, &WireConfig::default());
        assert_eq!(
            OpMsg::decode(&HEADER, &bytes, &WireConfig::default()).unwrap(),
            msg
        );
    }

    /// Body section `{}` then a sequence `d` holding `{}`, with `size` as
    /// the sequence's declared length (11 is correct)
    fn sequence_body(size: i32) -> Vec<u8> {
        let mut bytes = vec![0, 0, 0, 0, KIND_BODY, 5, 0, 0, 0, 0, KIND_SEQUENCE];
        bytes.extend_from_slice(&size.to_le_bytes());
        bytes.extend_from_slice(&[b'd', 0, 5, 0, 0, 0, 0]);
        bytes
    }

    fn sequence_error(size: i32) -> (i64, i64) {
        match OpMsg::decode(&HEADER, &sequence_body(size), &WireConfig::default()) {
            Err(WireError::LengthMismatch {
                what: "document sequence",
                declared,
                actual,
            }) => (declared, actual),
            other => panic!("size {size}: expected sequence length mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_sequence_size_checked() {
        let msg = OpMsg::decode(&HEADER, &sequence_body(11), &WireConfig::default()).unwrap();
        assert_eq!(msg.documents().count(), 2);

        // past the end of the body
        assert_eq!(sequence_error(100), (100, 11));
        // negative and below the minimum
        assert_eq!(sequence_error(-1).0, -1);
        assert_eq!(sequence_error(4).0, 4);
    }

    #[test]
    fn test_sequence_size_too_small_for_documents() {
        // ends right after the identifier, the document is left over
        assert_eq!(sequence_error(6), (6, 11));
        // ends inside the length prefix of the document
        assert_eq!(sequence_error(8), (8, 10));
        // ends inside the document
        assert_eq!(sequence_error(10), (10, 11));
    }

    #[test]
    fn test_checksum_verified() {
        let config = WireConfig::default();
        let msg = OpMsg::new(Document::from_iter([("a", Value::Null)]))
            .with_flags(OpMsgFlags::new().with(OpMsgFlags::CHECKSUM_PRESENT));
        let mut bytes = encode(&msg, &config);
        assert_eq!(OpMsg::decode(&HEADER, &bytes, &config).unwrap(), msg);

        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(matches!(
            OpMsg::decode(&HEADER, &bytes, &config),
            Err(WireError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_checksum_header_coverage() {
        let covering = WireConfig {
            checksum_covers_header: true,
            ..WireConfig::default()
        };
        let header = [1u8; HEADER_SIZE];
        let body = [5u8, 6, 7];

        let mut whole = header.to_vec();
        whole.extend_from_slice(&body);
        assert_eq!(checksum(&header, &body, &covering), crc32c::crc32c(&whole));
        assert_eq!(
            checksum(&header, &body, &WireConfig::default()),
            crc32c::crc32c(&body)
        );
    }

    #[test]
    fn test_checksum_flag_without_room() {
        let config = WireConfig::default();
        let flags = OpMsgFlags::CHECKSUM_PRESENT.to_le_bytes();

        let mut body = flags.to_vec();
        body.extend_from_slice(&[0, 0]);
        assert!(matches!(
            OpMsg::decode(&HEADER, &body, &config),
            Err(WireError::BufferUnderrun { .. })
        ));

        // four bytes after the flags are taken as the checksum, never defaulted
        let mut body = flags.to_vec();
        body.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(
            OpMsg::decode(&HEADER, &body, &config),
            Err(WireError::ChecksumMismatch { found: 0, .. })
        ));
    }

    #[test]
    fn test_unknown_flag_bits_survive() {
        let msg = OpMsg::new(Document::new()).with_flags(OpMsgFlags::from_bits(0x0004_0000));
        let bytes = encode(&msg, &WireConfig::default());
        let decoded = OpMsg::decode(&HEADER, &bytes, &WireConfig::default()).unwrap();
        assert_eq!(decoded.flags.bits(), 0x0004_0000);
    }

    #[test]
    fn test_malformed_bodies() {
        let config = WireConfig::default();
        assert!(matches!(
            OpMsg::decode(&HEADER, &[0, 0, 0, 0], &config),
            Err(WireError::NoSections)
        ));
        assert!(matches!(
            OpMsg::decode(&HEADER, &[0, 0, 0, 0, 7], &config),
            Err(WireError::UnknownSectionKind(7))
        ));
        let err = OpMsg::decode(&HEADER, &[0, 0, 0, 0, 0, 5, 0, 0], &config).unwrap_err();
        assert!(err.is_length_error(), "{err}");
    }

    #[test]
    fn test_to_json() {
        let msg = OpMsg::new(Document::from_iter([("ping", 1_i32)]))
            .with_flags(OpMsgFlags::new().with(OpMsgFlags::MORE_TO_COME));
        assert_eq!(
            msg.to_json().to_text(),
            r#"{"flags":["moreToCome"],"sections":[{"kind":0,"document":{"$k":["ping"],"ping":1}}]}"#
        );
    }
}
