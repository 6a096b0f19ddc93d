//! Legacy OP_REPLY body
//!
//! ```text
//! int32    response flags
//! int64    cursor id
//! int32    starting from
//! int32    number returned
//! document*
//! ```

use bytes::{BufMut, BytesMut};

use super::{OpReplyFlags, Result, WireError};
use crate::bson::{self, BsonType, Document, Json, Reader};

/// Reply to a legacy query
#[derive(Debug, Clone, PartialEq)]
pub struct OpReply {
    /// Flag bits, unknown bits included
    pub flags: OpReplyFlags,
    /// Open cursor, 0 when exhausted
    pub cursor_id: i64,
    /// Position of the first document in the cursor
    pub starting_from: i32,
    /// Returned documents
    pub documents: Vec<Document>,
}

impl OpReply {
    /// Single-document reply with no open cursor
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            flags: OpReplyFlags::default(),
            cursor_id: 0,
            starting_from: 0,
            documents: vec![document],
        }
    }

    /// Decode a complete body; the declared count must match the documents
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(body);
        let flags = OpReplyFlags::from_bits(reader.read_u32("OP_REPLY flags")?);
        let cursor_id = reader.read_i64("cursor id")?;
        let starting_from = reader.read_i32("starting from")?;
        let declared = reader.read_i32("number returned")?;

        let mut documents = Vec::new();
        while !reader.is_empty() {
            documents.push(Document::read_from(&mut reader)?);
        }
        if usize::try_from(declared).ok() != Some(documents.len()) {
            return Err(WireError::DocumentCountMismatch {
                declared,
                found: documents.len(),
            });
        }

        Ok(Self {
            flags,
            cursor_id,
            starting_from,
            documents,
        })
    }

    /// Append the body
    pub fn write_body(&self, buf: &mut BytesMut) -> Result<()> {
        let count = i32::try_from(self.documents.len()).map_err(|_| bson::Error::LengthOverflow {
            what: "OP_REPLY documents",
            size: self.documents.len(),
        })?;

        buf.put_u32_le(self.flags.bits());
        buf.put_i64_le(self.cursor_id);
        buf.put_i32_le(self.starting_from);
        buf.put_i32_le(count);
        for doc in &self.documents {
            doc.write_to(buf)?;
        }
        Ok(())
    }

    /// Diagnostic textual form
    #[must_use]
    pub fn to_json(&self) -> Json {
        let flags = self.flags.names().into_iter().map(Json::String).collect();
        Json::Object(vec![
            ("flags".to_owned(), Json::Array(flags)),
            ("cursorId".to_owned(), Json::String(self.cursor_id.to_string())),
            ("startingFrom".to_owned(), Json::Number(self.starting_from.into())),
            (
                "documents".to_owned(),
                Json::Array(self.documents.iter().map(BsonType::to_json).collect()),
            ),
        ])
    }
}
