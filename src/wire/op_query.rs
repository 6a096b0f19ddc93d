//! Legacy OP_QUERY body
//!
//! Drivers still open a connection with an OP_QUERY `isMaster`/`hello`
//! against `admin.$cmd`, so the framing layer has to read and write it.
//!
//! ```text
//! int32    flags
//! cstring  full collection name
//! int32    number to skip
//! int32    number to return
//! document query
//! document return fields selector (optional)
//! ```

use bytes::{BufMut, BytesMut};

use super::{OpQueryFlags, Result};
use crate::bson::{self, BsonType, Document, Json, Reader};

/// Legacy query
#[derive(Debug, Clone, PartialEq)]
pub struct OpQuery {
    /// Flag bits, unknown bits included
    pub flags: OpQueryFlags,
    /// `<db>.<collection>`
    pub full_collection_name: String,
    /// Documents to skip
    pub number_to_skip: i32,
    /// Batch size hint
    pub number_to_return: i32,
    /// Query or command document
    pub query: Document,
    /// Projection
    pub return_fields_selector: Option<Document>,
}

impl OpQuery {
    /// Command query against `<db>.$cmd`
    #[must_use]
    pub fn command(db: &str, query: Document) -> Self {
        Self {
            flags: OpQueryFlags::default(),
            full_collection_name: format!("{db}.$cmd"),
            number_to_skip: 0,
            number_to_return: -1,
            query,
            return_fields_selector: None,
        }
    }

    /// Decode a complete body
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(body);
        let flags = OpQueryFlags::from_bits(reader.read_u32("OP_QUERY flags")?);
        let full_collection_name = reader.read_cstr_utf8("full collection name")?.to_owned();
        let number_to_skip = reader.read_i32("number to skip")?;
        let number_to_return = reader.read_i32("number to return")?;
        let query = Document::read_from(&mut reader)?;
        let return_fields_selector = if reader.is_empty() {
            None
        } else {
            Some(Document::read_from(&mut reader)?)
        };
        if !reader.is_empty() {
            return Err(bson::Error::TrailingBytes {
                count: reader.remaining(),
            }
            .into());
        }

        Ok(Self {
            flags,
            full_collection_name,
            number_to_skip,
            number_to_return,
            query,
            return_fields_selector,
        })
    }

    /// Append the body
    pub fn write_body(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.flags.bits());
        bson::put_cstr(buf, &self.full_collection_name, "full collection name")?;
        buf.put_i32_le(self.number_to_skip);
        buf.put_i32_le(self.number_to_return);
        self.query.write_to(buf)?;
        if let Some(selector) = &self.return_fields_selector {
            selector.write_to(buf)?;
        }
        Ok(())
    }

    /// Diagnostic textual form
    #[must_use]
    pub fn to_json(&self) -> Json {
        let flags = self.flags.names().into_iter().map(Json::String).collect();
        let mut entries = vec![
            ("flags".to_owned(), Json::Array(flags)),
            (
                "fullCollectionName".to_owned(),
                Json::String(self.full_collection_name.clone()),
            ),
            ("numberToSkip".to_owned(), Json::Number(self.number_to_skip.into())),
            (
                "numberToReturn".to_owned(),
                Json::Number(self.number_to_return.into()),
            ),
            ("query".to_owned(), self.query.to_json()),
        ];
        if let Some(selector) = &self.return_fields_selector {
            entries.push(("returnFieldsSelector".to_owned(), selector.to_json()));
        }
        Json::Object(entries)
    }
}
