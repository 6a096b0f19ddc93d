//! BSON value model and codecs
//!
//! Every value kind can be read from and written to its binary wire form
//! and translated to and from the canonical textual form. The binary side
//! works over a bounds-checked [`Reader`]; the textual side goes through the
//! order-preserving [`Json`] tree.

mod binary;
mod document;
mod error;
mod json;
mod reader;
mod scalar;
mod value;

use bytes::{BufMut, Bytes, BytesMut};

pub use binary::{Binary, BinarySubtype};
pub use document::{Array, Document};
pub use error::{Error, Result};
pub use json::Json;
pub use reader::Reader;
pub use scalar::{CString, DateTime, ObjectId, Regex, Timestamp};
pub use value::{ElementType, Value};

/// Maximum depth of nested documents and arrays accepted by the decoders
pub const MAX_NESTING_DEPTH: usize = 100;

/// A value kind with binary and textual encodings.
///
/// Implementors provide the four primitive operations; the provided methods
/// add whole-buffer and whole-string entry points with strict consumption
/// checks.
pub trait BsonType: Sized {
    /// Read the value from the cursor, advancing past it
    fn read_from(reader: &mut Reader<'_>) -> Result<Self>;

    /// Append the binary form to `buf`
    fn write_to(&self, buf: &mut BytesMut) -> Result<()>;

    /// Canonical textual form
    fn to_json(&self) -> Json;

    /// Strict inverse of [`to_json`](Self::to_json)
    fn from_json(json: Json) -> Result<Self>;

    /// Decode a buffer that holds exactly one value
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let value = Self::read_from(&mut reader)?;
        if !reader.is_empty() {
            return Err(Error::TrailingBytes {
                count: reader.remaining(),
            });
        }
        Ok(value)
    }

    /// Encode to a fresh buffer
    fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        self.write_to(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Render the canonical textual form as a string
    fn to_json_string(&self) -> String {
        self.to_json().to_text()
    }

    /// Parse the canonical textual form; trailing data is rejected
    fn from_json_str(text: &str) -> Result<Self> {
        Self::from_json(Json::parse(text)?)
    }
}

/// Write `s` followed by a NUL terminator
pub(crate) fn put_cstr(buf: &mut BytesMut, s: &str, what: &'static str) -> Result<()> {
    if s.as_bytes().contains(&0) {
        return Err(Error::InteriorNul { what });
    }
    buf.put_slice(s.as_bytes());
    buf.put_u8(0);
    Ok(())
}

/// Convert an encoded size into its 32-bit length prefix
pub(crate) fn length_prefix(size: usize, what: &'static str) -> Result<i32> {
    i32::try_from(size).map_err(|_| Error::LengthOverflow { what, size })
}
