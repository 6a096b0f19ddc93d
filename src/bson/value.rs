//! Tagged BSON value

use std::fmt;

use bytes::BytesMut;

use super::{
    Array, Binary, BsonType, DateTime, Document, Error, Json, ObjectId, Reader, Regex, Result,
    Timestamp,
};

/// Element type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementType {
    /// 64-bit IEEE-754 float
    Double = 0x01,
    /// Length-prefixed UTF-8 string
    String = 0x02,
    /// Embedded document
    Document = 0x03,
    /// Array
    Array = 0x04,
    /// Binary data
    Binary = 0x05,
    /// Object identifier
    ObjectId = 0x07,
    /// Boolean
    Boolean = 0x08,
    /// UTC datetime
    DateTime = 0x09,
    /// Null
    Null = 0x0A,
    /// Regular expression
    Regex = 0x0B,
    /// 32-bit integer
    Int32 = 0x10,
    /// Timestamp
    Timestamp = 0x11,
    /// 64-bit integer
    Int64 = 0x12,
}

impl ElementType {
    /// Convert from tag byte
    #[must_use]
    pub const fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(Self::Double),
            0x02 => Some(Self::String),
            0x03 => Some(Self::Document),
            0x04 => Some(Self::Array),
            0x05 => Some(Self::Binary),
            0x07 => Some(Self::ObjectId),
            0x08 => Some(Self::Boolean),
            0x09 => Some(Self::DateTime),
            0x0A => Some(Self::Null),
            0x0B => Some(Self::Regex),
            0x10 => Some(Self::Int32),
            0x11 => Some(Self::Timestamp),
            0x12 => Some(Self::Int64),
            _ => None,
        }
    }

    /// Convert to tag byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Double => "double",
            Self::String => "string",
            Self::Document => "object",
            Self::Array => "array",
            Self::Binary => "binData",
            Self::ObjectId => "objectId",
            Self::Boolean => "bool",
            Self::DateTime => "date",
            Self::Null => "null",
            Self::Regex => "regex",
            Self::Int32 => "int",
            Self::Timestamp => "timestamp",
            Self::Int64 => "long",
        };
        f.write_str(name)
    }
}

/// Any BSON value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit float
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Embedded document
    Document(Document),
    /// Array
    Array(Array),
    /// Binary data
    Binary(Binary),
    /// Object identifier
    ObjectId(ObjectId),
    /// Boolean
    Boolean(bool),
    /// UTC datetime
    DateTime(DateTime),
    /// Null
    Null,
    /// Regular expression
    Regex(Regex),
    /// 32-bit integer
    Int32(i32),
    /// Timestamp
    Timestamp(Timestamp),
    /// 64-bit integer
    Int64(i64),
}

/// Wrapper markers recognised in the textual form, in dispatch order
const MARKERS: [&str; 7] = ["$f", "$b", "$o", "$d", "$r", "$t", "$l"];

impl Value {
    /// Type tag of the active variant
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        match self {
            Self::Double(_) => ElementType::Double,
            Self::String(_) => ElementType::String,
            Self::Document(_) => ElementType::Document,
            Self::Array(_) => ElementType::Array,
            Self::Binary(_) => ElementType::Binary,
            Self::ObjectId(_) => ElementType::ObjectId,
            Self::Boolean(_) => ElementType::Boolean,
            Self::DateTime(_) => ElementType::DateTime,
            Self::Null => ElementType::Null,
            Self::Regex(_) => ElementType::Regex,
            Self::Int32(_) => ElementType::Int32,
            Self::Timestamp(_) => ElementType::Timestamp,
            Self::Int64(_) => ElementType::Int64,
        }
    }

    /// Read the payload for `tag`; `depth` is that of the enclosing container
    pub(crate) fn read_element(tag: u8, reader: &mut Reader<'_>, depth: usize) -> Result<Self> {
        let element_type = ElementType::from_u8(tag).ok_or(Error::UnknownTypeTag { tag })?;
        Ok(match element_type {
            ElementType::Double => Self::Double(f64::read_from(reader)?),
            ElementType::String => Self::String(String::read_from(reader)?),
            ElementType::Document => Self::Document(Document::read_nested(reader, depth + 1)?),
            ElementType::Array => Self::Array(Array::read_nested(reader, depth + 1)?),
            ElementType::Binary => Self::Binary(Binary::read_from(reader)?),
            ElementType::ObjectId => Self::ObjectId(ObjectId::read_from(reader)?),
            ElementType::Boolean => Self::Boolean(bool::read_from(reader)?),
            ElementType::DateTime => Self::DateTime(DateTime::read_from(reader)?),
            ElementType::Null => Self::Null,
            ElementType::Regex => Self::Regex(Regex::read_from(reader)?),
            ElementType::Int32 => Self::Int32(i32::read_from(reader)?),
            ElementType::Timestamp => Self::Timestamp(Timestamp::read_from(reader)?),
            ElementType::Int64 => Self::Int64(i64::read_from(reader)?),
        })
    }

    /// Write the payload without its tag
    pub(crate) fn write_element(&self, buf: &mut BytesMut) -> Result<()> {
        match self {
            Self::Double(v) => v.write_to(buf),
            Self::String(v) => v.write_to(buf),
            Self::Document(v) => v.write_to(buf),
            Self::Array(v) => v.write_to(buf),
            Self::Binary(v) => v.write_to(buf),
            Self::ObjectId(v) => v.write_to(buf),
            Self::Boolean(v) => v.write_to(buf),
            Self::DateTime(v) => v.write_to(buf),
            Self::Null => Ok(()),
            Self::Regex(v) => v.write_to(buf),
            Self::Int32(v) => v.write_to(buf),
            Self::Timestamp(v) => v.write_to(buf),
            Self::Int64(v) => v.write_to(buf),
        }
    }

    /// Canonical textual form
    #[must_use]
    pub fn to_json(&self) -> Json {
        match self {
            Self::Double(v) => v.to_json(),
            Self::String(v) => v.to_json(),
            Self::Document(v) => v.to_json(),
            Self::Array(v) => v.to_json(),
            Self::Binary(v) => v.to_json(),
            Self::ObjectId(v) => v.to_json(),
            Self::Boolean(v) => v.to_json(),
            Self::DateTime(v) => v.to_json(),
            Self::Null => Json::Null,
            Self::Regex(v) => v.to_json(),
            Self::Int32(v) => v.to_json(),
            Self::Timestamp(v) => v.to_json(),
            Self::Int64(v) => v.to_json(),
        }
    }

    /// Strict inverse of [`to_json`](Self::to_json)
    pub fn from_json(json: Json) -> Result<Self> {
        Self::from_json_nested(json, 0)
    }

    /// `depth` counts the containers enclosing this value
    pub(crate) fn from_json_nested(json: Json, depth: usize) -> Result<Self> {
        match json {
            Json::Null => Ok(Self::Null),
            Json::Bool(b) => Ok(Self::Boolean(b)),
            Json::String(s) => Ok(Self::String(s)),
            json @ Json::Number(_) => i32::from_json(json).map(Self::Int32),
            Json::Array(items) => Array::from_json_items(items, depth).map(Self::Array),
            Json::Object(entries) => Self::from_json_object(entries, depth),
        }
    }

    fn from_json_object(entries: Vec<(String, Json)>, depth: usize) -> Result<Self> {
        if entries.first().is_some_and(|(key, _)| key == "$k") {
            return Document::from_json_entries(entries, depth).map(Self::Document);
        }

        let marker = MARKERS
            .iter()
            .copied()
            .find(|marker| entries.iter().any(|(key, _)| key == marker))
            .ok_or_else(|| {
                let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
                Error::strict(format!("object with keys {keys:?} is not a tagged value"))
            })?;

        let json = Json::Object(entries);
        match marker {
            "$f" => f64::from_json(json).map(Self::Double),
            "$b" => Binary::from_json(json).map(Self::Binary),
            "$o" => ObjectId::from_json(json).map(Self::ObjectId),
            "$d" => DateTime::from_json(json).map(Self::DateTime),
            "$r" => Regex::from_json(json).map(Self::Regex),
            "$t" => Timestamp::from_json(json).map(Self::Timestamp),
            _ => i64::from_json(json).map(Self::Int64),
        }
    }

    /// Render the canonical textual form as a string
    #[must_use]
    pub fn to_json_string(&self) -> String {
        self.to_json().to_text()
    }

    /// Parse the canonical textual form; trailing data is rejected
    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_json(Json::parse(text)?)
    }

    /// Borrow as a string slice if this is a `String`
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as a document if this is an embedded `Document`
    #[must_use]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Document(d) => Some(d),
            _ => None,
        }
    }

    /// Borrow as an array if this is an `Array`
    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Value of a `Boolean`
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric value of a `Double`, `Int32` or `Int64`
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Int32(v) => Some(*v as f64),
            Self::Int64(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_string())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Self::Document(v)
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Self {
        Self::Array(v)
    }
}

impl From<Binary> for Value {
    fn from(v: Binary) -> Self {
        Self::Binary(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Self::ObjectId(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<DateTime> for Value {
    fn from(v: DateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<Regex> for Value {
    fn from(v: Regex) -> Self {
        Self::Regex(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Self::Timestamp(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}
