//! Ordered documents and arrays
//!
//! Both containers share the binary layout:
//!
//! ```text
//! int32 total_length | (u8 tag, cstring key, payload)* | 0x00
//! ```
//!
//! Document keys are kept in wire order with duplicates preserved. Array
//! keys are positional and discarded on decode, regenerated on encode.

use std::fmt;

use bytes::{BufMut, BytesMut};

use super::{
    BsonType, Error, Json, MAX_NESTING_DEPTH, Reader, Result, Value, length_prefix, put_cstr,
};

/// Walk the elements of one document body, handing each key and value to `f`
fn read_elements(
    reader: &mut Reader<'_>,
    depth: usize,
    what: &'static str,
    mut f: impl FnMut(&str, Value),
) -> Result<()> {
    if depth > MAX_NESTING_DEPTH {
        return Err(Error::NestingTooDeep {
            max: MAX_NESTING_DEPTH,
        });
    }

    let body_len = reader.read_length_prefix(what, 5)?;
    let declared = body_len as i64 + 4;
    let mut body = reader.sub(body_len, what)?;

    loop {
        let tag = body.read_u8("element type").map_err(|_| Error::LengthMismatch {
            what,
            declared,
            actual: body.position() as i64 + 4,
        })?;
        if tag == 0 {
            if !body.is_empty() {
                return Err(Error::LengthMismatch {
                    what,
                    declared,
                    actual: body.position() as i64 + 4,
                });
            }
            return Ok(());
        }

        let key = body.read_cstr_utf8("key")?;
        let value =
            Value::read_element(tag, &mut body, depth).map_err(|e| Error::in_field(key, e))?;
        f(key, value);
    }
}

/// Write the length prefix, elements and terminator
fn write_elements<'a>(
    buf: &mut BytesMut,
    what: &'static str,
    elements: impl Iterator<Item = (std::borrow::Cow<'a, str>, &'a Value)>,
) -> Result<()> {
    let start = buf.len();
    buf.put_i32_le(0);
    for (key, value) in elements {
        buf.put_u8(value.element_type().as_u8());
        put_cstr(buf, &key, "key")?;
        value
            .write_element(buf)
            .map_err(|e| Error::in_field(&key, e))?;
    }
    buf.put_u8(0);

    let len = length_prefix(buf.len() - start, what)?;
    buf[start..start + 4].copy_from_slice(&len.to_le_bytes());
    Ok(())
}

/// Ordered key/value sequence.
///
/// Lookups are linear; insertion order is part of the value and duplicate
/// keys are kept.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    entries: Vec<(String, Value)>,
}

impl Document {
    /// Create an empty document
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create an empty document with room for `capacity` fields
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a field, keeping any existing field with the same key
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Replace the first field named `key`, or append it
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// First value stored under `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Every value stored under `key`, in order
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Whether any field is named `key`
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Remove and return the first field named `key`
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Fields in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the document has no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of the command: the first key
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        self.entries.first().map(|(k, _)| k.as_str())
    }

    pub(crate) fn read_nested(reader: &mut Reader<'_>, depth: usize) -> Result<Self> {
        let mut doc = Self::new();
        read_elements(reader, depth, "document", |key, value| {
            doc.entries.push((key.to_owned(), value));
        })?;
        Ok(doc)
    }

    pub(crate) fn from_json_entries(entries: Vec<(String, Json)>, depth: usize) -> Result<Self> {
        if depth > MAX_NESTING_DEPTH {
            return Err(Error::NestingTooDeep {
                max: MAX_NESTING_DEPTH,
            });
        }

        let mut entries = entries.into_iter();
        let keys = match entries.next() {
            Some((marker, Json::Array(keys))) if marker == "$k" => keys,
            _ => return Err(Error::strict("Document: first field must be a $k key list")),
        };
        if keys.len() != entries.len() {
            return Err(Error::strict(format!(
                "Document: $k lists {} keys, found {} fields",
                keys.len(),
                entries.len()
            )));
        }

        let mut doc = Self::with_capacity(keys.len());
        for (expected, (key, json)) in keys.into_iter().zip(entries) {
            let expected = expected.into_string("Document key")?;
            if expected != key {
                return Err(Error::strict(format!(
                    "Document: field {key:?} does not match $k entry {expected:?}"
                )));
            }
            if key.as_bytes().contains(&0) {
                return Err(Error::InteriorNul { what: "key" });
            }
            let value =
                Value::from_json_nested(json, depth + 1).map_err(|e| Error::in_field(&key, e))?;
            doc.entries.push((key, value));
        }
        Ok(doc)
    }

    /// Render the canonical textual form as a string
    #[must_use]
    pub fn to_json_string(&self) -> String {
        BsonType::to_json_string(self)
    }
}

impl BsonType for Document {
    fn read_from(reader: &mut Reader<'_>) -> Result<Self> {
        Self::read_nested(reader, 0)
    }

    fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        write_elements(
            buf,
            "document",
            self.entries.iter().map(|(k, v)| (k.as_str().into(), v)),
        )
    }

    fn to_json(&self) -> Json {
        let keys = self.keys().map(|k| Json::String(k.to_owned())).collect();
        let mut entries = Vec::with_capacity(self.entries.len() + 1);
        entries.push(("$k".to_owned(), Json::Array(keys)));
        entries.extend(self.entries.iter().map(|(k, v)| (k.clone(), v.to_json())));
        Json::Object(entries)
    }

    fn from_json(json: Json) -> Result<Self> {
        match json {
            Json::Object(entries) => Self::from_json_entries(entries, 0),
            Json::Null => Err(Error::strict("Document: null is not a valid encoding")),
            other => Err(Error::strict(format!(
                "Document: expected object, got {}",
                other.kind()
            ))),
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_string())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Ordered list of values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array(Vec<Value>);

impl Array {
    /// Create an empty array
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a value
    pub fn push(&mut self, value: impl Into<Value>) {
        self.0.push(value.into());
    }

    /// Value at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Values in order
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    /// Number of values
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the array is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unwrap into the underlying vector
    #[must_use]
    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }

    pub(crate) fn read_nested(reader: &mut Reader<'_>, depth: usize) -> Result<Self> {
        let mut values = Vec::new();
        read_elements(reader, depth, "array", |_, value| values.push(value))?;
        Ok(Self(values))
    }

    pub(crate) fn from_json_items(items: Vec<Json>, depth: usize) -> Result<Self> {
        if depth > MAX_NESTING_DEPTH {
            return Err(Error::NestingTooDeep {
                max: MAX_NESTING_DEPTH,
            });
        }
        items
            .into_iter()
            .enumerate()
            .map(|(i, json)| {
                Value::from_json_nested(json, depth + 1)
                    .map_err(|e| Error::in_field(&i.to_string(), e))
            })
            .collect::<Result<_>>()
            .map(Self)
    }
}

impl BsonType for Array {
    fn read_from(reader: &mut Reader<'_>) -> Result<Self> {
        Self::read_nested(reader, 0)
    }

    fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        write_elements(
            buf,
            "array",
            self.0
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string().into(), v)),
        )
    }

    fn to_json(&self) -> Json {
        Json::Array(self.0.iter().map(Value::to_json).collect())
    }

    fn from_json(json: Json) -> Result<Self> {
        match json {
            Json::Array(items) => Self::from_json_items(items, 0),
            Json::Null => Err(Error::strict("Array: null is not a valid encoding")),
            other => Err(Error::strict(format!(
                "Array: expected array, got {}",
                other.kind()
            ))),
        }
    }
}

impl From<Vec<Value>> for Array {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl<V: Into<Value>> FromIterator<V> for Array {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
