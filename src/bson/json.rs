//! Order-preserving JSON tree backing the canonical textual form.
//!
//! `serde_json::Value` collapses duplicate object keys and, without extra
//! features, reorders them. Documents may legitimately repeat keys, so the
//! textual bridge parses into [`Json`], whose objects are plain entry lists.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;

use super::{Error, Result};

/// JSON value with objects kept as ordered entry lists
#[derive(Debug, Clone, PartialEq)]
pub enum Json {
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Any JSON number
    Number(Number),
    /// String
    String(String),
    /// Array
    Array(Vec<Json>),
    /// Object entries in source order, duplicates kept
    Object(Vec<(String, Json)>),
}

impl Json {
    /// Parse exactly one JSON value; trailing non-whitespace is an error
    pub fn parse(text: &str) -> Result<Self> {
        let mut de = serde_json::Deserializer::from_str(text);
        let json = Self::deserialize(&mut de)?;
        de.end()
            .map_err(|_| Error::strict("trailing data after JSON value"))?;
        Ok(json)
    }

    /// Render as compact JSON text
    #[must_use]
    pub fn to_text(&self) -> String {
        // every number in the tree is finite, so serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Build a single-entry object
    #[must_use]
    pub fn tagged(key: &str, value: Self) -> Self {
        Self::Object(vec![(key.to_owned(), value)])
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    pub(crate) fn into_string(self, what: &str) -> Result<String> {
        match self {
            Self::String(s) => Ok(s),
            other => Err(Error::strict(format!(
                "{what}: expected string, got {}",
                other.kind()
            ))),
        }
    }
}

impl fmt::Display for Json {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Fields of a tagged wrapper object, consumed one at a time.
///
/// Wrapper objects accept fields in any order; anything left over after the
/// expected fields were taken is rejected.
pub(crate) struct Fields {
    what: &'static str,
    entries: Vec<(String, Json)>,
}

impl Fields {
    /// Unwrap `json` as an object; `null` is never a valid wrapper
    pub(crate) fn new(what: &'static str, json: Json) -> Result<Self> {
        match json {
            Json::Object(entries) => Ok(Self { what, entries }),
            Json::Null => Err(Error::strict(format!("{what}: null is not a valid encoding"))),
            other => Err(Error::strict(format!(
                "{what}: expected object, got {}",
                other.kind()
            ))),
        }
    }

    pub(crate) fn take(&mut self, key: &str) -> Result<Json> {
        let idx = self
            .entries
            .iter()
            .position(|(k, _)| k == key)
            .ok_or_else(|| Error::strict(format!("{}: missing field {key:?}", self.what)))?;
        Ok(self.entries.remove(idx).1)
    }

    pub(crate) fn take_string(&mut self, key: &str) -> Result<String> {
        let what = self.what;
        self.take(key)?.into_string(what)
    }

    pub(crate) fn finish(self) -> Result<()> {
        match self.entries.first() {
            None => Ok(()),
            Some((key, _)) => Err(Error::strict(format!(
                "{}: unknown field {key:?}",
                self.what
            ))),
        }
    }
}

impl Serialize for Json {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Json {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(JsonVisitor)
    }
}

struct JsonVisitor;

impl<'de> Visitor<'de> for JsonVisitor {
    type Value = Json;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Json, E> {
        Ok(Json::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Json, E> {
        Ok(Json::Null)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Json, E> {
        Ok(Json::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Json, E> {
        Ok(Json::Number(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Json, E> {
        Ok(Json::Number(v.into()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Json, E> {
        Number::from_f64(v)
            .map(Json::Number)
            .ok_or_else(|| E::custom("non-finite number"))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Json, E> {
        Ok(Json::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Json, E> {
        Ok(Json::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Json, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Json::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Json, A::Error> {
        let mut entries = Vec::new();
        while let Some((key, value)) = map.next_entry::<String, Json>()? {
            entries.push((key, value));
        }
        Ok(Json::Object(entries))
    }
}
