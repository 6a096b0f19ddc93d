//! Fixed-width and string scalar codecs

use std::fmt;

use bytes::{BufMut, BytesMut};

use super::json::Fields;
use super::{BsonType, Error, Json, Reader, Result, length_prefix, put_cstr};

const NAN: &str = "NaN";
const INFINITY: &str = "Infinity";
const NEG_INFINITY: &str = "-Infinity";

fn format_double(f: f64) -> String {
    if f.is_nan() {
        return NAN.to_owned();
    }
    if f.is_infinite() {
        return if f > 0.0 { INFINITY } else { NEG_INFINITY }.to_owned();
    }
    let abs = f.abs();
    if abs != 0.0 && !(1e-6..1e21).contains(&abs) {
        format!("{f:e}")
    } else {
        f.to_string()
    }
}

fn parse_double(s: &str) -> Result<f64> {
    match s {
        NAN => return Ok(f64::NAN),
        INFINITY => return Ok(f64::INFINITY),
        NEG_INFINITY => return Ok(f64::NEG_INFINITY),
        _ => {}
    }
    // str::parse also accepts "inf" and "nan"; only decimal notation is canonical
    let decimal = !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'));
    if !decimal {
        return Err(Error::strict(format!("Double: invalid number {s:?}")));
    }
    s.parse()
        .map_err(|_| Error::strict(format!("Double: invalid number {s:?}")))
}

fn parse_decimal<T: std::str::FromStr>(what: &str, s: &str) -> Result<T> {
    if s.is_empty() || s.starts_with('+') {
        return Err(Error::strict(format!("{what}: invalid integer {s:?}")));
    }
    s.parse()
        .map_err(|_| Error::strict(format!("{what}: invalid integer {s:?}")))
}

impl BsonType for f64 {
    fn read_from(reader: &mut Reader<'_>) -> Result<Self> {
        reader.read_f64("double")
    }

    fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u64_le(self.to_bits());
        Ok(())
    }

    fn to_json(&self) -> Json {
        Json::tagged("$f", Json::String(format_double(*self)))
    }

    fn from_json(json: Json) -> Result<Self> {
        let mut fields = Fields::new("Double", json)?;
        let value = parse_double(&fields.take_string("$f")?)?;
        fields.finish()?;
        Ok(value)
    }
}

impl BsonType for bool {
    fn read_from(reader: &mut Reader<'_>) -> Result<Self> {
        match reader.read_u8("boolean")? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(Error::InvalidBoolean { byte }),
        }
    }

    fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u8(u8::from(*self));
        Ok(())
    }

    fn to_json(&self) -> Json {
        Json::Bool(*self)
    }

    fn from_json(json: Json) -> Result<Self> {
        match json {
            Json::Bool(b) => Ok(b),
            other => Err(Error::strict(format!(
                "Boolean: expected boolean, got {}",
                other.kind()
            ))),
        }
    }
}

impl BsonType for i32 {
    fn read_from(reader: &mut Reader<'_>) -> Result<Self> {
        reader.read_i32("int32")
    }

    fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_i32_le(*self);
        Ok(())
    }

    fn to_json(&self) -> Json {
        Json::Number((*self).into())
    }

    fn from_json(json: Json) -> Result<Self> {
        match json {
            Json::Number(n) => n
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| Error::strict(format!("Int32: {n} is not a 32-bit integer"))),
            other => Err(Error::strict(format!(
                "Int32: expected number, got {}",
                other.kind()
            ))),
        }
    }
}

impl BsonType for i64 {
    fn read_from(reader: &mut Reader<'_>) -> Result<Self> {
        reader.read_i64("int64")
    }

    fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_i64_le(*self);
        Ok(())
    }

    fn to_json(&self) -> Json {
        Json::tagged("$l", Json::String(self.to_string()))
    }

    fn from_json(json: Json) -> Result<Self> {
        let mut fields = Fields::new("Int64", json)?;
        let value = parse_decimal("Int64", &fields.take_string("$l")?)?;
        fields.finish()?;
        Ok(value)
    }
}

/// Length-prefixed UTF-8 string.
///
/// Wire form: `int32` byte count including the terminator, the bytes, NUL.
impl BsonType for String {
    fn read_from(reader: &mut Reader<'_>) -> Result<Self> {
        let declared = reader.read_i32("string length")?;
        let mismatch = |actual: usize| Error::LengthMismatch {
            what: "string",
            declared: i64::from(declared),
            actual: actual as i64,
        };

        let len = usize::try_from(declared)
            .ok()
            .filter(|&len| len >= 1)
            .ok_or_else(|| mismatch(reader.remaining()))?;
        if len > reader.remaining() {
            return Err(mismatch(reader.remaining()));
        }

        let bytes = reader.take(len, "string")?;
        let (body, terminator) = bytes.split_at(len - 1);
        if terminator != [0] {
            let actual = bytes.iter().position(|&b| b == 0).map_or(len, |p| p + 1);
            return Err(mismatch(actual));
        }

        std::str::from_utf8(body)
            .map(str::to_owned)
            .map_err(|_| Error::InvalidUtf8 { what: "string" })
    }

    fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_i32_le(length_prefix(self.len() + 1, "string")?);
        buf.put_slice(self.as_bytes());
        buf.put_u8(0);
        Ok(())
    }

    fn to_json(&self) -> Json {
        Json::String(self.clone())
    }

    fn from_json(json: Json) -> Result<Self> {
        json.into_string("String")
    }
}

/// NUL-terminated string without interior NUL bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CString(String);

impl CString {
    /// Wrap `s`, rejecting interior NUL bytes
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if s.as_bytes().contains(&0) {
            return Err(Error::InteriorNul { what: "cstring" });
        }
        Ok(Self(s))
    }

    /// Borrow as `&str`
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap into the owned string
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl BsonType for CString {
    fn read_from(reader: &mut Reader<'_>) -> Result<Self> {
        reader
            .read_cstr_utf8("cstring")
            .map(|s| Self(s.to_owned()))
    }

    fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        put_cstr(buf, &self.0, "cstring")
    }

    fn to_json(&self) -> Json {
        Json::tagged("$c", Json::String(self.0.clone()))
    }

    fn from_json(json: Json) -> Result<Self> {
        let mut fields = Fields::new("CString", json)?;
        let s = fields.take_string("$c")?;
        fields.finish()?;
        Self::new(s)
    }
}

/// UTC datetime as milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DateTime(pub i64);

impl DateTime {
    /// Milliseconds since the Unix epoch
    #[must_use]
    pub const fn timestamp_millis(self) -> i64 {
        self.0
    }
}

impl BsonType for DateTime {
    fn read_from(reader: &mut Reader<'_>) -> Result<Self> {
        reader.read_i64("datetime").map(Self)
    }

    fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_i64_le(self.0);
        Ok(())
    }

    fn to_json(&self) -> Json {
        Json::tagged("$d", Json::String(self.0.to_string()))
    }

    fn from_json(json: Json) -> Result<Self> {
        let mut fields = Fields::new("DateTime", json)?;
        let ms = parse_decimal("DateTime", &fields.take_string("$d")?)?;
        fields.finish()?;
        Ok(Self(ms))
    }
}

/// Internal replication timestamp: seconds in the high word, ordinal in the low word
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Build from seconds and ordinal
    #[must_use]
    pub const fn new(seconds: u32, increment: u32) -> Self {
        Self(((seconds as u64) << 32) | increment as u64)
    }

    /// Seconds since the Unix epoch
    #[must_use]
    pub const fn seconds(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Ordinal within the second
    #[must_use]
    pub const fn increment(self) -> u32 {
        self.0 as u32
    }
}

impl BsonType for Timestamp {
    fn read_from(reader: &mut Reader<'_>) -> Result<Self> {
        reader.read_u64("timestamp").map(Self)
    }

    fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u64_le(self.0);
        Ok(())
    }

    fn to_json(&self) -> Json {
        Json::tagged("$t", Json::String(self.0.to_string()))
    }

    fn from_json(json: Json) -> Result<Self> {
        let mut fields = Fields::new("Timestamp", json)?;
        let t = parse_decimal("Timestamp", &fields.take_string("$t")?)?;
        fields.finish()?;
        Ok(Self(t))
    }
}

/// 12-byte object identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ObjectId(pub [u8; 12]);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl BsonType for ObjectId {
    fn read_from(reader: &mut Reader<'_>) -> Result<Self> {
        reader.read_bytes("objectid").map(Self)
    }

    fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_slice(&self.0);
        Ok(())
    }

    fn to_json(&self) -> Json {
        Json::tagged("$o", Json::String(self.to_string()))
    }

    fn from_json(json: Json) -> Result<Self> {
        let mut fields = Fields::new("ObjectId", json)?;
        let text = fields.take_string("$o")?;
        fields.finish()?;
        if text.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(Error::strict(format!("ObjectId: {text:?} is not lowercase hex")));
        }

        let mut id = [0u8; 12];
        hex::decode_to_slice(&text, &mut id)
            .map_err(|e| Error::strict(format!("ObjectId: {text:?}: {e}")))?;
        Ok(Self(id))
    }
}

/// Regular expression: pattern and option letters, both NUL-terminated on the wire
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Regex {
    /// Pattern source
    pub pattern: String,
    /// Option letters
    pub options: String,
}

impl BsonType for Regex {
    fn read_from(reader: &mut Reader<'_>) -> Result<Self> {
        let pattern = reader.read_cstr_utf8("regex pattern")?.to_owned();
        let options = reader.read_cstr_utf8("regex options")?.to_owned();
        Ok(Self { pattern, options })
    }

    fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        put_cstr(buf, &self.pattern, "regex pattern")?;
        put_cstr(buf, &self.options, "regex options")
    }

    fn to_json(&self) -> Json {
        Json::Object(vec![
            ("$r".to_owned(), Json::String(self.pattern.clone())),
            ("o".to_owned(), Json::String(self.options.clone())),
        ])
    }

    fn from_json(json: Json) -> Result<Self> {
        let mut fields = Fields::new("Regex", json)?;
        let pattern = fields.take_string("$r")?;
        let options = fields.take_string("o")?;
        fields.finish()?;
        if pattern.contains('\0') {
            return Err(Error::InteriorNul {
                what: "regex pattern",
            });
        }
        if options.contains('\0') {
            return Err(Error::InteriorNul {
                what: "regex options",
            });
        }
        Ok(Self { pattern, options })
    }
}
