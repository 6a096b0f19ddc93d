//! Binary data with a subtype byte

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::{BufMut, BytesMut};

use super::json::Fields;
use super::{BsonType, Error, Json, Reader, Result, length_prefix};

/// Binary subtype byte.
///
/// Stored raw: values outside the named set are carried through decode,
/// encode and the textual form unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BinarySubtype(pub u8);

impl BinarySubtype {
    /// Generic binary
    pub const GENERIC: Self = Self(0x00);
    /// Function
    pub const FUNCTION: Self = Self(0x01);
    /// Binary (old), length-prefixed payload
    pub const BINARY_OLD: Self = Self(0x02);
    /// UUID (old)
    pub const UUID_OLD: Self = Self(0x03);
    /// UUID
    pub const UUID: Self = Self(0x04);
    /// MD5 digest
    pub const MD5: Self = Self(0x05);
    /// Encrypted value
    pub const ENCRYPTED: Self = Self(0x06);
    /// User-defined
    pub const USER: Self = Self(0x80);

    /// Name of a known subtype
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self.0 {
            0x00 => Some("generic"),
            0x01 => Some("function"),
            0x02 => Some("binary-old"),
            0x03 => Some("uuid-old"),
            0x04 => Some("uuid"),
            0x05 => Some("md5"),
            0x06 => Some("encrypted"),
            0x80 => Some("user"),
            _ => None,
        }
    }
}

impl fmt::Display for BinarySubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "BinarySubtype({:#04x})", self.0),
        }
    }
}

/// Binary blob
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Binary {
    /// Subtype byte
    pub subtype: BinarySubtype,
    /// Payload
    pub bytes: Vec<u8>,
}

impl Binary {
    /// Create a blob with the given subtype
    pub fn new(subtype: BinarySubtype, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            subtype,
            bytes: bytes.into(),
        }
    }
}

impl BsonType for Binary {
    fn read_from(reader: &mut Reader<'_>) -> Result<Self> {
        let declared = reader.read_i32("binary length")?;
        let subtype = BinarySubtype(reader.read_u8("binary subtype")?);

        let len = usize::try_from(declared)
            .ok()
            .filter(|&len| len <= reader.remaining())
            .ok_or(Error::LengthMismatch {
                what: "binary",
                declared: i64::from(declared),
                actual: reader.remaining() as i64,
            })?;
        let bytes = reader.take(len, "binary")?.to_vec();

        Ok(Self { subtype, bytes })
    }

    fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_i32_le(length_prefix(self.bytes.len(), "binary")?);
        buf.put_u8(self.subtype.0);
        buf.put_slice(&self.bytes);
        Ok(())
    }

    fn to_json(&self) -> Json {
        Json::Object(vec![
            ("$b".to_owned(), Json::String(STANDARD.encode(&self.bytes))),
            ("s".to_owned(), Json::Number(self.subtype.0.into())),
        ])
    }

    fn from_json(json: Json) -> Result<Self> {
        let mut fields = Fields::new("Binary", json)?;
        let encoded = fields.take_string("$b")?;
        let subtype = match fields.take("s")? {
            Json::Number(n) => n
                .as_u64()
                .and_then(|s| u8::try_from(s).ok())
                .ok_or_else(|| Error::strict(format!("Binary: invalid subtype {n}")))?,
            other => {
                return Err(Error::strict(format!(
                    "Binary: expected subtype number, got {}",
                    other.kind()
                )));
            }
        };
        fields.finish()?;

        let bytes = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| Error::strict(format!("Binary: {e}")))?;
        Ok(Self {
            subtype: BinarySubtype(subtype),
            bytes,
        })
    }
}
