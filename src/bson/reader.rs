//! Bounds-checked cursor over an in-memory buffer.
//!
//! Every read either returns the requested bytes and advances, or fails
//! without moving the position. There is no global read position; each
//! decode pass owns its own `Reader`.

use super::{Error, Result};

/// Cursor for reading little-endian BSON fields with position tracking
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader positioned at the start of `buf`
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Whether every byte has been consumed
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Unread portion of the buffer
    #[must_use]
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Take exactly `n` bytes
    pub fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::BufferUnderrun {
                what,
                needed: n,
                got: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Split off a reader over the next `n` bytes and advance past them
    pub fn sub(&mut self, n: usize, what: &'static str) -> Result<Reader<'a>> {
        self.take(n, what).map(Reader::new)
    }

    fn array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N]> {
        let bytes = self.take(N, what)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Read one byte
    pub fn read_u8(&mut self, what: &'static str) -> Result<u8> {
        Ok(self.array::<1>(what)?[0])
    }

    /// Read a little-endian `i32`
    pub fn read_i32(&mut self, what: &'static str) -> Result<i32> {
        self.array(what).map(i32::from_le_bytes)
    }

    /// Read a little-endian `u32`
    pub fn read_u32(&mut self, what: &'static str) -> Result<u32> {
        self.array(what).map(u32::from_le_bytes)
    }

    /// Read a little-endian `i64`
    pub fn read_i64(&mut self, what: &'static str) -> Result<i64> {
        self.array(what).map(i64::from_le_bytes)
    }

    /// Read a little-endian `u64`
    pub fn read_u64(&mut self, what: &'static str) -> Result<u64> {
        self.array(what).map(u64::from_le_bytes)
    }

    /// Read a little-endian IEEE-754 double, preserving every bit
    pub fn read_f64(&mut self, what: &'static str) -> Result<f64> {
        self.read_u64(what).map(f64::from_bits)
    }

    /// Read a fixed-size byte array
    pub fn read_bytes<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N]> {
        self.array(what)
    }

    /// Read bytes up to the next NUL and consume the terminator
    pub fn read_cstr(&mut self) -> Result<&'a [u8]> {
        let rest = self.rest();
        let end = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(Error::UnterminatedCString)?;
        self.pos += end + 1;
        Ok(&rest[..end])
    }

    /// Read a NUL-terminated UTF-8 string
    pub fn read_cstr_utf8(&mut self, what: &'static str) -> Result<&'a str> {
        let bytes = self.read_cstr()?;
        std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8 { what })
    }

    /// Read a 32-bit length prefix that counts itself, returning the body length
    pub fn read_length_prefix(&mut self, what: &'static str, min: usize) -> Result<usize> {
        let declared = self.read_i32(what)?;
        let len = usize::try_from(declared)
            .ok()
            .filter(|&len| len >= min)
            .ok_or(Error::LengthMismatch {
                what,
                declared: i64::from(declared),
                actual: self.remaining() as i64 + 4,
            })?;
        if len - 4 > self.remaining() {
            return Err(Error::LengthMismatch {
                what,
                declared: i64::from(declared),
                actual: self.remaining() as i64 + 4,
            });
        }
        Ok(len - 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width_reads() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-2_i32).to_le_bytes());
        bytes.extend_from_slice(&7_u64.to_le_bytes());
        bytes.extend_from_slice(&1.5_f64.to_le_bytes());

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_i32("a").unwrap(), -2);
        assert_eq!(r.read_u64("b").unwrap(), 7);
        assert_eq!(r.read_f64("c").unwrap(), 1.5);
        assert!(r.is_empty());
    }

    #[test]
    fn test_underrun_does_not_advance() {
        let mut r = Reader::new(&[1, 2, 3]);
        let err = r.read_i32("int32").unwrap_err();
        assert!(matches!(
            err,
            Error::BufferUnderrun {
                what: "int32",
                needed: 4,
                got: 3
            }
        ));
        assert_eq!(r.position(), 0);
    }

    #[test]
    fn test_cstr() {
        let mut r = Reader::new(b"foo\0bar");
        assert_eq!(r.read_cstr().unwrap(), b"foo");
        assert_eq!(r.position(), 4);
        assert!(matches!(r.read_cstr(), Err(Error::UnterminatedCString)));
    }

    #[test]
    fn test_length_prefix_bounds() {
        let mut bytes = 9_i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0; 4]);
        let err = Reader::new(&bytes).read_length_prefix("document", 5);
        assert!(matches!(
            err,
            Err(Error::LengthMismatch {
                declared: 9,
                actual: 8,
                ..
            })
        ));

        let bytes = (-1_i32).to_le_bytes();
        assert!(Reader::new(&bytes).read_length_prefix("document", 5).is_err());
    }
}
