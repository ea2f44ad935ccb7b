//! Primitive wire codec.
//!
//! [`WireReader`] reads fixed-width integers and floats in the container's
//! byte order, plus the version-width "count" integers whose width is
//! chosen once per container (32-bit widened to 64-bit for v1, native
//! 64-bit for v2/v3).

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use ggufscope_core::{ByteOrder, CountWidth, GgufError, Result};
use std::io::{Read, Seek};

/// Dispatch a `byteorder` read method on the active byte order.
macro_rules! read_ordered {
    ($self:ident, $method:ident) => {
        match $self.order {
            ByteOrder::Little => $self.inner.$method::<LittleEndian>()?,
            ByteOrder::Big => $self.inner.$method::<BigEndian>()?,
        }
    };
}

/// Bytes treated as padding around decoded strings.
fn is_string_padding(c: char) -> bool {
    matches!(c, '\0' | '\t' | '\n' | '\x0B' | '\x0C' | '\r' | ' ')
}

/// Byte-order and width aware reader over a byte stream.
pub struct WireReader<R> {
    inner: R,
    order: ByteOrder,
    width: CountWidth,
}

impl<R: Read> WireReader<R> {
    /// Wrap `inner` with a fixed byte order and count width.
    pub fn new(inner: R, order: ByteOrder, width: CountWidth) -> Self {
        Self {
            inner,
            order,
            width,
        }
    }

    /// Active byte order.
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Active count width.
    pub fn count_width(&self) -> CountWidth {
        self.width
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Mutable access to the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Read exactly `N` raw bytes.
    pub fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.inner.read_u8()?)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.inner.read_i8()?)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(read_ordered!(self, read_u16))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(read_ordered!(self, read_i16))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(read_ordered!(self, read_u32))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(read_ordered!(self, read_i32))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(read_ordered!(self, read_u64))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(read_ordered!(self, read_i64))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(read_ordered!(self, read_f32))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(read_ordered!(self, read_f64))
    }

    /// Read a one-byte bool; only 0 and 1 are valid.
    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(GgufError::InvalidBoolEncoding(other)),
        }
    }

    /// Read a version-width count, widened to `u64`.
    pub fn read_count(&mut self) -> Result<u64> {
        match self.width {
            CountWidth::U32 => Ok(u64::from(self.read_u32()?)),
            CountWidth::U64 => self.read_u64(),
        }
    }

    /// Read a version-width count and narrow it to `usize`, rejecting
    /// values above `limit`.
    pub fn read_len(&mut self, what: &str, limit: u64) -> Result<usize> {
        let len = self.read_count()?;
        if len > limit {
            return Err(GgufError::InvalidFormat(format!(
                "{} length {} exceeds limit {}",
                what, len, limit
            )));
        }
        usize::try_from(len).map_err(|_| {
            GgufError::InvalidFormat(format!("{} length {} does not fit in memory", what, len))
        })
    }

    /// Read a length-prefixed string, stripping ASCII whitespace and NUL
    /// bytes from both ends.
    pub fn read_string(&mut self, max_len: u64) -> Result<String> {
        let len = self.read_len("string", max_len)?;

        // Grow with the data actually present so a corrupt length fails as
        // a short read rather than an up-front allocation.
        let mut buf = Vec::with_capacity(len.min(4096));
        let read = (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        if read != len {
            return Err(GgufError::TruncatedRead(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("string of {} bytes ended after {}", len, read),
            )));
        }

        let text = String::from_utf8(buf)
            .map_err(|e| GgufError::InvalidFormat(format!("string is not UTF-8: {}", e)))?;
        let trimmed = text.trim_matches(is_string_padding);
        if trimmed.len() == text.len() {
            Ok(text)
        } else {
            Ok(trimmed.to_string())
        }
    }
}

impl<R: Read + Seek> WireReader<R> {
    /// Current absolute position of the underlying stream.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(bytes: Vec<u8>, order: ByteOrder, width: CountWidth) -> WireReader<Cursor<Vec<u8>>> {
        WireReader::new(Cursor::new(bytes), order, width)
    }

    #[test]
    fn test_reads_in_byte_order() {
        let mut le = reader(
            0x0102_0304u32.to_le_bytes().to_vec(),
            ByteOrder::Little,
            CountWidth::U64,
        );
        assert_eq!(le.read_u32().unwrap(), 0x0102_0304);

        let mut be = reader(
            0x0102_0304u32.to_be_bytes().to_vec(),
            ByteOrder::Big,
            CountWidth::U64,
        );
        assert_eq!(be.read_u32().unwrap(), 0x0102_0304);
    }

    #[test]
    fn test_floats_and_signed() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-2.5f32).to_be_bytes());
        bytes.extend_from_slice(&1.25f64.to_be_bytes());
        bytes.extend_from_slice(&(-7i16).to_be_bytes());
        bytes.push(0xFF);

        let mut r = reader(bytes, ByteOrder::Big, CountWidth::U64);
        assert_eq!(r.read_f32().unwrap(), -2.5);
        assert_eq!(r.read_f64().unwrap(), 1.25);
        assert_eq!(r.read_i16().unwrap(), -7);
        assert_eq!(r.read_i8().unwrap(), -1);
    }

    #[test]
    fn test_count_width_widening() {
        let mut bytes = u32::MAX.to_le_bytes().to_vec();
        bytes.extend_from_slice(&7u32.to_le_bytes());
        let mut r = reader(bytes, ByteOrder::Little, CountWidth::U32);
        assert_eq!(r.read_count().unwrap(), u64::from(u32::MAX));
        assert_eq!(r.read_count().unwrap(), 7);

        let mut r = reader(
            (1u64 << 40).to_le_bytes().to_vec(),
            ByteOrder::Little,
            CountWidth::U64,
        );
        assert_eq!(r.read_count().unwrap(), 1 << 40);
    }

    #[test]
    fn test_bool_domain() {
        let mut r = reader(vec![0, 1, 2], ByteOrder::Little, CountWidth::U64);
        assert!(!r.read_bool().unwrap());
        assert!(r.read_bool().unwrap());
        assert!(matches!(
            r.read_bool(),
            Err(GgufError::InvalidBoolEncoding(2))
        ));
    }

    #[test]
    fn test_string_trimmed() {
        let raw = b"\0 llama\t\n\x0B\x0C\r\0";
        let mut bytes = (raw.len() as u64).to_le_bytes().to_vec();
        bytes.extend_from_slice(raw);
        let mut r = reader(bytes, ByteOrder::Little, CountWidth::U64);
        assert_eq!(r.read_string(1024).unwrap(), "llama");
    }

    #[test]
    fn test_string_keeps_inner_whitespace() {
        let raw = b"a b";
        let mut bytes = (raw.len() as u32).to_be_bytes().to_vec();
        bytes.extend_from_slice(raw);
        let mut r = reader(bytes, ByteOrder::Big, CountWidth::U32);
        assert_eq!(r.read_string(1024).unwrap(), "a b");
    }

    #[test]
    fn test_string_truncated() {
        let mut bytes = 10u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"abc");
        let mut r = reader(bytes, ByteOrder::Little, CountWidth::U64);
        assert!(matches!(
            r.read_string(1024),
            Err(GgufError::TruncatedRead(_))
        ));
    }

    #[test]
    fn test_string_over_limit() {
        let mut r = reader(
            u64::MAX.to_le_bytes().to_vec(),
            ByteOrder::Little,
            CountWidth::U64,
        );
        assert!(matches!(
            r.read_string(1024),
            Err(GgufError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_string_invalid_utf8() {
        let mut bytes = 2u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0xC3, 0x28]);
        let mut r = reader(bytes, ByteOrder::Little, CountWidth::U64);
        assert!(matches!(
            r.read_string(1024),
            Err(GgufError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_short_read() {
        let mut r = reader(vec![1, 2], ByteOrder::Little, CountWidth::U64);
        assert!(matches!(r.read_u32(), Err(GgufError::TruncatedRead(_))));
    }

    #[test]
    fn test_position() {
        let mut r = reader(vec![0; 16], ByteOrder::Little, CountWidth::U64);
        r.read_u64().unwrap();
        r.read_u16().unwrap();
        assert_eq!(r.position().unwrap(), 10);
    }
}
