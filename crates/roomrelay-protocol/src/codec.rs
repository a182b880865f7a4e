//! Field-level encoding: cursors that write and read typed fields.
//!
//! Messages in [`crate::types`] are built from these two types. Keeping the
//! field rules here means every message agrees on widths and byte order.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::ProtocolError;

/// Longest string a single field can carry, in bytes.
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

// ---------------------------------------------------------------------------
// PacketWriter
// ---------------------------------------------------------------------------

/// Appends typed fields to a growing packet.
///
/// ```rust
/// use roomrelay_protocol::{PacketReader, PacketWriter};
///
/// let mut writer = PacketWriter::new();
/// writer.put_u32(1234).put_str("alice");
///
/// let mut reader = PacketReader::new(writer.finish());
/// assert_eq!(reader.read_u32().unwrap(), 1234);
/// assert_eq!(reader.read_string().unwrap(), "alice");
/// ```
#[derive(Debug, Default)]
pub struct PacketWriter {
    buf: BytesMut,
}

impl PacketWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes one byte.
    pub fn put_u8(&mut self, value: u8) -> &mut Self {
        self.buf.put_u8(value);
        self
    }

    /// Writes a little-endian `u32`.
    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buf.put_u32_le(value);
        self
    }

    /// Writes a little-endian `u64`.
    pub fn put_u64(&mut self, value: u64) -> &mut Self {
        self.buf.put_u64_le(value);
        self
    }

    /// Writes a length-prefixed UTF-8 string.
    ///
    /// Strings longer than [`MAX_STRING_LEN`] bytes are cut at the last
    /// character boundary that fits.
    pub fn put_str(&mut self, value: &str) -> &mut Self {
        let mut end = value.len().min(MAX_STRING_LEN);
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        let bytes = &value.as_bytes()[..end];
        self.buf.put_u16_le(bytes.len() as u16);
        self.buf.put_slice(bytes);
        self
    }

    /// Freezes the packet into cheaply clonable bytes.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

// ---------------------------------------------------------------------------
// PacketReader
// ---------------------------------------------------------------------------

/// Reads typed fields from the front of a packet.
///
/// Each read checks the remaining length first, so a short packet yields
/// [`ProtocolError::Truncated`] instead of a panic.
#[derive(Debug, Clone)]
pub struct PacketReader {
    buf: Bytes,
}

impl PacketReader {
    /// Wraps `buf` for reading from its first byte.
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Reads a little-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16, ProtocolError> {
        self.ensure(2)?;
        Ok(self.buf.get_u16_le())
    }

    /// Reads a little-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    /// Reads a little-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64, ProtocolError> {
        self.ensure(8)?;
        Ok(self.buf.get_u64_le())
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, ProtocolError> {
        let len = self.read_u16()? as usize;
        self.ensure(len)?;
        let raw = self.buf.split_to(len);
        String::from_utf8(raw.to_vec()).map_err(|_| ProtocolError::InvalidUtf8)
    }

    fn ensure(&self, needed: usize) -> Result<(), ProtocolError> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(ProtocolError::Truncated { needed, remaining });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_are_little_endian() {
        let mut writer = PacketWriter::new();
        writer.put_u32(0x0102_0304).put_u64(1);
        let bytes = writer.finish();
        assert_eq!(&bytes[..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&bytes[4..], &[1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_string_has_u16_length_prefix() {
        let mut writer = PacketWriter::new();
        writer.put_str("hé");
        let bytes = writer.finish();
        // "hé" is 3 bytes in UTF-8.
        assert_eq!(&bytes[..2], &[3, 0]);
        assert_eq!(&bytes[2..], "hé".as_bytes());
    }

    #[test]
    fn test_overlong_string_is_cut_on_char_boundary() {
        // 'é' is two bytes, so MAX_STRING_LEN (odd) falls mid-character.
        let long = "é".repeat(MAX_STRING_LEN);
        let mut writer = PacketWriter::new();
        writer.put_str(&long);

        let mut reader = PacketReader::new(writer.finish());
        let decoded = reader.read_string().unwrap();
        assert_eq!(decoded.len(), MAX_STRING_LEN - 1);
        assert!(decoded.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_read_past_end_reports_truncation() {
        let mut reader = PacketReader::new(Bytes::from_static(&[1, 2]));
        assert_eq!(
            reader.read_u32(),
            Err(ProtocolError::Truncated { needed: 4, remaining: 2 })
        );
    }

    #[test]
    fn test_string_length_past_end_reports_truncation() {
        // Claims 10 bytes, carries 1.
        let mut reader = PacketReader::new(Bytes::from_static(&[10, 0, b'a']));
        assert_eq!(
            reader.read_string(),
            Err(ProtocolError::Truncated { needed: 10, remaining: 1 })
        );
    }

    #[test]
    fn test_invalid_utf8_string_is_rejected() {
        let mut reader = PacketReader::new(Bytes::from_static(&[2, 0, 0xff, 0xfe]));
        assert_eq!(reader.read_string(), Err(ProtocolError::InvalidUtf8));
    }
}
