//! Buffer utilities for reading and writing TDS protocol data.
//!
//! TDS is little-endian on the wire except for the packet header length,
//! which is big-endian.

use crate::error::{Error, Result};
use crate::protocol::constants::*;
use bytes::{BufMut, Bytes, BytesMut};

/// A buffer for reading TDS protocol data.
pub struct ReadBuffer {
    data: Bytes,
    pos: usize,
}

impl ReadBuffer {
    /// Create a new read buffer from bytes.
    pub fn new(data: Bytes) -> Self {
        Self { data, pos: 0 }
    }

    /// Get the current position in the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Get the remaining bytes in the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Check if the buffer has at least `n` bytes remaining.
    pub fn has_remaining(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    #[track_caller]
    fn ensure(&self, n: usize) -> Result<()> {
        if !self.has_remaining(n) {
            return Err(Error::BufferTooSmall {
                needed: n,
                available: self.remaining(),
                location: std::panic::Location::caller(),
            });
        }
        Ok(())
    }

    /// Skip `n` bytes.
    #[track_caller]
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Read a single byte.
    #[track_caller]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let val = self.data[self.pos];
        self.pos += 1;
        Ok(val)
    }

    /// Read a little-endian u16.
    #[track_caller]
    pub fn read_u16_le(&mut self) -> Result<u16> {
        self.ensure(2)?;
        let val = u16::from_le_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        Ok(val)
    }

    /// Read a little-endian u32.
    #[track_caller]
    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.ensure(4)?;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.data[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Read a little-endian i32.
    #[track_caller]
    pub fn read_i32_le(&mut self) -> Result<i32> {
        Ok(self.read_u32_le()? as i32)
    }

    /// Read a little-endian u64.
    #[track_caller]
    pub fn read_u64_le(&mut self) -> Result<u64> {
        self.ensure(8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.data[self.pos..self.pos + 8]);
        self.pos += 8;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Read raw bytes.
    #[track_caller]
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        self.ensure(n)?;
        let bytes = self.data.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(bytes)
    }

    /// Read `chars` UTF-16LE code units as a string.
    pub fn read_ucs2(&mut self, chars: usize) -> Result<String> {
        let raw = self.read_bytes(chars * 2)?;
        let units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).map_err(|_| Error::protocol("Invalid UTF-16 string"))
    }

    /// Read a B_VARCHAR (1-byte character count, UTF-16LE).
    pub fn read_b_varchar(&mut self) -> Result<String> {
        let chars = self.read_u8()? as usize;
        self.read_ucs2(chars)
    }

    /// Read a US_VARCHAR (2-byte character count, UTF-16LE).
    pub fn read_us_varchar(&mut self) -> Result<String> {
        let chars = self.read_u16_le()? as usize;
        self.read_ucs2(chars)
    }
}

/// A buffer for writing TDS protocol data.
pub struct WriteBuffer {
    data: BytesMut,
}

impl WriteBuffer {
    /// Create a new write buffer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(8192)
    }

    /// Create a new write buffer with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
        }
    }

    /// Get the current length of the buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the buffer contents as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Freeze the buffer into immutable bytes.
    pub fn freeze(self) -> Bytes {
        self.data.freeze()
    }

    /// Take the written bytes, leaving the buffer empty but keeping its capacity.
    pub fn take(&mut self) -> Bytes {
        self.data.split().freeze()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, val: u8) {
        self.data.put_u8(val);
    }

    /// Write a little-endian u16.
    pub fn write_u16_le(&mut self, val: u16) {
        self.data.put_u16_le(val);
    }

    /// Write a little-endian i16.
    pub fn write_i16_le(&mut self, val: i16) {
        self.data.put_i16_le(val);
    }

    /// Write a little-endian u32.
    pub fn write_u32_le(&mut self, val: u32) {
        self.data.put_u32_le(val);
    }

    /// Write a little-endian i32.
    pub fn write_i32_le(&mut self, val: i32) {
        self.data.put_i32_le(val);
    }

    /// Write a little-endian u64.
    pub fn write_u64_le(&mut self, val: u64) {
        self.data.put_u64_le(val);
    }

    /// Write a little-endian i64.
    pub fn write_i64_le(&mut self, val: i64) {
        self.data.put_i64_le(val);
    }

    /// Write the low `n` bytes of `val`, little-endian.
    pub fn write_uint_le(&mut self, val: u64, n: usize) {
        self.data.put_uint_le(val, n);
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Write bytes with a 2-byte length prefix (USHORTLEN).
    pub fn write_ushort_len_bytes(&mut self, bytes: &[u8]) {
        self.write_u16_le(bytes.len() as u16);
        self.write_bytes(bytes);
    }

    /// Write bytes as a PLP stream with a known total length.
    pub fn write_plp(&mut self, bytes: &[u8]) {
        self.write_u64_le(bytes.len() as u64);
        for chunk in bytes.chunks(TDS_PLP_CHUNK_SIZE) {
            self.write_u32_le(chunk.len() as u32);
            self.write_bytes(chunk);
        }
        self.write_u32_le(TDS_PLP_TERMINATOR);
    }

    /// Write a PLP NULL.
    pub fn write_plp_null(&mut self) {
        self.write_u64_le(TDS_PLP_NULL);
    }
}

impl Default for WriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_little_endian() {
        let mut buf = ReadBuffer::new(Bytes::from_static(&[
            0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0x01, 0, 0, 0, 0, 0, 0, 0,
        ]));
        assert_eq!(buf.read_u16_le().unwrap(), 0x1234);
        assert_eq!(buf.read_u32_le().unwrap(), 0x12345678);
        assert_eq!(buf.read_u64_le().unwrap(), 1);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_read_past_end() {
        let mut buf = ReadBuffer::new(Bytes::from_static(&[1, 2]));
        match buf.read_u32_le() {
            Err(Error::BufferTooSmall {
                needed, available, ..
            }) => {
                assert_eq!(needed, 4);
                assert_eq!(available, 2);
            }
            other => panic!("Expected BufferTooSmall, got {:?}", other),
        }
    }

    #[test]
    fn test_read_b_varchar() {
        // "id" as B_VARCHAR
        let mut buf = ReadBuffer::new(Bytes::from_static(&[2, b'i', 0, b'd', 0]));
        assert_eq!(buf.read_b_varchar().unwrap(), "id");
    }

    #[test]
    fn test_write_plp() {
        let mut buf = WriteBuffer::new();
        buf.write_plp(b"{}");
        assert_eq!(
            buf.as_bytes(),
            &[2, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, b'{', b'}', 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_write_plp_chunks_long_values() {
        let data = vec![b'x'; TDS_PLP_CHUNK_SIZE + 10];
        let mut buf = WriteBuffer::new();
        buf.write_plp(&data);
        // length + 2 chunk headers + data + terminator
        assert_eq!(buf.len(), 8 + 4 + 4 + data.len() + 4);
        let mut read = ReadBuffer::new(buf.freeze());
        assert_eq!(read.read_u64_le().unwrap(), data.len() as u64);
        assert_eq!(read.read_u32_le().unwrap(), TDS_PLP_CHUNK_SIZE as u32);
    }

    #[test]
    fn test_take_resets_buffer() {
        let mut buf = WriteBuffer::new();
        buf.write_uint_le(0x030201, 3);
        let taken = buf.take();
        assert_eq!(&taken[..], &[1, 2, 3]);
        assert!(buf.is_empty());
    }
}
