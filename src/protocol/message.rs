//! Message traits and builders for TDS protocol serialization.
//!
//! Messages implement the `Message` trait which allows calculating wire size
//! before allocation, enabling single-allocation serialization. The packet
//! layer then splits the serialized message into packets.

use crate::error::Result;
use crate::protocol::constants::*;

// ============================================================================
// Core Traits
// ============================================================================

/// A message that can calculate its wire size and serialize to bytes.
///
/// Implementing this trait allows messages to be serialized with a single allocation:
/// 1. Call `wire_size()` to determine buffer capacity needed
/// 2. Allocate buffer with exact capacity
/// 3. Call `write_to()` to serialize directly into buffer
pub trait Message {
    /// TDS packet type the message is sent with.
    fn packet_type(&self) -> u8;

    /// Calculate the serialized size in bytes (excluding packet headers).
    fn wire_size(&self) -> usize;

    /// Write message content to buffer.
    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()>;
}

// ============================================================================
// Size Calculation Helpers
// ============================================================================

/// Wire size of a string as UTF-16LE without a length prefix.
#[inline]
pub fn ucs2_wire_size(s: &str) -> usize {
    s.encode_utf16().count() * 2
}

/// Wire size of a B_VARCHAR (1-byte character count + UTF-16LE).
#[inline]
pub fn b_varchar_wire_size(s: &str) -> usize {
    1 + ucs2_wire_size(s)
}

// ============================================================================
// Write Extension Trait
// ============================================================================

/// Extension methods for writing TDS data to a `Vec<u8>`.
pub trait WriteExt {
    /// Write a single byte.
    fn write_u8(&mut self, val: u8);

    /// Write a big-endian u16 (packet header length only).
    fn write_u16_be(&mut self, val: u16);

    /// Write a little-endian u16.
    fn write_u16_le(&mut self, val: u16);

    /// Write a little-endian u32.
    fn write_u32_le(&mut self, val: u32);

    /// Write a little-endian u64.
    fn write_u64_le(&mut self, val: u64);

    /// Write raw bytes.
    fn write_bytes(&mut self, bytes: &[u8]);

    /// Write a string as UTF-16LE without a length prefix.
    fn write_ucs2(&mut self, s: &str);

    /// Write a B_VARCHAR.
    fn write_b_varchar(&mut self, s: &str);
}

impl WriteExt for Vec<u8> {
    #[inline]
    fn write_u8(&mut self, val: u8) {
        self.push(val);
    }

    #[inline]
    fn write_u16_be(&mut self, val: u16) {
        self.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    fn write_u16_le(&mut self, val: u16) {
        self.extend_from_slice(&val.to_le_bytes());
    }

    #[inline]
    fn write_u32_le(&mut self, val: u32) {
        self.extend_from_slice(&val.to_le_bytes());
    }

    #[inline]
    fn write_u64_le(&mut self, val: u64) {
        self.extend_from_slice(&val.to_le_bytes());
    }

    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }

    fn write_ucs2(&mut self, s: &str) {
        for unit in s.encode_utf16() {
            self.extend_from_slice(&unit.to_le_bytes());
        }
    }

    fn write_b_varchar(&mut self, s: &str) {
        // names longer than 255 characters are rejected by the server anyway
        let chars = s.encode_utf16().count().min(u8::MAX as usize);
        self.push(chars as u8);
        for unit in s.encode_utf16().take(chars) {
            self.extend_from_slice(&unit.to_le_bytes());
        }
    }
}

// ============================================================================
// Packet Header
// ============================================================================

/// TDS packet header size.
pub const HEADER_SIZE: usize = 8;

/// Write a TDS packet header.
///
/// # Arguments
/// * `buf` - Buffer to write to
/// * `packet_type` - TDS packet type (SQL batch, bulk load, ...)
/// * `status` - Status bits (`TDS_STATUS_EOM` on the last packet of a message)
/// * `total_size` - Total packet size including header
/// * `packet_id` - Packet sequence number, wrapping at 255
pub fn write_packet_header(
    buf: &mut Vec<u8>,
    packet_type: u8,
    status: u8,
    total_size: usize,
    packet_id: u8,
) {
    buf.write_u8(packet_type);
    buf.write_u8(status);
    buf.write_u16_be(total_size as u16);
    buf.write_u16_be(0); // SPID
    buf.write_u8(packet_id);
    buf.write_u8(0); // Window (unused)
}

/// Write the ALL_HEADERS block with a transaction descriptor header.
pub fn write_all_headers(buf: &mut Vec<u8>, transaction_descriptor: u64) {
    buf.write_u32_le(TDS_ALL_HEADERS_LEN);
    buf.write_u32_le(TDS_ALL_HEADERS_LEN - 4);
    buf.write_u16_le(TDS_HEADER_TRANSACTION_DESCRIPTOR);
    buf.write_u64_le(transaction_descriptor);
    buf.write_u32_le(1); // Outstanding request count
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_ucs2() {
        let mut buf = Vec::new();
        buf.write_ucs2("ab");
        assert_eq!(buf, vec![b'a', 0, b'b', 0]);
        assert_eq!(ucs2_wire_size("ab"), 4);
    }

    #[test]
    fn test_write_b_varchar() {
        let mut buf = Vec::new();
        buf.write_b_varchar("id");
        assert_eq!(buf, vec![2, b'i', 0, b'd', 0]);
        assert_eq!(buf.len(), b_varchar_wire_size("id"));
    }

    #[test]
    fn test_all_headers_size() {
        let mut buf = Vec::new();
        write_all_headers(&mut buf, 0);
        assert_eq!(buf.len(), TDS_ALL_HEADERS_LEN as usize);
        assert_eq!(&buf[0..4], &[22, 0, 0, 0]);
        assert_eq!(&buf[4..8], &[18, 0, 0, 0]);
    }

    #[test]
    fn test_packet_header() {
        let mut buf = Vec::new();
        write_packet_header(&mut buf, TDS_PACKET_TYPE_BULK_LOAD, TDS_STATUS_EOM, 0x0123, 3);
        assert_eq!(buf, vec![0x07, 0x01, 0x01, 0x23, 0, 0, 3, 0]);
    }
}
