//! uniqueidentifier encoder.
//!
//! The first three groups (4, 2 and 2 bytes) are stored little-endian; the
//! last 8 bytes keep their textual order.

use crate::protocol::buffer::WriteBuffer;
use uuid::Uuid;

/// Wire bytes of a uniqueidentifier.
pub fn guid_to_wire(value: &Uuid) -> [u8; 16] {
    value.to_bytes_le()
}

/// Inverse of `guid_to_wire`.
pub fn guid_from_wire(bytes: [u8; 16]) -> Uuid {
    Uuid::from_bytes_le(bytes)
}

/// Encode a uniqueidentifier.
pub fn encode_guid(value: &Uuid, buf: &mut WriteBuffer) {
    buf.write_u8(16);
    buf.write_bytes(&guid_to_wire(value));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid_permutation() {
        let u = Uuid::parse_str("00112233-4455-6677-8899-aabbccddeeff").unwrap();
        assert_eq!(
            guid_to_wire(&u),
            [
                0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD,
                0xEE, 0xFF
            ]
        );
    }

    #[test]
    fn test_guid_round_trip() {
        for s in [
            "00000000-0000-0000-0000-000000000000",
            "6f9619ff-8b86-d011-b42d-00c04fc964ff",
            "ffffffff-ffff-ffff-ffff-ffffffffffff",
        ] {
            let u = Uuid::parse_str(s).unwrap();
            assert_eq!(guid_from_wire(guid_to_wire(&u)), u);
        }
    }

    /// 16-byte patterns: each byte position marked alone, all bytes distinct, and
    /// pseudo-random fills.
    fn patterns() -> Vec<[u8; 16]> {
        let mut out = Vec::new();
        for pos in 0..16 {
            let mut b = [0u8; 16];
            b[pos] = 0xA5;
            out.push(b);
        }
        for start in [0u8, 0x10, 0xF0] {
            out.push(std::array::from_fn(|i| start.wrapping_add(i as u8 * 17)));
        }
        let mut state = 0x2545_F491_4F6C_DD1Du64;
        for _ in 0..64 {
            out.push(std::array::from_fn(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 24) as u8
            }));
        }
        out
    }

    #[test]
    fn test_guid_round_trip_patterns() {
        for bytes in patterns() {
            let u = Uuid::from_bytes(bytes);
            let wire = guid_to_wire(&u);
            let mut swapped = bytes;
            swapped[0..4].reverse();
            swapped[4..6].reverse();
            swapped[6..8].reverse();
            assert_eq!(wire, swapped, "{}", u);
            assert_eq!(guid_from_wire(wire), u);
        }
    }

    #[test]
    fn test_encode_guid_length_prefix() {
        let mut buf = WriteBuffer::new();
        encode_guid(&Uuid::nil(), &mut buf);
        assert_eq!(buf.len(), 17);
        assert_eq!(buf.as_bytes()[0], 16);
    }
}
