//! Integer, decimal and money decoders.

use crate::error::{Error, Result};
use crate::protocol::encode::number::MONEY_SCALE;
use rust_decimal::Decimal;

/// Decode a little-endian signed integer of 1, 2, 4 or 8 bytes.
///
/// A single byte is tinyint and therefore unsigned.
pub fn decode_int(data: &[u8]) -> Result<i64> {
    let value = match data.len() {
        1 => data[0] as i64,
        2 => i16::from_le_bytes([data[0], data[1]]) as i64,
        4 => i32::from_le_bytes([data[0], data[1], data[2], data[3]]) as i64,
        8 => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(data);
            i64::from_le_bytes(bytes)
        }
        n => return Err(Error::protocol(format!("Invalid integer length {}", n))),
    };
    Ok(value)
}

/// Decode a decimal or numeric value: sign byte, then magnitude little-endian.
///
/// Values beyond 96 bits or 28 fractional digits cannot be represented and
/// return `Error::Protocol`.
pub fn decode_decimal(data: &[u8], scale: u8) -> Result<Decimal> {
    if data.len() < 2 || data.len() > 17 {
        return Err(Error::protocol(format!(
            "Invalid decimal length {}",
            data.len()
        )));
    }
    let negative = data[0] == 0;
    let mut bytes = [0u8; 16];
    bytes[..data.len() - 1].copy_from_slice(&data[1..]);
    let magnitude = u128::from_le_bytes(bytes);
    if magnitude >> 96 != 0 || scale > 28 {
        return Err(Error::protocol(format!(
            "Decimal value exceeds 28 digits (scale {})",
            scale
        )));
    }
    let mut value = Decimal::from_i128_with_scale(magnitude as i128, scale as u32);
    value.set_sign_negative(negative);
    Ok(value)
}

/// Decode smallmoney (4 bytes) or money (8 bytes, high half first).
pub fn decode_money(data: &[u8]) -> Result<Decimal> {
    let units = match data.len() {
        4 => i32::from_le_bytes([data[0], data[1], data[2], data[3]]) as i64,
        8 => {
            let high = i32::from_le_bytes([data[0], data[1], data[2], data[3]]) as i64;
            let low = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as i64;
            (high << 32) | low
        }
        n => return Err(Error::protocol(format!("Invalid money length {}", n))),
    };
    Ok(Decimal::new(units, MONEY_SCALE))
}
