//! Integer, floating point, decimal and money encoders.
//!
//! All values are written in their nullable TDS form: a one-byte length
//! followed by the little-endian value.

use crate::error::{Error, Result};
use crate::protocol::buffer::WriteBuffer;
use crate::protocol::types::{decimal_magnitude_len, SqlType, MAX_DECIMAL_PRECISION};
use rust_decimal::{Decimal, RoundingStrategy};

/// Money types keep four fractional digits.
pub const MONEY_SCALE: u32 = 4;

/// Smallest smallmoney value, -214,748.3648.
pub const SMALLMONEY_MIN: Decimal = Decimal::from_parts(2_147_483_648, 0, 0, true, MONEY_SCALE);
/// Largest smallmoney value, 214,748.3647.
pub const SMALLMONEY_MAX: Decimal = Decimal::from_parts(2_147_483_647, 0, 0, false, MONEY_SCALE);
/// Smallest money value, -922,337,203,685,477.5808.
pub const MONEY_MIN: Decimal = Decimal::from_parts(0, 0x8000_0000, 0, true, MONEY_SCALE);
/// Largest money value, 922,337,203,685,477.5807.
pub const MONEY_MAX: Decimal = Decimal::from_parts(0xFFFF_FFFF, 0x7FFF_FFFF, 0, false, MONEY_SCALE);

/// Encode an integer into tinyint, smallint, int or bigint.
pub fn encode_int(value: i64, sql_type: SqlType, column: &str, buf: &mut WriteBuffer) -> Result<()> {
    let in_range = match sql_type {
        SqlType::TinyInt => (0..=u8::MAX as i64).contains(&value),
        SqlType::SmallInt => (i16::MIN as i64..=i16::MAX as i64).contains(&value),
        SqlType::Int => (i32::MIN as i64..=i32::MAX as i64).contains(&value),
        SqlType::BigInt => true,
        other => {
            return Err(Error::type_conversion(
                column,
                format!("{} is not an integer type", other),
            ))
        }
    };
    if !in_range {
        return Err(Error::out_of_range(column, value));
    }

    let len = sql_type.fixed_len().unwrap_or(8);
    buf.write_u8(len as u8);
    buf.write_uint_le(value as u64, len);
    Ok(())
}

/// Encode a bit.
pub fn encode_bit(value: bool, buf: &mut WriteBuffer) {
    buf.write_u8(1);
    buf.write_u8(value as u8);
}

/// Encode a real (4-byte float).
pub fn encode_real(value: f64, column: &str, buf: &mut WriteBuffer) -> Result<()> {
    if !value.is_finite() || value.abs() > f32::MAX as f64 {
        return Err(Error::out_of_range(column, value));
    }
    buf.write_u8(4);
    buf.write_u32_le((value as f32).to_bits());
    Ok(())
}

/// Encode a float (8-byte float).
pub fn encode_float(value: f64, column: &str, buf: &mut WriteBuffer) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::out_of_range(column, value));
    }
    buf.write_u8(8);
    buf.write_u64_le(value.to_bits());
    Ok(())
}

/// Integer mantissa of `value` at exactly `scale` fractional digits.
///
/// Rounds half away from zero when `value` has more digits than `scale`.
/// Returns `None` if the scaled mantissa does not fit in 128 bits.
pub fn scaled_mantissa(value: Decimal, scale: u32) -> Option<i128> {
    let rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    let missing = scale.checked_sub(rounded.scale())?;
    10i128
        .checked_pow(missing)
        .and_then(|factor| rounded.mantissa().checked_mul(factor))
}

/// Encode a decimal or numeric value.
///
/// Wire form: length, sign byte (1 = positive), magnitude little-endian in
/// 4, 8, 12 or 16 bytes depending on precision.
pub fn encode_decimal(
    value: Decimal,
    precision: u8,
    scale: u8,
    column: &str,
    buf: &mut WriteBuffer,
) -> Result<()> {
    let mantissa =
        scaled_mantissa(value, scale as u32).ok_or_else(|| Error::out_of_range(column, value))?;
    let magnitude = mantissa.unsigned_abs();
    let limit = 10u128
        .checked_pow(precision as u32)
        .filter(|_| precision <= MAX_DECIMAL_PRECISION)
        .ok_or_else(|| {
            Error::schema_mismatch(format!("Column '{}': invalid decimal precision {}", column, precision))
        })?;
    if magnitude >= limit {
        return Err(Error::out_of_range(column, value));
    }

    let len = decimal_magnitude_len(precision);
    buf.write_u8((1 + len) as u8);
    buf.write_u8(if mantissa < 0 { 0 } else { 1 });
    buf.write_bytes(&magnitude.to_le_bytes()[..len]);
    Ok(())
}

/// Validate a currency value and return it in units of 1/10000.
pub fn money_units(value: Decimal, sql_type: SqlType, column: &str) -> Result<i64> {
    let (min, max) = match sql_type {
        SqlType::SmallMoney => (SMALLMONEY_MIN, SMALLMONEY_MAX),
        _ => (MONEY_MIN, MONEY_MAX),
    };
    let rounded = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if rounded < min || rounded > max {
        return Err(Error::out_of_range(column, value));
    }
    scaled_mantissa(rounded, MONEY_SCALE)
        .and_then(|units| i64::try_from(units).ok())
        .ok_or_else(|| Error::out_of_range(column, value))
}

/// Encode smallmoney or money.
///
/// Money is written as the high 32 bits followed by the low 32 bits of the
/// 64-bit unit count.
pub fn encode_money(
    value: Decimal,
    sql_type: SqlType,
    column: &str,
    buf: &mut WriteBuffer,
) -> Result<()> {
    let units = money_units(value, sql_type, column)?;
    match sql_type {
        SqlType::SmallMoney => {
            buf.write_u8(4);
            buf.write_i32_le(units as i32);
        }
        _ => {
            buf.write_u8(8);
            buf.write_i32_le((units >> 32) as i32);
            buf.write_u32_le(units as u32);
        }
    }
    Ok(())
}
