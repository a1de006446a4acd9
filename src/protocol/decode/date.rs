//! Date and time decoders.
//!
//! Inverse of the encoders in `encode::datetime`. Read-back of a datetime
//! reproduces the server's display value: ticks are converted to whole
//! milliseconds with `(ticks * 10 + 1) / 3`.

use crate::error::{Error, Result};
use crate::protocol::encode::datetime::base_1900;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

fn le_uint(data: &[u8]) -> u64 {
    data.iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

fn invalid(what: &str, data: &[u8]) -> Error {
    Error::protocol(format!("Invalid {} value of {} bytes", what, data.len()))
}

/// Decode a datetime from 8 bytes.
pub fn decode_datetime(data: &[u8]) -> Result<NaiveDateTime> {
    if data.len() != 8 {
        return Err(invalid("datetime", data));
    }
    let days = i32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let ticks = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    let ms = (ticks as i64 * 10 + 1) / 3;
    base_1900()
        .and_time(NaiveTime::MIN)
        .checked_add_signed(Duration::days(days as i64) + Duration::milliseconds(ms))
        .ok_or_else(|| invalid("datetime", data))
}

/// Decode a smalldatetime from 4 bytes.
pub fn decode_smalldatetime(data: &[u8]) -> Result<NaiveDateTime> {
    if data.len() != 4 {
        return Err(invalid("smalldatetime", data));
    }
    let days = u16::from_le_bytes([data[0], data[1]]);
    let minutes = u16::from_le_bytes([data[2], data[3]]);
    base_1900()
        .and_time(NaiveTime::MIN)
        .checked_add_signed(Duration::days(days as i64) + Duration::minutes(minutes as i64))
        .ok_or_else(|| invalid("smalldatetime", data))
}

/// Decode a date from 3 bytes of days since 0001-01-01.
pub fn decode_date(data: &[u8]) -> Result<NaiveDate> {
    if data.len() != 3 {
        return Err(invalid("date", data));
    }
    let days = le_uint(data) as i32;
    NaiveDate::from_num_days_from_ce_opt(days + 1).ok_or_else(|| invalid("date", data))
}

/// Decode a time of day stored as 10^-scale second units.
pub fn decode_time(data: &[u8], scale: u8) -> Result<NaiveTime> {
    if !(3..=5).contains(&data.len()) || scale > 7 {
        return Err(invalid("time", data));
    }
    let units = le_uint(data);
    let per_second = 10u64.pow(scale as u32);
    let secs = (units / per_second) as u32;
    let nanos = ((units % per_second) * 10u64.pow(9 - scale as u32)) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos).ok_or_else(|| invalid("time", data))
}

/// Decode a datetime2: time followed by a 3-byte date.
pub fn decode_datetime2(data: &[u8], scale: u8) -> Result<NaiveDateTime> {
    if data.len() < 6 {
        return Err(invalid("datetime2", data));
    }
    let split = data.len() - 3;
    let time = decode_time(&data[..split], scale)?;
    let date = decode_date(&data[split..])?;
    Ok(date.and_time(time))
}

/// Decode a datetimeoffset: UTC datetime2 followed by offset minutes.
pub fn decode_datetimeoffset(data: &[u8], scale: u8) -> Result<DateTime<FixedOffset>> {
    if data.len() < 8 {
        return Err(invalid("datetimeoffset", data));
    }
    let split = data.len() - 2;
    let utc = decode_datetime2(&data[..split], scale)?;
    let minutes = i16::from_le_bytes([data[split], data[split + 1]]);
    let offset =
        FixedOffset::east_opt(minutes as i32 * 60).ok_or_else(|| invalid("datetimeoffset", data))?;
    Ok(DateTime::from_naive_utc_and_offset(utc, offset))
}
