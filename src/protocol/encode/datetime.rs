//! Date and time encoders.
//!
//! Legacy types count days from 1900-01-01:
//! - datetime: i32 days, u32 ticks of 1/300 s since midnight
//! - smalldatetime: u16 days, u16 minutes since midnight
//!
//! Extended types count days from 0001-01-01 in 3 bytes and store the time
//! of day as a count of 10^-scale second units in 3 to 5 bytes:
//! - date: days
//! - time(s): time
//! - datetime2(s): time, days
//! - datetimeoffset(s): UTC time, UTC days, i16 offset minutes

use crate::error::{Error, Result};
use crate::protocol::buffer::WriteBuffer;
use crate::protocol::types::{time_len, MAX_TIME_SCALE};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Ticks per second for datetime.
pub const DATETIME_TICKS_PER_SECOND: u32 = 300;
/// Ticks per day for datetime.
pub const DATETIME_TICKS_PER_DAY: u32 = DATETIME_TICKS_PER_SECOND * 86_400;
/// Largest offset accepted by datetimeoffset, in minutes.
pub const MAX_OFFSET_MINUTES: i32 = 14 * 60;

pub(crate) fn base_1900() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or_default()
}

pub(crate) fn datetime_min() -> NaiveDate {
    NaiveDate::from_ymd_opt(1753, 1, 1).unwrap_or_default()
}

pub(crate) fn smalldatetime_max() -> NaiveDate {
    NaiveDate::from_ymd_opt(2079, 6, 6).unwrap_or_default()
}

pub(crate) fn year_9999_max() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or_default()
}

/// Days since 0001-01-01.
pub(crate) fn days_from_ce(date: NaiveDate) -> u32 {
    (date.num_days_from_ce() - 1) as u32
}

/// Nanoseconds within the second, folding a leap second into the last one.
fn subsec_nanos(time: NaiveTime) -> u32 {
    time.nanosecond().min(999_999_999)
}

/// Milliseconds since midnight, rounding sub-millisecond nanos half up.
///
/// May return 86,400,000 when the time rounds up to the next midnight.
pub fn ms_of_day(time: NaiveTime) -> u32 {
    time.num_seconds_from_midnight() * 1000 + (subsec_nanos(time) + 500_000) / 1_000_000
}

/// Quantize milliseconds since midnight to datetime ticks.
///
/// Each tick is 10/3 ms. The result reaches `DATETIME_TICKS_PER_DAY` when the
/// value rounds up to the next midnight.
pub fn datetime_ticks(ms_of_day: u32) -> u32 {
    (3 * ms_of_day + 5) / 10
}

/// Split a datetime into (days since 1900-01-01, ticks since midnight).
pub fn datetime_parts(value: NaiveDateTime, column: &str) -> Result<(i32, u32)> {
    let mut date = value.date();
    let mut ticks = datetime_ticks(ms_of_day(value.time()));
    if ticks >= DATETIME_TICKS_PER_DAY {
        ticks -= DATETIME_TICKS_PER_DAY;
        date = date
            .succ_opt()
            .ok_or_else(|| Error::out_of_range(column, value))?;
    }
    if date < datetime_min() || date > year_9999_max() {
        return Err(Error::out_of_range(column, value));
    }
    let days = (date - base_1900()).num_days() as i32;
    Ok((days, ticks))
}

/// Encode a datetime.
pub fn encode_datetime(value: NaiveDateTime, column: &str, buf: &mut WriteBuffer) -> Result<()> {
    let (days, ticks) = datetime_parts(value, column)?;
    buf.write_u8(8);
    buf.write_i32_le(days);
    buf.write_u32_le(ticks);
    Ok(())
}

/// Split a smalldatetime into (days since 1900-01-01, minutes since midnight).
///
/// Values with 29.999 seconds or more round up to the next minute.
pub fn smalldatetime_parts(value: NaiveDateTime, column: &str) -> Result<(u16, u16)> {
    let ms = ms_of_day(value.time());
    let mut minutes = ms / 60_000;
    if ms % 60_000 >= 29_999 {
        minutes += 1;
    }
    let mut date = value.date();
    if minutes >= 1440 {
        minutes -= 1440;
        date = date
            .succ_opt()
            .ok_or_else(|| Error::out_of_range(column, value))?;
    }
    if date < base_1900() || date > smalldatetime_max() {
        return Err(Error::out_of_range(column, value));
    }
    let days = (date - base_1900()).num_days() as u16;
    Ok((days, minutes as u16))
}

/// Encode a smalldatetime.
pub fn encode_smalldatetime(
    value: NaiveDateTime,
    column: &str,
    buf: &mut WriteBuffer,
) -> Result<()> {
    let (days, minutes) = smalldatetime_parts(value, column)?;
    buf.write_u8(4);
    buf.write_u16_le(days);
    buf.write_u16_le(minutes);
    Ok(())
}

/// Time of day in units of 10^-scale seconds.
///
/// Fractional digits beyond `scale` are rounded half up. Returns the unit
/// count and whether the value rounded up to the next midnight.
pub fn time_units(time: NaiveTime, scale: u8) -> (u64, bool) {
    let scale = scale.min(MAX_TIME_SCALE) as u32;
    let per_second = 10u64.pow(scale);
    let unit_nanos = 10u64.pow(9 - scale);
    let fraction = (subsec_nanos(time) as u64 + unit_nanos / 2) / unit_nanos;
    let units = time.num_seconds_from_midnight() as u64 * per_second + fraction;
    let per_day = 86_400 * per_second;
    if units >= per_day {
        (units - per_day, true)
    } else {
        (units, false)
    }
}

fn write_time(units: u64, scale: u8, buf: &mut WriteBuffer) {
    buf.write_uint_le(units, time_len(scale));
}

fn write_date(date: NaiveDate, buf: &mut WriteBuffer) {
    buf.write_uint_le(days_from_ce(date) as u64, 3);
}

fn check_date(date: NaiveDate, column: &str) -> Result<()> {
    if date.year() < 1 || date > year_9999_max() {
        return Err(Error::out_of_range(column, date));
    }
    Ok(())
}

/// Encode a date.
pub fn encode_date(value: NaiveDate, column: &str, buf: &mut WriteBuffer) -> Result<()> {
    check_date(value, column)?;
    buf.write_u8(3);
    write_date(value, buf);
    Ok(())
}

/// Encode a time. Values rounding up to midnight wrap to 00:00:00.
pub fn encode_time(value: NaiveTime, scale: u8, buf: &mut WriteBuffer) {
    let (units, _) = time_units(value, scale);
    buf.write_u8(time_len(scale) as u8);
    write_time(units, scale, buf);
}

/// Encode a datetime2. Values rounding up to midnight carry into the next day.
pub fn encode_datetime2(
    value: NaiveDateTime,
    scale: u8,
    column: &str,
    buf: &mut WriteBuffer,
) -> Result<()> {
    let (units, date) = datetime2_parts(value, scale, column)?;
    buf.write_u8((time_len(scale) + 3) as u8);
    write_time(units, scale, buf);
    write_date(date, buf);
    Ok(())
}

fn datetime2_parts(value: NaiveDateTime, scale: u8, column: &str) -> Result<(u64, NaiveDate)> {
    let (units, next_day) = time_units(value.time(), scale);
    let date = if next_day {
        value
            .date()
            .succ_opt()
            .ok_or_else(|| Error::out_of_range(column, value))?
    } else {
        value.date()
    };
    check_date(date, column).map_err(|_| Error::out_of_range(column, value))?;
    Ok((units, date))
}

/// Encode a datetimeoffset as UTC date and time plus the offset in minutes.
pub fn encode_datetimeoffset(
    value: DateTime<FixedOffset>,
    scale: u8,
    column: &str,
    buf: &mut WriteBuffer,
) -> Result<()> {
    let offset_seconds = value.offset().local_minus_utc();
    let offset_minutes = offset_seconds / 60;
    if offset_seconds % 60 != 0 || offset_minutes.abs() > MAX_OFFSET_MINUTES {
        return Err(Error::out_of_range(column, value));
    }
    let (units, date) = datetime2_parts(value.naive_utc(), scale, column)?;
    buf.write_u8((time_len(scale) + 5) as u8);
    write_time(units, scale, buf);
    write_date(date, buf);
    buf.write_i16_le(offset_minutes as i16);
    Ok(())
}
