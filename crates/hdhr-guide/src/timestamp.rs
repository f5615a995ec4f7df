//! XMLTV timestamp formatting.

use std::fmt::Display;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone};

/// XMLTV date format: `YYYYMMDDHHMMSS ±HHMM`.
const XMLTV_FORMAT: &str = "%Y%m%d%H%M%S %z";

/// Converts unix seconds to a zoned datetime.
///
/// # Errors
///
/// Returns an error if `epoch` is outside chrono's representable range.
pub fn to_zoned<Tz: TimeZone>(tz: &Tz, epoch: i64) -> Result<DateTime<Tz>> {
    tz.timestamp_opt(epoch, 0)
        .single()
        .with_context(|| format!("timestamp out of range: {epoch}"))
}

/// Formats unix seconds as an XMLTV timestamp in `tz`.
///
/// The offset is the one in effect at that instant, so programs on either
/// side of a DST change carry different offsets.
///
/// # Errors
///
/// Returns an error if `epoch` is outside chrono's representable range.
pub fn xmltv_timestamp<Tz>(tz: &Tz, epoch: i64) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    Ok(to_zoned(tz, epoch)?.format(XMLTV_FORMAT).to_string())
}

/// Calendar date of unix seconds in UTC.
#[must_use]
pub fn utc_date(epoch: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(epoch, 0).map(|dt| dt.date_naive())
}
