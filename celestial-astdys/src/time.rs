//! Modified Julian Date conversion.
//!
//! AstDyS catalogs stamp their osculating elements with an MJD epoch, the
//! number of days since 1858-11-17T00:00:00. Fractional days carry the time
//! of day down to the microsecond.

use crate::error::{Error, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Julian Date of MJD 0.
pub const MJD_ZERO_POINT: f64 = 2_400_000.5;

/// Output format of [`mjd_to_string`].
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const MICROSECONDS_PER_DAY: f64 = 86_400_000_000.0;

fn mjd_epoch() -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1858, 11, 17)
        .map(|date| date.and_time(NaiveTime::MIN))
        .ok_or_else(|| Error::Validation("MJD epoch is not representable".into()))
}

/// Convert an MJD to a calendar date and time.
///
/// # Errors
/// Returns [`Error::Validation`] for NaN/infinite input or an MJD whose date
/// falls outside the representable calendar range (roughly ±262,000 years).
pub fn mjd_to_datetime(mjd: f64) -> Result<NaiveDateTime> {
    if !mjd.is_finite() {
        return Err(Error::Validation(format!("MJD must be finite, got {}", mjd)));
    }
    let offset = Duration::microseconds((mjd * MICROSECONDS_PER_DAY).round() as i64);
    mjd_epoch()?
        .checked_add_signed(offset)
        .ok_or_else(|| Error::Validation(format!("MJD {} is outside the calendar range", mjd)))
}

/// Convert an MJD to a `YYYY-MM-DD HH:MM:SS` string. Sub-second parts are truncated.
pub fn mjd_to_string(mjd: f64) -> Result<String> {
    Ok(mjd_to_datetime(mjd)?.format(DATE_FORMAT).to_string())
}
