//! Date utilities

use crate::{Error, Result};
use chrono::{Duration, NaiveDate, Utc};

/// Longest date window a single run may cover
pub const MAX_WINDOW_DAYS: u32 = 14;

/// Today's date in UTC
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse an ISO `YYYY-MM-DD` date
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
        Error::InvalidInput(format!("date must be YYYY-MM-DD, got {:?}: {}", raw, e))
    })
}

/// Consecutive dates starting at `start`
///
/// `days` is clamped to 1..=MAX_WINDOW_DAYS.
pub fn date_window(start: NaiveDate, days: u32) -> Vec<NaiveDate> {
    let days = days.clamp(1, MAX_WINDOW_DAYS);
    (0..days)
        .map(|offset| start + Duration::days(i64::from(offset)))
        .collect()
}
