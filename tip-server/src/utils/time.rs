//! Time helpers (business time zone)
//!
//! Date → timestamp conversion happens at the API layer;
//! the engine only sees `i64` Unix millis.

use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// Parse a date string (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// Parse a time zone name (e.g. `Europe/Madrid`)
pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| AppError::validation(format!("Unknown time zone: {}", name)))
}

/// Day start (00:00:00) → Unix millis (business time zone)
///
/// DST gap fallback: if local midnight does not exist, use UTC midnight.
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// Day end → next day 00:00:00 in Unix millis (business time zone)
///
/// Callers use `< end` (exclusive).
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    day_start_millis(next_day, tz)
}

/// Unix millis → ISO day key (`YYYY-MM-DD`) in the business time zone
pub fn date_key(millis: i64, tz: Tz) -> String {
    match tz.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => String::from("1970-01-01"),
    }
}
