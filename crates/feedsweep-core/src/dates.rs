//! Time window helpers for the `updatedAfter` cutoff

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::{Error, Result};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a user supplied date into UTC
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]` and `YYYY-MM-DD`. Values
/// without an offset are local time.
pub fn parse_to_utc(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| Error::InvalidDate(input.to_string()))?;

    local_to_utc(naive).ok_or_else(|| Error::InvalidDate(input.to_string()))
}

/// Midnight at the start of the day before `now`, in UTC
pub fn start_of_yesterday(now: DateTime<Local>) -> DateTime<Utc> {
    let yesterday = now.date_naive() - Duration::days(1);
    let midnight = yesterday.and_time(NaiveTime::MIN);
    local_to_utc(midnight).unwrap_or_else(|| (now - Duration::days(1)).with_timezone(&Utc))
}

pub fn hours_ago(hours: u32, now: DateTime<Local>) -> DateTime<Utc> {
    (now - Duration::hours(i64::from(hours))).with_timezone(&Utc)
}

/// Resolve a local wall-clock time, taking the earlier instant on DST overlap
fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
