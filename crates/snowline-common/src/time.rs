//! Timestamp handling for satellite observations.
//!
//! Observation files carry their acquisition time in the filename as
//! `_YYYYMMDDTHHMMSS_`; persisted state stores it as unix seconds.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

use crate::error::{SnowlineError, SnowlineResult};

const FILENAME_DATETIME_FORMAT: &str = "%Y%m%dT%H%M%S";

fn filename_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_(?P<datetime>\d{8}T\d{6})_").expect("static regex"))
}

/// Extract the first `_YYYYMMDDTHHMMSS_` datetime from a filename or path.
///
/// The value is interpreted as UTC.
pub fn timestamp_from_filename(filename: &str) -> SnowlineResult<DateTime<Utc>> {
    let captures = filename_regex().captures(filename).ok_or_else(|| {
        SnowlineError::InvalidTimestamp(format!("no datetime found in {}", filename))
    })?;

    let datestr = &captures["datetime"];
    let naive = NaiveDateTime::parse_from_str(datestr, FILENAME_DATETIME_FORMAT).map_err(|e| {
        SnowlineError::InvalidTimestamp(format!("{} in {}: {}", datestr, filename, e))
    })?;

    Ok(Utc.from_utc_datetime(&naive))
}

/// Convert a timestamp to fractional unix seconds.
pub fn timestamp_to_unix(ts: &DateTime<Utc>) -> f64 {
    ts.timestamp() as f64 + f64::from(ts.timestamp_subsec_nanos()) / 1e9
}

/// Convert fractional unix seconds back to a UTC timestamp.
pub fn timestamp_from_unix(seconds: f64) -> SnowlineResult<DateTime<Utc>> {
    if !seconds.is_finite() {
        return Err(SnowlineError::InvalidTimestamp(seconds.to_string()));
    }

    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;

    DateTime::from_timestamp(whole as i64, nanos)
        .ok_or_else(|| SnowlineError::InvalidTimestamp(seconds.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_timestamp_from_filename() {
        let ts = timestamp_from_filename(
            "L2SNOW_reproj_idepix_subset_S3A_OL_1_EFR____20180102T100908_20180102T101208_0179.nc",
        )
        .unwrap();
        assert_eq!(ts.year(), 2018);
        assert_eq!(ts.month(), 1);
        assert_eq!(ts.day(), 2);
        assert_eq!(ts.hour(), 10);
        assert_eq!(ts.minute(), 9);
        assert_eq!(ts.second(), 8);
    }

    #[test]
    fn test_timestamp_from_filename_missing() {
        let result = timestamp_from_filename("snowmap.nc");
        assert!(matches!(result, Err(SnowlineError::InvalidTimestamp(_))));
    }

    #[test]
    fn test_timestamp_from_filename_invalid_date() {
        let result = timestamp_from_filename("obs_20181399T250000_x.nc");
        assert!(matches!(result, Err(SnowlineError::InvalidTimestamp(_))));
    }

    #[test]
    fn test_unix_conversion() {
        let ts = Utc.with_ymd_and_hms(2019, 12, 14, 9, 35, 35).unwrap();
        let secs = timestamp_to_unix(&ts);
        assert_eq!(secs, 1576316135.0);
        assert_eq!(timestamp_from_unix(secs).unwrap(), ts);
        assert!(timestamp_from_unix(f64::NAN).is_err());
    }
}
