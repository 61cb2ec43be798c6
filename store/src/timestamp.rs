use std::fmt;

use bincode::{Decode, Encode};
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::errors::StoreError;

/// Format of the canvas history exports: an optional fractional second of
/// variable precision, always suffixed with a literal "UTC".
const HISTORY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f UTC";

/// Microseconds since the Unix epoch, UTC.
///
/// The only time representation used past the parse boundaries; calendar
/// datetimes are converted exactly once, where they enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_micros(micros: i64) -> Self {
        Timestamp(micros)
    }

    pub const fn as_micros(self) -> i64 {
        self.0
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Timestamp(dt.timestamp_micros())
    }

    /// Parses a timestamp string as found in the canvas history exports,
    /// e.g. `2022-04-04 00:53:51.577 UTC`.
    pub fn parse_history(value: &str) -> Result<Self, StoreError> {
        let dt = NaiveDateTime::parse_from_str(value, HISTORY_FORMAT).map_err(|source| {
            StoreError::TimestampParse {
                value: value.to_string(),
                source,
            }
        })?;
        Ok(Self::from_datetime(dt.and_utc()))
    }

    /// Offsets by a (possibly fractional) number of seconds, rounded to the
    /// nearest microsecond.
    pub fn add_seconds(self, seconds: f64) -> Self {
        Timestamp(self.0 + (seconds * 1e6).round() as i64)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Timestamp;

    #[test]
    fn parses_millisecond_precision() {
        let ts = Timestamp::parse_history("2022-04-04 00:53:51.577 UTC").unwrap();
        assert_eq!(ts.as_micros() % 1_000_000, 577_000);
    }

    #[test]
    fn parses_whole_seconds() {
        let ts = Timestamp::parse_history("2022-04-01 12:00:00 UTC").unwrap();
        assert_eq!(ts.as_micros() % 1_000_000, 0);
    }

    #[test]
    fn fractional_precision_is_variable() {
        let coarse = Timestamp::parse_history("2022-04-01 12:00:00.5 UTC").unwrap();
        let fine = Timestamp::parse_history("2022-04-01 12:00:00.500 UTC").unwrap();
        assert_eq!(coarse, fine);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Timestamp::parse_history("not a timestamp").is_err());
        assert!(Timestamp::parse_history("2022-04-01T12:00:00Z").is_err());
    }

    #[test]
    fn add_seconds_rounds_to_micros() {
        let ts = Timestamp::from_micros(1_000_000);
        assert_eq!(ts.add_seconds(1.5).as_micros(), 2_500_000);
        assert_eq!(ts.add_seconds(-0.25).as_micros(), 750_000);
    }
}
