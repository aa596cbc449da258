//! `timestamp with time zone`, stored as microseconds since 2000-01-01 UTC.

use std::fmt;

/// Seconds between the Unix epoch and 2000-01-01 00:00:00 UTC.
pub const PG_EPOCH_UNIX_SECS: i64 = 946_684_800;

const MICROS_PER_SEC: i64 = 1_000_000;
const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SEC;

/// A `timestamptz` value.
///
/// `i64::MAX` and `i64::MIN` are the `infinity` and `-infinity` sentinels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct TimestampTz(i64);

impl TimestampTz {
    pub const INFINITY: Self = Self(i64::MAX);
    pub const NEG_INFINITY: Self = Self(i64::MIN);

    /// From microseconds since 2000-01-01 UTC.
    pub const fn from_pg_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// From microseconds since the Unix epoch, `None` on overflow.
    pub fn from_unix_micros(micros: i64) -> Option<Self> {
        micros
            .checked_sub(PG_EPOCH_UNIX_SECS * MICROS_PER_SEC)
            .map(Self)
    }

    /// Microseconds since 2000-01-01 UTC.
    pub const fn pg_micros(self) -> i64 {
        self.0
    }

    /// Microseconds since the Unix epoch, `None` on overflow.
    pub fn unix_micros(self) -> Option<i64> {
        self.0.checked_add(PG_EPOCH_UNIX_SECS * MICROS_PER_SEC)
    }

    pub const fn is_finite(self) -> bool {
        self.0 != i64::MAX && self.0 != i64::MIN
    }
}

impl fmt::Display for TimestampTz {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            i64::MAX => return f.write_str("infinity"),
            i64::MIN => return f.write_str("-infinity"),
            _ => {}
        }
        let days_since_pg_epoch = self.0.div_euclid(MICROS_PER_DAY);
        let micros_of_day = self.0.rem_euclid(MICROS_PER_DAY);
        let (year, month, day) = civil_from_days(days_since_pg_epoch + PG_EPOCH_UNIX_SECS / 86_400);

        let secs = micros_of_day / MICROS_PER_SEC;
        let frac = micros_of_day % MICROS_PER_SEC;
        let (hh, mm, ss) = (secs / 3600, (secs / 60) % 60, secs % 60);

        let (shown_year, era) = if year <= 0 {
            (1 - year, " BC")
        } else {
            (year, "")
        };
        write!(
            f,
            "{shown_year:04}-{month:02}-{day:02} {hh:02}:{mm:02}:{ss:02}"
        )?;
        if frac != 0 {
            let digits = format!("{frac:06}");
            f.write_str(".")?;
            f.write_str(digits.trim_end_matches('0'))?;
        }
        write!(f, "+00{era}")
    }
}

/// Days since the Unix epoch to a proleptic Gregorian (year, month, day).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pg_epoch_renders() {
        assert_eq!(
            TimestampTz::from_pg_micros(0).to_string(),
            "2000-01-01 00:00:00+00"
        );
    }

    #[test]
    fn unix_conversion() {
        let ts = TimestampTz::from_unix_micros(0).unwrap();
        assert_eq!(ts.to_string(), "1970-01-01 00:00:00+00");
        assert_eq!(ts.unix_micros(), Some(0));
        assert_eq!(ts.pg_micros(), -PG_EPOCH_UNIX_SECS * MICROS_PER_SEC);
    }

    #[test]
    fn fractional_seconds_are_trimmed() {
        // 2024-02-29 12:34:56.5 UTC
        let unix = 1_709_210_096_500_000;
        let ts = TimestampTz::from_unix_micros(unix).unwrap();
        assert_eq!(ts.to_string(), "2024-02-29 12:34:56.5+00");
    }

    #[test]
    fn before_epoch() {
        let ts = TimestampTz::from_pg_micros(-1);
        assert_eq!(ts.to_string(), "1999-12-31 23:59:59.999999+00");
    }

    #[test]
    fn infinities() {
        assert_eq!(TimestampTz::INFINITY.to_string(), "infinity");
        assert_eq!(TimestampTz::NEG_INFINITY.to_string(), "-infinity");
        assert!(!TimestampTz::INFINITY.is_finite());
        assert!(TimestampTz::from_pg_micros(5).is_finite());
    }
}
