use std::fmt::{self, Display};
use std::str::FromStr;

use chrono::{DateTime, Datelike as _, Local, NaiveDate, Utc, Weekday};
use eyre::{eyre, Error};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::PayrollError;

/// No payroll data exists before this year.
pub const MIN_YEAR: i32 = 2020;
/// Periods may be generated at most this many months ahead of the clock.
pub const MAX_MONTHS_AHEAD: i32 = 2;

/// A billing month, identified by its `YYYY-MM` token.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Period, PayrollError> {
        if !(1..=12).contains(&month) {
            return Err(PayrollError::InvalidPeriod(format!(
                "{:04}-{:02}",
                year, month
            )));
        }
        Ok(Period { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn next(&self) -> Period {
        if self.month == 12 {
            Period {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Period {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Half-open UTC range covering the whole month.
    pub fn range(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), Error> {
        fn inner(period: Period) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
            let from = period.first_day()?.and_hms_opt(0, 0, 0)?.and_utc();
            let to = period.next().first_day()?.and_hms_opt(0, 0, 0)?.and_utc();
            Some((from, to))
        }
        inner(*self).ok_or_else(|| eyre!("Failed to calculate date range for {}", self))
    }

    /// How many times the given weekday occurs in this month.
    pub fn weekday_count(&self, weekday: Weekday) -> u32 {
        let mut count = 0;
        let Some(mut day) = self.first_day() else {
            return 0;
        };
        while day.month() == self.month {
            if day.weekday() == weekday {
                count += 1;
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        count
    }

    /// Rejects periods outside the allowed window: before the epoch year or
    /// more than [`MAX_MONTHS_AHEAD`] months after `now`.
    pub fn validate_window(&self, now: DateTime<Local>) -> Result<(), PayrollError> {
        if self.year < MIN_YEAR {
            return Err(PayrollError::InvalidPeriod(format!(
                "{} is before {}-01",
                self, MIN_YEAR
            )));
        }
        let current = self.year * 12 + self.month as i32 - 1;
        let horizon = now.year() * 12 + now.month() as i32 - 1 + MAX_MONTHS_AHEAD;
        if current > horizon {
            return Err(PayrollError::InvalidPeriod(format!(
                "{} is too far in the future",
                self
            )));
        }
        Ok(())
    }

    fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = PayrollError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let bytes = token.as_bytes();
        let well_formed = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);
        if !well_formed {
            return Err(PayrollError::InvalidPeriod(token.to_string()));
        }
        let year = token[..4]
            .parse()
            .map_err(|_| PayrollError::InvalidPeriod(token.to_string()))?;
        let month = token[5..]
            .parse()
            .map_err(|_| PayrollError::InvalidPeriod(token.to_string()))?;
        Period::new(year, month)
    }
}

impl Serialize for Period {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D>(deserializer: D) -> Result<Period, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Weekday};

    use super::*;

    #[test]
    fn test_parse() {
        let period: Period = "2024-03".parse().unwrap();
        assert_eq!(2024, period.year());
        assert_eq!(3, period.month());

        for token in [
            "2024-3", "2024/03", "202403", "2024-13", "2024-00", "24-03", "2024-03 ", "garbage",
        ] {
            assert!(token.parse::<Period>().is_err(), "accepted {:?}", token);
        }
    }

    #[test]
    fn test_display_round_trip() {
        let period: Period = "2024-09".parse().unwrap();
        assert_eq!("2024-09", period.to_string());
    }

    #[test]
    fn test_range() {
        let period: Period = "2024-02".parse().unwrap();
        let (from, to) = period.range().unwrap();
        assert_eq!(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(), from);
        assert_eq!(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(), to);

        let december: Period = "2023-12".parse().unwrap();
        let (_, to) = december.range().unwrap();
        assert_eq!(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), to);
    }

    #[test]
    fn test_weekday_count() {
        // February 2024 has 29 days and starts on a Thursday.
        let period: Period = "2024-02".parse().unwrap();
        assert_eq!(5, period.weekday_count(Weekday::Thu));
        assert_eq!(4, period.weekday_count(Weekday::Mon));
    }

    #[test]
    fn test_window() {
        let now = Local.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();

        let ok: Period = "2024-05".parse().unwrap();
        assert!(ok.validate_window(now).is_ok());

        let too_far: Period = "2024-06".parse().unwrap();
        assert!(matches!(
            too_far.validate_window(now),
            Err(PayrollError::InvalidPeriod(_))
        ));

        let too_old: Period = "2019-12".parse().unwrap();
        assert!(matches!(
            too_old.validate_window(now),
            Err(PayrollError::InvalidPeriod(_))
        ));

        let past: Period = "2021-07".parse().unwrap();
        assert!(past.validate_window(now).is_ok());
    }
}
