//! Recurring anchor date of a calendar.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// Maximum number of days in each month, Feb 29 included
/// (index 0 unused, index 1 = January, ..., index 12 = December).
pub(crate) const MAX_DAYS_PER_MONTH: [u8; 13] = [0, 31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Three-letter month abbreviations (index 0 = January).
const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Full English month names (index 0 = January).
const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// The recurring date every interval of a calendar is positioned against.
///
/// An anchor is either a full month-day (`"10-15"`) or a month alone
/// (`"Dec"`), in which case it falls on the first day of that month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Anchor {
    month: u8,
    day: Option<u8>,
}

impl Anchor {
    /// Creates an anchor on a fixed month and day.
    ///
    /// February 29 is accepted; see [`Anchor::date_in`] for how it is
    /// realized in non-leap years.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidAnchor`] if the month is outside
    /// 1..=12 or the day does not exist in that month.
    pub fn month_day(month: u8, day: u8) -> Result<Self, CalendarError> {
        validate_month(month, &format!("{month}-{day}"))?;
        let max_day = MAX_DAYS_PER_MONTH[month as usize];
        if !(1..=max_day).contains(&day) {
            return Err(CalendarError::InvalidAnchor {
                input: format!("{month}-{day}"),
                reason: format!("day must be 1..={max_day} for month {month}"),
            });
        }
        Ok(Self {
            month,
            day: Some(day),
        })
    }

    /// Creates a month-only anchor, falling on the first of the month.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidAnchor`] if the month is outside 1..=12.
    pub fn month(month: u8) -> Result<Self, CalendarError> {
        validate_month(month, &month.to_string())?;
        Ok(Self { month, day: None })
    }

    /// Returns the anchor month (1..=12).
    pub fn month_number(&self) -> u8 {
        self.month
    }

    /// Returns the anchor day, `1` for month-only anchors.
    pub fn day(&self) -> u8 {
        self.day.unwrap_or(1)
    }

    /// Returns `true` if the anchor was given as a month only.
    pub fn is_month_only(&self) -> bool {
        self.day.is_none()
    }

    /// Returns the anchor as a midnight timestamp in `year`.
    ///
    /// A February 29 anchor snaps to February 28 in non-leap years.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::DateOutOfRange`] if `year` is outside the
    /// range supported by the date library.
    pub fn date_in(&self, year: i32) -> Result<NaiveDateTime, CalendarError> {
        let month = u32::from(self.month);
        let day = u32::from(self.day());
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .or_else(|| {
                if month == 2 && day == 29 {
                    NaiveDate::from_ymd_opt(year, 2, 28)
                } else {
                    None
                }
            })
            .ok_or(CalendarError::DateOutOfRange { year })?;
        Ok(date.and_time(NaiveTime::MIN))
    }
}

fn validate_month(month: u8, input: &str) -> Result<(), CalendarError> {
    if !(1..=12).contains(&month) {
        return Err(CalendarError::InvalidAnchor {
            input: input.to_string(),
            reason: "month must be 1..=12".to_string(),
        });
    }
    Ok(())
}

fn month_from_name(name: &str) -> Option<u8> {
    let lower = name.to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .position(|full| *full == lower || (lower.len() == 3 && full.starts_with(&lower)))
        .map(|i| i as u8 + 1)
}

impl FromStr for Anchor {
    type Err = CalendarError;

    /// Parses `"MM-DD"`, `"M-D"` or a month name such as `"Dec"` or
    /// `"december"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = |reason: &str| CalendarError::InvalidAnchor {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        if let Some((month, day)) = s.split_once('-') {
            let month: u8 = month
                .parse()
                .map_err(|_| invalid("expected a numeric month before '-'"))?;
            let day: u8 = day
                .parse()
                .map_err(|_| invalid("expected a numeric day after '-'"))?;
            return Self::month_day(month, day);
        }

        month_from_name(s)
            .map(|month| Self { month, day: None })
            .ok_or_else(|| invalid("expected 'MM-DD' or a month name"))
    }
}

impl TryFrom<String> for Anchor {
    type Error = CalendarError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Anchor> for String {
    fn from(anchor: Anchor) -> Self {
        anchor.to_string()
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.day {
            Some(day) => write!(f, "{:02}-{:02}", self.month, day),
            None => f.write_str(MONTH_ABBR[self.month as usize - 1]),
        }
    }
}
