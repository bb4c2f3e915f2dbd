//! Signed calendar durations used for interval lengths and gaps.

use std::fmt;
use std::ops::{Add, Neg};
use std::str::FromStr;

use chrono::{Months, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// A signed duration made of whole calendar months and whole days.
///
/// Months keep interval boundaries on the same day-of-month every year;
/// days give fixed-width intervals. Weeks and years are parsed into days
/// and months respectively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Span {
    months: i32,
    days: i64,
}

impl Span {
    /// The zero-length span.
    pub const ZERO: Self = Self { months: 0, days: 0 };

    /// A span of `n` days.
    pub fn days(n: i64) -> Self {
        Self { months: 0, days: n }
    }

    /// A span of `n` weeks (stored as `7 * n` days).
    pub fn weeks(n: i64) -> Self {
        Self::days(7 * n)
    }

    /// A span of `n` calendar months.
    pub fn months(n: i32) -> Self {
        Self { months: n, days: 0 }
    }

    /// A span of `n` calendar years (stored as `12 * n` months).
    pub fn years(n: i32) -> Self {
        Self::months(12 * n)
    }

    /// Returns the month component.
    pub fn month_part(&self) -> i32 {
        self.months
    }

    /// Returns the day component.
    pub fn day_part(&self) -> i64 {
        self.days
    }

    /// Returns `true` if both components are zero.
    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.days == 0
    }

    /// Returns `true` if the span is non-zero and has no negative component.
    pub fn is_positive(&self) -> bool {
        self.months >= 0 && self.days >= 0 && !self.is_zero()
    }

    /// Moves `t` back in time by this span: months first, then days.
    ///
    /// Month arithmetic clamps to the end of the month (Mar 31 minus one
    /// month is Feb 28/29). Returns `None` when the result is out of range.
    pub fn before(&self, t: NaiveDateTime) -> Option<NaiveDateTime> {
        let shifted = match self.months {
            0 => t,
            m if m > 0 => t.checked_sub_months(Months::new(m.unsigned_abs()))?,
            m => t.checked_add_months(Months::new(m.unsigned_abs()))?,
        };
        shifted.checked_sub_signed(TimeDelta::try_days(self.days)?)
    }

    /// Moves `t` forward in time by this span.
    pub fn after(&self, t: NaiveDateTime) -> Option<NaiveDateTime> {
        (-*self).before(t)
    }
}

impl Add for Span {
    type Output = Span;

    fn add(self, rhs: Span) -> Span {
        Span {
            months: self.months + rhs.months,
            days: self.days + rhs.days,
        }
    }
}

impl Neg for Span {
    type Output = Span;

    fn neg(self) -> Span {
        Span {
            months: -self.months,
            days: -self.days,
        }
    }
}

impl FromStr for Span {
    type Err = CalendarError;

    /// Parses one or more `<int><unit>` terms with an optional leading `-`,
    /// e.g. `"7d"`, `"2W"`, `"1M"`, `"1Y"`, `"-60d"` or `"1M10d"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let invalid = |reason: String| CalendarError::InvalidSpan {
            input: input.to_string(),
            reason,
        };

        let (negative, mut rest) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };
        if rest.is_empty() {
            return Err(invalid("empty duration".to_string()));
        }

        let mut span = Span::ZERO;
        let mut first = true;
        while !rest.is_empty() {
            let term_negative = !first && rest.starts_with('-');
            if term_negative {
                rest = &rest[1..];
            }
            first = false;
            let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            if digits == 0 {
                return Err(invalid(format!("expected a number at '{rest}'")));
            }
            let value: i64 = rest[..digits]
                .parse()
                .map_err(|_| invalid(format!("number '{}' is too large", &rest[..digits])))?;
            rest = &rest[digits..];

            let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
            let unit = &rest[..unit_len];
            rest = &rest[unit_len..];

            let too_large = || invalid(format!("{value}{unit} is too large"));
            let months = |factor: i64| {
                value
                    .checked_mul(factor)
                    .and_then(|m| i32::try_from(m).ok())
                    .ok_or_else(too_large)
            };
            let term = match unit {
                "d" | "D" | "day" | "days" => Span::days(value),
                "w" | "W" | "week" | "weeks" => {
                    Span::days(value.checked_mul(7).ok_or_else(too_large)?)
                }
                "M" | "month" | "months" => Span::months(months(1)?),
                "y" | "Y" | "year" | "years" => Span::months(months(12)?),
                "" => return Err(invalid(format!("missing unit after '{value}'"))),
                other => return Err(invalid(format!("unknown unit '{other}'"))),
            };
            span = span + if term_negative { -term } else { term };
        }

        Ok(if negative { -span } else { span })
    }
}

impl TryFrom<String> for Span {
    type Error = CalendarError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Span> for String {
    fn from(span: Span) -> Self {
        span.to_string()
    }
}

impl fmt::Display for Span {
    /// Writes the canonical form: `"1M"`, `"180d"`, `"-60d"`, `"1M10d"`,
    /// `"0d"`, `"1M-3d"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0d");
        }
        let all_non_positive = self.months <= 0 && self.days <= 0;
        if all_non_positive {
            f.write_str("-")?;
            let abs = -*self;
            return write_terms(f, abs.months, abs.days);
        }
        // Mixed signs: the positive term goes first, the negative one carries
        // its own sign.
        if self.days < 0 {
            return write!(f, "{}M{}d", self.months, self.days);
        }
        if self.months < 0 {
            return write!(f, "{}d{}M", self.days, self.months);
        }
        write_terms(f, self.months, self.days)
    }
}

fn write_terms(f: &mut fmt::Formatter<'_>, months: i32, days: i64) -> fmt::Result {
    if months != 0 {
        write!(f, "{months}M")?;
    }
    if days != 0 {
        write!(f, "{days}d")?;
    }
    Ok(())
}
