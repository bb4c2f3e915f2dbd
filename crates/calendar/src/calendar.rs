//! Calendar construction: an anchor plus an ordered list of intervals.

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::anchor::Anchor;
use crate::error::CalendarError;
use crate::interval::{IntervalSpec, Role};
use crate::span::Span;

/// First year of the Gregorian cycle over which calendars are measured.
const CYCLE_START: i32 = 2001;

/// Years after which the Gregorian leap pattern repeats.
const GREGORIAN_CYCLE: i32 = 400;

/// Shortest calendar year in days.
const MIN_YEAR_DAYS: i64 = 365;

/// An anchor-relative interval calendar.
///
/// Intervals are placed backward from the anchor in insertion order: the
/// first interval ends at the anchor (shifted back by its own gap), every
/// following interval ends where the previous one starts (shifted back by its
/// gap). Lag labels follow the same order, so the first interval is `t-0`.
///
/// # Example
///
/// ```
/// use almanac_calendar::{Anchor, Calendar, Role, Span};
///
/// let mut calendar = Calendar::new("12-31".parse::<Anchor>().unwrap());
/// calendar
///     .add_interval("target", Role::Target, Span::days(7), Span::ZERO)
///     .unwrap();
/// let realized = calendar.realize_year(2020).unwrap();
/// assert_eq!(realized.intervals()[0].to_string(), "(2020-12-24, 2020-12-31]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CalendarCode", into = "CalendarCode")]
pub struct Calendar {
    anchor: Anchor,
    allow_overlap: bool,
    specs: Vec<IntervalSpec>,
}

/// Serialized form of a [`Calendar`].
#[derive(Serialize, Deserialize)]
struct CalendarCode {
    anchor: Anchor,
    #[serde(default)]
    allow_overlap: bool,
    #[serde(default)]
    intervals: Vec<IntervalSpec>,
}

impl TryFrom<CalendarCode> for Calendar {
    type Error = CalendarError;

    fn try_from(code: CalendarCode) -> Result<Self, Self::Error> {
        let mut calendar = Calendar::new(code.anchor).with_allow_overlap(code.allow_overlap);
        for spec in code.intervals {
            calendar.add_interval(spec.name(), spec.role(), spec.length(), spec.gap())?;
        }
        Ok(calendar)
    }
}

impl From<Calendar> for CalendarCode {
    fn from(calendar: Calendar) -> Self {
        Self {
            anchor: calendar.anchor,
            allow_overlap: calendar.allow_overlap,
            intervals: calendar.specs,
        }
    }
}

impl Calendar {
    /// Creates an empty calendar on `anchor`.
    ///
    /// Year overlap is disallowed by default.
    pub fn new(anchor: Anchor) -> Self {
        Self {
            anchor,
            allow_overlap: false,
            specs: Vec::new(),
        }
    }

    /// Allows or forbids consecutive realized years from sharing time.
    pub fn with_allow_overlap(mut self, allow_overlap: bool) -> Self {
        self.allow_overlap = allow_overlap;
        self
    }

    /// Appends an interval after the previously added ones.
    ///
    /// # Errors
    ///
    /// - [`CalendarError::DuplicateName`] if `name` is already used.
    /// - [`CalendarError::NonPositiveLength`] if `length` is not strictly
    ///   positive.
    pub fn add_interval(
        &mut self,
        name: impl Into<String>,
        role: Role,
        length: Span,
        gap: Span,
    ) -> Result<&mut Self, CalendarError> {
        let name = name.into();
        if self.specs.iter().any(|s| s.name() == name) {
            return Err(CalendarError::DuplicateName { name });
        }
        self.specs.push(IntervalSpec::new(name, role, length, gap)?);
        Ok(self)
    }

    /// Appends `n` intervals of the same role, length and gap.
    ///
    /// Names are generated as `"{role}_{k}"` where `k` counts the intervals
    /// of that role, starting at 1.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Calendar::add_interval`]; intervals added before
    /// the failing one are kept.
    pub fn add_intervals(
        &mut self,
        role: Role,
        length: Span,
        gap: Span,
        n: usize,
    ) -> Result<&mut Self, CalendarError> {
        for _ in 0..n {
            let position = self.specs.iter().filter(|s| s.role() == role).count() + 1;
            self.add_interval(format!("{role}_{position}"), role, length, gap)?;
        }
        Ok(self)
    }

    /// Keeps all targets and only the first `max_lag` precursors.
    ///
    /// Precursor order is insertion order, so the precursors kept are the
    /// ones closest to the anchor when gaps are non-negative.
    pub fn set_max_lag(&mut self, max_lag: usize) -> &mut Self {
        let mut seen = 0;
        let before = self.specs.len();
        self.specs.retain(|s| match s.role() {
            Role::Target => true,
            Role::Precursor => {
                seen += 1;
                seen <= max_lag
            }
        });
        debug!(
            max_lag,
            removed = before - self.specs.len(),
            "trimmed precursor intervals"
        );
        self
    }

    /// Returns the anchor.
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Returns `true` if consecutive realized years may share time.
    pub fn allow_overlap(&self) -> bool {
        self.allow_overlap
    }

    /// Returns the interval definitions in insertion order.
    pub fn specs(&self) -> &[IntervalSpec] {
        &self.specs
    }

    /// Returns the number of intervals.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns `true` if the calendar has no intervals.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Returns the number of target intervals.
    pub fn n_targets(&self) -> usize {
        self.specs.iter().filter(|s| s.role().is_target()).count()
    }

    /// Returns the number of precursor intervals.
    pub fn n_precursors(&self) -> usize {
        self.len() - self.n_targets()
    }

    /// Returns, per interval, its `(right, left)` offsets measured backward
    /// from the anchor.
    ///
    /// `right_i = sum(length_j + gap_j for j < i) + gap_i` and
    /// `left_i = right_i + length_i`.
    pub fn offsets(&self) -> Vec<(Span, Span)> {
        let mut cursor = Span::ZERO;
        self.specs
            .iter()
            .map(|spec| {
                let right = cursor + spec.gap();
                let left = right + spec.length();
                cursor = left;
                (right, left)
            })
            .collect()
    }

    /// Smallest step, in anchor years, at which realizations never share
    /// time (at least 1).
    ///
    /// Realizations `k` years apart are compared over a full Gregorian leap
    /// cycle, so month-based intervals and leap days are measured as they
    /// actually fall: a calendar of twelve 1-month intervals steps by one
    /// year, a calendar of 366 days steps by two.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::DateOutOfRange`] if the intervals reach
    /// outside the supported date range.
    pub fn cycle_years(&self) -> Result<usize, CalendarError> {
        let Some((earliest, latest)) = self.extent(CYCLE_START)? else {
            return Ok(1);
        };
        // a step of `max_step` years always clears the extent
        let max_step = (latest - earliest).num_days() / MIN_YEAR_DAYS + 2;
        let max_step = usize::try_from(max_step).unwrap_or(1);
        let lead = i32::try_from(max_step).unwrap_or(i32::MAX);

        let first = CYCLE_START.saturating_sub(lead);
        let extents = (first..CYCLE_START + GREGORIAN_CYCLE)
            .map(|year| self.extent(year))
            .collect::<Result<Vec<_>, _>>()?;
        let offset = extents.len() - GREGORIAN_CYCLE as usize;

        let step = (1..max_step)
            .find(|&k| {
                (offset..extents.len()).all(|i| match (extents[i - k], extents[i]) {
                    (Some((_, before)), Some((after, _))) => before <= after,
                    _ => true,
                })
            })
            .unwrap_or(max_step);
        Ok(step)
    }

    /// Whole years, rounded up, between the anchor and the farthest
    /// interval boundary.
    pub(crate) fn reach_years(&self) -> Result<i32, CalendarError> {
        let anchor = self.anchor.date_in(CYCLE_START)?;
        let Some((earliest, latest)) = self.extent(CYCLE_START)? else {
            return Ok(0);
        };
        let days = (anchor - earliest).num_days().abs().max((latest - anchor).num_days().abs());
        Ok(i32::try_from(days / MIN_YEAR_DAYS + 1).unwrap_or(i32::MAX))
    }

    /// Earliest interval start and latest interval end in `year`.
    fn extent(&self, year: i32) -> Result<Option<(NaiveDateTime, NaiveDateTime)>, CalendarError> {
        let realized = self.realize_year(year)?;
        Ok(realized.earliest_left().zip(realized.latest_right()))
    }

    /// Encodes the calendar as a JSON string.
    ///
    /// The encoding is stable and is what resampled data records as its
    /// calendar provenance.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidCode`] if serialization fails.
    pub fn to_code(&self) -> Result<String, CalendarError> {
        serde_json::to_string(self).map_err(|e| CalendarError::InvalidCode {
            reason: e.to_string(),
        })
    }

    /// Rebuilds a calendar from [`Calendar::to_code`] output.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidCode`] if the string is not a valid
    /// encoding, or any interval validation error.
    pub fn from_code(code: &str) -> Result<Self, CalendarError> {
        let raw: CalendarCode = serde_json::from_str(code).map_err(|e| {
            CalendarError::InvalidCode {
                reason: e.to_string(),
            }
        })?;
        Calendar::try_from(raw)
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Calendar(anchor={}, allow_overlap={}, n_targets={}, n_precursors={}",
            self.anchor,
            self.allow_overlap,
            self.n_targets(),
            self.n_precursors()
        )?;
        let lengths: HashSet<Span> = self.specs.iter().map(IntervalSpec::length).collect();
        if lengths.len() == 1 {
            if let Some(length) = lengths.iter().next() {
                write!(f, ", length={length}")?;
            }
        }
        f.write_str(")")
    }
}

/// Builds a calendar of equally long day-based intervals.
///
/// `n_targets` target intervals come first, followed by the precursors. When
/// `n_precursors` is `None`, precursors are added until the calendar covers
/// one year: `365 / length_days` intervals in total, never fewer than the
/// targets.
///
/// # Errors
///
/// Returns [`CalendarError::NonPositiveLength`] if `length_days` is zero.
pub fn daily_calendar(
    anchor: Anchor,
    length_days: u32,
    n_targets: usize,
    n_precursors: Option<usize>,
) -> Result<Calendar, CalendarError> {
    preset(
        anchor,
        Span::days(i64::from(length_days)),
        n_targets,
        n_precursors,
        (365 / length_days.max(1)) as usize,
    )
}

/// Builds a calendar of equally long month-based intervals.
///
/// Same layout as [`daily_calendar`]; with `n_precursors = None` the calendar
/// holds `12 / length_months` intervals in total, never fewer than the targets.
///
/// # Errors
///
/// Returns [`CalendarError::NonPositiveLength`] if `length_months` is zero.
pub fn monthly_calendar(
    anchor: Anchor,
    length_months: u32,
    n_targets: usize,
    n_precursors: Option<usize>,
) -> Result<Calendar, CalendarError> {
    let months = i32::try_from(length_months).map_err(|_| CalendarError::InvalidSpan {
        input: format!("{length_months}M"),
        reason: "interval length is too large".to_string(),
    })?;
    preset(
        anchor,
        Span::months(months),
        n_targets,
        n_precursors,
        (12 / length_months.max(1)) as usize,
    )
}

fn preset(
    anchor: Anchor,
    length: Span,
    n_targets: usize,
    n_precursors: Option<usize>,
    per_year: usize,
) -> Result<Calendar, CalendarError> {
    if !length.is_positive() {
        return Err(CalendarError::NonPositiveLength {
            name: "preset".to_string(),
            length: length.to_string(),
        });
    }
    let n_precursors = n_precursors.unwrap_or_else(|| per_year.max(n_targets) - n_targets);
    let mut calendar = Calendar::new(anchor);
    calendar
        .add_intervals(Role::Target, length, Span::ZERO, n_targets)?
        .add_intervals(Role::Precursor, length, Span::ZERO, n_precursors)?;
    Ok(calendar)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(s: &str) -> Anchor {
        s.parse().unwrap()
    }

    #[test]
    fn add_interval_chains() {
        let mut calendar = Calendar::new(anchor("12-31"));
        calendar
            .add_interval("t", Role::Target, Span::days(7), Span::ZERO)
            .unwrap()
            .add_interval("p", Role::Precursor, Span::days(14), Span::days(-3))
            .unwrap();
        assert_eq!(calendar.len(), 2);
        assert_eq!(calendar.n_targets(), 1);
        assert_eq!(calendar.n_precursors(), 1);
        assert_eq!(
            calendar.offsets(),
            vec![
                (Span::ZERO, Span::days(7)),
                (Span::days(4), Span::days(18)),
            ]
        );
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut calendar = Calendar::new(anchor("12-31"));
        calendar
            .add_interval("t", Role::Target, Span::days(7), Span::ZERO)
            .unwrap();
        let err = calendar
            .add_interval("t", Role::Precursor, Span::days(7), Span::ZERO)
            .unwrap_err();
        assert_eq!(err, CalendarError::DuplicateName { name: "t".to_string() });
        assert_eq!(calendar.len(), 1);
    }

    #[test]
    fn non_positive_length_rejected() {
        let mut calendar = Calendar::new(anchor("12-31"));
        assert!(matches!(
            calendar.add_interval("t", Role::Target, Span::ZERO, Span::ZERO),
            Err(CalendarError::NonPositiveLength { .. })
        ));
        assert!(calendar.is_empty());
    }

    #[test]
    fn add_intervals_names_by_role() {
        let mut calendar = Calendar::new(anchor("Dec"));
        calendar
            .add_intervals(Role::Target, Span::months(1), Span::ZERO, 1)
            .unwrap()
            .add_intervals(Role::Precursor, Span::months(1), Span::ZERO, 2)
            .unwrap();
        let names: Vec<&str> = calendar.specs().iter().map(IntervalSpec::name).collect();
        assert_eq!(names, vec!["target_1", "precursor_1", "precursor_2"]);
    }

    #[test]
    fn daily_preset_fills_year() {
        let calendar = daily_calendar(anchor("10-15"), 180, 1, None).unwrap();
        assert_eq!(calendar.n_targets(), 1);
        assert_eq!(calendar.n_precursors(), 1);

        let calendar = daily_calendar(anchor("10-15"), 30, 2, None).unwrap();
        assert_eq!(calendar.len(), 12);

        let calendar = daily_calendar(anchor("10-15"), 400, 2, None).unwrap();
        assert_eq!(calendar.len(), 2);
        assert_eq!(calendar.n_precursors(), 0);
    }

    #[test]
    fn daily_preset_explicit_precursors() {
        let calendar = daily_calendar(anchor("10-15"), 7, 1, Some(3)).unwrap();
        assert_eq!(calendar.len(), 4);
    }

    #[test]
    fn monthly_preset() {
        let calendar = monthly_calendar(anchor("Dec"), 3, 1, None).unwrap();
        assert_eq!(calendar.len(), 4);
        assert!(calendar.specs().iter().all(|s| s.length() == Span::months(3)));
    }

    #[test]
    fn preset_rejects_zero_length() {
        assert!(daily_calendar(anchor("10-15"), 0, 1, None).is_err());
        assert!(monthly_calendar(anchor("10-15"), 0, 0, Some(0)).is_err());
    }

    #[test]
    fn set_max_lag_keeps_targets() {
        let mut calendar = daily_calendar(anchor("10-15"), 30, 2, Some(6)).unwrap();
        calendar.set_max_lag(2);
        assert_eq!(calendar.n_targets(), 2);
        assert_eq!(calendar.n_precursors(), 2);
        assert_eq!(calendar.specs()[3].name(), "precursor_2");
    }

    #[test]
    fn code_round_trip() {
        let mut calendar = Calendar::new(anchor("02-29")).with_allow_overlap(true);
        calendar
            .add_interval("t", Role::Target, Span::months(1), Span::ZERO)
            .unwrap()
            .add_interval("p", Role::Precursor, Span::days(10), Span::days(-5))
            .unwrap();
        let code = calendar.to_code().unwrap();
        assert_eq!(Calendar::from_code(&code).unwrap(), calendar);
    }

    #[test]
    fn code_rejects_garbage_and_duplicates() {
        assert!(matches!(
            Calendar::from_code("not json"),
            Err(CalendarError::InvalidCode { .. })
        ));
        let dup = r#"{"anchor":"12-31","intervals":[
            {"name":"a","role":"target","length":"7d"},
            {"name":"a","role":"precursor","length":"7d"}]}"#;
        assert!(Calendar::from_code(dup).is_err());
        let zero = r#"{"anchor":"12-31","intervals":[{"name":"a","role":"target","length":"0d"}]}"#;
        assert!(Calendar::from_code(zero).is_err());
    }

    #[test]
    fn cycle_years() {
        let one = daily_calendar(anchor("12-31"), 30, 1, None).unwrap();
        assert_eq!(one.cycle_years().unwrap(), 1);

        let monthly = monthly_calendar(anchor("Feb"), 1, 1, None).unwrap();
        assert_eq!(monthly.cycle_years().unwrap(), 1);

        let long = daily_calendar(anchor("12-31"), 100, 1, Some(4)).unwrap();
        assert_eq!(long.cycle_years().unwrap(), 2);

        assert_eq!(Calendar::new(anchor("12-31")).cycle_years().unwrap(), 1);
    }

    #[test]
    fn cycle_years_at_year_length() {
        // 365 days fit in every year, 366 days do not
        let year = daily_calendar(anchor("12-31"), 73, 1, Some(4)).unwrap();
        assert_eq!(year.cycle_years().unwrap(), 1);
        let leap = daily_calendar(anchor("12-31"), 183, 1, Some(1)).unwrap();
        assert_eq!(leap.cycle_years().unwrap(), 2);

        let twelve_months = monthly_calendar(anchor("Mar"), 1, 1, Some(11)).unwrap();
        assert_eq!(twelve_months.cycle_years().unwrap(), 1);
        let thirteen_months = monthly_calendar(anchor("Mar"), 1, 1, Some(12)).unwrap();
        assert_eq!(thirteen_months.cycle_years().unwrap(), 2);
    }

    #[test]
    fn cycle_years_ignores_distance_to_anchor() {
        // a short calendar far before its anchor still steps by one year
        let mut calendar = Calendar::new(anchor("12-31"));
        calendar
            .add_interval("t", Role::Target, Span::days(30), Span::days(400))
            .unwrap();
        assert_eq!(calendar.cycle_years().unwrap(), 1);
        assert_eq!(calendar.reach_years().unwrap(), 2);
    }

    #[test]
    fn display_summary() {
        let calendar = daily_calendar(anchor("10-15"), 180, 1, None).unwrap();
        assert_eq!(
            calendar.to_string(),
            "Calendar(anchor=10-15, allow_overlap=false, n_targets=1, n_precursors=1, length=180d)"
        );
    }
}
