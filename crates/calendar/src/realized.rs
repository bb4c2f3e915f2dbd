//! Concrete, dated intervals produced by realizing a calendar.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, TimeDelta};

use crate::anchor::Anchor;
use crate::error::CalendarError;
use crate::interval::Role;

/// Backward-counting lag label of an interval: `t-0`, `t-1`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(usize);

impl Label {
    /// Creates the label for lag `n`.
    pub fn new(n: usize) -> Self {
        Self(n)
    }

    /// Returns the lag number.
    pub fn lag(self) -> usize {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t-{}", self.0)
    }
}

impl FromStr for Label {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("t-")
            .and_then(|n| n.parse::<usize>().ok())
            .map(Self)
            .ok_or_else(|| CalendarError::InvalidCode {
                reason: format!("'{s}' is not an interval label"),
            })
    }
}

/// A dated interval `(left, right]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RealizedInterval {
    label: Label,
    left: NaiveDateTime,
    right: NaiveDateTime,
    role: Role,
}

impl RealizedInterval {
    pub(crate) fn new(label: Label, left: NaiveDateTime, right: NaiveDateTime, role: Role) -> Self {
        Self {
            label,
            left,
            right,
            role,
        }
    }

    /// Returns the lag label.
    pub fn label(&self) -> Label {
        self.label
    }

    /// Returns the exclusive left bound.
    pub fn left(&self) -> NaiveDateTime {
        self.left
    }

    /// Returns the inclusive right bound.
    pub fn right(&self) -> NaiveDateTime {
        self.right
    }

    /// Returns the role of the interval.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns `true` if the interval is a target period.
    pub fn is_target(&self) -> bool {
        self.role.is_target()
    }

    /// Returns `true` if `t` lies in `(left, right]`.
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.left < t && t <= self.right
    }

    /// Returns `right - left`.
    pub fn duration(&self) -> TimeDelta {
        self.right - self.left
    }

    /// Returns `true` if the two intervals share any instant.
    pub fn overlaps(&self, other: &RealizedInterval) -> bool {
        self.left < other.right && other.left < self.right
    }
}

impl fmt::Display for RealizedInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}]",
            self.left.format("%Y-%m-%d"),
            self.right.format("%Y-%m-%d")
        )
    }
}

/// One calendar realized for a single anchor year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealizedCalendar {
    anchor_year: i32,
    intervals: Vec<RealizedInterval>,
}

impl RealizedCalendar {
    pub(crate) fn new(anchor_year: i32, intervals: Vec<RealizedInterval>) -> Self {
        Self {
            anchor_year,
            intervals,
        }
    }

    /// Returns the anchor year.
    pub fn anchor_year(&self) -> i32 {
        self.anchor_year
    }

    /// Returns the intervals in label order (`t-0` first).
    pub fn intervals(&self) -> &[RealizedInterval] {
        &self.intervals
    }

    /// Returns the number of intervals.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Returns `true` if the calendar has no intervals.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Returns the earliest left bound, or `None` without intervals.
    pub fn earliest_left(&self) -> Option<NaiveDateTime> {
        self.intervals.iter().map(RealizedInterval::left).min()
    }

    /// Returns the latest right bound, or `None` without intervals.
    pub fn latest_right(&self) -> Option<NaiveDateTime> {
        self.intervals.iter().map(RealizedInterval::right).max()
    }
}

/// A calendar realized for several anchor years.
///
/// Rows are anchor years, latest first; columns are lag labels in calendar
/// order. The table also carries the anchor and the encoded calendar so that
/// downstream consumers can record where the intervals came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTable {
    anchor: Anchor,
    calendar_code: String,
    years: Vec<RealizedCalendar>,
}

impl IntervalTable {
    pub(crate) fn new(anchor: Anchor, calendar_code: String, years: Vec<RealizedCalendar>) -> Self {
        Self {
            anchor,
            calendar_code,
            years,
        }
    }

    /// Returns the anchor of the calendar that produced this table.
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Returns the encoded calendar that produced this table.
    pub fn calendar_code(&self) -> &str {
        &self.calendar_code
    }

    /// Returns the realized years, latest first.
    pub fn years(&self) -> &[RealizedCalendar] {
        &self.years
    }

    /// Returns the anchor years, latest first.
    pub fn anchor_years(&self) -> Vec<i32> {
        self.years.iter().map(RealizedCalendar::anchor_year).collect()
    }

    /// Returns the realization of a single anchor year.
    pub fn year(&self, anchor_year: i32) -> Option<&RealizedCalendar> {
        self.years.iter().find(|y| y.anchor_year == anchor_year)
    }

    /// Returns the number of lag labels per year.
    pub fn n_labels(&self) -> usize {
        self.years.first().map_or(0, RealizedCalendar::len)
    }

    /// Returns the lag labels in calendar order.
    pub fn labels(&self) -> Vec<Label> {
        (0..self.n_labels()).map(Label::new).collect()
    }

    /// Returns the role of every lag label, in calendar order.
    pub fn roles(&self) -> Vec<Role> {
        self.years
            .first()
            .map(|y| y.intervals.iter().map(RealizedInterval::role).collect())
            .unwrap_or_default()
    }

    /// Returns `true` if the table holds no interval at all.
    pub fn is_empty(&self) -> bool {
        self.n_labels() == 0
    }

    /// Returns the shortest interval duration in the table.
    pub fn shortest_interval(&self) -> Option<TimeDelta> {
        self.flatten().map(|(_, interval)| interval.duration()).min()
    }

    /// Iterates `(anchor_year, interval)` pairs, years latest first and labels
    /// in calendar order within each year.
    pub fn flatten(&self) -> impl Iterator<Item = (i32, &RealizedInterval)> + '_ {
        self.years
            .iter()
            .flat_map(|y| y.intervals.iter().map(move |i| (y.anchor_year, i)))
    }
}
