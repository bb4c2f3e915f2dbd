//! Realization of a calendar into dated intervals.

use chrono::Datelike;
use tracing::debug;

use crate::calendar::Calendar;
use crate::error::CalendarError;
use crate::index::Index;
use crate::realized::{IntervalTable, Label, RealizedCalendar, RealizedInterval};

impl Calendar {
    /// Realizes the calendar for a single anchor year.
    ///
    /// Interval `i` is `(anchor - left_i, anchor - right_i]` with the offsets
    /// from [`Calendar::offsets`], labelled `t-i`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::DateOutOfRange`] if any boundary falls
    /// outside the supported date range.
    pub fn realize_year(&self, year: i32) -> Result<RealizedCalendar, CalendarError> {
        let anchor = self.anchor().date_in(year)?;
        let out_of_range = || CalendarError::DateOutOfRange { year };

        let intervals = self
            .specs()
            .iter()
            .zip(self.offsets())
            .enumerate()
            .map(|(i, (spec, (right, left)))| {
                let right = right.before(anchor).ok_or_else(out_of_range)?;
                let left = left.before(anchor).ok_or_else(out_of_range)?;
                Ok(RealizedInterval::new(Label::new(i), left, right, spec.role()))
            })
            .collect::<Result<Vec<_>, CalendarError>>()?;

        Ok(RealizedCalendar::new(year, intervals))
    }

    /// Realizes the calendar for every year in `first..=last`, latest first.
    ///
    /// An empty range (`first > last`) yields an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::DateOutOfRange`] if a year cannot be realized.
    pub fn realize_range(&self, first: i32, last: i32) -> Result<IntervalTable, CalendarError> {
        let years = (first..=last)
            .rev()
            .map(|year| self.realize_year(year))
            .collect::<Result<Vec<_>, _>>()?;
        self.table(years)
    }

    /// Realizes the calendar for every anchor year fully covered by `index`.
    ///
    /// A year is kept when its earliest interval start is not before the
    /// first timestamp and its latest interval end is not after the last
    /// one. When year overlap is disallowed, kept years step back from the
    /// latest one by [`Calendar::cycle_years`], so no two of them share time.
    ///
    /// # Errors
    ///
    /// - [`CalendarError::InvalidIndex`] if `index` is not a non-empty,
    ///   chronological datetime index.
    /// - [`CalendarError::Coverage`] if no year is fully covered.
    #[tracing::instrument(skip_all, fields(anchor = %self.anchor(), n_intervals = self.len()))]
    pub fn realize_for_data(&self, index: &Index) -> Result<IntervalTable, CalendarError> {
        let (first, last) = index.span()?;
        let cycle = self.cycle_years()?;
        let margin = self.reach_years()?.saturating_add(1);

        let mut years = Vec::new();
        let start = first.year().saturating_sub(margin);
        let end = last.year().saturating_add(margin);
        for year in (start..=end).rev() {
            let realized = match self.realize_year(year) {
                Ok(realized) => realized,
                Err(CalendarError::DateOutOfRange { .. }) => continue,
                Err(e) => return Err(e),
            };
            let anchor = self.anchor().date_in(year)?;
            let earliest = realized.earliest_left().unwrap_or(anchor);
            let latest = realized.latest_right().unwrap_or(anchor);
            if earliest >= first && latest <= last {
                years.push(realized);
            }
        }

        if !self.allow_overlap() && cycle > 1 {
            if let Some(latest) = years.first().map(RealizedCalendar::anchor_year) {
                years.retain(|y| (latest - y.anchor_year()).unsigned_abs() as usize % cycle == 0);
            }
        }

        if years.is_empty() {
            return Err(CalendarError::Coverage { first, last });
        }

        debug!(
            first_year = years.last().map(RealizedCalendar::anchor_year),
            last_year = years.first().map(RealizedCalendar::anchor_year),
            n_years = years.len(),
            cycle,
            "realized calendar for data"
        );
        self.table(years)
    }

    fn table(&self, years: Vec<RealizedCalendar>) -> Result<IntervalTable, CalendarError> {
        Ok(IntervalTable::new(self.anchor(), self.to_code()?, years))
    }
}
