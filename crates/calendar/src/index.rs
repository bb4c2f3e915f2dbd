//! Time axis of a data container.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::CalendarError;
use crate::span::Span;

/// The index values of a data container's time axis.
///
/// Only [`Index::Datetime`] can be realized against a calendar; the other
/// variants exist so that containers indexed by position or by label can be
/// rejected with a clear error instead of being silently misread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Index {
    /// Naive timestamps.
    Datetime(Vec<NaiveDateTime>),
    /// Integer positions.
    Integer(Vec<i64>),
    /// String labels.
    Label(Vec<String>),
}

impl Index {
    /// Returns the number of index entries.
    pub fn len(&self) -> usize {
        match self {
            Index::Datetime(v) => v.len(),
            Index::Integer(v) => v.len(),
            Index::Label(v) => v.len(),
        }
    }

    /// Returns `true` if the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the index kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Index::Datetime(_) => "datetime",
            Index::Integer(_) => "integer",
            Index::Label(_) => "label",
        }
    }

    /// Returns the timestamps of a chronological datetime index.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidIndex`] if the index is not a datetime
    /// index, is empty, or is not in chronological order.
    pub fn datetimes(&self) -> Result<&[NaiveDateTime], CalendarError> {
        let Index::Datetime(times) = self else {
            return Err(CalendarError::InvalidIndex {
                reason: format!("expected a datetime index, got a {} index", self.kind()),
            });
        };
        if times.is_empty() {
            return Err(CalendarError::InvalidIndex {
                reason: "index is empty".to_string(),
            });
        }
        if let Some(pos) = times.windows(2).position(|w| w[1] < w[0]) {
            return Err(CalendarError::InvalidIndex {
                reason: format!(
                    "index is not chronological: {} follows {} at position {}",
                    times[pos + 1],
                    times[pos],
                    pos + 1
                ),
            });
        }
        Ok(times)
    }

    /// Returns the earliest and latest timestamp of the index.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Index::datetimes`].
    pub fn span(&self) -> Result<(NaiveDateTime, NaiveDateTime), CalendarError> {
        let times = self.datetimes()?;
        // Non-empty and sorted, checked above.
        Ok((times[0], times[times.len() - 1]))
    }
}

impl From<Vec<NaiveDateTime>> for Index {
    fn from(times: Vec<NaiveDateTime>) -> Self {
        Index::Datetime(times)
    }
}

impl From<Vec<NaiveDate>> for Index {
    fn from(dates: Vec<NaiveDate>) -> Self {
        Index::Datetime(
            dates
                .into_iter()
                .map(|d| d.and_time(NaiveTime::MIN))
                .collect(),
        )
    }
}

impl From<Vec<i64>> for Index {
    fn from(positions: Vec<i64>) -> Self {
        Index::Integer(positions)
    }
}

impl From<Vec<String>> for Index {
    fn from(labels: Vec<String>) -> Self {
        Index::Label(labels)
    }
}

/// Builds a datetime index from `start` to `end` (inclusive) in steps of
/// `step`.
///
/// Every entry is computed from `start` directly, so month steps starting on
/// the 31st land on month ends without drifting.
///
/// # Errors
///
/// Returns [`CalendarError::InvalidSpan`] if `step` is not strictly positive,
/// and [`CalendarError::InvalidIndex`] if `end` precedes `start`.
pub fn date_range(
    start: NaiveDateTime,
    end: NaiveDateTime,
    step: Span,
) -> Result<Index, CalendarError> {
    if !step.is_positive() {
        return Err(CalendarError::InvalidSpan {
            input: step.to_string(),
            reason: "a date range step must be strictly positive".to_string(),
        });
    }
    if end < start {
        return Err(CalendarError::InvalidIndex {
            reason: format!("date range ends ({end}) before it starts ({start})"),
        });
    }

    let mut times = Vec::new();
    for k in 0.. {
        let Some(t) = scaled(step, k).and_then(|s| s.after(start)) else {
            break;
        };
        if t > end {
            break;
        }
        times.push(t);
    }
    Ok(Index::Datetime(times))
}

fn scaled(step: Span, k: i32) -> Option<Span> {
    let months = step.month_part().checked_mul(k)?;
    let days = step.day_part().checked_mul(i64::from(k))?;
    Some(Span::months(months) + Span::days(days))
}
