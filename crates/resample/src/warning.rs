//! Non-fatal conditions reported by a resampling call.

use std::fmt;

use chrono::TimeDelta;

/// A non-fatal condition raised while resampling.
///
/// Each kind is raised at most once per call. Warnings are logged through
/// `tracing` and returned on the resampled frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ResampleWarning {
    /// The shortest interval holds only a few samples.
    LowFrequency {
        /// Shortest realized interval.
        shortest: TimeDelta,
        /// Median sampling step of the data.
        step: TimeDelta,
        /// Configured tolerance factor.
        tolerance: f64,
    },
    /// Some `(anchor_year, interval)` cells hold no sample at all.
    MissingData {
        /// Number of empty cells.
        n_empty: usize,
    },
}

impl fmt::Display for ResampleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResampleWarning::LowFrequency {
                shortest,
                step,
                tolerance,
            } => write!(
                f,
                "the shortest interval ({}) is less than {tolerance} times the \
                 sampling step ({}); interval values may rest on very few samples",
                human_duration(*shortest),
                human_duration(*step)
            ),
            ResampleWarning::MissingData { n_empty } => write!(
                f,
                "{n_empty} interval(s) contain no data; their values are NaN"
            ),
        }
    }
}

/// Formats a duration in the largest whole unit: `"7d"`, `"12h"`, `"30m"`,
/// or seconds otherwise.
pub(crate) fn human_duration(d: TimeDelta) -> String {
    let secs = d.num_seconds();
    if d.subsec_nanos() != 0 {
        return format!("{}s", d.num_milliseconds() as f64 / 1000.0);
    }
    match secs {
        s if s != 0 && s % 86_400 == 0 => format!("{}d", s / 86_400),
        s if s != 0 && s % 3_600 == 0 => format!("{}h", s / 3_600),
        s if s != 0 && s % 60 == 0 => format!("{}m", s / 60),
        s => format!("{s}s"),
    }
}
