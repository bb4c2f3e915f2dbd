//! Error types for the almanac-resample crate.

use chrono::TimeDelta;

use crate::warning::human_duration;

/// Error type for all fallible operations in the almanac-resample crate.
///
/// Every variant is fatal and is raised before any interval is reduced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResampleError {
    /// Returned when the realized calendar has no intervals.
    #[error("calendar has no intervals")]
    EmptyCalendar,

    /// Returned when the data's time axis is not a chronological datetime
    /// index.
    #[error("invalid time index: {reason}")]
    InvalidIndex {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when variables or dimensions use names the output reserves.
    #[error("input data uses reserved names: {}", names.join(", "))]
    ReservedName {
        /// The offending names, sorted.
        names: Vec<String>,
    },

    /// Returned when the shortest interval is shorter than the finest gap
    /// between the data's timestamps.
    #[error(
        "the input data has a lower time resolution than the calendar: \
         shortest interval is {}, sampling step is {}",
        human_duration(*shortest),
        human_duration(*step)
    )]
    IncompatibleFrequency {
        /// Shortest realized interval.
        shortest: TimeDelta,
        /// Finest gap between timestamps.
        step: TimeDelta,
    },

    /// Returned when a value array does not match the time axis length.
    #[error("{field}: expected {expected} elements, got {got}")]
    LengthMismatch {
        /// Name of the mismatched field.
        field: String,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// Returned when two variables (input or generated) share a name.
    #[error("duplicate variable name '{name}'")]
    DuplicateVariable {
        /// The duplicated name.
        name: String,
    },

    /// Returned when an array variable lacks the time dimension.
    #[error("variable '{variable}' has no '{time_dim}' dimension")]
    MissingTimeDim {
        /// Name of the offending variable.
        variable: String,
        /// The expected time dimension.
        time_dim: String,
    },

    /// Returned when coordinate values do not fit their dimension.
    #[error("invalid coordinate '{dim}': {reason}")]
    InvalidCoord {
        /// The dimension the values were given for.
        dim: String,
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a reduction method name is not recognised.
    #[error("unknown reduction method '{name}'")]
    UnknownMethod {
        /// The rejected name.
        name: String,
    },

    /// Returned when the parts of a resampled frame do not fit together.
    #[error("invalid resampled frame: {reason}")]
    InvalidFrame {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when configuration is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Calendar error.
    #[error(transparent)]
    Calendar(#[from] almanac_calendar::CalendarError),
}
