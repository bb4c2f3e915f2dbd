//! Error types for the almanac-calendar crate.

use chrono::NaiveDateTime;

/// Error type for all fallible operations in the almanac-calendar crate.
///
/// `InvalidAnchor`, `InvalidSpan`, `DuplicateName`, `NonPositiveLength` and
/// `InvalidCode` are configuration errors raised while a calendar is built.
/// `Coverage` and `InvalidIndex` are raised when a calendar is realized
/// against a dataset's time axis.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalendarError {
    /// Returned when an anchor date cannot be parsed or is not a valid date.
    #[error("invalid anchor '{input}': {reason}")]
    InvalidAnchor {
        /// The rejected anchor input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Returned when a duration string cannot be parsed.
    #[error("invalid duration '{input}': {reason}")]
    InvalidSpan {
        /// The rejected duration input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Returned when an interval name is already used in the calendar.
    #[error("interval name '{name}' is already used in this calendar")]
    DuplicateName {
        /// The duplicated interval name.
        name: String,
    },

    /// Returned when an interval length is zero or negative.
    #[error("interval '{name}' must have a strictly positive length, got {length}")]
    NonPositiveLength {
        /// Name of the offending interval.
        name: String,
        /// The rejected length, as displayed.
        length: String,
    },

    /// Returned when a calendar code cannot be decoded.
    #[error("invalid calendar code: {reason}")]
    InvalidCode {
        /// Decoder message.
        reason: String,
    },

    /// Returned when a realization falls outside the supported date range.
    #[error("year {year} cannot be realized: date out of range")]
    DateOutOfRange {
        /// The year that could not be realized.
        year: i32,
    },

    /// Returned when no anchor year is fully covered by the data's time span.
    #[error("the input data ({first} to {last}) does not cover a single calendar year")]
    Coverage {
        /// Earliest timestamp of the input data.
        first: NaiveDateTime,
        /// Latest timestamp of the input data.
        last: NaiveDateTime,
    },

    /// Returned when a time axis is not a chronological datetime index.
    #[error("invalid time index: {reason}")]
    InvalidIndex {
        /// Description of the problem.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn display_invalid_anchor() {
        let err = CalendarError::InvalidAnchor {
            input: "13-01".to_string(),
            reason: "month must be 1..=12".to_string(),
        };
        assert_eq!(err.to_string(), "invalid anchor '13-01': month must be 1..=12");
    }

    #[test]
    fn display_duplicate_name() {
        let err = CalendarError::DuplicateName {
            name: "target".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "interval name 'target' is already used in this calendar"
        );
    }

    #[test]
    fn display_non_positive_length() {
        let err = CalendarError::NonPositiveLength {
            name: "p1".to_string(),
            length: "0d".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "interval 'p1' must have a strictly positive length, got 0d"
        );
    }

    #[test]
    fn display_coverage() {
        let first = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let last = NaiveDate::from_ymd_opt(2020, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let err = CalendarError::Coverage { first, last };
        assert_eq!(
            err.to_string(),
            "the input data (2020-01-01 00:00:00 to 2020-03-01 00:00:00) does not cover a single calendar year"
        );
    }

    #[test]
    fn display_invalid_index() {
        let err = CalendarError::InvalidIndex {
            reason: "index is empty".to_string(),
        };
        assert_eq!(err.to_string(), "invalid time index: index is empty");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<CalendarError>();
    }

    #[test]
    fn error_is_clone_and_partial_eq() {
        let err = CalendarError::DateOutOfRange { year: 300_000 };
        assert_eq!(err.clone(), err);
    }
}
