//! Error types for almanac-io.

use std::path::PathBuf;

use almanac_resample::ResampleError;

/// Error type for all fallible operations in the almanac-io crate.
///
/// Covers missing files, failures reported by the Arrow and Parquet
/// libraries, archives whose layout does not describe a resampled frame, and
/// frames that cannot be rebuilt from an otherwise readable archive.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a required file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Wraps an error originating from the Arrow or Parquet libraries.
    #[error("parquet error: {reason}")]
    Parquet {
        /// Description of the underlying Parquet failure.
        reason: String,
    },

    /// Returned when the schema metadata of an archive is missing or
    /// malformed.
    #[error("invalid archive metadata '{key}': {reason}")]
    Metadata {
        /// Metadata key that was inspected.
        key: String,
        /// Description of the problem.
        reason: String,
    },

    /// Returned when one or more validation checks fail.
    #[error("{count} validation error(s): {details}")]
    Validation {
        /// Number of accumulated validation failures.
        count: usize,
        /// Human-readable summary of the failures.
        details: String,
    },

    /// Returned when the archived parts do not form a valid frame.
    #[error(transparent)]
    Resample(#[from] ResampleError),
}

impl IoError {
    /// Builds a [`IoError::Validation`] from accumulated messages.
    pub(crate) fn validation(messages: Vec<String>) -> Self {
        IoError::Validation {
            count: messages.len(),
            details: messages.join("; "),
        }
    }
}

impl From<parquet::errors::ParquetError> for IoError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        IoError::Parquet {
            reason: e.to_string(),
        }
    }
}

impl From<arrow::error::ArrowError> for IoError {
    fn from(e: arrow::error::ArrowError) -> Self {
        IoError::Parquet {
            reason: e.to_string(),
        }
    }
}
