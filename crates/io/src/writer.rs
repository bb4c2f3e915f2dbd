//! Archive settings and the [`write_parquet`] entry point.

use std::path::Path;

use almanac_resample::ResampledFrame;
use parquet::basic::{self, ZstdLevel};
use parquet::file::properties::WriterProperties;
use tracing::debug;

use crate::error::IoError;
use crate::parquet_write::{self, ArchiveLayout};

/// Rows per row group unless configured otherwise.
const DEFAULT_ROW_GROUP_SIZE: usize = 1_000_000;

/// Page codec of an archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    None,
    #[default]
    Snappy,
    /// Zstandard at the given level, 1 to 22.
    Zstd(i32),
}

impl TryFrom<Compression> for basic::Compression {
    type Error = IoError;

    fn try_from(codec: Compression) -> Result<Self, IoError> {
        Ok(match codec {
            Compression::None => basic::Compression::UNCOMPRESSED,
            Compression::Snappy => basic::Compression::SNAPPY,
            Compression::Zstd(level) => {
                let level = ZstdLevel::try_new(level).map_err(|e| {
                    IoError::validation(vec![format!("zstd level {level}: {e}")])
                })?;
                basic::Compression::ZSTD(level)
            }
        })
    }
}

/// How [`write_parquet`] lays out an archive.
///
/// ```
/// use almanac_io::{Compression, WriterConfig};
///
/// let config = WriterConfig::new()
///     .with_compression(Compression::Zstd(9))
///     .with_row_group_size(50_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct WriterConfig {
    compression: Compression,
    row_group_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }
}

impl WriterConfig {
    /// Snappy pages in row groups of a million rows.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Caps the rows held by one row group.
    pub fn with_row_group_size(mut self, rows: usize) -> Self {
        self.row_group_size = rows;
        self
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    /// # Errors
    ///
    /// Returns [`IoError::Validation`] naming every problem: an empty row
    /// group or a zstd level the codec does not accept.
    pub fn validate(&self) -> Result<(), IoError> {
        let mut problems = Vec::new();
        if self.row_group_size == 0 {
            problems.push("row_group_size must be greater than 0".to_string());
        }
        if let Err(IoError::Validation { details, .. }) =
            basic::Compression::try_from(self.compression)
        {
            problems.push(details);
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(IoError::validation(problems))
        }
    }
}

/// Writes a resampled frame to a Parquet file in long format.
///
/// Attributes and the shape of the non-time dimensions travel in the schema
/// metadata so that [`read_parquet`](crate::read_parquet) can rebuild the
/// frame. Warnings are not archived.
///
/// # Errors
///
/// Returns [`IoError::Validation`] if the configuration is invalid or the
/// variables do not share their non-time dimensions, and
/// [`IoError::Parquet`] if batch conversion or file I/O fails.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn write_parquet(
    path: &Path,
    frame: &ResampledFrame,
    config: &WriterConfig,
) -> Result<(), IoError> {
    config.validate()?;

    let layout = ArchiveLayout::of(frame)?;
    let schema = parquet_write::build_schema(&layout, frame)?;

    let compression = basic::Compression::try_from(config.compression)?;
    let props = WriterProperties::builder()
        .set_compression(compression)
        .set_max_row_group_size(config.row_group_size)
        .build();

    let batch = parquet_write::frame_to_record_batch(frame, &layout, &schema)?;
    debug!(
        n_rows = batch.num_rows(),
        n_variables = layout.variables.len(),
        "writing resampled frame"
    );

    parquet_write::write_batches(path, &[batch], &schema, props)?;

    Ok(())
}
