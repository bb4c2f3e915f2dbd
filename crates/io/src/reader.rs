//! Rebuilding resampled frames from Parquet archives.

use std::path::Path;

use almanac_calendar::Label;
use almanac_resample::{ResampledFrame, ResampledVariable};
use ndarray::{Array2, ArrayD, IxDyn};
use tracing::debug;

use crate::error::IoError;
use crate::parquet_read::{self, ArchiveColumns};
use crate::parquet_write::ArchiveLayout;

/// Stop collecting row problems after this many.
const MAX_REPORTED: usize = 10;

/// Reads a frame written by [`write_parquet`](crate::write_parquet).
///
/// The `(anchor_year, interval)` grid is recovered from the row order and
/// checked row by row; the returned frame carries no warnings.
///
/// # Errors
///
/// - [`IoError::FileNotFound`] if `path` does not exist.
/// - [`IoError::Parquet`] if the file cannot be decoded.
/// - [`IoError::Metadata`] if the layout or attributes are missing.
/// - [`IoError::Validation`] if the columns do not match the layout or the
///   rows do not form a complete grid.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn read_parquet(path: &Path) -> Result<ResampledFrame, IoError> {
    let (schema, batches) = parquet_read::read_batches(path)?;
    let layout = parquet_read::read_layout(&schema)?;
    let attrs = parquet_read::read_attrs(&schema)?;
    parquet_read::validate_schema(&schema, &layout)?;
    let columns = parquet_read::extract_columns(&batches, &layout)?;

    let grid = Grid::recover(&columns, &layout)?;
    debug!(
        n_years = grid.anchor_years.len(),
        n_labels = grid.labels.len(),
        n_rows = columns.n_rows(),
        "read resampled frame"
    );

    let n_years = grid.anchor_years.len();
    let n_labels = grid.labels.len();
    let stride = layout.stride();
    let is_target = Array2::from_shape_fn((n_years, n_labels), |(i, j)| {
        columns.is_target[(i * n_labels + j) * stride]
    });

    let mut shape = vec![n_years, n_labels];
    shape.extend(&layout.shape);
    let variables = layout
        .variables
        .iter()
        .zip(columns.values)
        .map(|(name, values)| {
            let data = ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|e| {
                IoError::Validation {
                    count: 1,
                    details: format!("variable '{name}': {e}"),
                }
            })?;
            Ok(ResampledVariable::new(name.clone(), layout.dims.clone(), data))
        })
        .collect::<Result<Vec<_>, IoError>>()?;

    Ok(ResampledFrame::from_parts(
        grid.anchor_years,
        grid.labels,
        is_target,
        variables,
        attrs,
    )?
    .with_coords(layout.coords)?)
}

/// Anchor years and labels recovered from the long-format rows.
#[derive(Debug)]
struct Grid {
    anchor_years: Vec<i32>,
    labels: Vec<Label>,
}

impl Grid {
    /// Reads the axes from the first row of every cell, then checks that
    /// every row sits where the row order says it should.
    fn recover(columns: &ArchiveColumns, layout: &ArchiveLayout) -> Result<Self, IoError> {
        let stride = layout.stride();
        let n_rows = columns.n_rows();
        if n_rows % stride != 0 {
            return Err(IoError::Validation {
                count: 1,
                details: format!("{n_rows} rows do not fill cells of {stride} rows"),
            });
        }
        let n_cells = n_rows / stride;

        let mut anchor_years: Vec<i32> = (0..n_cells)
            .map(|c| columns.anchor_years[c * stride])
            .collect();
        anchor_years.dedup();
        let n_years = anchor_years.len();
        let n_labels = if n_years == 0 { 0 } else { n_cells / n_years };
        if n_years * n_labels != n_cells {
            return Err(IoError::Validation {
                count: 1,
                details: format!(
                    "{n_cells} cells do not form a grid over {n_years} anchor years"
                ),
            });
        }

        let labels = (0..n_labels)
            .map(|j| {
                let raw = &columns.labels[j * stride];
                raw.parse::<Label>().map_err(|e| IoError::Validation {
                    count: 1,
                    details: format!("row {}: {e}", j * stride),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let label_text: Vec<String> = labels.iter().map(Label::to_string).collect();

        let mut problems = Vec::new();
        for r in 0..n_rows {
            let cell = r / stride;
            let (i, j) = (cell / n_labels, cell % n_labels);
            let year = columns.anchor_years[r];
            if year != anchor_years[i] {
                problems.push(format!(
                    "row {r}: expected anchor year {}, got {year}",
                    anchor_years[i]
                ));
            }
            if columns.labels[r] != label_text[j] {
                problems.push(format!(
                    "row {r}: expected interval {}, got {}",
                    label_text[j], columns.labels[r]
                ));
            }
            if columns.is_target[r] != columns.is_target[cell * stride] {
                problems.push(format!("row {r}: target flag differs within its cell"));
            }
            let position = layout.unravel(r % stride);
            for (axis, index) in columns.positions.iter().enumerate() {
                if index[r] as usize != position[axis] {
                    problems.push(format!(
                        "row {r}: expected {} index {}, got {}",
                        layout.dims[axis], position[axis], index[r]
                    ));
                }
            }
            if problems.len() >= MAX_REPORTED {
                break;
            }
        }
        if !problems.is_empty() {
            return Err(IoError::validation(problems));
        }

        Ok(Self {
            anchor_years,
            labels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(years: &[i32], labels: &[&str]) -> ArchiveColumns {
        ArchiveColumns {
            anchor_years: years.to_vec(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
            is_target: labels.iter().map(|&s| s == "t-0").collect(),
            positions: Vec::new(),
            values: Vec::new(),
        }
    }

    fn flat_layout() -> ArchiveLayout {
        ArchiveLayout {
            dims: Vec::new(),
            shape: Vec::new(),
            variables: Vec::new(),
            coords: Default::default(),
        }
    }

    #[test]
    fn recovers_grid() {
        let cols = columns(&[2021, 2021, 2020, 2020], &["t-0", "t-1", "t-0", "t-1"]);
        let grid = Grid::recover(&cols, &flat_layout()).unwrap();
        assert_eq!(grid.anchor_years, vec![2021, 2020]);
        assert_eq!(grid.labels, vec![Label::new(0), Label::new(1)]);
    }

    #[test]
    fn empty_archive_is_an_empty_grid() {
        let grid = Grid::recover(&columns(&[], &[]), &flat_layout()).unwrap();
        assert!(grid.anchor_years.is_empty());
        assert!(grid.labels.is_empty());
    }

    #[test]
    fn rejects_ragged_years() {
        let cols = columns(&[2021, 2021, 2020], &["t-0", "t-1", "t-0"]);
        assert!(matches!(
            Grid::recover(&cols, &flat_layout()),
            Err(IoError::Validation { .. })
        ));
    }

    #[test]
    fn rejects_shuffled_labels() {
        let cols = columns(&[2021, 2021, 2020, 2020], &["t-0", "t-1", "t-1", "t-0"]);
        match Grid::recover(&cols, &flat_layout()).unwrap_err() {
            IoError::Validation { count, details } => {
                assert_eq!(count, 2);
                assert!(details.contains("row 2: expected interval t-0, got t-1"));
            }
            other => panic!("expected Validation error, got {other}"),
        }
    }

    #[test]
    fn rejects_bad_label_text() {
        let cols = columns(&[2021], &["lag0"]);
        assert!(matches!(
            Grid::recover(&cols, &flat_layout()),
            Err(IoError::Validation { .. })
        ));
    }
}
