//! Low-level Parquet column building.
//!
//! A frame is stored in long format: one row per `(anchor_year, interval)`
//! cell and per position along the non-time dimensions, years outer, labels
//! next, then the remaining axes in row-major order.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use almanac_resample::{ANCHOR_YEAR, Coords, IS_TARGET, LABEL_DIM, ResampledFrame};
use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int32Array, RecordBatch, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize};

use crate::error::IoError;

/// Schema metadata key holding the [`ArchiveLayout`] as JSON.
pub(crate) const LAYOUT_KEY: &str = "almanac.layout";
/// Schema metadata key holding the frame attributes as JSON.
pub(crate) const ATTRS_KEY: &str = "almanac.attrs";

/// Shape information that the long-format columns alone cannot carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ArchiveLayout {
    /// Non-time dimensions shared by every variable.
    pub dims: Vec<String>,
    /// Size of each non-time dimension.
    pub shape: Vec<usize>,
    /// Variable names, in frame order.
    pub variables: Vec<String>,
    /// Coordinate values of the dimensions that have them.
    #[serde(default)]
    pub coords: Coords,
}

impl ArchiveLayout {
    /// Describes `frame`, requiring all variables to share their non-time
    /// dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] listing every variable whose dims or
    /// shape differ from the first one, every name that collides with another
    /// column, and every empty dimension.
    pub(crate) fn of(frame: &ResampledFrame) -> Result<Self, IoError> {
        let (dims, shape) = match frame.variables().first() {
            Some(first) => (first.extra_dims().to_vec(), first.data().shape()[2..].to_vec()),
            None => (Vec::new(), Vec::new()),
        };

        let mut problems = Vec::new();
        for var in frame.variables() {
            if var.extra_dims() != dims.as_slice() || var.data().shape()[2..] != shape[..] {
                problems.push(format!(
                    "variable '{}' has dims {:?} with shape {:?}, expected {:?} with shape {:?}",
                    var.name(),
                    var.extra_dims(),
                    &var.data().shape()[2..],
                    dims,
                    shape
                ));
            }
        }
        for (dim, size) in dims.iter().zip(&shape) {
            if *size == 0 {
                problems.push(format!("dimension '{dim}' is empty"));
            }
        }
        let mut seen: HashSet<&str> = [ANCHOR_YEAR, LABEL_DIM, IS_TARGET].into_iter().collect();
        let names = dims
            .iter()
            .map(String::as_str)
            .chain(frame.variables().iter().map(|v| v.name()));
        for name in names {
            if !seen.insert(name) {
                problems.push(format!("column name '{name}' is used twice"));
            }
        }
        if !problems.is_empty() {
            return Err(IoError::validation(problems));
        }

        Ok(Self {
            dims,
            shape,
            variables: frame.variables().iter().map(|v| v.name().to_string()).collect(),
            coords: frame.coords().clone(),
        })
    }

    /// Number of rows per `(anchor_year, interval)` cell.
    pub(crate) fn stride(&self) -> usize {
        self.shape.iter().product()
    }

    /// Position along each non-time dimension of the `offset`-th row of a
    /// cell.
    pub(crate) fn unravel(&self, mut offset: usize) -> Vec<usize> {
        let mut position = vec![0; self.shape.len()];
        for (p, &size) in position.iter_mut().zip(&self.shape).rev() {
            *p = offset % size;
            offset /= size;
        }
        position
    }
}

/// Builds the Arrow schema for `frame`, with the layout and attributes stored
/// as schema metadata.
///
/// Columns are `anchor_year`, `interval`, `is_target`, one index column per
/// non-time dimension, then one column per variable.
pub(crate) fn build_schema(
    layout: &ArchiveLayout,
    frame: &ResampledFrame,
) -> Result<Schema, IoError> {
    let mut fields = vec![
        Field::new(ANCHOR_YEAR, DataType::Int32, false),
        Field::new(LABEL_DIM, DataType::Utf8, false),
        Field::new(IS_TARGET, DataType::Boolean, false),
    ];
    fields.extend(
        layout
            .dims
            .iter()
            .map(|d| Field::new(d, DataType::UInt32, false)),
    );
    fields.extend(
        layout
            .variables
            .iter()
            .map(|v| Field::new(v, DataType::Float64, false)),
    );

    let metadata = HashMap::from([
        (LAYOUT_KEY.to_string(), to_json(LAYOUT_KEY, layout)?),
        (ATTRS_KEY.to_string(), to_json(ATTRS_KEY, frame.attrs())?),
    ]);
    Ok(Schema::new_with_metadata(fields, metadata))
}

fn to_json<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String, IoError> {
    serde_json::to_string(value).map_err(|e| IoError::Metadata {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Converts `frame` into a single long-format [`RecordBatch`].
///
/// The batch schema must be the one returned by [`build_schema`] for the
/// same layout.
pub(crate) fn frame_to_record_batch(
    frame: &ResampledFrame,
    layout: &ArchiveLayout,
    schema: &Schema,
) -> Result<RecordBatch, IoError> {
    let stride = layout.stride();
    let n_cells = frame.n_years() * frame.n_labels();
    let n_rows = n_cells * stride;

    let years = frame
        .flat_anchor_years()
        .into_iter()
        .flat_map(|y| std::iter::repeat_n(y, stride));
    let labels = frame
        .flat_labels()
        .into_iter()
        .flat_map(|l| std::iter::repeat_n(l.to_string(), stride));
    let targets = frame
        .flat_is_target()
        .into_iter()
        .flat_map(|t| std::iter::repeat_n(t, stride));

    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Int32Array::from_iter_values(years)),
        Arc::new(StringArray::from_iter_values(labels.collect::<Vec<_>>())),
        Arc::new(BooleanArray::from(targets.collect::<Vec<_>>())),
    ];

    let positions: Vec<Vec<usize>> = (0..stride).map(|o| layout.unravel(o)).collect();
    for axis in 0..layout.dims.len() {
        let index = (0..n_rows).map(|r| positions[r % stride][axis] as u32);
        columns.push(Arc::new(UInt32Array::from_iter_values(index)));
    }

    for var in frame.variables() {
        columns.push(Arc::new(Float64Array::from(var.flat_values())));
    }

    Ok(RecordBatch::try_new(Arc::new(schema.clone()), columns)?)
}

/// Writes a sequence of [`RecordBatch`]es to a Parquet file at `path`.
///
/// # Errors
///
/// Returns [`IoError::Parquet`] if file creation, batch writing, or file
/// finalisation fails.
pub(crate) fn write_batches(
    path: &Path,
    batches: &[RecordBatch],
    schema: &Schema,
    props: WriterProperties,
) -> Result<(), IoError> {
    let file = std::fs::File::create(path).map_err(|e| IoError::Parquet {
        reason: e.to_string(),
    })?;
    let mut writer = ArrowWriter::try_new(file, Arc::new(schema.clone()), Some(props))?;

    for batch in batches {
        writer.write(batch)?;
    }

    writer.close()?;
    Ok(())
}
