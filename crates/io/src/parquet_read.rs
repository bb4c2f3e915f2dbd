//! Low-level Parquet reading and column extraction.

use std::path::Path;

use almanac_resample::{ANCHOR_YEAR, Attrs, IS_TARGET, LABEL_DIM};
use arrow::array::{AsArray, RecordBatch};
use arrow::datatypes::{DataType, Float64Type, Int32Type, Schema, SchemaRef, UInt32Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::de::DeserializeOwned;

use crate::error::IoError;
use crate::parquet_write::{ATTRS_KEY, ArchiveLayout, LAYOUT_KEY};

/// Columns of an archive, concatenated across record batches.
#[derive(Debug, Default)]
pub(crate) struct ArchiveColumns {
    pub anchor_years: Vec<i32>,
    pub labels: Vec<String>,
    pub is_target: Vec<bool>,
    /// One index column per non-time dimension.
    pub positions: Vec<Vec<u32>>,
    /// One value column per variable.
    pub values: Vec<Vec<f64>>,
}

impl ArchiveColumns {
    pub(crate) fn n_rows(&self) -> usize {
        self.anchor_years.len()
    }
}

/// Reads the Arrow schema and all record batches from a Parquet file.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if the file does not exist, or
/// [`IoError::Parquet`] if the file cannot be opened or read.
pub(crate) fn read_batches(path: &Path) -> Result<(SchemaRef, Vec<RecordBatch>), IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = std::fs::File::open(path).map_err(|e| IoError::Parquet {
        reason: e.to_string(),
    })?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;

    let batches: Vec<RecordBatch> = reader.collect::<Result<Vec<_>, _>>()?;

    Ok((schema, batches))
}

fn metadata<T: DeserializeOwned>(schema: &Schema, key: &str) -> Result<T, IoError> {
    let raw = schema.metadata().get(key).ok_or_else(|| IoError::Metadata {
        key: key.to_string(),
        reason: "missing from the schema".to_string(),
    })?;
    serde_json::from_str(raw).map_err(|e| IoError::Metadata {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Reads the frame layout stored in the schema metadata.
pub(crate) fn read_layout(schema: &Schema) -> Result<ArchiveLayout, IoError> {
    let layout: ArchiveLayout = metadata(schema, LAYOUT_KEY)?;
    if layout.dims.len() != layout.shape.len() {
        return Err(IoError::Metadata {
            key: LAYOUT_KEY.to_string(),
            reason: format!(
                "{} dims for {} sizes",
                layout.dims.len(),
                layout.shape.len()
            ),
        });
    }
    if layout.shape.contains(&0) {
        return Err(IoError::Metadata {
            key: LAYOUT_KEY.to_string(),
            reason: "empty dimension".to_string(),
        });
    }
    Ok(layout)
}

/// Reads the frame attributes stored in the schema metadata.
pub(crate) fn read_attrs(schema: &Schema) -> Result<Attrs, IoError> {
    metadata(schema, ATTRS_KEY)
}

/// Validates the schema against the columns `layout` expects.
///
/// # Errors
///
/// Returns [`IoError::Validation`] listing every column whose name or type
/// differs from the expected one, or a column-count mismatch.
pub(crate) fn validate_schema(schema: &Schema, layout: &ArchiveLayout) -> Result<(), IoError> {
    let mut expected: Vec<(&str, DataType)> = vec![
        (ANCHOR_YEAR, DataType::Int32),
        (LABEL_DIM, DataType::Utf8),
        (IS_TARGET, DataType::Boolean),
    ];
    expected.extend(layout.dims.iter().map(|d| (d.as_str(), DataType::UInt32)));
    expected.extend(
        layout
            .variables
            .iter()
            .map(|v| (v.as_str(), DataType::Float64)),
    );

    let fields = schema.fields();
    if fields.len() != expected.len() {
        return Err(IoError::Validation {
            count: 1,
            details: format!(
                "expected {} columns, got {}",
                expected.len(),
                fields.len()
            ),
        });
    }

    let mismatches: Vec<String> = fields
        .iter()
        .zip(&expected)
        .enumerate()
        .filter(|(_, (field, (name, data_type)))| {
            field.name() != name || field.data_type() != data_type
        })
        .map(|(i, (field, (name, data_type)))| {
            format!(
                "column {i}: expected '{name}' ({data_type}), got '{}' ({})",
                field.name(),
                field.data_type()
            )
        })
        .collect();

    if !mismatches.is_empty() {
        return Err(IoError::validation(mismatches));
    }
    Ok(())
}

/// Concatenates the columns of every batch.
///
/// The batches must match a schema accepted by [`validate_schema`].
pub(crate) fn extract_columns(
    batches: &[RecordBatch],
    layout: &ArchiveLayout,
) -> Result<ArchiveColumns, IoError> {
    let n_dims = layout.dims.len();
    let mut columns = ArchiveColumns {
        positions: vec![Vec::new(); n_dims],
        values: vec![Vec::new(); layout.variables.len()],
        ..ArchiveColumns::default()
    };

    for batch in batches {
        let nulls: usize = batch.columns().iter().map(|c| c.null_count()).sum();
        if nulls > 0 {
            return Err(IoError::Validation {
                count: 1,
                details: "archive columns must not contain nulls".to_string(),
            });
        }
        columns
            .anchor_years
            .extend(batch.column(0).as_primitive::<Int32Type>().values().iter().copied());
        columns.labels.extend(
            batch
                .column(1)
                .as_string::<i32>()
                .iter()
                .map(|s| s.unwrap_or_default().to_string()),
        );
        columns
            .is_target
            .extend(batch.column(2).as_boolean().iter().map(|b| b.unwrap_or(false)));
        for (axis, index) in columns.positions.iter_mut().enumerate() {
            index.extend(batch.column(3 + axis).as_primitive::<UInt32Type>().values().iter().copied());
        }
        for (k, values) in columns.values.iter_mut().enumerate() {
            values.extend(
                batch
                    .column(3 + n_dims + k)
                    .as_primitive::<Float64Type>()
                    .values()
                    .iter()
                    .copied(),
            );
        }
    }

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use almanac_resample::Coords;
    use arrow::array::{Int32Array, UInt32Array};
    use arrow::datatypes::Field;

    use super::*;
    use crate::parquet_write::{self, tests::gridded_frame};

    fn archived_batch() -> (ArchiveLayout, RecordBatch) {
        let frame = gridded_frame();
        let layout = ArchiveLayout::of(&frame).unwrap();
        let schema = parquet_write::build_schema(&layout, &frame).unwrap();
        let batch = parquet_write::frame_to_record_batch(&frame, &layout, &schema).unwrap();
        (layout, batch)
    }

    #[test]
    fn metadata_round_trips() {
        let (layout, batch) = archived_batch();
        let schema = batch.schema();
        assert_eq!(read_layout(&schema).unwrap(), layout);
        let attrs = read_attrs(&schema).unwrap();
        assert_eq!(attrs["units"].to_string(), "K");
    }

    #[test]
    fn missing_metadata() {
        let schema = Schema::new(vec![Field::new("a", DataType::Int32, false)]);
        match read_layout(&schema).unwrap_err() {
            IoError::Metadata { key, reason } => {
                assert_eq!(key, LAYOUT_KEY);
                assert!(reason.contains("missing"));
            }
            other => panic!("expected Metadata error, got {other}"),
        }
    }

    #[test]
    fn malformed_layout() {
        let metadata = HashMap::from([(
            LAYOUT_KEY.to_string(),
            r#"{"dims":["lat"],"shape":[],"variables":[]}"#.to_string(),
        )]);
        let schema = Schema::new_with_metadata(Vec::<Field>::new(), metadata);
        assert!(matches!(
            read_layout(&schema),
            Err(IoError::Metadata { .. })
        ));
    }

    #[test]
    fn validate_schema_accepts_written_schema() {
        let (layout, batch) = archived_batch();
        assert!(validate_schema(&batch.schema(), &layout).is_ok());
    }

    #[test]
    fn validate_schema_wrong_column_count() {
        let (layout, _) = archived_batch();
        let schema = Schema::new(vec![Field::new("anchor_year", DataType::Int32, false)]);
        match validate_schema(&schema, &layout).unwrap_err() {
            IoError::Validation { details, .. } => {
                assert!(details.contains("expected 6 columns, got 1"));
            }
            other => panic!("expected Validation error, got {other}"),
        }
    }

    #[test]
    fn validate_schema_wrong_name_and_type() {
        let layout = ArchiveLayout {
            dims: Vec::new(),
            shape: Vec::new(),
            variables: vec!["x".to_string()],
            coords: Coords::new(),
        };
        let schema = Schema::new(vec![
            Field::new("anchor_year", DataType::Int32, false),
            Field::new("interval", DataType::Utf8, false),
            Field::new("is_target", DataType::Boolean, false),
            Field::new("y", DataType::Int32, false),
        ]);
        match validate_schema(&schema, &layout).unwrap_err() {
            IoError::Validation { count, details } => {
                assert_eq!(count, 1);
                assert!(details.contains("expected 'x'"));
                assert!(details.contains("got 'y'"));
            }
            other => panic!("expected Validation error, got {other}"),
        }
    }

    #[test]
    fn extract_columns_concatenates_batches() {
        let (layout, batch) = archived_batch();
        let columns = extract_columns(&[batch.clone(), batch], &layout).unwrap();
        assert_eq!(columns.n_rows(), 24);
        assert_eq!(columns.labels[2], "t-1");
        assert_eq!(columns.positions[0][..4], [0, 1, 0, 1]);
        assert_eq!(columns.values[0][7], 101.0);
        assert_eq!(columns.values[1][7], -101.0);
    }

    #[test]
    fn extract_columns_rejects_nulls() {
        let layout = ArchiveLayout {
            dims: vec!["m".to_string()],
            shape: vec![1],
            variables: Vec::new(),
            coords: Coords::new(),
        };
        let schema = Arc::new(Schema::new(vec![
            Field::new("anchor_year", DataType::Int32, true),
            Field::new("m", DataType::UInt32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![None, Some(2020)])),
                Arc::new(UInt32Array::from(vec![0, 0])),
            ],
        )
        .unwrap();
        assert!(matches!(
            extract_columns(&[batch], &layout),
            Err(IoError::Validation { .. })
        ));
    }
}
