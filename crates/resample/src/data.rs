//! Input containers and the capability trait the resampler works through.

use std::collections::{BTreeMap, HashSet};

use almanac_calendar::Index;
use ndarray::{ArrayD, Axis, IxDyn};

use crate::attrs::Attrs;
use crate::error::ResampleError;
use crate::reducer::Strategy;

/// Output name of an unnamed [`Series`].
pub const DEFAULT_SERIES_NAME: &str = "data";

/// Coordinate values of non-time dimensions, by dimension name.
pub type Coords = BTreeMap<String, Vec<f64>>;

/// Shape of one output variable, without its time axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Output variable name.
    pub name: String,
    /// Non-time dimension names, in order.
    pub dims: Vec<String>,
    /// Non-time dimension lengths, in order.
    pub shape: Vec<usize>,
}

/// Time-indexed data the resampler can reduce.
///
/// Implementors expose their time axis and reduce every variable over the
/// time positions selected by a boolean mask, collapsing the time axis and
/// keeping every other axis.
pub trait TimeIndexed: Sync {
    /// The time axis.
    fn index(&self) -> &Index;

    /// Every variable and dimension name, for reserved-name checks.
    fn names(&self) -> Vec<&str>;

    /// Metadata attributes.
    fn attrs(&self) -> &Attrs;

    /// One layout per output variable, in output order.
    fn layouts(&self) -> Vec<Layout>;

    /// Coordinate values of non-time dimensions. None by default.
    fn coords(&self) -> Coords {
        Coords::new()
    }

    /// Reduces every variable over the masked time positions.
    ///
    /// Returns one array per layout, shaped like the layout. `mask` has one
    /// entry per time position.
    fn reduce_masked(&self, mask: &[bool], strategy: &Strategy) -> Vec<ArrayD<f64>>;
}

fn selected(values: &[f64], mask: &[bool]) -> Vec<f64> {
    values
        .iter()
        .zip(mask)
        .filter_map(|(&v, &keep)| keep.then_some(v))
        .collect()
}

fn scalar(value: f64) -> ArrayD<f64> {
    ArrayD::from_elem(IxDyn(&[]), value)
}

/// Checks coordinate values against every `(dims, shape)` that carries `dim`.
pub(crate) fn check_coord<'a>(
    dim: &str,
    values: &[f64],
    carriers: impl IntoIterator<Item = (&'a [String], &'a [usize])>,
) -> Result<(), ResampleError> {
    let invalid = |reason: String| ResampleError::InvalidCoord {
        dim: dim.to_string(),
        reason,
    };
    if values.iter().any(|v| !v.is_finite()) {
        return Err(invalid("values must be finite".to_string()));
    }
    let mut carried = false;
    for (dims, shape) in carriers {
        let Some(axis) = dims.iter().position(|d| d == dim) else {
            continue;
        };
        carried = true;
        if shape[axis] != values.len() {
            return Err(invalid(format!(
                "{} values for a dimension of length {}",
                values.len(),
                shape[axis]
            )));
        }
    }
    if !carried {
        return Err(invalid("no variable has this dimension".to_string()));
    }
    Ok(())
}

fn check_length(field: &str, expected: usize, got: usize) -> Result<(), ResampleError> {
    if expected != got {
        return Err(ResampleError::LengthMismatch {
            field: field.to_string(),
            expected,
            got,
        });
    }
    Ok(())
}

/// A single time series.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: Option<String>,
    index: Index,
    values: Vec<f64>,
    attrs: Attrs,
}

impl Series {
    /// Creates an unnamed series.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError::LengthMismatch`] if `values` and `index`
    /// differ in length.
    pub fn new(index: impl Into<Index>, values: Vec<f64>) -> Result<Self, ResampleError> {
        let index = index.into();
        check_length("values", index.len(), values.len())?;
        Ok(Self {
            name: None,
            index,
            values,
            attrs: Attrs::new(),
        })
    }

    /// Sets the series name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the metadata attributes.
    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Returns the series name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    fn output_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_SERIES_NAME)
    }
}

impl TimeIndexed for Series {
    fn index(&self) -> &Index {
        &self.index
    }

    fn names(&self) -> Vec<&str> {
        vec![self.output_name()]
    }

    fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    fn layouts(&self) -> Vec<Layout> {
        vec![Layout {
            name: self.output_name().to_string(),
            dims: Vec::new(),
            shape: Vec::new(),
        }]
    }

    fn reduce_masked(&self, mask: &[bool], strategy: &Strategy) -> Vec<ArrayD<f64>> {
        vec![scalar(strategy.apply(&selected(&self.values, mask)))]
    }
}

/// Named columns sharing one time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    index: Index,
    columns: Vec<(String, Vec<f64>)>,
    attrs: Attrs,
}

impl Frame {
    /// Creates a frame from `(name, values)` columns.
    ///
    /// # Errors
    ///
    /// - [`ResampleError::LengthMismatch`] if a column differs in length
    ///   from the index.
    /// - [`ResampleError::DuplicateVariable`] if two columns share a name.
    pub fn new(
        index: impl Into<Index>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, ResampleError> {
        let index = index.into();
        let mut seen = HashSet::new();
        for (name, values) in &columns {
            if !seen.insert(name.as_str()) {
                return Err(ResampleError::DuplicateVariable { name: name.clone() });
            }
            check_length(name, index.len(), values.len())?;
        }
        Ok(Self {
            index,
            columns,
            attrs: Attrs::new(),
        })
    }

    /// Sets the metadata attributes.
    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Returns the columns.
    pub fn columns(&self) -> &[(String, Vec<f64>)] {
        &self.columns
    }

    /// Returns the values of one column.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }
}

impl TimeIndexed for Frame {
    fn index(&self) -> &Index {
        &self.index
    }

    fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    fn layouts(&self) -> Vec<Layout> {
        self.columns
            .iter()
            .map(|(name, _)| Layout {
                name: name.clone(),
                dims: Vec::new(),
                shape: Vec::new(),
            })
            .collect()
    }

    fn reduce_masked(&self, mask: &[bool], strategy: &Strategy) -> Vec<ArrayD<f64>> {
        self.columns
            .iter()
            .map(|(_, values)| scalar(strategy.apply(&selected(values, mask))))
            .collect()
    }
}

/// A named n-dimensional array with labelled dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    dims: Vec<String>,
    data: ArrayD<f64>,
}

impl Variable {
    /// Creates a variable.
    ///
    /// # Errors
    ///
    /// - [`ResampleError::LengthMismatch`] if the number of dimension names
    ///   differs from the array rank.
    /// - [`ResampleError::DuplicateVariable`] if a dimension name repeats.
    pub fn new(
        name: impl Into<String>,
        dims: Vec<String>,
        data: ArrayD<f64>,
    ) -> Result<Self, ResampleError> {
        let name = name.into();
        check_length(&format!("{name} dims"), data.ndim(), dims.len())?;
        let mut seen = HashSet::new();
        if let Some(dup) = dims.iter().find(|d| !seen.insert(d.as_str())) {
            return Err(ResampleError::DuplicateVariable { name: dup.clone() });
        }
        Ok(Self { name, dims, data })
    }

    /// Returns the variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the dimension names.
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    /// Returns the data.
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }
}

/// Array variables sharing one time dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    time: Index,
    time_dim: String,
    variables: Vec<Variable>,
    /// Position of the time axis within each variable.
    time_axes: Vec<usize>,
    coords: Coords,
    attrs: Attrs,
}

impl Dataset {
    /// Creates a dataset whose variables all carry `time_dim`.
    ///
    /// # Errors
    ///
    /// - [`ResampleError::MissingTimeDim`] if a variable lacks `time_dim`.
    /// - [`ResampleError::LengthMismatch`] if a variable's time axis differs
    ///   in length from `time`.
    /// - [`ResampleError::DuplicateVariable`] if two variables share a name.
    pub fn new(
        time: impl Into<Index>,
        time_dim: impl Into<String>,
        variables: Vec<Variable>,
    ) -> Result<Self, ResampleError> {
        let time = time.into();
        let time_dim = time_dim.into();
        let mut seen = HashSet::new();
        let mut time_axes = Vec::with_capacity(variables.len());
        for var in &variables {
            if !seen.insert(var.name.as_str()) {
                return Err(ResampleError::DuplicateVariable {
                    name: var.name.clone(),
                });
            }
            let axis = var.dims.iter().position(|d| *d == time_dim).ok_or_else(|| {
                ResampleError::MissingTimeDim {
                    variable: var.name.clone(),
                    time_dim: time_dim.clone(),
                }
            })?;
            check_length(&var.name, time.len(), var.data.len_of(Axis(axis)))?;
            time_axes.push(axis);
        }
        Ok(Self {
            time,
            time_dim,
            variables,
            time_axes,
            coords: Coords::new(),
            attrs: Attrs::new(),
        })
    }

    /// Attaches coordinate values to a non-time dimension, replacing any
    /// given before.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError::InvalidCoord`] if no variable carries `dim`
    /// besides its time axis, if a variable's `dim` axis differs in length
    /// from `values`, or if a value is not finite.
    pub fn with_coord(
        mut self,
        dim: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, ResampleError> {
        let dim = dim.into();
        let layouts = self.layouts();
        check_coord(
            &dim,
            &values,
            layouts.iter().map(|l| (l.dims.as_slice(), l.shape.as_slice())),
        )?;
        self.coords.insert(dim, values);
        Ok(self)
    }

    /// Sets the metadata attributes.
    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Returns the name of the time dimension.
    pub fn time_dim(&self) -> &str {
        &self.time_dim
    }

    /// Returns the variables.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn reduce_variable(
        var: &Variable,
        axis: usize,
        positions: &[usize],
        strategy: &Strategy,
    ) -> ArrayD<f64> {
        if positions.is_empty() {
            let mut shape = var.data.shape().to_vec();
            shape.remove(axis);
            return ArrayD::from_elem(IxDyn(&shape), f64::NAN);
        }
        let picked = var.data.select(Axis(axis), positions);
        picked.map_axis(Axis(axis), |lane| {
            let samples: Vec<f64> = lane.iter().copied().collect();
            strategy.apply(&samples)
        })
    }
}

impl TimeIndexed for Dataset {
    fn index(&self) -> &Index {
        &self.time
    }

    fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.variables.iter().map(|v| v.name.as_str()).collect();
        for var in &self.variables {
            for dim in &var.dims {
                if !names.contains(&dim.as_str()) {
                    names.push(dim);
                }
            }
        }
        names
    }

    fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    fn layouts(&self) -> Vec<Layout> {
        self.variables
            .iter()
            .zip(&self.time_axes)
            .map(|(var, &axis)| {
                let mut dims = var.dims.clone();
                dims.remove(axis);
                let mut shape = var.data.shape().to_vec();
                shape.remove(axis);
                Layout {
                    name: var.name.clone(),
                    dims,
                    shape,
                }
            })
            .collect()
    }

    fn coords(&self) -> Coords {
        self.coords.clone()
    }

    fn reduce_masked(&self, mask: &[bool], strategy: &Strategy) -> Vec<ArrayD<f64>> {
        let positions: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        self.variables
            .iter()
            .zip(&self.time_axes)
            .map(|(var, &axis)| Self::reduce_variable(var, axis, &positions, strategy))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::{Method, Reducer};
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use ndarray::{Array2, Array3};

    fn days(n: usize) -> Vec<NaiveDateTime> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_time(NaiveTime::MIN);
        (0..n)
            .map(|i| start + chrono::TimeDelta::days(i as i64))
            .collect()
    }

    fn mean() -> Strategy {
        Reducer::from(Method::Mean).resolve()
    }

    #[test]
    fn series_length_checked() {
        let err = Series::new(days(3), vec![1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            ResampleError::LengthMismatch {
                field: "values".to_string(),
                expected: 3,
                got: 2,
            }
        );
    }

    #[test]
    fn unnamed_series_outputs_data() {
        let s = Series::new(days(2), vec![1.0, 2.0]).unwrap();
        assert_eq!(s.names(), vec!["data"]);
        assert_eq!(s.layouts()[0].name, "data");
        let named = s.with_name("precip");
        assert_eq!(named.names(), vec!["precip"]);
    }

    #[test]
    fn series_reduce_masked() {
        let s = Series::new(days(4), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let out = s.reduce_masked(&[false, true, true, false], &mean());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].ndim(), 0);
        assert_relative_eq!(out[0][IxDyn(&[])], 2.5);
        assert!(s.reduce_masked(&[false; 4], &mean())[0][IxDyn(&[])].is_nan());
    }

    #[test]
    fn frame_rejects_duplicates_and_bad_lengths() {
        let dup = Frame::new(
            days(2),
            vec![("a".to_string(), vec![1.0, 2.0]), ("a".to_string(), vec![1.0, 2.0])],
        );
        assert!(matches!(dup, Err(ResampleError::DuplicateVariable { .. })));
        let short = Frame::new(days(2), vec![("a".to_string(), vec![1.0])]);
        assert!(matches!(short, Err(ResampleError::LengthMismatch { .. })));
    }

    #[test]
    fn frame_reduces_each_column() {
        let frame = Frame::new(
            days(3),
            vec![
                ("a".to_string(), vec![1.0, 2.0, 3.0]),
                ("b".to_string(), vec![10.0, 20.0, 30.0]),
            ],
        )
        .unwrap();
        let out = frame.reduce_masked(&[true, true, false], &mean());
        assert_relative_eq!(out[0][IxDyn(&[])], 1.5);
        assert_relative_eq!(out[1][IxDyn(&[])], 15.0);
        assert_eq!(frame.column("b").unwrap(), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn dataset_requires_time_dim() {
        let var = Variable::new(
            "sst",
            vec!["lat".to_string(), "lon".to_string()],
            Array2::<f64>::zeros((2, 2)).into_dyn(),
        )
        .unwrap();
        assert_eq!(
            Dataset::new(days(2), "time", vec![var]).unwrap_err(),
            ResampleError::MissingTimeDim {
                variable: "sst".to_string(),
                time_dim: "time".to_string(),
            }
        );
    }

    #[test]
    fn variable_rank_checked() {
        let err = Variable::new("x", vec!["time".to_string()], Array2::<f64>::zeros((2, 2)).into_dyn());
        assert!(matches!(err, Err(ResampleError::LengthMismatch { .. })));
    }

    #[test]
    fn dataset_reduces_time_axis_only() {
        // dims (lat, time, lon) with time in the middle
        let data = Array3::from_shape_fn((2, 3, 2), |(i, t, j)| (100 * i + 10 * t + j) as f64);
        let var = Variable::new(
            "sst",
            vec!["lat".to_string(), "time".to_string(), "lon".to_string()],
            data.into_dyn(),
        )
        .unwrap();
        let ds = Dataset::new(days(3), "time", vec![var]).unwrap();

        let layouts = ds.layouts();
        assert_eq!(layouts[0].dims, vec!["lat".to_string(), "lon".to_string()]);
        assert_eq!(layouts[0].shape, vec![2, 2]);
        assert_eq!(ds.names(), vec!["sst", "lat", "time", "lon"]);

        let out = ds.reduce_masked(&[false, true, true], &mean());
        assert_eq!(out[0].shape(), &[2, 2]);
        assert_relative_eq!(out[0][IxDyn(&[0, 0])], 15.0);
        assert_relative_eq!(out[0][IxDyn(&[1, 1])], 116.0);

        let empty = ds.reduce_masked(&[false, false, false], &mean());
        assert_eq!(empty[0].shape(), &[2, 2]);
        assert!(empty[0].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn dataset_coords_follow_non_time_dims() {
        let var = Variable::new(
            "sst",
            vec!["time".to_string(), "lat".to_string()],
            Array2::<f64>::zeros((3, 2)).into_dyn(),
        )
        .unwrap();
        let ds = Dataset::new(days(3), "time", vec![var]).unwrap();
        assert!(ds.coords().is_empty());

        let ds = ds.with_coord("lat", vec![-5.0, 5.0]).unwrap();
        assert_eq!(ds.coords()["lat"], vec![-5.0, 5.0]);

        let err = ds.clone().with_coord("lat", vec![0.0]).unwrap_err();
        assert_eq!(
            err,
            ResampleError::InvalidCoord {
                dim: "lat".to_string(),
                reason: "1 values for a dimension of length 2".to_string(),
            }
        );
        assert!(matches!(
            ds.clone().with_coord("time", vec![0.0; 3]),
            Err(ResampleError::InvalidCoord { .. })
        ));
        assert!(matches!(
            ds.with_coord("lat", vec![0.0, f64::NAN]),
            Err(ResampleError::InvalidCoord { .. })
        ));
    }
}
