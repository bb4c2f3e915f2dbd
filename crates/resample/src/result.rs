//! Output type for resampling operations.

use std::collections::HashSet;

use almanac_calendar::Label;
use ndarray::{Array2, ArrayD};

use crate::attrs::Attrs;
use crate::data::{Coords, check_coord};
use crate::error::ResampleError;
use crate::warning::ResampleWarning;

/// Name of the anchor-year axis.
pub const ANCHOR_YEAR: &str = "anchor_year";
/// Name of the interval-label axis.
pub const LABEL_DIM: &str = "interval";
/// Name of the target flag.
pub const IS_TARGET: &str = "is_target";

/// Names no input variable or dimension may use.
pub const RESERVED_NAMES: [&str; 3] = [ANCHOR_YEAR, LABEL_DIM, IS_TARGET];

/// One resampled variable, shaped `[anchor_year, interval, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledVariable {
    name: String,
    dims: Vec<String>,
    data: ArrayD<f64>,
}

impl ResampledVariable {
    /// Creates a variable from its non-time dimensions and full data array.
    ///
    /// The two leading axes of `data` are the anchor-year and interval axes.
    pub fn new(name: impl Into<String>, extra_dims: Vec<String>, data: ArrayD<f64>) -> Self {
        let mut dims = vec![ANCHOR_YEAR.to_string(), LABEL_DIM.to_string()];
        dims.extend(extra_dims);
        Self {
            name: name.into(),
            dims,
            data,
        }
    }

    /// Returns the variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns every dimension name, structural axes first.
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    /// Returns the dimensions carried over from the input.
    pub fn extra_dims(&self) -> &[String] {
        &self.dims[2..]
    }

    /// Returns the data.
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Returns the values in row order: years outer, labels inner, then the
    /// remaining axes.
    pub fn flat_values(&self) -> Vec<f64> {
        self.data.iter().copied().collect()
    }
}

/// Data resampled onto a realized calendar.
///
/// One cell per `(anchor_year, interval)`; every input variable becomes one
/// output variable with its time axis replaced by those two axes.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledFrame {
    anchor_years: Vec<i32>,
    labels: Vec<Label>,
    is_target: Array2<bool>,
    variables: Vec<ResampledVariable>,
    coords: Coords,
    attrs: Attrs,
    warnings: Vec<ResampleWarning>,
}

impl ResampledFrame {
    /// Assembles a frame, checking that every part fits the two axes.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError::InvalidFrame`] on any shape or naming
    /// mismatch and [`ResampleError::DuplicateVariable`] on repeated
    /// variable names.
    pub fn from_parts(
        anchor_years: Vec<i32>,
        labels: Vec<Label>,
        is_target: Array2<bool>,
        variables: Vec<ResampledVariable>,
        attrs: Attrs,
    ) -> Result<Self, ResampleError> {
        let cells = (anchor_years.len(), labels.len());
        if is_target.dim() != cells {
            return Err(ResampleError::InvalidFrame {
                reason: format!(
                    "is_target has shape {:?}, expected {:?}",
                    is_target.dim(),
                    cells
                ),
            });
        }
        let mut seen = HashSet::new();
        for var in &variables {
            if !seen.insert(var.name.as_str()) {
                return Err(ResampleError::DuplicateVariable {
                    name: var.name.clone(),
                });
            }
            let shape = var.data.shape();
            if var.dims.len() != shape.len() {
                return Err(ResampleError::InvalidFrame {
                    reason: format!(
                        "variable '{}' has {} dims for a rank-{} array",
                        var.name,
                        var.dims.len(),
                        shape.len()
                    ),
                });
            }
            if shape.len() < 2 || shape[0] != cells.0 || shape[1] != cells.1 {
                return Err(ResampleError::InvalidFrame {
                    reason: format!(
                        "variable '{}' has shape {:?}, expected leading axes {:?}",
                        var.name, shape, cells
                    ),
                });
            }
        }
        Ok(Self {
            anchor_years,
            labels,
            is_target,
            variables,
            coords: Coords::new(),
            attrs,
            warnings: Vec::new(),
        })
    }

    /// Attaches coordinate values to dimensions carried over from the input.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError::InvalidCoord`] if a dimension belongs to no
    /// variable, its length differs from the values, or a value is not
    /// finite.
    pub fn with_coords(mut self, coords: Coords) -> Result<Self, ResampleError> {
        for (dim, values) in &coords {
            check_coord(
                dim,
                values,
                self.variables
                    .iter()
                    .map(|v| (v.extra_dims(), &v.data.shape()[2..])),
            )?;
        }
        self.coords = coords;
        Ok(self)
    }

    pub(crate) fn with_warnings(mut self, warnings: Vec<ResampleWarning>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Returns the anchor years, in axis order.
    pub fn anchor_years(&self) -> &[i32] {
        &self.anchor_years
    }

    /// Returns the interval labels, in calendar order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Returns the number of anchor years.
    pub fn n_years(&self) -> usize {
        self.anchor_years.len()
    }

    /// Returns the number of interval labels.
    pub fn n_labels(&self) -> usize {
        self.labels.len()
    }

    /// Returns the target flag of every cell.
    pub fn is_target(&self) -> &Array2<bool> {
        &self.is_target
    }

    /// Returns the variables, in output order.
    pub fn variables(&self) -> &[ResampledVariable] {
        &self.variables
    }

    /// Returns a variable by name.
    pub fn variable(&self, name: &str) -> Option<&ResampledVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Returns the coordinate values of the carried-over dimensions.
    pub fn coords(&self) -> &Coords {
        &self.coords
    }

    /// Returns the metadata attributes.
    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// Returns the warnings raised while resampling.
    pub fn warnings(&self) -> &[ResampleWarning] {
        &self.warnings
    }

    /// Anchor year of every cell, years outer and labels inner.
    pub fn flat_anchor_years(&self) -> Vec<i32> {
        self.anchor_years
            .iter()
            .flat_map(|&y| std::iter::repeat_n(y, self.labels.len()))
            .collect()
    }

    /// Label of every cell, years outer and labels inner.
    pub fn flat_labels(&self) -> Vec<Label> {
        self.anchor_years
            .iter()
            .flat_map(|_| self.labels.iter().copied())
            .collect()
    }

    /// Target flag of every cell, years outer and labels inner.
    pub fn flat_is_target(&self) -> Vec<bool> {
        self.is_target.iter().copied().collect()
    }
}
