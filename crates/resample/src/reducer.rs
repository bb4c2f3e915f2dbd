//! Reduction methods applied to the samples of one interval.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ResampleError;

/// Built-in reduction methods.
///
/// All methods skip NaN samples except [`Method::Size`], which counts every
/// sample. A cell without any sample is NaN for every method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Method {
    /// Arithmetic mean.
    #[default]
    Mean,
    /// Median.
    Median,
    /// Sum.
    Sum,
    /// Minimum.
    Min,
    /// Maximum.
    Max,
    /// Sample standard deviation (N-1).
    Std,
    /// Sample variance (N-1).
    Var,
    /// Peak-to-peak range.
    Ptp,
    /// Number of samples, NaN included.
    Size,
    /// Number of non-NaN samples.
    Count,
    /// Number of non-NaN, non-zero samples.
    CountNonzero,
}

impl Method {
    /// Every built-in method, in declaration order.
    pub const ALL: [Method; 11] = [
        Method::Mean,
        Method::Median,
        Method::Sum,
        Method::Min,
        Method::Max,
        Method::Std,
        Method::Var,
        Method::Ptp,
        Method::Size,
        Method::Count,
        Method::CountNonzero,
    ];

    /// Name of the method as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Mean => "mean",
            Method::Median => "median",
            Method::Sum => "sum",
            Method::Min => "min",
            Method::Max => "max",
            Method::Std => "std",
            Method::Var => "var",
            Method::Ptp => "ptp",
            Method::Size => "size",
            Method::Count => "count",
            Method::CountNonzero => "count_nonzero",
        }
    }

    fn function(self) -> fn(&[f64]) -> f64 {
        match self {
            Method::Mean => almanac_stats::mean,
            Method::Median => almanac_stats::median,
            Method::Sum => almanac_stats::sum,
            Method::Min => almanac_stats::min,
            Method::Max => almanac_stats::max,
            Method::Std => almanac_stats::sd,
            Method::Var => almanac_stats::variance,
            Method::Ptp => almanac_stats::ptp,
            Method::Size => |s| s.len() as f64,
            Method::Count => |s| almanac_stats::count(s) as f64,
            Method::CountNonzero => |s| almanac_stats::count_nonzero(s) as f64,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ResampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == name)
            .ok_or_else(|| ResampleError::UnknownMethod {
                name: name.to_string(),
            })
    }
}

/// A user-supplied reduction over the samples of one cell.
pub type CustomFn = dyn Fn(&[f64]) -> f64 + Send + Sync;

/// How the samples of a cell are reduced to one value.
#[derive(Clone)]
pub enum Reducer {
    /// A built-in method.
    Builtin(Method),
    /// A user-supplied function. It receives every sample of a non-empty
    /// cell, NaN included, and is never called for empty cells.
    Custom(Arc<CustomFn>),
}

impl Reducer {
    /// Wraps a closure as a custom reducer.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Reducer::Custom(Arc::new(f))
    }

    /// Resolves the reducer into the strategy applied to every cell.
    pub fn resolve(&self) -> Strategy {
        match self {
            Reducer::Builtin(method) => Strategy(Inner::Builtin(method.function())),
            Reducer::Custom(f) => Strategy(Inner::Custom(Arc::clone(f))),
        }
    }
}

impl Default for Reducer {
    fn default() -> Self {
        Reducer::Builtin(Method::Mean)
    }
}

impl From<Method> for Reducer {
    fn from(method: Method) -> Self {
        Reducer::Builtin(method)
    }
}

impl FromStr for Reducer {
    type Err = ResampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Reducer::Builtin)
    }
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reducer::Builtin(method) => write!(f, "Builtin({method})"),
            Reducer::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A resolved [`Reducer`], ready to be applied to cells.
#[derive(Clone)]
pub struct Strategy(Inner);

#[derive(Clone)]
enum Inner {
    Builtin(fn(&[f64]) -> f64),
    Custom(Arc<CustomFn>),
}

impl Strategy {
    /// Reduces the samples of one cell. Empty cells are NaN.
    pub fn apply(&self, samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return f64::NAN;
        }
        match &self.0 {
            Inner::Builtin(f) => f(samples),
            Inner::Custom(f) => f(samples),
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Inner::Builtin(_) => f.write_str("Strategy(builtin)"),
            Inner::Custom(_) => f.write_str("Strategy(custom)"),
        }
    }
}
