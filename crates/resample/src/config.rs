//! Configuration for resampling onto realized calendars.

use serde::Deserialize;

use crate::error::ResampleError;

/// Order of the anchor-year axis in resampled output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YearOrder {
    /// Latest anchor year first, as realized.
    #[default]
    Descending,
    /// Earliest anchor year first.
    Ascending,
}

/// Configuration for [`resample`](crate::resample).
///
/// Use the builder methods to customise parameters. The struct also
/// deserializes from a table where every field is optional, so it can be
/// embedded in an application's configuration file.
///
/// # Example
///
/// ```
/// use almanac_resample::{ResampleConfig, YearOrder};
///
/// let config = ResampleConfig::new()
///     .with_low_frequency_tolerance(3.0)
///     .with_year_order(YearOrder::Ascending);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResampleConfig {
    #[serde(default = "default_low_frequency_tolerance")]
    low_frequency_tolerance: f64,
    #[serde(default)]
    year_order: YearOrder,
    #[serde(default = "default_parallel")]
    parallel: bool,
}

fn default_low_frequency_tolerance() -> f64 {
    2.0
}

fn default_parallel() -> bool {
    true
}

impl ResampleConfig {
    /// Creates a new configuration with defaults.
    ///
    /// Defaults: `low_frequency_tolerance = 2.0`,
    /// `year_order = Descending`, `parallel = true`.
    pub fn new() -> Self {
        Self {
            low_frequency_tolerance: default_low_frequency_tolerance(),
            year_order: YearOrder::default(),
            parallel: default_parallel(),
        }
    }

    /// Sets the factor below which `shortest interval / sampling step`
    /// raises a low-frequency warning.
    pub fn with_low_frequency_tolerance(mut self, tolerance: f64) -> Self {
        self.low_frequency_tolerance = tolerance;
        self
    }

    /// Sets the order of the anchor-year axis.
    pub fn with_year_order(mut self, order: YearOrder) -> Self {
        self.year_order = order;
        self
    }

    /// Enables or disables parallel reduction of cells.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    // --- Accessors ---

    /// Returns the low-frequency tolerance factor.
    pub fn low_frequency_tolerance(&self) -> f64 {
        self.low_frequency_tolerance
    }

    /// Returns the order of the anchor-year axis.
    pub fn year_order(&self) -> YearOrder {
        self.year_order
    }

    /// Returns `true` if cells are reduced in parallel.
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), ResampleError> {
        if !self.low_frequency_tolerance.is_finite() || self.low_frequency_tolerance < 1.0 {
            return Err(ResampleError::InvalidConfig {
                reason: format!(
                    "low_frequency_tolerance must be finite and >= 1, got {}",
                    self.low_frequency_tolerance
                ),
            });
        }
        Ok(())
    }
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ResampleConfig::new();
        assert!((cfg.low_frequency_tolerance() - 2.0).abs() < f64::EPSILON);
        assert_eq!(cfg.year_order(), YearOrder::Descending);
        assert!(cfg.parallel());
    }

    #[test]
    fn builder_chaining() {
        let cfg = ResampleConfig::new()
            .with_low_frequency_tolerance(4.0)
            .with_year_order(YearOrder::Ascending)
            .with_parallel(false);
        assert!((cfg.low_frequency_tolerance() - 4.0).abs() < f64::EPSILON);
        assert_eq!(cfg.year_order(), YearOrder::Ascending);
        assert!(!cfg.parallel());
    }

    #[test]
    fn validate_ok() {
        assert!(ResampleConfig::new().validate().is_ok());
        assert!(
            ResampleConfig::new()
                .with_low_frequency_tolerance(1.0)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn validate_bad_tolerance() {
        for bad in [0.5, 0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(
                ResampleConfig::new()
                    .with_low_frequency_tolerance(bad)
                    .validate()
                    .is_err(),
                "tolerance {bad} should be rejected"
            );
        }
    }

    #[test]
    fn deserialize_partial_toml() {
        let cfg: ResampleConfig = toml::from_str("year_order = \"ascending\"").unwrap();
        assert_eq!(cfg.year_order(), YearOrder::Ascending);
        assert!((cfg.low_frequency_tolerance() - 2.0).abs() < f64::EPSILON);
        assert!(cfg.parallel());
    }

    #[test]
    fn deserialize_full_toml() {
        let cfg: ResampleConfig = toml::from_str(
            "low_frequency_tolerance = 3.5\nyear_order = \"descending\"\nparallel = false",
        )
        .unwrap();
        assert_eq!(
            cfg,
            ResampleConfig::new()
                .with_low_frequency_tolerance(3.5)
                .with_parallel(false)
        );
    }

    #[test]
    fn deserialize_rejects_unknown_fields() {
        assert!(toml::from_str::<ResampleConfig>("tolerance = 3.0").is_err());
    }

    #[test]
    fn default_matches_new() {
        assert_eq!(ResampleConfig::default(), ResampleConfig::new());
    }
}
