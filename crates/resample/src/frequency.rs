//! Sampling-step versus interval-length diagnostics.

use almanac_calendar::IntervalTable;
use chrono::{NaiveDateTime, TimeDelta};
use tracing::debug;

use crate::error::ResampleError;
use crate::warning::ResampleWarning;

/// Median positive gap between consecutive timestamps, or `None` with fewer
/// than two distinct timestamps.
pub fn sampling_step(times: &[NaiveDateTime]) -> Option<TimeDelta> {
    step_by(times, almanac_stats::median_step)
}

/// Smallest positive gap between consecutive timestamps, or `None` with
/// fewer than two distinct timestamps.
pub fn finest_step(times: &[NaiveDateTime]) -> Option<TimeDelta> {
    step_by(times, almanac_stats::min_step)
}

fn step_by(times: &[NaiveDateTime], reduce: fn(&[f64]) -> Option<f64>) -> Option<TimeDelta> {
    let first = *times.first()?;
    let offsets: Vec<f64> = times
        .iter()
        .map(|&t| (t - first).num_milliseconds() as f64)
        .collect();
    let step_ms = reduce(&offsets)?;
    Some(TimeDelta::milliseconds(step_ms.round() as i64))
}

/// Compares the shortest realized interval with the data's sampling step.
///
/// Returns a [`ResampleWarning::LowFrequency`] when the shortest interval is
/// shorter than `tolerance` median sampling steps. Months of 28 to 31 days
/// therefore resample monthly data with a warning.
///
/// # Errors
///
/// Returns [`ResampleError::IncompatibleFrequency`] when the shortest
/// interval is shorter than the finest gap between timestamps, so that some
/// interval could not hold a single sample.
pub(crate) fn check_frequency(
    times: &[NaiveDateTime],
    table: &IntervalTable,
    tolerance: f64,
) -> Result<Option<ResampleWarning>, ResampleError> {
    let (Some(step), Some(finest), Some(shortest)) = (
        sampling_step(times),
        finest_step(times),
        table.shortest_interval(),
    ) else {
        debug!("skipping frequency check");
        return Ok(None);
    };
    debug!(?step, ?finest, ?shortest, "frequency check");

    if shortest < finest {
        return Err(ResampleError::IncompatibleFrequency {
            shortest,
            step: finest,
        });
    }
    let ratio = shortest.num_milliseconds() as f64 / step.num_milliseconds() as f64;
    if ratio < tolerance {
        return Ok(Some(ResampleWarning::LowFrequency {
            shortest,
            step,
            tolerance,
        }));
    }
    Ok(None)
}
