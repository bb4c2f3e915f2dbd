//! Resampling of time-indexed data onto a realized calendar.

use std::collections::{BTreeSet, HashSet};

use almanac_calendar::{IntervalTable, RealizedInterval};
use chrono::NaiveDateTime;
use ndarray::{Array2, ArrayD, IxDyn};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::attrs::with_provenance;
use crate::config::{ResampleConfig, YearOrder};
use crate::data::TimeIndexed;
use crate::error::ResampleError;
use crate::frequency::check_frequency;
use crate::reducer::{Reducer, Strategy};
use crate::result::{RESERVED_NAMES, ResampledFrame, ResampledVariable};
use crate::warning::ResampleWarning;

/// Resamples `data` onto every `(anchor_year, interval)` cell of `table`.
///
/// Each cell selects the samples with `left < t <= right` over the whole
/// time axis, so overlapping intervals see the same samples, and reduces
/// them with `how`. Only the time axis collapses; every other dimension of
/// the input is kept.
///
/// # Errors
///
/// Checked in this order, before any reduction:
/// - [`ResampleError::InvalidConfig`] if `config` is invalid.
/// - [`ResampleError::EmptyCalendar`] if the table has no intervals.
/// - [`ResampleError::InvalidIndex`] if the time axis is not a non-empty,
///   chronological datetime index.
/// - [`ResampleError::ReservedName`] if a variable or dimension uses a
///   reserved name.
/// - [`ResampleError::IncompatibleFrequency`] if an interval is shorter than
///   the finest gap between timestamps.
pub fn resample<D>(
    table: &IntervalTable,
    data: &D,
    how: &Reducer,
    config: &ResampleConfig,
) -> Result<ResampledFrame, ResampleError>
where
    D: TimeIndexed + ?Sized,
{
    resample_with_extra(table, data, how, &[], config)
}

/// Like [`resample`], with additional reducers.
///
/// Every `(name, reducer)` pair adds one output variable per input variable,
/// named `{variable}_{name}`, after the variables reduced with `how`.
///
/// # Errors
///
/// Same conditions as [`resample`], plus
/// [`ResampleError::DuplicateVariable`] if a generated name collides with
/// another output variable.
#[tracing::instrument(
    skip_all,
    fields(
        n_years = table.years().len(),
        n_labels = table.n_labels(),
        how = ?how,
        n_extra = extra.len()
    )
)]
pub fn resample_with_extra<D>(
    table: &IntervalTable,
    data: &D,
    how: &Reducer,
    extra: &[(String, Reducer)],
    config: &ResampleConfig,
) -> Result<ResampledFrame, ResampleError>
where
    D: TimeIndexed + ?Sized,
{
    config.validate()?;

    if table.is_empty() {
        return Err(ResampleError::EmptyCalendar);
    }

    let times = data
        .index()
        .datetimes()
        .map_err(|e| ResampleError::InvalidIndex {
            reason: match e {
                almanac_calendar::CalendarError::InvalidIndex { reason } => reason,
                other => other.to_string(),
            },
        })?;

    let layouts = data.layouts();
    let mut output_names: Vec<String> = layouts.iter().map(|l| l.name.clone()).collect();
    for (suffix, _) in extra {
        output_names.extend(layouts.iter().map(|l| format!("{}_{suffix}", l.name)));
    }
    check_reserved(data.names().into_iter().chain(output_names.iter().map(String::as_str)))?;
    let mut seen = HashSet::new();
    if let Some(dup) = output_names.iter().find(|n| !seen.insert(n.as_str())) {
        return Err(ResampleError::DuplicateVariable { name: dup.clone() });
    }

    let mut warnings = Vec::new();
    if let Some(w) = check_frequency(times, table, config.low_frequency_tolerance())? {
        warnings.push(w);
    }

    // Strategies are resolved once for the whole call.
    let strategies: Vec<Strategy> = std::iter::once(how)
        .chain(extra.iter().map(|(_, r)| r))
        .map(Reducer::resolve)
        .collect();

    let mut years: Vec<_> = table.years().iter().collect();
    if config.year_order() == YearOrder::Ascending {
        years.reverse();
    }
    let n_years = years.len();
    let n_labels = table.n_labels();
    let cells: Vec<&RealizedInterval> = years.iter().flat_map(|y| y.intervals()).collect();

    let reduce_cell = |interval: &&RealizedInterval| -> (bool, Vec<ArrayD<f64>>) {
        let mask = cell_mask(times, interval);
        let empty = !mask.iter().any(|&m| m);
        let arrays = strategies
            .iter()
            .flat_map(|s| data.reduce_masked(&mask, s))
            .collect();
        (empty, arrays)
    };
    let reduced: Vec<(bool, Vec<ArrayD<f64>>)> = if config.parallel() {
        cells.par_iter().map(reduce_cell).collect()
    } else {
        cells.iter().map(reduce_cell).collect()
    };

    let n_empty = reduced.iter().filter(|(empty, _)| *empty).count();
    if n_empty > 0 {
        warnings.push(ResampleWarning::MissingData { n_empty });
    }
    for w in &warnings {
        warn!("{w}");
    }

    let variables = output_names
        .into_iter()
        .zip(layouts.iter().cycle())
        .enumerate()
        .map(|(k, (name, layout))| {
            let mut shape = vec![n_years, n_labels];
            shape.extend(&layout.shape);
            let values: Vec<f64> = reduced
                .iter()
                .flat_map(|(_, arrays)| arrays[k].iter().copied())
                .collect();
            let array = ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|e| {
                ResampleError::InvalidFrame {
                    reason: format!("variable '{name}': {e}"),
                }
            })?;
            Ok(ResampledVariable::new(name, layout.dims.clone(), array))
        })
        .collect::<Result<Vec<_>, ResampleError>>()?;

    let is_target = Array2::from_shape_fn((n_years, n_labels), |(i, j)| {
        years[i].intervals()[j].is_target()
    });
    let anchor_years = years.iter().map(|y| y.anchor_year()).collect();
    let attrs = with_provenance(data.attrs(), table);

    debug!(
        n_cells = cells.len(),
        n_variables = variables.len(),
        n_empty,
        "resampled data onto calendar"
    );

    Ok(
        ResampledFrame::from_parts(anchor_years, table.labels(), is_target, variables, attrs)?
            .with_coords(data.coords())?
            .with_warnings(warnings),
    )
}

/// Fails if any name is reserved for the output structure.
fn check_reserved<'a>(names: impl Iterator<Item = &'a str>) -> Result<(), ResampleError> {
    let offenders: BTreeSet<&str> = names.filter(|n| RESERVED_NAMES.contains(n)).collect();
    if offenders.is_empty() {
        return Ok(());
    }
    Err(ResampleError::ReservedName {
        names: offenders.into_iter().map(str::to_string).collect(),
    })
}

/// Selects the timestamps inside `(left, right]`. `times` is sorted.
fn cell_mask(times: &[NaiveDateTime], interval: &RealizedInterval) -> Vec<bool> {
    let start = times.partition_point(|&t| t <= interval.left());
    let end = times.partition_point(|&t| t <= interval.right());
    let mut mask = vec![false; times.len()];
    if start < end {
        mask[start..end].fill(true);
    }
    mask
}
