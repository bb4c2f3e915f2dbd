//! Resampling of time-indexed data onto realized almanac calendars.
//!
//! This crate aggregates a series, a table of columns, or labelled
//! n-dimensional arrays onto every `(anchor_year, interval)` cell of an
//! [`IntervalTable`](almanac_calendar::IntervalTable), after checking the
//! input for reserved names and for a sampling step compatible with the
//! intervals.
//!
//! # Pipeline
//!
//! ```text
//!  ┌──────────────┐     ┌────────────────┐     ┌──────────────────┐
//!  │  Validation   │────▶│  Frequency      │────▶│  Per-cell reduce  │
//!  │  (index/names)│     │  diagnostics    │     │  (rayon)          │
//!  └──────────────┘     └────────────────┘     └──────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```ignore
//! use almanac_calendar::{Anchor, daily_calendar};
//! use almanac_resample::{Method, ResampleConfig, Series, resample};
//!
//! let calendar = daily_calendar("10-15".parse::<Anchor>()?, 180, 1, None)?;
//! let series = Series::new(times, values)?.with_name("sst");
//! let table = calendar.realize_for_data(series.index())?;
//! let frame = resample(&table, &series, &Method::Mean.into(), &ResampleConfig::new())?;
//! ```

mod attrs;
mod config;
mod data;
mod error;
mod frequency;
mod reducer;
mod resample;
mod result;
mod warning;

pub use attrs::{
    ANCHOR_KEY, AttrValue, Attrs, CALENDAR_CODE_KEY, HISTORY_KEY, VERSION, VERSION_KEY,
    with_provenance,
};
pub use config::{ResampleConfig, YearOrder};
pub use data::{
    Coords, DEFAULT_SERIES_NAME, Dataset, Frame, Layout, Series, TimeIndexed, Variable,
};
pub use error::ResampleError;
pub use frequency::{finest_step, sampling_step};
pub use reducer::{CustomFn, Method, Reducer, Strategy};
pub use resample::{resample, resample_with_extra};
pub use result::{
    ANCHOR_YEAR, IS_TARGET, LABEL_DIM, RESERVED_NAMES, ResampledFrame, ResampledVariable,
};
pub use warning::ResampleWarning;
