//! # almanac
//!
//! Anchor-relative interval calendars for subseasonal-to-seasonal (S2S)
//! prediction research, and resampling of time series and gridded data onto
//! them.
//!
//! A [`Calendar`] is a list of target and precursor intervals counted
//! backward from a yearly anchor date. Realizing it produces concrete
//! `(left, right]` intervals for every anchor year, and [`resample`]
//! aggregates data onto each `(anchor_year, interval)` cell.
//!
//! ```mermaid
//! graph LR
//!     A[Calendar] -->|realize_for_data| B[IntervalTable]
//!     D[Series / Frame / Dataset] --> R[resample]
//!     B --> R
//!     R --> F[ResampledFrame]
//!     F -->|write_parquet| P[(Parquet)]
//! ```
//!
//! # Quick start
//!
//! ```ignore
//! use almanac::{Anchor, Method, ResampleConfig, Series, TimeIndexed, daily_calendar, resample};
//!
//! almanac::logging::init(1);
//! let calendar = daily_calendar("12-31".parse::<Anchor>()?, 7, 1, Some(3))?;
//! let series = Series::new(times, values)?.with_name("t2m");
//! let table = calendar.realize_for_data(series.index())?;
//! let frame = resample(&table, &series, &Method::Mean.into(), &ResampleConfig::new())?;
//! ```
//!
//! # Crates
//!
//! | Crate | Purpose |
//! |-------|---------|
//! | [`almanac_calendar`] | anchors, spans, calendars and their realization |
//! | [`almanac_stats`] | NaN-aware reducers |
//! | [`almanac_resample`] | input adapters, diagnostics and [`resample`] |
//! | [`almanac_io`] | Parquet archives of resampled frames |

pub mod logging;

pub use almanac_calendar::{
    Anchor, Calendar, CalendarError, Index, IntervalSpec, IntervalTable, Label, RealizedCalendar,
    RealizedInterval, Role, Span, daily_calendar, date_range, monthly_calendar,
};
pub use almanac_io::{Compression, IoError, WriterConfig, read_parquet, write_parquet};
pub use almanac_resample::{
    AttrValue, Attrs, Coords, CustomFn, Dataset, Frame, Method, Reducer, ResampleConfig,
    ResampleError, ResampleWarning, ResampledFrame, ResampledVariable, Series, TimeIndexed,
    Variable, YearOrder, resample, resample_with_extra,
};

pub use almanac_calendar;
pub use almanac_io;
pub use almanac_resample;
pub use almanac_stats;
