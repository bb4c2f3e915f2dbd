//! # almanac-calendar
//!
//! Anchor-relative interval calendars and their realization into dated
//! `(left, right]` intervals for concrete years.
//!
//! ## Architecture
//!
//! ```mermaid
//! graph LR
//!     A["Anchor + IntervalSpec list"] -->|"Calendar::offsets()"| B["(right, left) spans"]
//!     B -->|"realize_year()"| C["RealizedCalendar"]
//!     C -->|"realize_range() / realize_for_data()"| D["IntervalTable"]
//!     E["Index"] -->|"span()"| D
//!     D -->|"flatten()"| F["(anchor_year, interval) rows"]
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use almanac_calendar::{Anchor, Calendar, Role, Span, date_range};
//!
//! let mut calendar = Calendar::new("10-15".parse::<Anchor>()?);
//! calendar
//!     .add_interval("target", Role::Target, Span::days(180), Span::ZERO)?
//!     .add_interval("precursor", Role::Precursor, Span::days(180), Span::ZERO)?;
//!
//! // One year
//! let year = calendar.realize_year(2020)?;
//!
//! // Every year covered by a dataset
//! let index = date_range(start, end, Span::days(1))?;
//! let table = calendar.realize_for_data(&index)?;
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `anchor` | Recurring month-day anchor |
//! | `span` | Month/day durations used for lengths and gaps |
//! | `interval` | Interval roles and definitions |
//! | `calendar` | Calendar builder, presets and encoding |
//! | `realize` | Realization for one year, a year range or a dataset |
//! | `realized` | Dated intervals and the year × label table |
//! | `index` | Time axis of data containers |
//! | `error` | Error types |

mod anchor;
mod calendar;
mod error;
mod index;
mod interval;
mod realize;
mod realized;
mod span;

pub use anchor::Anchor;
pub use calendar::{Calendar, daily_calendar, monthly_calendar};
pub use error::CalendarError;
pub use index::{Index, date_range};
pub use interval::{IntervalSpec, Role};
pub use realized::{IntervalTable, Label, RealizedCalendar, RealizedInterval};
pub use span::Span;
