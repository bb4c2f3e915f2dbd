//! Primitive-only metadata attributes and provenance stamping.

use std::collections::BTreeMap;
use std::fmt;

use almanac_calendar::IntervalTable;
use serde::{Deserialize, Serialize};

/// Version of almanac that produced a resampled frame.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Attribute key holding the almanac version.
pub const VERSION_KEY: &str = "almanac_version";
/// Attribute key holding the calendar anchor.
pub const ANCHOR_KEY: &str = "almanac_calendar_anchor_date";
/// Attribute key holding the encoded calendar.
pub const CALENDAR_CODE_KEY: &str = "almanac_calendar_code";
/// Attribute key that accumulates one line per processing step.
pub const HISTORY_KEY: &str = "history";

/// A primitive attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Text.
    Str(String),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
}

/// Metadata attributes, ordered by key.
pub type Attrs = BTreeMap<String, AttrValue>;

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(x) => write!(f, "{x}"),
            AttrValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<i32> for AttrValue {
    fn from(i: i32) -> Self {
        AttrValue::Int(i64::from(i))
    }
}

impl From<f64> for AttrValue {
    fn from(x: f64) -> Self {
        AttrValue::Float(x)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

/// Returns `input` stamped with the provenance of a resampling onto `table`.
///
/// The almanac keys are (re)written, one line is appended to `history`,
/// every other key is copied unchanged.
pub fn with_provenance(input: &Attrs, table: &IntervalTable) -> Attrs {
    let mut attrs = input.clone();
    let anchor = table.anchor().to_string();
    let line = format!("resampled onto an almanac calendar anchored at {anchor} (almanac {VERSION})");
    let history = match attrs.get(HISTORY_KEY) {
        Some(previous) => format!("{previous}\n{line}"),
        None => line,
    };

    attrs.insert(VERSION_KEY.to_string(), VERSION.into());
    attrs.insert(ANCHOR_KEY.to_string(), anchor.into());
    attrs.insert(CALENDAR_CODE_KEY.to_string(), table.calendar_code().into());
    attrs.insert(HISTORY_KEY.to_string(), history.into());
    attrs
}
