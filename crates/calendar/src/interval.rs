//! Interval definitions: the leaf entries of a calendar.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CalendarError;
use crate::span::Span;

/// Whether an interval holds the predicted event or predictor data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The period of the event being predicted.
    Target,
    /// A period preceding the target, used as predictor data.
    Precursor,
}

impl Role {
    /// Returns `true` for [`Role::Target`].
    pub fn is_target(self) -> bool {
        self == Role::Target
    }

    /// Lowercase name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Target => "target",
            Role::Precursor => "precursor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "target" => Ok(Role::Target),
            "precursor" => Ok(Role::Precursor),
            _ => Err(CalendarError::InvalidCode {
                reason: format!("unknown interval role '{s}' (expected 'target' or 'precursor')"),
            }),
        }
    }
}

/// One named interval of a calendar.
///
/// Intervals are chained backward from the anchor in insertion order. `gap`
/// is the distance from the previously placed interval (or from the anchor
/// for the first one); a negative gap makes the interval overlap its
/// predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSpec {
    name: String,
    role: Role,
    length: Span,
    #[serde(default)]
    gap: Span,
}

impl IntervalSpec {
    /// Creates an interval definition.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::NonPositiveLength`] if `length` is zero or
    /// has a negative component.
    pub fn new(
        name: impl Into<String>,
        role: Role,
        length: Span,
        gap: Span,
    ) -> Result<Self, CalendarError> {
        let name = name.into();
        if !length.is_positive() {
            return Err(CalendarError::NonPositiveLength {
                name,
                length: length.to_string(),
            });
        }
        Ok(Self {
            name,
            role,
            length,
            gap,
        })
    }

    /// Returns the interval name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the interval role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the interval length.
    pub fn length(&self) -> Span {
        self.length
    }

    /// Returns the gap to the previously placed interval.
    pub fn gap(&self) -> Span {
        self.gap
    }
}
