//! Unit-aware normalization of part attributes.
//!
//! # Responsibility
//! - Parse `value[unit]` inputs.
//! - Convert numeric attributes to one canonical base unit per domain.
//!
//! # Invariants
//! - Normalization is pure: no I/O, no shared mutable state.
//! - Bag normalization is all-or-nothing; the first field error aborts.
//! - A user-supplied unit is not checked against the field's expected domain
//!   unless the caller opts in through [`check_props_domains`].

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod domain;
mod normalize;

pub use domain::{accepted_units, guess_domain, lookup_unit, UnitAlias, UnitDomain};
pub use normalize::{
    check_props_domains, default_unit_for_field, infer_field_domain, is_text_only_field,
    normalize_props, normalize_value, parse_value_with_unit, validate_unit_for_field, FieldUnits,
    Normalized, ParsedValue,
};

/// Errors from parsing or converting one value.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitError {
    /// Input is blank after trim.
    EmptyValue,
    /// Input is not `number[unit]`.
    InvalidValueFormat(String),
    /// Resolved unit has no alias entry.
    UnknownUnit {
        unit: String,
        /// Domain guessed from the unit text, used to list valid units.
        suggestion: Option<UnitDomain>,
    },
    /// Explicit unit belongs to another domain than the field expects.
    IncompatibleUnit {
        field: String,
        unit: String,
        expected: UnitDomain,
    },
}

impl Display for UnitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyValue => write!(f, "empty value"),
            Self::InvalidValueFormat(value) => {
                write!(f, "invalid value format `{value}` (expected number[unit])")
            }
            Self::UnknownUnit {
                unit,
                suggestion: Some(domain),
            } => write!(
                f,
                "unknown unit `{unit}`; valid {domain} units: {}",
                domain.suggested_units().join(", ")
            ),
            Self::UnknownUnit {
                unit,
                suggestion: None,
            } => write!(f, "unknown unit `{unit}`"),
            Self::IncompatibleUnit {
                field,
                unit,
                expected,
            } => write!(
                f,
                "unit `{unit}` is incompatible with field `{field}` (expected {expected}, base {})",
                expected.base_unit()
            ),
        }
    }
}

impl Error for UnitError {}

/// Bag-level failure naming the offending field.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeError {
    pub field: String,
    pub error: UnitError,
}

impl Display for NormalizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "field `{}`: {}", self.field, self.error)
    }
}

impl Error for NormalizeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}
