//! Property search expressions.
//!
//! Grammar: `<property>:<value>` where `<value>` is either `min..max`
//! (inclusive numeric range) or an exact string.

use crate::model::part::{PropBag, PropValue};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\d.]+)\.\.([\d.]+)$").expect("valid range regex"));

/// Errors from criteria parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CriteriaError {
    InvalidCriteriaFormat(String),
}

impl Display for CriteriaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCriteriaFormat(message) => write!(
                f,
                "invalid search expression: {message} (expected prop:value or prop:min..max)"
            ),
        }
    }
}

impl Error for CriteriaError {}

/// How a property value is compared.
#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaKind {
    /// Byte-for-byte comparison of the stringified value.
    Exact(String),
    /// Inclusive numeric interval.
    Range { min: f64, max: f64 },
}

/// One parsed `property:value` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    pub property: String,
    pub kind: CriteriaKind,
}

impl SearchCriteria {
    /// Parses `d_int:10..10.5` or `brand:SKF`.
    ///
    /// The expression is split at the first `:`, so exact values may contain
    /// further colons.
    pub fn parse(expression: &str) -> Result<Self, CriteriaError> {
        let Some((property, value)) = expression.split_once(':') else {
            return Err(CriteriaError::InvalidCriteriaFormat(format!(
                "missing `:` in `{expression}`"
            )));
        };
        if property.is_empty() {
            return Err(CriteriaError::InvalidCriteriaFormat(format!(
                "empty property in `{expression}`"
            )));
        }

        let kind = match RANGE_RE.captures(value) {
            Some(captures) => CriteriaKind::Range {
                min: parse_bound(&captures[1])?,
                max: parse_bound(&captures[2])?,
            },
            None => CriteriaKind::Exact(value.to_string()),
        };

        Ok(Self {
            property: property.to_string(),
            kind,
        })
    }

    /// Evaluates the predicate against one property value; absent never
    /// matches.
    pub fn matches(&self, value: Option<&PropValue>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match &self.kind {
            CriteriaKind::Exact(expected) => value.to_string() == *expected,
            CriteriaKind::Range { min, max } => value
                .as_f64()
                .is_some_and(|number| *min <= number && number <= *max),
        }
    }

    /// Looks the property up in `props` and evaluates it.
    pub fn matches_props(&self, props: &PropBag) -> bool {
        self.matches(props.get(&self.property))
    }
}

impl Display for SearchCriteria {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            CriteriaKind::Exact(value) => write!(f, "{}:{value}", self.property),
            CriteriaKind::Range { min, max } => write!(f, "{}:{min}..{max}", self.property),
        }
    }
}

fn parse_bound(text: &str) -> Result<f64, CriteriaError> {
    text.parse::<f64>()
        .map_err(|_| CriteriaError::InvalidCriteriaFormat(format!("invalid bound `{text}`")))
}

/// Parses an optional expression; blank input means "no property filter".
pub fn criteria_from_expression(expression: &str) -> Result<Option<SearchCriteria>, CriteriaError> {
    if expression.trim().is_empty() {
        return Ok(None);
    }
    SearchCriteria::parse(expression).map(Some)
}
