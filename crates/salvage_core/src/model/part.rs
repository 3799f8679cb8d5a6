//! Part domain model and attribute bag values.
//!
//! # Responsibility
//! - Define the catalog record for one salvaged part.
//! - Define the tagged value type stored in free-form attribute bags.
//!
//! # Invariants
//! - Numeric attributes in a persisted `PropBag` are already expressed in the
//!   base unit of their physical domain; reads never re-normalize.
//! - `type_name` is empty when the part has no archetype.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Store-assigned part identity. Ordering follows creation order.
pub type PartId = i64;

/// One attribute value inside a part's attribute bag.
///
/// Serialized untagged so the JSON form is a plain scalar
/// (`10`, `"SKF"`, `true`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PropValue {
    /// Returns the numeric reading of this value.
    ///
    /// Numbers are returned as-is and text is accepted when it parses as a
    /// float. Booleans never have a numeric reading.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.parse::<f64>().ok(),
            Self::Bool(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

/// Stringified form used by exact-match search.
///
/// Numbers use the shortest float rendering, so `10.0` and `"10"` print the
/// same.
impl Display for PropValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Free-form attribute bag keyed by field name.
pub type PropBag = BTreeMap<String, PropValue>;

/// Catalog record for one salvaged part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: PartId,
    /// Archetype name; empty when the part is free-form.
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    /// Normalized attribute bag.
    pub props: PropBag,
    pub location_id: Option<i64>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

/// Write model for a new part, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPart {
    pub type_name: String,
    pub name: String,
    /// Raw attribute bag as entered by the user.
    pub props: PropBag,
    /// Location reference: numeric id or location name.
    pub location: Option<String>,
}

impl NewPart {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds one raw attribute.
    pub fn with_prop(mut self, field: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(field.into(), value.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{PropBag, PropValue};

    #[test]
    fn numeric_and_text_ten_stringify_identically() {
        assert_eq!(PropValue::Number(10.0).to_string(), "10");
        assert_eq!(PropValue::Text("10".to_string()).to_string(), "10");
        assert_eq!(PropValue::Number(15.5).to_string(), "15.5");
    }

    #[test]
    fn untagged_json_keeps_scalar_shape() {
        let mut bag = PropBag::new();
        bag.insert("d_int".to_string(), PropValue::Number(10.0));
        bag.insert("brand".to_string(), PropValue::from("SKF"));
        bag.insert("sealed".to_string(), PropValue::Bool(true));

        let json = serde_json::to_string(&bag).unwrap();
        assert_eq!(json, r#"{"brand":"SKF","d_int":10.0,"sealed":true}"#);

        let parsed: PropBag = serde_json::from_str(r#"{"d_ext":32,"brand":"SKF"}"#).unwrap();
        assert_eq!(parsed["d_ext"], PropValue::Number(32.0));
        assert_eq!(parsed["brand"], PropValue::Text("SKF".to_string()));
    }

    #[test]
    fn numeric_reading_accepts_numeric_text_only() {
        assert_eq!(PropValue::from("12.5").as_f64(), Some(12.5));
        assert_eq!(PropValue::from("abc").as_f64(), None);
        assert_eq!(PropValue::Bool(true).as_f64(), None);
    }
}
