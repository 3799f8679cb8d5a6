//! Compatibility query and result records shared by local and federated
//! search.

use super::criteria::{criteria_from_expression, CriteriaError, SearchCriteria};
use crate::model::part::{PartId, PropBag, PropValue};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Source label of hits produced by this instance.
pub const LOCAL_SOURCE: &str = "local";

/// Type/name/property filters of one compatibility search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartQuery {
    /// Exact archetype; empty matches every type.
    pub type_name: String,
    /// Name substring; empty matches every name.
    pub name: String,
    pub criteria: Option<SearchCriteria>,
}

impl PartQuery {
    /// Builds a query from raw filter inputs.
    pub fn parse(type_name: &str, name: &str, prop_expression: &str) -> Result<Self, CriteriaError> {
        Ok(Self {
            type_name: type_name.trim().to_string(),
            name: name.trim().to_string(),
            criteria: criteria_from_expression(prop_expression)?,
        })
    }

    /// Property expression as forwarded to peers; empty when unfiltered.
    pub fn prop_expression(&self) -> String {
        self.criteria
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

/// One search result, local or from a peer.
///
/// This is also the peer search JSON payload element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartHit {
    pub id: PartId,
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_peer_props")]
    pub props: PropBag,
    /// Full location path, when the part is placed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// `"local"` or the peer name.
    #[serde(default)]
    pub source: String,
}

/// Reads a peer attribute bag without failing on values outside `PropValue`.
///
/// `null` bags and `null` entries are dropped; arrays and objects are kept as
/// their JSON text.
fn deserialize_peer_props<'de, D>(deserializer: D) -> Result<PropBag, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(field, value)| {
            let value = match value {
                Value::Null => return None,
                Value::Bool(flag) => PropValue::Bool(flag),
                Value::Number(number) => match number.as_f64() {
                    Some(number) => PropValue::Number(number),
                    None => PropValue::Text(number.to_string()),
                },
                Value::String(text) => PropValue::Text(text),
                nested @ (Value::Array(_) | Value::Object(_)) => {
                    PropValue::Text(nested.to_string())
                }
            };
            Some((field, value))
        })
        .collect())
}
