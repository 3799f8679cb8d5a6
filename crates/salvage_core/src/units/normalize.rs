//! Value parsing, unit resolution and bag normalization.

use super::domain::{guess_domain, lookup_unit, UnitDomain};
use super::{NormalizeError, UnitError};
use crate::model::part::{PropBag, PropValue};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static VALUE_WITH_UNIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^([-+]?\d*\.?\d+)\s*([a-zA-ZΩµ"/]+)?$"#).expect("valid value regex")
});

/// Field names that always hold free text, even when the text looks numeric.
const TEXT_ONLY_FIELDS: &[&str] = &[
    "reference",
    "marque",
    "brand",
    "type",
    "tete",
    "materiau",
    "material",
    "modele",
    "model",
    "serie",
    "series",
    "nom",
    "name",
    "couleur",
    "color",
    "colour",
    "notes",
    "commentaire",
    "comment",
    "description",
];

/// Field-name keywords, checked in order; first substring hit decides the
/// domain.
const FIELD_KEYWORDS: &[(UnitDomain, &[&str])] = &[
    (
        UnitDomain::Dimension,
        &[
            "d_int",
            "d_ext",
            "diametre",
            "diameter",
            "largeur",
            "longueur",
            "length",
            "width",
            "height",
            "hauteur",
            "epaisseur",
            "thickness",
            "axe",
            "rayon",
            "radius",
            "taille",
            "size",
            "pas",
        ],
    ),
    (UnitDomain::Voltage, &["volt", "tension", "voltage"]),
    (
        UnitDomain::Current,
        &["amp", "ampere", "courant", "current", "intensite"],
    ),
    (UnitDomain::Resistance, &["ohm", "resistance", "impedance"]),
    (
        UnitDomain::Capacitance,
        &["capacite", "capacity", "farad", "capa"],
    ),
    (UnitDomain::Pressure, &["pression", "pressure"]),
    (
        UnitDomain::RotationalSpeed,
        &["rpm", "vitesse", "speed", "rotation", "tr/min", "tours"],
    ),
    (UnitDomain::Power, &["watt", "puissance", "power"]),
];

/// Per-field default units, usually taken from an archetype.
pub type FieldUnits = BTreeMap<String, String>;

/// Magnitude and optional unit token of one raw input.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedValue {
    pub value: f64,
    pub unit: Option<String>,
}

/// Result of converting one value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized {
    /// Value in the domain's base unit, or the bare magnitude when untagged.
    pub value: f64,
    /// `None` when no unit could be resolved.
    pub domain: Option<UnitDomain>,
}

impl Normalized {
    pub fn base_unit(&self) -> Option<&'static str> {
        self.domain.map(UnitDomain::base_unit)
    }
}

/// Splits `"12.5 cm"` into magnitude and unit token.
pub fn parse_value_with_unit(input: &str) -> Result<ParsedValue, UnitError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(UnitError::EmptyValue);
    }

    let captures = VALUE_WITH_UNIT_RE
        .captures(input)
        .ok_or_else(|| UnitError::InvalidValueFormat(input.to_string()))?;
    let value = captures[1]
        .parse::<f64>()
        .map_err(|_| UnitError::InvalidValueFormat(input.to_string()))?;
    let unit = captures
        .get(2)
        .map(|unit| unit.as_str().to_string())
        .filter(|unit| !unit.is_empty());

    Ok(ParsedValue { value, unit })
}

/// Converts one input to its domain base unit.
///
/// An explicit unit in `input` wins over `default_unit`. Without either, the
/// bare magnitude is returned untagged.
pub fn normalize_value(input: &str, default_unit: Option<&str>) -> Result<Normalized, UnitError> {
    let parsed = parse_value_with_unit(input)?;
    let unit = parsed
        .unit
        .as_deref()
        .or(default_unit.filter(|unit| !unit.is_empty()));
    match unit {
        Some(unit) => convert(parsed.value, unit),
        None => Ok(Normalized {
            value: parsed.value,
            domain: None,
        }),
    }
}

fn convert(magnitude: f64, unit: &str) -> Result<Normalized, UnitError> {
    let entry = lookup_unit(unit).ok_or_else(|| UnitError::UnknownUnit {
        unit: unit.to_string(),
        suggestion: guess_domain(unit),
    })?;
    Ok(Normalized {
        value: magnitude * entry.to_base,
        domain: Some(entry.domain),
    })
}

/// Returns whether `field` is always stored as free text.
pub fn is_text_only_field(field: &str) -> bool {
    let lower = field.to_lowercase();
    TEXT_ONLY_FIELDS.contains(&lower.as_str())
}

/// Infers the physical domain of a field from its name.
pub fn infer_field_domain(field: &str) -> Option<UnitDomain> {
    let lower = field.to_lowercase();
    FIELD_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lower.contains(keyword)))
        .map(|(domain, _)| *domain)
}

/// Best-effort default unit for a field without an archetype default.
pub fn default_unit_for_field(field: &str) -> Option<&'static str> {
    infer_field_domain(field).map(UnitDomain::base_unit)
}

/// Normalizes every numeric attribute of a bag.
///
/// Unit resolution per field: explicit unit in the value, then
/// `field_units`, then [`default_unit_for_field`]. Text that is not a number
/// and booleans pass through untouched.
///
/// # Errors
/// Returns the first failing field; no partial bag is produced.
pub fn normalize_props(props: &PropBag, field_units: &FieldUnits) -> Result<PropBag, NormalizeError> {
    let mut normalized = PropBag::new();

    for (field, value) in props {
        if is_text_only_field(field) {
            normalized.insert(field.clone(), value.clone());
            continue;
        }

        let default_unit = field_units
            .get(field)
            .map(String::as_str)
            .filter(|unit| !unit.is_empty())
            .or_else(|| default_unit_for_field(field));
        let with_field = |error: UnitError| NormalizeError {
            field: field.clone(),
            error,
        };

        let value = match value {
            PropValue::Number(number) => match default_unit {
                Some(unit) => PropValue::Number(convert(*number, unit).map_err(with_field)?.value),
                None => PropValue::Number(*number),
            },
            PropValue::Text(text) => {
                if parse_value_with_unit(text).is_err() {
                    value.clone()
                } else {
                    let result = normalize_value(text, default_unit).map_err(with_field)?;
                    PropValue::Number(result.value)
                }
            }
            PropValue::Bool(_) => value.clone(),
        };
        normalized.insert(field.clone(), value);
    }

    Ok(normalized)
}

/// Checks that an explicit unit belongs to the domain a field expects.
///
/// `expected` overrides the name-based inference. Fields with no known domain
/// accept any recognized unit.
pub fn validate_unit_for_field(
    field: &str,
    unit: &str,
    expected: Option<UnitDomain>,
) -> Result<(), UnitError> {
    if unit.is_empty() {
        return Ok(());
    }

    let entry = lookup_unit(unit).ok_or_else(|| UnitError::UnknownUnit {
        unit: unit.to_string(),
        suggestion: guess_domain(unit),
    })?;

    let Some(expected) = expected.or_else(|| infer_field_domain(field)) else {
        return Ok(());
    };
    if entry.domain != expected {
        return Err(UnitError::IncompatibleUnit {
            field: field.to_string(),
            unit: unit.to_string(),
            expected,
        });
    }
    Ok(())
}

/// Applies [`validate_unit_for_field`] to every raw value carrying an
/// explicit unit. Must run on the raw bag, before normalization.
pub fn check_props_domains(
    props: &PropBag,
    expected_domain: impl Fn(&str) -> Option<UnitDomain>,
) -> Result<(), NormalizeError> {
    for (field, value) in props {
        if is_text_only_field(field) {
            continue;
        }
        let Some(text) = value.as_text() else {
            continue;
        };
        let Ok(ParsedValue {
            unit: Some(unit), ..
        }) = parse_value_with_unit(text)
        else {
            continue;
        };
        validate_unit_for_field(field, &unit, expected_domain(field)).map_err(|error| {
            NormalizeError {
                field: field.clone(),
                error,
            }
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        check_props_domains, default_unit_for_field, is_text_only_field, normalize_props,
        normalize_value, parse_value_with_unit, validate_unit_for_field, FieldUnits,
    };
    use crate::model::part::{PropBag, PropValue};
    use crate::units::{UnitDomain, UnitError};

    fn approx(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn parse_accepts_spaced_and_signed_values() {
        let parsed = parse_value_with_unit(" 12.5 cm ").unwrap();
        assert_eq!(parsed.value, 12.5);
        assert_eq!(parsed.unit.as_deref(), Some("cm"));

        let parsed = parse_value_with_unit("-3").unwrap();
        assert_eq!(parsed.value, -3.0);
        assert_eq!(parsed.unit, None);

        let parsed = parse_value_with_unit(".5\"").unwrap();
        assert_eq!(parsed.value, 0.5);
        assert_eq!(parsed.unit.as_deref(), Some("\""));
    }

    #[test]
    fn parse_rejects_non_numeric_and_empty_input() {
        assert!(matches!(
            parse_value_with_unit("SKF"),
            Err(UnitError::InvalidValueFormat(_))
        ));
        assert!(matches!(
            parse_value_with_unit("10 mm x 3"),
            Err(UnitError::InvalidValueFormat(_))
        ));
        assert_eq!(parse_value_with_unit("   "), Err(UnitError::EmptyValue));
    }

    #[test]
    fn centimeters_and_millimeters_agree() {
        let cm = normalize_value("1cm", None).unwrap();
        let mm = normalize_value("10mm", None).unwrap();
        assert_eq!(cm.value, 10.0);
        assert_eq!(mm.value, 10.0);
        assert_eq!(cm.domain, Some(UnitDomain::Dimension));
        assert_eq!(cm.base_unit(), Some("mm"));
    }

    #[test]
    fn aliases_of_one_domain_are_consistent() {
        let inch = normalize_value("1in", None).unwrap().value;
        for alias in ["inch", "pouce", "\""] {
            let other = normalize_value(&format!("1{alias}"), None).unwrap().value;
            assert!(approx(inch, other));
        }
        let kilo = normalize_value("1kV", None).unwrap().value;
        let milli = normalize_value("1000000mV", None).unwrap().value;
        assert!(approx(kilo, milli));
        assert!(approx(normalize_value("100nF", None).unwrap().value, 0.1));
        assert!(approx(normalize_value("2kPa", None).unwrap().value, 0.02));
    }

    #[test]
    fn explicit_unit_beats_default() {
        let result = normalize_value("1cm", Some("mm")).unwrap();
        assert_eq!(result.value, 10.0);
    }

    #[test]
    fn default_unit_applies_to_bare_number() {
        let result = normalize_value("2", Some("m")).unwrap();
        assert_eq!(result.value, 2000.0);
    }

    #[test]
    fn bare_number_without_unit_is_untagged() {
        let result = normalize_value("42", None).unwrap();
        assert_eq!(result.value, 42.0);
        assert_eq!(result.domain, None);
        assert_eq!(result.base_unit(), None);
    }

    #[test]
    fn unknown_unit_carries_domain_suggestion() {
        let err = normalize_value("10mmm", None).unwrap_err();
        assert_eq!(
            err,
            UnitError::UnknownUnit {
                unit: "mmm".to_string(),
                suggestion: Some(UnitDomain::Dimension),
            }
        );
        assert!(err.to_string().contains("mm, cm, m"));

        let err = normalize_value("3 qq", None).unwrap_err();
        assert!(matches!(
            err,
            UnitError::UnknownUnit {
                suggestion: None,
                ..
            }
        ));
    }

    #[test]
    fn field_keywords_infer_default_units() {
        assert_eq!(default_unit_for_field("D_INT"), Some("mm"));
        assert_eq!(default_unit_for_field("shaft_diameter"), Some("mm"));
        assert_eq!(default_unit_for_field("voltage_max"), Some("V"));
        assert_eq!(default_unit_for_field("puissance"), Some("W"));
        assert_eq!(default_unit_for_field("speed"), Some("rpm"));
        assert_eq!(default_unit_for_field("weight"), None);
        assert!(is_text_only_field("Brand"));
        assert!(!is_text_only_field("d_int"));
    }

    #[test]
    fn normalize_props_converts_numbers_and_keeps_text() {
        let mut props = PropBag::new();
        props.insert("d_int".to_string(), PropValue::from("1cm"));
        props.insert("d_ext".to_string(), PropValue::Number(32.0));
        props.insert("voltage".to_string(), PropValue::from("2kV"));
        props.insert("reference".to_string(), PropValue::from("6001"));
        props.insert("seal".to_string(), PropValue::from("2RS rubber"));
        props.insert("sealed".to_string(), PropValue::Bool(true));
        props.insert("count".to_string(), PropValue::from("4"));

        let normalized = normalize_props(&props, &FieldUnits::new()).unwrap();
        assert_eq!(normalized["d_int"], PropValue::Number(10.0));
        assert_eq!(normalized["d_ext"], PropValue::Number(32.0));
        assert_eq!(normalized["voltage"], PropValue::Number(2000.0));
        assert_eq!(normalized["reference"], PropValue::from("6001"));
        assert_eq!(normalized["seal"], PropValue::from("2RS rubber"));
        assert_eq!(normalized["sealed"], PropValue::Bool(true));
        assert_eq!(normalized["count"], PropValue::Number(4.0));
    }

    #[test]
    fn field_units_override_keyword_defaults() {
        let mut props = PropBag::new();
        props.insert("width".to_string(), PropValue::Number(2.0));
        let mut units = FieldUnits::new();
        units.insert("width".to_string(), "cm".to_string());

        let normalized = normalize_props(&props, &units).unwrap();
        assert_eq!(normalized["width"], PropValue::Number(20.0));
    }

    #[test]
    fn normalize_props_is_all_or_nothing() {
        let mut props = PropBag::new();
        props.insert("d_int".to_string(), PropValue::from("10mm"));
        props.insert("length".to_string(), PropValue::from("3 furlongs"));

        let err = normalize_props(&props, &FieldUnits::new()).unwrap_err();
        assert_eq!(err.field, "length");
        assert!(matches!(err.error, UnitError::UnknownUnit { .. }));
    }

    #[test]
    fn unit_from_another_domain_is_accepted_by_default() {
        let mut props = PropBag::new();
        props.insert("width".to_string(), PropValue::from("10V"));
        let normalized = normalize_props(&props, &FieldUnits::new()).unwrap();
        assert_eq!(normalized["width"], PropValue::Number(10.0));
    }

    #[test]
    fn domain_check_rejects_foreign_unit_when_enabled() {
        let err = validate_unit_for_field("width", "V", None).unwrap_err();
        assert_eq!(
            err,
            UnitError::IncompatibleUnit {
                field: "width".to_string(),
                unit: "V".to_string(),
                expected: UnitDomain::Dimension,
            }
        );
        assert!(validate_unit_for_field("width", "inch", None).is_ok());
        assert!(validate_unit_for_field("label_x", "V", None).is_ok());
        assert!(validate_unit_for_field("label_x", "V", Some(UnitDomain::Power)).is_err());

        let mut props = PropBag::new();
        props.insert("width".to_string(), PropValue::from("10V"));
        props.insert("brand".to_string(), PropValue::from("5V"));
        let err = check_props_domains(&props, |_| None).unwrap_err();
        assert_eq!(err.field, "width");
    }
}
