//! Template file format and the in-memory registry.

use super::{TemplateError, TemplateLoadError, TemplateResult};
use crate::model::part::PropBag;
use crate::units::{lookup_unit, FieldUnits, UnitDomain};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Declared constraints for one archetype field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDefinition {
    pub required: bool,
    /// Physical domain; selects the conversion table.
    pub domain: Option<UnitDomain>,
    /// Unit applied to bare numbers entered for this field.
    pub default_unit: Option<String>,
}

/// One part archetype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub description: String,
    pub fields: BTreeMap<String, FieldDefinition>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds one field declaration.
    pub fn with_field(mut self, field: impl Into<String>, definition: FieldDefinition) -> Self {
        self.fields.insert(field.into(), definition);
        self
    }

    /// Required field names, sorted.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, definition)| definition.required)
            .map(|(field, _)| field.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    fields: BTreeMap<String, Option<FieldFile>>,
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    optional: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FieldFile {
    #[serde(default)]
    required: bool,
    domain: Option<UnitDomain>,
    unit: Option<String>,
}

/// Immutable set of archetypes keyed by name.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, Template>,
    strict: bool,
}

impl TemplateRegistry {
    /// Loads every `*.yaml` / `*.yml` file directly under `dir`.
    ///
    /// Files are read in file-name order. A missing directory yields an empty
    /// registry.
    pub fn load_dir(dir: impl AsRef<Path>, strict: bool) -> Result<Self, TemplateLoadError> {
        let dir = dir.as_ref();
        let started_at = Instant::now();
        log::info!("event=templates_load module=template status=start strict={strict}");

        let result = read_template_files(dir).and_then(|templates| {
            let mut registry = Self {
                templates: BTreeMap::new(),
                strict,
            };
            for (path, template) in templates {
                if registry.templates.contains_key(&template.name) {
                    return Err(TemplateLoadError::DuplicateName {
                        name: template.name,
                        path,
                    });
                }
                registry.templates.insert(template.name.clone(), template);
            }
            Ok(registry)
        });

        match &result {
            Ok(registry) => log::info!(
                "event=templates_load module=template status=ok duration_ms={} count={}",
                started_at.elapsed().as_millis(),
                registry.templates.len()
            ),
            Err(_) => log::error!(
                "event=templates_load module=template status=error duration_ms={}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    /// Builds a registry from already-constructed templates.
    ///
    /// Later duplicates replace earlier ones.
    pub fn from_templates(templates: impl IntoIterator<Item = Template>, strict: bool) -> Self {
        Self {
            templates: templates
                .into_iter()
                .map(|template| (template.name.clone(), template))
                .collect(),
            strict,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Template names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Checks `props` against the archetype named `type_name`.
    ///
    /// Empty types are free-form. Unknown types pass unless the registry is
    /// strict.
    pub fn validate_props(&self, type_name: &str, props: &PropBag) -> TemplateResult<()> {
        if type_name.is_empty() {
            return Ok(());
        }
        let Some(template) = self.templates.get(type_name) else {
            if self.strict {
                return Err(TemplateError::UnknownType(type_name.to_string()));
            }
            return Ok(());
        };

        if let Some(missing) = template
            .required_fields()
            .find(|field| !props.contains_key(*field))
        {
            return Err(TemplateError::MissingRequiredField {
                type_name: type_name.to_string(),
                field: missing.to_string(),
            });
        }
        Ok(())
    }

    /// Default units declared by the archetype, keyed by field.
    pub fn field_units(&self, type_name: &str) -> FieldUnits {
        self.templates
            .get(type_name)
            .map(|template| {
                template
                    .fields
                    .iter()
                    .filter_map(|(field, definition)| {
                        definition
                            .default_unit
                            .as_ref()
                            .map(|unit| (field.clone(), unit.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn field_domain(&self, type_name: &str, field: &str) -> Option<UnitDomain> {
        self.templates
            .get(type_name)?
            .fields
            .get(field)?
            .domain
    }
}

fn read_template_files(dir: &Path) -> Result<Vec<(PathBuf, Template)>, TemplateLoadError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(TemplateLoadError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| TemplateLoadError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if path.is_file() && is_yaml {
            paths.push(path);
        }
    }
    paths.sort();

    let mut templates = Vec::with_capacity(paths.len());
    for path in paths {
        let content = fs::read_to_string(&path).map_err(|source| TemplateLoadError::Io {
            path: path.clone(),
            source,
        })?;
        let template = parse_template(&path, &content)?;
        templates.push((path, template));
    }
    Ok(templates)
}

fn parse_template(path: &Path, content: &str) -> Result<Template, TemplateLoadError> {
    let file: TemplateFile =
        serde_yaml::from_str(content).map_err(|err| TemplateLoadError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

    let name = file.name.trim().to_string();
    if name.is_empty() {
        return Err(TemplateLoadError::Parse {
            path: path.to_path_buf(),
            message: "missing template name".to_string(),
        });
    }

    let mut fields = BTreeMap::new();
    for (field, declared) in file.fields {
        let definition = build_field(&name, &field, declared.unwrap_or_default())?;
        fields.insert(field, definition);
    }
    for field in file.required {
        fields.entry(field).or_insert_with(FieldDefinition::default).required = true;
    }
    for field in file.optional {
        fields.entry(field).or_insert_with(FieldDefinition::default);
    }

    Ok(Template {
        name,
        description: file.description,
        fields,
    })
}

fn build_field(
    template: &str,
    field: &str,
    declared: FieldFile,
) -> Result<FieldDefinition, TemplateLoadError> {
    let invalid = |message: String| TemplateLoadError::InvalidField {
        template: template.to_string(),
        field: field.to_string(),
        message,
    };

    let unit = declared.unit.filter(|unit| !unit.trim().is_empty());
    let domain = match unit.as_deref() {
        None => declared.domain,
        Some(unit) => {
            let entry = lookup_unit(unit).ok_or_else(|| invalid(format!("unknown unit `{unit}`")))?;
            match declared.domain {
                Some(domain) if domain != entry.domain => {
                    return Err(invalid(format!(
                        "unit `{unit}` belongs to {} but field declares {domain}",
                        entry.domain
                    )));
                }
                _ => Some(entry.domain),
            }
        }
    };

    Ok(FieldDefinition {
        required: declared.required,
        domain,
        default_unit: unit,
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_template, FieldDefinition, Template, TemplateRegistry};
    use crate::model::part::{PropBag, PropValue};
    use crate::template::{TemplateError, TemplateLoadError};
    use crate::units::UnitDomain;
    use std::fs;
    use std::path::Path;

    const BEARING_YAML: &str = r#"
name: bearing
description: Ball bearing
fields:
  d_int: { required: true, domain: dimension, unit: mm }
  d_ext: { required: true, unit: mm }
  brand: {}
  notes:
required: [width]
optional: [seal]
"#;

    fn bearing_registry(strict: bool) -> TemplateRegistry {
        let template = parse_template(Path::new("bearing.yaml"), BEARING_YAML).unwrap();
        TemplateRegistry::from_templates([template], strict)
    }

    #[test]
    fn yaml_fields_and_legacy_lists_merge() {
        let template = parse_template(Path::new("bearing.yaml"), BEARING_YAML).unwrap();
        assert_eq!(template.description, "Ball bearing");
        let required: Vec<&str> = template.required_fields().collect();
        assert_eq!(required, vec!["d_ext", "d_int", "width"]);
        assert_eq!(template.fields["d_ext"].domain, Some(UnitDomain::Dimension));
        assert_eq!(template.fields["seal"], FieldDefinition::default());
        assert!(template.fields.contains_key("notes"));
    }

    #[test]
    fn legacy_domain_aliases_are_accepted() {
        let template = parse_template(
            Path::new("psu.yaml"),
            "name: psu\nfields:\n  out: { domain: tension, unit: V }\n",
        )
        .unwrap();
        assert_eq!(template.fields["out"].domain, Some(UnitDomain::Voltage));
    }

    #[test]
    fn unknown_or_mismatched_field_unit_is_rejected() {
        let err = parse_template(
            Path::new("a.yaml"),
            "name: a\nfields:\n  size: { unit: furlong }\n",
        )
        .unwrap_err();
        assert!(matches!(err, TemplateLoadError::InvalidField { .. }));

        let err = parse_template(
            Path::new("b.yaml"),
            "name: b\nfields:\n  size: { domain: voltage, unit: mm }\n",
        )
        .unwrap_err();
        assert!(matches!(err, TemplateLoadError::InvalidField { .. }));
    }

    #[test]
    fn missing_name_is_a_parse_error() {
        let err = parse_template(Path::new("c.yaml"), "description: nameless\n").unwrap_err();
        assert!(matches!(err, TemplateLoadError::Parse { .. }));
    }

    #[test]
    fn validate_props_reports_first_missing_required_field() {
        let registry = bearing_registry(false);
        let mut props = PropBag::new();
        props.insert("d_int".to_string(), PropValue::Number(10.0));

        let err = registry.validate_props("bearing", &props).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingRequiredField {
                type_name: "bearing".to_string(),
                field: "d_ext".to_string(),
            }
        );

        props.insert("d_ext".to_string(), PropValue::Number(32.0));
        props.insert("width".to_string(), PropValue::Number(10.0));
        assert!(registry.validate_props("bearing", &props).is_ok());
    }

    #[test]
    fn unknown_types_pass_only_outside_strict_mode() {
        let props = PropBag::new();
        assert!(bearing_registry(false).validate_props("gearbox", &props).is_ok());
        assert_eq!(
            bearing_registry(true).validate_props("gearbox", &props),
            Err(TemplateError::UnknownType("gearbox".to_string()))
        );
        assert!(bearing_registry(true).validate_props("", &props).is_ok());
    }

    #[test]
    fn field_units_only_lists_fields_with_units() {
        let registry = bearing_registry(true);
        let units = registry.field_units("bearing");
        assert_eq!(units.len(), 2);
        assert_eq!(units["d_int"], "mm");
        assert!(registry.field_units("gearbox").is_empty());
        assert_eq!(
            registry.field_domain("bearing", "d_int"),
            Some(UnitDomain::Dimension)
        );
        assert_eq!(registry.field_domain("bearing", "brand"), None);
    }

    #[test]
    fn load_dir_reads_yaml_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bearing.yaml"), BEARING_YAML).unwrap();
        fs::write(dir.path().join("motor.yml"), "name: motor\nrequired: [power]\n").unwrap();
        fs::write(dir.path().join("readme.txt"), "not a template").unwrap();

        let registry = TemplateRegistry::load_dir(dir.path(), true).unwrap();
        assert_eq!(registry.names(), vec!["bearing", "motor"]);
        assert!(registry.is_strict());
    }

    #[test]
    fn load_dir_rejects_duplicate_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.yaml"), "name: motor\n").unwrap();
        fs::write(dir.path().join("b.yaml"), "name: motor\n").unwrap();

        let err = TemplateRegistry::load_dir(dir.path(), false).unwrap_err();
        assert!(matches!(err, TemplateLoadError::DuplicateName { name, .. } if name == "motor"));
    }

    #[test]
    fn missing_directory_yields_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TemplateRegistry::load_dir(dir.path().join("absent"), true).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn in_memory_templates_can_be_built_fluently() {
        let template = Template::new("fuse").with_field(
            "current",
            FieldDefinition {
                required: true,
                domain: Some(UnitDomain::Current),
                default_unit: Some("A".to_string()),
            },
        );
        let registry = TemplateRegistry::from_templates([template], false);
        assert!(registry.contains("fuse"));
        assert_eq!(registry.len(), 1);
    }
}
