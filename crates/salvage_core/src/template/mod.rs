//! Part archetypes ("templates") loaded from YAML files.
//!
//! # Responsibility
//! - Load archetype definitions once at startup.
//! - Validate attribute bags against required fields.
//! - Feed per-field default units and domains to the unit normalizer.
//!
//! # Invariants
//! - A registry is immutable after construction and passed by reference.
//! - Template names are unique inside one registry.
//! - In strict mode every non-empty part type must name a loaded template.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod registry;

pub use registry::{FieldDefinition, Template, TemplateRegistry};

/// Result type for template validation.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Validation errors raised against a loaded registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Strict mode and the type names no template.
    UnknownType(String),
    /// A required field is absent from the attribute bag.
    MissingRequiredField { type_name: String, field: String },
}

impl Display for TemplateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownType(type_name) => write!(f, "unknown part type `{type_name}`"),
            Self::MissingRequiredField { type_name, field } => write!(
                f,
                "missing required field `{field}` for part type `{type_name}`"
            ),
        }
    }
}

impl Error for TemplateError {}

/// Errors while reading a template directory.
#[derive(Debug)]
pub enum TemplateLoadError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// File is not a valid template document.
    Parse { path: PathBuf, message: String },
    /// Two files declare the same template name.
    DuplicateName { name: String, path: PathBuf },
    /// Field declaration references an unknown unit or mismatched domain.
    InvalidField {
        template: String,
        field: String,
        message: String,
    },
}

impl Display for TemplateLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read templates at `{}`: {source}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "invalid template file `{}`: {message}", path.display())
            }
            Self::DuplicateName { name, path } => write!(
                f,
                "duplicate template name `{name}` in `{}`",
                path.display()
            ),
            Self::InvalidField {
                template,
                field,
                message,
            } => write!(f, "template `{template}` field `{field}`: {message}"),
        }
    }
}

impl Error for TemplateLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { .. } => None,
            Self::DuplicateName { .. } => None,
            Self::InvalidField { .. } => None,
        }
    }
}
