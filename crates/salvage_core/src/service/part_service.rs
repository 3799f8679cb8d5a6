//! Part creation and placement use-case service.
//!
//! # Responsibility
//! - Run the write pipeline: normalize, validate against the archetype,
//!   resolve the location, store.
//! - Assign and clear part locations.
//!
//! # Invariants
//! - Attribute bags are normalized exactly once, here, before storage.
//! - A failing field aborts the whole write; nothing is persisted.
//! - Attribute values are never written to logs.

use crate::model::location::LocationId;
use crate::model::part::{NewPart, Part, PartId};
use crate::repo::location_repo::LocationRepository;
use crate::repo::part_repo::PartRepository;
use crate::repo::RepoError;
use crate::service::location_service::{LocationService, LocationServiceError};
use crate::template::{TemplateError, TemplateRegistry};
use crate::units::{check_props_domains, normalize_props, NormalizeError};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from part service operations.
#[derive(Debug)]
pub enum PartServiceError {
    /// Part name is blank after trim.
    InvalidName,
    Normalize(NormalizeError),
    Template(TemplateError),
    /// Location reference (id or name) does not resolve.
    LocationNotFound(String),
    PartNotFound(PartId),
    Location(LocationServiceError),
    Serialize(serde_json::Error),
    Repo(RepoError),
}

impl PartServiceError {
    /// Stable metadata-only code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidName => "invalid_name",
            Self::Normalize(_) => "normalize_failed",
            Self::Template(TemplateError::UnknownType(_)) => "unknown_type",
            Self::Template(TemplateError::MissingRequiredField { .. }) => "missing_required_field",
            Self::LocationNotFound(_) => "location_not_found",
            Self::PartNotFound(_) => "part_not_found",
            Self::Location(_) => "location_error",
            Self::Serialize(_) => "serialize_failed",
            Self::Repo(_) => "repo_error",
        }
    }
}

impl Display for PartServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "part name must not be blank"),
            Self::Normalize(err) => write!(f, "{err}"),
            Self::Template(err) => write!(f, "{err}"),
            Self::LocationNotFound(reference) => write!(f, "location not found: {reference}"),
            Self::PartNotFound(id) => write!(f, "part not found: {id}"),
            Self::Location(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to encode attributes: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PartServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Normalize(err) => Some(err),
            Self::Template(err) => Some(err),
            Self::Location(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::InvalidName | Self::LocationNotFound(_) | Self::PartNotFound(_) => None,
        }
    }
}

impl From<NormalizeError> for PartServiceError {
    fn from(value: NormalizeError) -> Self {
        Self::Normalize(value)
    }
}

impl From<TemplateError> for PartServiceError {
    fn from(value: TemplateError) -> Self {
        Self::Template(value)
    }
}

impl From<RepoError> for PartServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity: "part", id } => Self::PartNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<LocationServiceError> for PartServiceError {
    fn from(value: LocationServiceError) -> Self {
        match value {
            LocationServiceError::LocationNotFound(id) => Self::LocationNotFound(id.to_string()),
            LocationServiceError::UnknownReference(reference) => Self::LocationNotFound(reference),
            LocationServiceError::Repo(err) => Self::Repo(err),
            other => Self::Location(other),
        }
    }
}

/// Part service facade.
pub struct PartService<'reg, P: PartRepository, L: LocationRepository> {
    parts: P,
    locations: LocationService<L>,
    registry: &'reg TemplateRegistry,
    enforce_unit_domains: bool,
}

impl<'reg, P: PartRepository, L: LocationRepository> PartService<'reg, P, L> {
    /// Creates service with permissive unit/domain handling.
    pub fn new(parts: P, locations: L, registry: &'reg TemplateRegistry) -> Self {
        Self {
            parts,
            locations: LocationService::new(locations),
            registry,
            enforce_unit_domains: false,
        }
    }

    /// Rejects explicit units that belong to another domain than the field.
    pub fn with_unit_domain_check(mut self, enabled: bool) -> Self {
        self.enforce_unit_domains = enabled;
        self
    }

    /// Normalizes, validates and stores one part.
    pub fn add_part(&self, new_part: NewPart) -> Result<Part, PartServiceError> {
        let started_at = Instant::now();
        info!("event=part_add module=part status=start");

        match self.add_part_inner(new_part) {
            Ok(part) => {
                info!(
                    "event=part_add module=part status=ok part_id={} field_count={} duration_ms={}",
                    part.id,
                    part.props.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(part)
            }
            Err(err) => {
                error!(
                    "event=part_add module=part status=error duration_ms={} error_code={}",
                    started_at.elapsed().as_millis(),
                    err.code()
                );
                Err(err)
            }
        }
    }

    fn add_part_inner(&self, new_part: NewPart) -> Result<Part, PartServiceError> {
        let name = new_part.name.trim();
        if name.is_empty() {
            return Err(PartServiceError::InvalidName);
        }
        let type_name = new_part.type_name.trim();

        if self.enforce_unit_domains {
            check_props_domains(&new_part.props, |field| {
                self.registry.field_domain(type_name, field)
            })?;
        }
        let props = normalize_props(&new_part.props, &self.registry.field_units(type_name))?;
        self.registry.validate_props(type_name, &props)?;

        let location_id = match new_part.location.as_deref().map(str::trim) {
            Some(reference) if !reference.is_empty() => {
                Some(self.locations.resolve(reference)?.id)
            }
            _ => None,
        };

        let props_json = serde_json::to_string(&props).map_err(PartServiceError::Serialize)?;
        Ok(self
            .parts
            .create_part(type_name, name, &props_json, location_id)?)
    }

    pub fn get(&self, id: PartId) -> Result<Part, PartServiceError> {
        self.parts
            .get_part(id)?
            .ok_or(PartServiceError::PartNotFound(id))
    }

    /// Places a part in an existing location.
    pub fn set_location(
        &self,
        part_id: PartId,
        location_id: LocationId,
    ) -> Result<(), PartServiceError> {
        self.get(part_id)?;
        self.locations.get(location_id)?;
        self.parts.set_location(part_id, Some(location_id))?;
        info!(
            "event=part_locate module=part status=ok part_id={part_id} location_id={location_id}"
        );
        Ok(())
    }

    pub fn clear_location(&self, part_id: PartId) -> Result<(), PartServiceError> {
        self.parts.set_location(part_id, None)?;
        info!("event=part_locate module=part status=ok part_id={part_id} location_id=none");
        Ok(())
    }
}
