//! Location hierarchy use-case service.
//!
//! # Responsibility
//! - Enforce hierarchy invariants above the repository layer.
//! - Reconstruct display paths and recursive part counts.
//!
//! # Invariants
//! - Moves must not create parent-child cycles.
//! - Every parent walk carries a visited set, so corrupt pre-existing cycles
//!   terminate instead of looping.
//! - A location with parts or children cannot be deleted.

use crate::model::location::{Location, LocationId, LocationTreeNode, LocationType};
use crate::repo::location_repo::LocationRepository;
use crate::repo::RepoError;
use log::{error, info};
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Upper bound on path length; deeper chains are truncated at the root side.
pub const MAX_PATH_DEPTH: usize = 100;

const PATH_SEPARATOR: &str = " > ";

/// Errors from location service operations.
#[derive(Debug)]
pub enum LocationServiceError {
    /// Name is blank after trim.
    InvalidName,
    ParentNotFound(LocationId),
    LocationNotFound(LocationId),
    /// No location matches a name or id reference.
    UnknownReference(String),
    /// Move would place a node under itself or a descendant.
    CycleDetected {
        location_id: LocationId,
        parent_id: LocationId,
    },
    /// Parts are still assigned directly to the location.
    LocationNotEmpty { part_count: u64 },
    LocationHasChildren { child_count: u64 },
    Repo(RepoError),
}

impl Display for LocationServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "location name must not be blank"),
            Self::ParentNotFound(id) => write!(f, "parent location not found: {id}"),
            Self::LocationNotFound(id) => write!(f, "location not found: {id}"),
            Self::UnknownReference(reference) => {
                write!(f, "no location matches `{reference}`")
            }
            Self::CycleDetected {
                location_id,
                parent_id,
            } => write!(
                f,
                "move would create cycle: location {location_id} under parent {parent_id}"
            ),
            Self::LocationNotEmpty { part_count } => write!(
                f,
                "cannot delete location: {part_count} part(s) are stored in it"
            ),
            Self::LocationHasChildren { child_count } => write!(
                f,
                "cannot delete location: {child_count} sub-location(s) exist"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LocationServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LocationServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "location",
                id,
            } => Self::LocationNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Location hierarchy service facade.
pub struct LocationService<R: LocationRepository> {
    repo: R,
}

impl<R: LocationRepository> LocationService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one location under an optional parent.
    pub fn create(
        &self,
        name: impl Into<String>,
        parent_id: Option<LocationId>,
        kind: LocationType,
        description: impl Into<String>,
    ) -> Result<Location, LocationServiceError> {
        let name = normalize_name(name.into())?;
        if let Some(parent_id) = parent_id {
            self.repo
                .get_location(parent_id)?
                .ok_or(LocationServiceError::ParentNotFound(parent_id))?;
        }

        let description = description.into();
        let location =
            self.repo
                .create_location(&name, parent_id, kind, description.trim())?;
        info!(
            "event=location_create module=location status=ok location_id={} kind={}",
            location.id, location.kind
        );
        Ok(location)
    }

    pub fn get(&self, id: LocationId) -> Result<Location, LocationServiceError> {
        self.repo
            .get_location(id)?
            .ok_or(LocationServiceError::LocationNotFound(id))
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Location>, LocationServiceError> {
        Ok(self.repo.find_by_name(name.trim())?)
    }

    /// Resolves a user reference: numeric id first, then case-insensitive
    /// name.
    pub fn resolve(&self, reference: &str) -> Result<Location, LocationServiceError> {
        let reference = reference.trim();
        if let Ok(id) = reference.parse::<LocationId>() {
            if let Some(location) = self.repo.get_location(id)? {
                return Ok(location);
            }
        }
        self.repo
            .find_by_name(reference)?
            .ok_or_else(|| LocationServiceError::UnknownReference(reference.to_string()))
    }

    /// Lists direct children, or roots when `parent_id` is `None`.
    pub fn list_children(
        &self,
        parent_id: Option<LocationId>,
    ) -> Result<Vec<Location>, LocationServiceError> {
        if let Some(parent_id) = parent_id {
            self.repo
                .get_location(parent_id)?
                .ok_or(LocationServiceError::ParentNotFound(parent_id))?;
        }
        Ok(self.repo.list_children(parent_id)?)
    }

    /// Moves one location under a new parent, or to root.
    pub fn move_location(
        &self,
        id: LocationId,
        new_parent_id: Option<LocationId>,
    ) -> Result<(), LocationServiceError> {
        let started_at = Instant::now();
        let result = self.move_location_inner(id, new_parent_id);
        match &result {
            Ok(()) => info!(
                "event=location_move module=location status=ok location_id={id} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=location_move module=location status=error location_id={id} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    fn move_location_inner(
        &self,
        id: LocationId,
        new_parent_id: Option<LocationId>,
    ) -> Result<(), LocationServiceError> {
        self.get(id)?;

        if let Some(parent_id) = new_parent_id {
            if parent_id == id {
                return Err(LocationServiceError::CycleDetected {
                    location_id: id,
                    parent_id,
                });
            }
            self.repo
                .get_location(parent_id)?
                .ok_or(LocationServiceError::ParentNotFound(parent_id))?;
            if self.would_create_cycle(id, parent_id)? {
                return Err(LocationServiceError::CycleDetected {
                    location_id: id,
                    parent_id,
                });
            }
        }

        Ok(self.repo.set_parent(id, new_parent_id)?)
    }

    /// Builds `"Root > Child > Leaf"` for one location.
    pub fn full_path(&self, id: LocationId) -> Result<String, LocationServiceError> {
        let mut names = Vec::new();
        let mut visited = HashSet::new();
        let mut cursor = Some(self.get(id)?);

        while let Some(location) = cursor {
            if !visited.insert(location.id) || names.len() >= MAX_PATH_DEPTH {
                break;
            }
            cursor = match location.parent_id {
                Some(parent_id) => self.repo.get_location(parent_id)?,
                None => None,
            };
            names.push(location.name);
        }

        names.reverse();
        Ok(names.join(PATH_SEPARATOR))
    }

    /// Display label `"<path> (#id)"`.
    pub fn describe(&self, id: LocationId) -> Result<String, LocationServiceError> {
        Ok(format!("{} (#{id})", self.full_path(id)?))
    }

    /// Resolves paths for many ids at once; unknown ids are skipped.
    pub fn paths_for(
        &self,
        ids: impl IntoIterator<Item = LocationId>,
    ) -> Result<BTreeMap<LocationId, String>, LocationServiceError> {
        let mut paths = BTreeMap::new();
        for id in ids {
            if paths.contains_key(&id) {
                continue;
            }
            match self.full_path(id) {
                Ok(path) => {
                    paths.insert(id, path);
                }
                Err(LocationServiceError::LocationNotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(paths)
    }

    /// Deletes one empty leaf location.
    pub fn delete(&self, id: LocationId) -> Result<(), LocationServiceError> {
        self.get(id)?;

        let part_count = self.repo.count_direct_parts(id)?;
        if part_count > 0 {
            return Err(LocationServiceError::LocationNotEmpty { part_count });
        }
        let child_count = self.repo.count_children(id)?;
        if child_count > 0 {
            return Err(LocationServiceError::LocationHasChildren { child_count });
        }

        self.repo.delete_location(id)?;
        info!("event=location_delete module=location status=ok location_id={id}");
        Ok(())
    }

    /// Counts parts stored in the location and all of its descendants.
    pub fn parts_count(&self, id: LocationId) -> Result<u64, LocationServiceError> {
        self.get(id)?;
        let mut visited = HashSet::new();
        let mut pending = vec![id];
        let mut total = 0;

        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            total += self.repo.count_direct_parts(current)?;
            pending.extend(
                self.repo
                    .list_children(Some(current))?
                    .into_iter()
                    .map(|child| child.id),
            );
        }
        Ok(total)
    }

    /// Returns the whole forest with recursive part counts.
    pub fn tree(&self) -> Result<Vec<LocationTreeNode>, LocationServiceError> {
        let mut visited = HashSet::new();
        let roots = self.repo.list_children(None)?;
        let mut nodes = Vec::with_capacity(roots.len());
        for root in roots {
            if let Some(node) = self.build_node(root, &mut visited)? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    fn build_node(
        &self,
        location: Location,
        visited: &mut HashSet<LocationId>,
    ) -> Result<Option<LocationTreeNode>, LocationServiceError> {
        if !visited.insert(location.id) {
            return Ok(None);
        }

        let mut parts_count = self.repo.count_direct_parts(location.id)?;
        let mut children = Vec::new();
        for child in self.repo.list_children(Some(location.id))? {
            if let Some(node) = self.build_node(child, visited)? {
                parts_count += node.parts_count;
                children.push(node);
            }
        }

        Ok(Some(LocationTreeNode {
            location,
            parts_count,
            children,
        }))
    }

    fn would_create_cycle(
        &self,
        location_id: LocationId,
        candidate_parent_id: LocationId,
    ) -> Result<bool, LocationServiceError> {
        let mut visited = HashSet::new();
        let mut cursor = Some(candidate_parent_id);
        while let Some(current) = cursor {
            if current == location_id {
                return Ok(true);
            }
            // Stored loop that never reaches the moved node.
            if !visited.insert(current) {
                return Ok(false);
            }

            cursor = match self.repo.get_location(current)? {
                Some(location) => location.parent_id,
                None => None,
            };
        }
        Ok(false)
    }
}

fn normalize_name(value: String) -> Result<String, LocationServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LocationServiceError::InvalidName);
    }
    Ok(trimmed.to_string())
}
