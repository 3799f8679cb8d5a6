//! Compatibility search use-case service.
//!
//! # Responsibility
//! - Run the local type/name/property search.
//! - Fall back to peer fan-out when nothing matches locally.
//!
//! # Invariants
//! - Local hits keep creation order (`id ASC`).
//! - Peers are only queried when the local result set is empty.

use crate::federation::Federation;
use crate::repo::location_repo::LocationRepository;
use crate::repo::part_repo::PartRepository;
use crate::repo::RepoError;
use crate::search::{PartHit, PartQuery, LOCAL_SOURCE};
use crate::service::location_service::{LocationService, LocationServiceError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from local search.
#[derive(Debug)]
pub enum SearchServiceError {
    Repo(RepoError),
    /// Location path reconstruction failed.
    Location(LocationServiceError),
}

impl Display for SearchServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Location(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SearchServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Location(err) => Some(err),
        }
    }
}

impl From<RepoError> for SearchServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<LocationServiceError> for SearchServiceError {
    fn from(value: LocationServiceError) -> Self {
        Self::Location(value)
    }
}

/// Local compatibility search facade.
pub struct PartSearchService<P: PartRepository, L: LocationRepository> {
    parts: P,
    locations: LocationService<L>,
}

impl<P: PartRepository, L: LocationRepository> PartSearchService<P, L> {
    pub fn new(parts: P, locations: L) -> Self {
        Self {
            parts,
            locations: LocationService::new(locations),
        }
    }

    /// Searches this catalog only.
    pub fn search_local(&self, query: &PartQuery) -> Result<Vec<PartHit>, SearchServiceError> {
        let started_at = Instant::now();
        let candidates = self.parts.list_candidates(&query.type_name, &query.name)?;
        let candidate_count = candidates.len();

        let matched: Vec<_> = candidates
            .into_iter()
            .filter(|part| {
                query
                    .criteria
                    .as_ref()
                    .map_or(true, |criteria| criteria.matches_props(&part.props))
            })
            .collect();

        let paths = self
            .locations
            .paths_for(matched.iter().filter_map(|part| part.location_id))?;
        let hits: Vec<PartHit> = matched
            .into_iter()
            .map(|part| PartHit {
                location: part.location_id.and_then(|id| paths.get(&id).cloned()),
                id: part.id,
                type_name: part.type_name,
                name: part.name,
                props: part.props,
                source: LOCAL_SOURCE.to_string(),
            })
            .collect();

        info!(
            "event=local_search module=search status=ok duration_ms={} candidate_count={candidate_count} hit_count={}",
            started_at.elapsed().as_millis(),
            hits.len()
        );
        Ok(hits)
    }
}

/// Runs a local search and, when it finds nothing, asks the federation.
pub async fn find_compatible<P: PartRepository, L: LocationRepository>(
    local: &PartSearchService<P, L>,
    federation: Option<&Federation>,
    query: &PartQuery,
) -> Result<Vec<PartHit>, SearchServiceError> {
    let hits = local.search_local(query)?;
    if !hits.is_empty() {
        return Ok(hits);
    }
    match federation {
        Some(federation) if !federation.is_empty() => Ok(federation.fan_out(query).await),
        _ => Ok(hits),
    }
}
