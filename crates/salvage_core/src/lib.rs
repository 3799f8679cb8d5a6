//! Core logic for the salvaged-parts catalog.
//! This crate is the single source of truth for normalization, matching and
//! placement invariants.

pub mod config;
pub mod db;
pub mod federation;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod template;
pub mod units;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use federation::{merge_peers, Federation, HttpPeerClient, PeerClient, PeerError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::location::{Location, LocationId, LocationTreeNode, LocationType};
pub use model::part::{NewPart, Part, PartId, PropBag, PropValue};
pub use model::peer::{generate_peer_token, Peer};
pub use repo::location_repo::{LocationRepository, SqliteLocationRepository};
pub use repo::part_repo::{PartRepository, SqlitePartRepository};
pub use repo::peer_repo::{PeerRepository, SqlitePeerRepository};
pub use repo::{RepoError, RepoResult};
pub use search::{CriteriaError, PartHit, PartQuery, SearchCriteria};
pub use service::location_service::{LocationService, LocationServiceError};
pub use service::part_service::{PartService, PartServiceError};
pub use service::search_service::{find_compatible, PartSearchService, SearchServiceError};
pub use template::{Template, TemplateError, TemplateLoadError, TemplateRegistry};
pub use units::{normalize_props, normalize_value, NormalizeError, UnitDomain, UnitError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
