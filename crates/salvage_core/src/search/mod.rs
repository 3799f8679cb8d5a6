//! Property search expressions and compatibility queries.
//!
//! # Responsibility
//! - Parse user search expressions into predicates.
//! - Evaluate predicates against normalized attribute bags.
//! - Define the query/result records exchanged with peers.
//!
//! # Invariants
//! - Matching is pure; callers apply it in-process after store-side filters.

pub mod criteria;
pub mod query;

pub use criteria::{criteria_from_expression, CriteriaError, CriteriaKind, SearchCriteria};
pub use query::{PartHit, PartQuery, LOCAL_SOURCE};
