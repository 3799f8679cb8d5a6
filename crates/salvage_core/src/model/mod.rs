//! Catalog domain model.
//!
//! # Responsibility
//! - Define the records shared by normalization, search and placement logic.
//!
//! # Invariants
//! - Part attribute bags hold canonical values once persisted.
//! - Location parent chains form a forest (no cycles).

pub mod location;
pub mod part;
pub mod peer;
