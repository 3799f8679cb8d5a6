//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the CLI and embedding layers decoupled from storage details.

pub mod location_service;
pub mod part_service;
pub mod search_service;
