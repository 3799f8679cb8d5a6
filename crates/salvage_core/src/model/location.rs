//! Physical location model.
//!
//! # Responsibility
//! - Define containers (zone, furniture, shelf, box) that hold parts.
//!
//! # Invariants
//! - `parent_id = None` marks a root; roots may be many (forest).
//! - Parent chains must not cycle. Storage does not guarantee this; the
//!   location service checks it on every move.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned location identity.
pub type LocationId = i64;

/// Kind of physical container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    /// Workshop, room.
    Zone,
    /// Cabinet, workbench, rack.
    Furniture,
    /// Shelf or tier inside furniture.
    Shelf,
    /// Box, bin, drawer.
    #[default]
    Box,
}

impl LocationType {
    /// Storage and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zone => "ZONE",
            Self::Furniture => "FURNITURE",
            Self::Shelf => "SHELF",
            Self::Box => "BOX",
        }
    }

    /// Parses a type name case-insensitively. Blank input maps to `Box`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "" | "BOX" => Some(Self::Box),
            "ZONE" => Some(Self::Zone),
            "FURNITURE" => Some(Self::Furniture),
            "SHELF" => Some(Self::Shelf),
            _ => None,
        }
    }
}

impl Display for LocationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    /// Parent location. `None` means root.
    pub parent_id: Option<LocationId>,
    #[serde(rename = "loc_type")]
    pub kind: LocationType,
    pub description: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

/// Nested view of one location subtree with recursive part counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationTreeNode {
    pub location: Location,
    /// Parts assigned to this node and all of its descendants.
    pub parts_count: u64,
    pub children: Vec<LocationTreeNode>,
}
