//! # World Snapshot
//!
//! The view of the map the engine hands the planner before a run.
//!
//! A snapshot lists the map extent, every resource node and every unit the
//! planning player owns. It is plain data: [`crate::GameState::from_snapshot`]
//! turns it into the root search node.

use crate::{MapExtent, PlannerResult, Position, ResourceKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unit kinds the planner cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Peasant,
    #[serde(alias = "town_hall")]
    TownHall,
}

/// A resource node as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceView {
    pub kind: ResourceKind,
    pub x: i32,
    pub y: i32,
    pub remaining: u32,
}

impl ResourceView {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// A unit owned by the planning player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitView {
    /// Engine identity of the unit
    pub id: u32,
    pub kind: UnitKind,
    pub x: i32,
    pub y: i32,
}

impl UnitView {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// Everything the planner needs to know about the world at planning time.
///
/// # Examples
///
/// ```
/// use harvest_planner::WorldSnapshot;
///
/// let snapshot = WorldSnapshot::from_json(r#"{
///     "width": 8,
///     "height": 8,
///     "food_cap": 3,
///     "resources": [{ "kind": "wood", "x": 6, "y": 1, "remaining": 300 }],
///     "units": [
///         { "id": 4, "kind": "townhall", "x": 1, "y": 1 },
///         { "id": 7, "kind": "peasant", "x": 2, "y": 2 }
///     ]
/// }"#).unwrap();
///
/// assert_eq!(snapshot.total_remaining(harvest_planner::ResourceKind::Wood), 300);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub width: u32,
    pub height: u32,
    /// Population cap of the planning player
    pub food_cap: u32,
    #[serde(default)]
    pub resources: Vec<ResourceView>,
    #[serde(default)]
    pub units: Vec<UnitView>,
}

impl WorldSnapshot {
    /// Parses a snapshot from JSON text.
    pub fn from_json(json: &str) -> PlannerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON snapshot from disk.
    pub fn load(path: impl AsRef<Path>) -> PlannerResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn extent(&self) -> MapExtent {
        MapExtent::new(self.width, self.height)
    }

    /// Total quantity of `kind` left across all nodes.
    pub fn total_remaining(&self, kind: ResourceKind) -> u64 {
        self.resources
            .iter()
            .filter(|resource| resource.kind == kind)
            .map(|resource| u64::from(resource.remaining))
            .sum()
    }
}
