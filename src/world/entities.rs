//! # Map Objects
//!
//! Peasants, forests, gold mines and the town hall as the planner sees them.

use crate::config::HARVEST_AMOUNT;
use crate::{PeasantId, Position};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind tag shared by every object on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectKind {
    Peasant,
    Forest,
    GoldMine,
    TownHall,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Peasant => "PEASANT",
            ObjectKind::Forest => "FOREST",
            ObjectKind::GoldMine => "GOLDMINE",
            ObjectKind::TownHall => "TOWNHALL",
        };
        f.write_str(name)
    }
}

/// The two gatherable resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Wood,
    Gold,
}

impl ResourceKind {
    /// The landmark a peasant has to stand next to in order to gather this.
    pub fn source(self) -> Landmark {
        match self {
            ResourceKind::Wood => Landmark::Forest,
            ResourceKind::Gold => Landmark::GoldMine,
        }
    }
}

/// Objects a peasant can walk up to and be "next to".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Landmark {
    Forest,
    GoldMine,
    TownHall,
}

impl Landmark {
    /// The map object kind this landmark corresponds to.
    pub fn object_kind(self) -> ObjectKind {
        match self {
            Landmark::Forest => ObjectKind::Forest,
            Landmark::GoldMine => ObjectKind::GoldMine,
            Landmark::TownHall => ObjectKind::TownHall,
        }
    }

    /// The resource gathered here, None for the town hall.
    pub fn resource(self) -> Option<ResourceKind> {
        match self {
            Landmark::Forest => Some(ResourceKind::Wood),
            Landmark::GoldMine => Some(ResourceKind::Gold),
            Landmark::TownHall => None,
        }
    }

    pub fn is_resource(self) -> bool {
        self.resource().is_some()
    }
}

/// Common view over everything placed on the map.
pub trait MapObject {
    /// Which kind of object this is.
    fn kind(&self) -> ObjectKind;

    /// Where the object stands.
    fn position(&self) -> Position;

    /// Whether the object holds nothing. Only meaningful for peasants.
    fn is_empty(&self) -> bool {
        true
    }
}

/// Resource carried by a peasant. The amount is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cargo {
    kind: ResourceKind,
    amount: u32,
}

impl Cargo {
    /// What is being carried.
    pub fn kind(self) -> ResourceKind {
        self.kind
    }

    /// How much is being carried.
    pub fn amount(self) -> u32 {
        self.amount
    }
}

/// A resource-gathering agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Peasant {
    id: PeasantId,
    position: Position,
    cargo: Option<Cargo>,
    next_to: Option<Landmark>,
}

impl Peasant {
    /// Creates an empty-handed peasant that is not next to anything.
    pub fn new(id: PeasantId, position: Position) -> Self {
        Self {
            id,
            position,
            cargo: None,
            next_to: None,
        }
    }

    /// Planning id of this peasant.
    pub fn id(&self) -> PeasantId {
        self.id
    }

    /// What the peasant carries, if anything.
    pub fn carrying(&self) -> Option<ResourceKind> {
        self.cargo.map(Cargo::kind)
    }

    /// How much the peasant carries; zero when empty-handed.
    pub fn carried_amount(&self) -> u32 {
        self.cargo.map_or(0, Cargo::amount)
    }

    pub fn cargo(&self) -> Option<Cargo> {
        self.cargo
    }

    /// The landmark set by the most recent Move, Deposit or Create.
    pub fn next_to(&self) -> Option<Landmark> {
        self.next_to
    }

    pub fn is_next_to(&self, landmark: Landmark) -> bool {
        self.next_to == Some(landmark)
    }

    pub fn is_next_to_forest(&self) -> bool {
        self.is_next_to(Landmark::Forest)
    }

    pub fn is_next_to_gold_mine(&self) -> bool {
        self.is_next_to(Landmark::GoldMine)
    }

    pub fn is_next_to_town_hall(&self) -> bool {
        self.is_next_to(Landmark::TownHall)
    }

    pub(crate) fn with_next_to(mut self, landmark: Landmark) -> Self {
        self.next_to = Some(landmark);
        self
    }

    /// Moves the peasant; the adjacency flags are cleared and then exactly
    /// the one for `landmark` is set.
    pub(crate) fn relocate(&mut self, position: Position, landmark: Landmark) {
        self.position = position;
        self.next_to = Some(landmark);
    }

    /// Loads `amount` of `kind`. A zero amount leaves the peasant empty.
    pub(crate) fn load(&mut self, kind: ResourceKind, amount: u32) {
        self.cargo = (amount > 0).then_some(Cargo { kind, amount });
    }

    /// Empties the peasant's hands, returning what it carried.
    pub(crate) fn unload(&mut self) -> Option<Cargo> {
        self.cargo.take()
    }
}

impl MapObject for Peasant {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Peasant
    }

    fn position(&self) -> Position {
        self.position
    }

    fn is_empty(&self) -> bool {
        self.cargo.is_none()
    }
}

/// A forest or a gold mine with the quantity still left in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceNode {
    resource: ResourceKind,
    position: Position,
    remaining: u32,
}

impl ResourceNode {
    pub fn new(resource: ResourceKind, position: Position, remaining: u32) -> Self {
        Self {
            resource,
            position,
            remaining,
        }
    }

    /// A forest holding `remaining` wood.
    pub fn forest(position: Position, remaining: u32) -> Self {
        Self::new(ResourceKind::Wood, position, remaining)
    }

    /// A gold mine holding `remaining` gold.
    pub fn gold_mine(position: Position, remaining: u32) -> Self {
        Self::new(ResourceKind::Gold, position, remaining)
    }

    /// The resource this node yields.
    pub fn resource(&self) -> ResourceKind {
        self.resource
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// How many peasants can harvest this node in the same tick.
    pub fn harvest_capacity(&self) -> u32 {
        self.remaining / HARVEST_AMOUNT
    }

    /// Harvests still possible before the node runs dry. A short last
    /// chunk counts as a full one.
    pub fn harvests_left(&self) -> u32 {
        self.remaining.div_ceil(HARVEST_AMOUNT)
    }

    /// Takes one full chunk out of the node and returns the amount loaded.
    ///
    /// The node bottoms out at 0 even when less than a chunk was left.
    pub(crate) fn take_chunk(&mut self) -> u32 {
        self.remaining = self.remaining.saturating_sub(HARVEST_AMOUNT);
        HARVEST_AMOUNT
    }
}

impl MapObject for ResourceNode {
    fn kind(&self) -> ObjectKind {
        self.resource.source().object_kind()
    }

    fn position(&self) -> Position {
        self.position
    }
}

/// The drop-off point for gathered resources and the producer of peasants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TownHall {
    position: Position,
    unit_id: Option<u32>,
}

impl TownHall {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            unit_id: None,
        }
    }

    /// Attaches the engine's identity for this town hall.
    pub fn with_unit_id(mut self, unit_id: u32) -> Self {
        self.unit_id = Some(unit_id);
        self
    }

    /// Engine identity, opaque to the planner.
    pub fn unit_id(&self) -> Option<u32> {
        self.unit_id
    }
}

impl MapObject for TownHall {
    fn kind(&self) -> ObjectKind {
        ObjectKind::TownHall
    }

    fn position(&self) -> Position {
        self.position
    }
}
