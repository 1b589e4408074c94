//! # State Fingerprints
//!
//! A canonical, hashable key for a [`GameState`], used by the search for
//! duplicate detection.

use crate::{Cargo, GameState, Landmark, MapObject, Position, ResourceNode};

/// Layout of one peasant with its id left out.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeasantLayout {
    pub position: Position,
    pub cargo: Option<Cargo>,
    pub next_to: Option<Landmark>,
    /// Whether the peasant's last action was a Move; this restricts its
    /// next candidates, so it is part of the layout.
    pub moved_last: bool,
}

/// Two states with the same fingerprint generate the same successors and
/// satisfy the same goal, however they were reached.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateFingerprint {
    peasants: Vec<PeasantLayout>,
    forests: Vec<(Position, u32)>,
    gold_mines: Vec<(Position, u32)>,
    my_wood: u32,
    my_gold: u32,
}

impl StateFingerprint {
    pub fn peasants(&self) -> &[PeasantLayout] {
        &self.peasants
    }
}

fn quantities(nodes: &[ResourceNode]) -> Vec<(Position, u32)> {
    nodes
        .iter()
        .map(|node| (node.position(), node.remaining()))
        .collect()
}

impl GameState {
    pub fn fingerprint(&self) -> StateFingerprint {
        let mut peasants: Vec<PeasantLayout> = self
            .peasants()
            .iter()
            .map(|peasant| PeasantLayout {
                position: peasant.position(),
                cargo: peasant.cargo(),
                next_to: peasant.next_to(),
                moved_last: self.moved_last(peasant.id()),
            })
            .collect();
        peasants.sort();

        StateFingerprint {
            peasants,
            forests: quantities(self.forests()),
            gold_mines: quantities(self.gold_mines()),
            my_wood: self.my_wood(),
            my_gold: self.my_gold(),
        }
    }
}
