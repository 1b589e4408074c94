//! # Harvest Action
//!
//! Takes one chunk of wood or gold out of an adjacent resource node.

use crate::{
    GameState, MapObject, Peasant, PeasantId, PlannerError, PlannerResult, Position,
    ResourceKind, ResourceNode, StripsAction,
};
use serde::{Deserialize, Serialize};

/// Harvest from a forest or a gold mine the peasant stands next to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestAction {
    peasant: PeasantId,
    resource: ResourceKind,
    resource_position: Position,
    from: Position,
}

impl HarvestAction {
    pub fn new(peasant: &Peasant, node: &ResourceNode) -> Self {
        Self::from_parts(
            peasant.id(),
            node.resource(),
            node.position(),
            peasant.position(),
        )
    }

    pub(crate) fn from_parts(
        peasant: PeasantId,
        resource: ResourceKind,
        resource_position: Position,
        from: Position,
    ) -> Self {
        Self {
            peasant,
            resource,
            resource_position,
            from,
        }
    }

    pub fn peasant(&self) -> PeasantId {
        self.peasant
    }

    pub fn resource(&self) -> ResourceKind {
        self.resource
    }

    pub fn resource_position(&self) -> Position {
        self.resource_position
    }

    /// Where the peasant stands while harvesting.
    pub fn from(&self) -> Position {
        self.from
    }

    /// The peasant is empty-handed, flagged as next to this kind of node,
    /// actually adjacent to it, and the node still holds something.
    pub fn preconditions_met(&self, state: &GameState) -> bool {
        let Ok(peasant) = state.peasant(self.peasant) else {
            return false;
        };

        peasant.is_empty()
            && peasant.is_next_to(self.resource.source())
            && peasant.position().is_adjacent(self.resource_position)
            && state
                .resource_at(self.resource_position)
                .is_some_and(|node| node.resource() == self.resource && !node.is_exhausted())
    }

    pub(crate) fn apply_effects(&self, draft: &mut GameState) -> PlannerResult<()> {
        let available = draft
            .resource_at(self.resource_position)
            .is_some_and(|node| !node.is_exhausted());
        if !available {
            return Err(PlannerError::ResourceExhausted {
                position: self.resource_position,
            });
        }
        if !self.preconditions_met(draft) {
            return Err(StripsAction::Harvest(self.clone()).precondition_failure());
        }

        let amount = draft.harvest_chunk(self.resource_position)?;
        draft.peasant_mut(self.peasant)?.load(self.resource, amount);
        Ok(())
    }
}
