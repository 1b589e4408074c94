//! # Move Action
//!
//! Walks a peasant up to a forest, a gold mine or the town hall.

use crate::{GameState, Landmark, MapObject, PeasantId, PlannerError, PlannerResult, Position};
use serde::{Deserialize, Serialize};

/// Move toward a map object, stopping on the free neighbour cell closest to
/// where the peasant stands.
///
/// Peasants cannot stand on a resource or on the town hall, so the real
/// destination is resolved against the state when the action is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveAction {
    peasant: PeasantId,
    target: Landmark,
    target_position: Position,
    destination: Position,
    cost: f64,
}

impl MoveAction {
    /// Resolves a move of `peasant` toward the object at `target_position`.
    ///
    /// Fails with [`PlannerError::UnreachableTarget`] when every neighbour of
    /// the target is off the map or blocked.
    pub fn toward(
        state: &GameState,
        peasant: PeasantId,
        target: Landmark,
        target_position: Position,
    ) -> PlannerResult<Self> {
        let from = state.peasant(peasant)?.position();
        let destination = state.approach_cell(target_position, from).ok_or(
            PlannerError::UnreachableTarget {
                target: target_position,
            },
        )?;

        Ok(Self {
            peasant,
            target,
            target_position,
            destination,
            cost: from.euclidean_distance(destination),
        })
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        peasant: PeasantId,
        target: Landmark,
        target_position: Position,
        destination: Position,
        cost: f64,
    ) -> Self {
        Self {
            peasant,
            target,
            target_position,
            destination,
            cost,
        }
    }

    pub fn peasant(&self) -> PeasantId {
        self.peasant
    }

    /// What kind of object the peasant walks to.
    pub fn target(&self) -> Landmark {
        self.target
    }

    /// Where the target object stands.
    pub fn target_position(&self) -> Position {
        self.target_position
    }

    /// The cell the peasant ends up on.
    pub fn destination(&self) -> Position {
        self.destination
    }

    /// Euclidean travel distance.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// A peasant may always choose to move.
    pub fn preconditions_met(&self, _state: &GameState) -> bool {
        true
    }

    pub(crate) fn apply_effects(&self, draft: &mut GameState) -> PlannerResult<()> {
        draft
            .peasant_mut(self.peasant)?
            .relocate(self.destination, self.target);
        Ok(())
    }
}
