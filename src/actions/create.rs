//! # Create Action
//!
//! Trains a new peasant at the town hall in exchange for gold.

use crate::config::PEASANT_GOLD_COST;
use crate::{
    GameState, Landmark, MapObject, Peasant, PeasantId, PlannerError, PlannerResult,
    StripsAction,
};
use serde::{Deserialize, Serialize};

/// Produce a peasant. The producer is a peasant standing beside the hall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAction {
    producer: PeasantId,
}

impl CreateAction {
    pub fn new(producer: PeasantId) -> Self {
        Self { producer }
    }

    pub fn producer(&self) -> PeasantId {
        self.producer
    }

    /// Create is enabled, the stockpile covers the cost, the food cap has
    /// room and the producer stands next to the town hall.
    pub fn preconditions_met(&self, state: &GameState) -> bool {
        state.goal().allow_create
            && state.my_gold() >= PEASANT_GOLD_COST
            && state.peasant_count() < state.food_cap()
            && state.peasant(self.producer).is_ok_and(|producer| {
                producer.position().is_adjacent(state.town_hall_position())
            })
    }

    pub(crate) fn apply_effects(&self, draft: &mut GameState) -> PlannerResult<()> {
        if draft.peasant_count() >= draft.food_cap() {
            return Err(PlannerError::PopulationCapReached {
                cap: draft.food_cap(),
            });
        }
        if !self.preconditions_met(draft) {
            return Err(StripsAction::Create(self.clone()).precondition_failure());
        }

        let spawn = draft
            .spawn_cell()
            .ok_or(PlannerError::UnreachableTarget {
                target: draft.town_hall_position(),
            })?;
        let id = PeasantId(draft.peasant_count());
        draft.spend_gold(PEASANT_GOLD_COST);
        draft.add_peasant(Peasant::new(id, spawn).with_next_to(Landmark::TownHall));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MapExtent, PlanningGoal, Position, ResourceNode, TownHall};

    fn with_gold(gold: u32, food_cap: u32, allow_create: bool) -> GameState {
        GameState::builder(MapExtent::new(8, 8), TownHall::new(Position::new(1, 1)))
            .peasant(Position::new(2, 2))
            .stockpile(0, gold)
            .food_cap(food_cap)
            .goal(PlanningGoal::new(0, 1000, allow_create))
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_spawns_peasant_beside_hall() {
        let state = with_gold(500, 3, true);
        let action = CreateAction::new(PeasantId(0));
        assert!(action.preconditions_met(&state));

        let next = StripsAction::Create(action).apply(&state).unwrap();
        assert_eq!(next.peasant_count(), 2);
        assert_eq!(next.my_gold(), 100);

        let created = next.peasant(PeasantId(1)).unwrap();
        // (0, 0) is the first neighbour of the hall in enumeration order
        assert_eq!(created.position(), Position::new(0, 0));
        assert!(created.is_empty());
        assert!(created.is_next_to_town_hall());
    }

    #[test]
    fn test_create_skips_occupied_cells() {
        let state = GameState::builder(MapExtent::new(8, 8), TownHall::new(Position::new(1, 1)))
            .peasant(Position::new(1, 0))
            .resource(ResourceNode::forest(Position::new(0, 0), 100))
            .stockpile(0, 400)
            .food_cap(2)
            .goal(PlanningGoal::new(0, 0, true))
            .build()
            .unwrap();
        let next = StripsAction::Create(CreateAction::new(PeasantId(0)))
            .apply(&state)
            .unwrap();
        assert_eq!(
            next.peasant(PeasantId(1)).unwrap().position(),
            Position::new(2, 0)
        );
    }

    #[test]
    fn test_create_needs_gold() {
        let state = with_gold(399, 3, true);
        assert!(!CreateAction::new(PeasantId(0)).preconditions_met(&state));
    }

    #[test]
    fn test_create_disabled() {
        let state = with_gold(1000, 3, false);
        assert!(!CreateAction::new(PeasantId(0)).preconditions_met(&state));
    }

    #[test]
    fn test_create_at_food_cap() {
        let state = with_gold(1000, 1, true);
        let action = CreateAction::new(PeasantId(0));
        assert!(!action.preconditions_met(&state));
        assert!(matches!(
            StripsAction::Create(action).apply(&state),
            Err(PlannerError::PopulationCapReached { cap: 1 })
        ));
    }

    #[test]
    fn test_create_requires_producer_at_hall() {
        let state = GameState::builder(MapExtent::new(8, 8), TownHall::new(Position::new(1, 1)))
            .peasant(Position::new(5, 5))
            .stockpile(0, 400)
            .food_cap(2)
            .goal(PlanningGoal::new(0, 0, true))
            .build()
            .unwrap();
        assert!(!CreateAction::new(PeasantId(0)).preconditions_met(&state));
    }
}
