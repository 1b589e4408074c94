//! # Deposit Action
//!
//! Drops carried wood or gold off at the town hall.

use crate::{
    GameState, Landmark, MapObject, Peasant, PeasantId, PlannerResult, Position, StripsAction,
};
use serde::{Deserialize, Serialize};

/// Deposit everything the peasant carries into the town hall stockpile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositAction {
    peasant: PeasantId,
    town_hall: Position,
    from: Position,
}

impl DepositAction {
    pub fn new(peasant: PeasantId, town_hall: Position, from: Position) -> Self {
        Self {
            peasant,
            town_hall,
            from,
        }
    }

    /// Deposit for `peasant` into the hall of `state`.
    pub fn for_peasant(state: &GameState, peasant: &Peasant) -> Self {
        Self::new(peasant.id(), state.town_hall_position(), peasant.position())
    }

    pub fn peasant(&self) -> PeasantId {
        self.peasant
    }

    pub fn town_hall(&self) -> Position {
        self.town_hall
    }

    /// Where the peasant stands while depositing.
    pub fn from(&self) -> Position {
        self.from
    }

    /// The peasant carries something and stands next to the town hall.
    pub fn preconditions_met(&self, state: &GameState) -> bool {
        state.peasant(self.peasant).is_ok_and(|peasant| {
            peasant.carried_amount() > 0 && peasant.is_next_to(Landmark::TownHall)
        })
    }

    pub(crate) fn apply_effects(&self, draft: &mut GameState) -> PlannerResult<()> {
        if !self.preconditions_met(draft) {
            return Err(StripsAction::Deposit(self.clone()).precondition_failure());
        }

        let peasant = draft.peasant_mut(self.peasant)?;
        let cargo = peasant.unload();
        let position = peasant.position();
        peasant.relocate(position, Landmark::TownHall);
        if let Some(cargo) = cargo {
            draft.credit(cargo.kind(), cargo.amount());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MapExtent, PlannerError, ResourceKind, TownHall};

    fn at_hall(carrying: Option<ResourceKind>) -> GameState {
        let hall = TownHall::new(Position::new(1, 1));
        let builder = GameState::builder(MapExtent::new(8, 8), hall);
        let builder = match carrying {
            Some(kind) => builder.peasant_carrying(Position::new(5, 5), kind, 100),
            None => builder.peasant(Position::new(5, 5)),
        };
        let state = builder.goal(crate::PlanningGoal::new(100, 100, false)).build().unwrap();
        let step = crate::MoveAction::toward(
            &state,
            PeasantId(0),
            Landmark::TownHall,
            state.town_hall_position(),
        )
        .unwrap();
        StripsAction::Move(step).apply(&state).unwrap()
    }

    #[test]
    fn test_deposit_credits_stockpile() {
        let state = at_hall(Some(ResourceKind::Gold));
        let peasant = state.peasant(PeasantId(0)).unwrap();
        let action = DepositAction::for_peasant(&state, peasant);
        assert!(action.preconditions_met(&state));

        let next = StripsAction::Deposit(action).apply(&state).unwrap();
        assert_eq!(next.my_gold(), 100);
        assert_eq!(next.my_wood(), 0);
        let peasant = next.peasant(PeasantId(0)).unwrap();
        assert!(peasant.is_empty());
        assert!(peasant.is_next_to_town_hall());
        assert_eq!(next.cost() - state.cost(), 1.0);
    }

    #[test]
    fn test_deposit_rejected_for_empty_peasant() {
        let state = at_hall(None);
        let peasant = state.peasant(PeasantId(0)).unwrap();
        let action = DepositAction::for_peasant(&state, peasant);
        assert!(!action.preconditions_met(&state));
        assert!(matches!(
            StripsAction::Deposit(action).apply(&state),
            Err(PlannerError::PreconditionFailure { .. })
        ));
    }

    #[test]
    fn test_deposit_requires_town_hall_flag() {
        let state = GameState::builder(MapExtent::new(8, 8), TownHall::new(Position::new(1, 1)))
            .peasant_carrying(Position::new(2, 2), ResourceKind::Wood, 100)
            .build()
            .unwrap();
        // Standing beside the hall without having walked there
        let peasant = state.peasant(PeasantId(0)).unwrap();
        assert!(!DepositAction::for_peasant(&state, peasant).preconditions_met(&state));
    }
}
