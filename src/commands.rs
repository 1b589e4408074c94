//! # Engine Commands
//!
//! Translation of planned actions into the commands a simulation engine
//! executes.
//!
//! Each action maps onto exactly one command. Moves become compound moves to
//! a cell; the other actions become primitive commands aimed at the
//! neighbouring object.

use crate::{
    Direction, JointAction, MapObject, PeasantId, Plan, PlannerError, PlannerResult, Position,
    StripsAction, TownHall,
};
use serde::{Deserialize, Serialize};

/// A command for the simulation engine.
///
/// ```
/// use harvest_planner::{
///     DepositAction, EngineCommand, MapObject, PeasantId, Position, StripsAction, TownHall,
/// };
///
/// let hall = TownHall::new(Position::new(1, 1)).with_unit_id(12);
/// let deposit = StripsAction::Deposit(DepositAction::new(
///     PeasantId(0),
///     hall.position(),
///     Position::new(2, 2),
/// ));
/// let command = EngineCommand::for_action(&deposit, &hall).unwrap();
/// assert_eq!(
///     serde_json::to_string(&command).unwrap(),
///     r#"{"command":"primitive_deposit","unit":0,"direction":"Northwest"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EngineCommand {
    /// Walk the unit to a cell, letting the engine route it
    CompoundMove { unit: PeasantId, x: i32, y: i32 },
    /// Gather from the object in `direction`
    PrimitiveGather { unit: PeasantId, direction: Direction },
    /// Deposit into the object in `direction`
    PrimitiveDeposit { unit: PeasantId, direction: Direction },
    /// Train a peasant at the town hall
    PrimitiveProduction { town_hall: Option<u32> },
}

impl EngineCommand {
    /// The engine command carrying out `action`.
    ///
    /// Fails with [`PlannerError::UnreachableTarget`] when a Harvest or
    /// Deposit is issued from the very cell of its target.
    pub fn for_action(action: &StripsAction, town_hall: &TownHall) -> PlannerResult<Self> {
        let facing = |from: Position, target: Position| {
            from.direction_to(target)
                .ok_or(PlannerError::UnreachableTarget { target })
        };

        let command = match action {
            StripsAction::Move(step) => EngineCommand::CompoundMove {
                unit: step.peasant(),
                x: step.destination().x,
                y: step.destination().y,
            },
            StripsAction::Harvest(harvest) => EngineCommand::PrimitiveGather {
                unit: harvest.peasant(),
                direction: facing(harvest.from(), harvest.resource_position())?,
            },
            StripsAction::Deposit(deposit) => EngineCommand::PrimitiveDeposit {
                unit: deposit.peasant(),
                direction: facing(deposit.from(), town_hall.position())?,
            },
            StripsAction::Create(_) => EngineCommand::PrimitiveProduction {
                town_hall: town_hall.unit_id(),
            },
        };
        Ok(command)
    }
}

/// Commands for one joint step, in the order the actions appear.
pub fn commands_for_step(
    step: &JointAction,
    town_hall: &TownHall,
) -> PlannerResult<Vec<EngineCommand>> {
    step.iter()
        .map(|action| EngineCommand::for_action(action, town_hall))
        .collect()
}

impl Plan {
    /// Engine commands for every step of the plan, oldest first.
    pub fn commands(&self, town_hall: &TownHall) -> PlannerResult<Vec<Vec<EngineCommand>>> {
        self.steps()
            .iter()
            .map(|step| commands_for_step(step, town_hall))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        CreateAction, DepositAction, HarvestAction, Landmark, MoveAction, ResourceKind,
        SearchStats,
    };

    fn hall() -> TownHall {
        TownHall::new(Position::new(1, 1)).with_unit_id(7)
    }

    #[test]
    fn test_move_becomes_compound_move() {
        let step = StripsAction::Move(MoveAction::from_parts(
            PeasantId(2),
            Landmark::Forest,
            Position::new(6, 2),
            Position::new(5, 2),
            3.0,
        ));
        assert_eq!(
            EngineCommand::for_action(&step, &hall()).unwrap(),
            EngineCommand::CompoundMove {
                unit: PeasantId(2),
                x: 5,
                y: 2
            }
        );
    }

    #[test]
    fn test_harvest_faces_resource() {
        let harvest = StripsAction::Harvest(HarvestAction::from_parts(
            PeasantId(0),
            ResourceKind::Gold,
            Position::new(6, 6),
            Position::new(5, 5),
        ));
        assert_eq!(
            EngineCommand::for_action(&harvest, &hall()).unwrap(),
            EngineCommand::PrimitiveGather {
                unit: PeasantId(0),
                direction: Direction::Southeast
            }
        );
    }

    #[test]
    fn test_deposit_and_create_use_town_hall() {
        let deposit = StripsAction::Deposit(DepositAction::new(
            PeasantId(1),
            Position::new(1, 1),
            Position::new(1, 2),
        ));
        let create = StripsAction::Create(CreateAction::new(PeasantId(1)));
        let step = JointAction::new(vec![deposit, create]);

        let commands = commands_for_step(&step, &hall()).unwrap();
        assert_eq!(
            commands,
            vec![
                EngineCommand::PrimitiveDeposit {
                    unit: PeasantId(1),
                    direction: Direction::North
                },
                EngineCommand::PrimitiveProduction { town_hall: Some(7) },
            ]
        );

        let plan = Plan::new(vec![step], 2.0, SearchStats::default());
        assert_eq!(plan.commands(&hall()).unwrap().len(), 1);
    }

    #[test]
    fn test_stacked_target_is_rejected() {
        let deposit = StripsAction::Deposit(DepositAction::new(
            PeasantId(1),
            Position::new(1, 1),
            Position::new(1, 1),
        ));
        assert!(matches!(
            EngineCommand::for_action(&deposit, &hall()),
            Err(PlannerError::UnreachableTarget { .. })
        ));
    }
}
