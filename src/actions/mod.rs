//! # Action System
//!
//! The four STRIPS actions a peasant can take, and the joint action that
//! groups one action per peasant into a single planning step.
//!
//! Every action is a precondition over a [`GameState`] plus an effect. The
//! effect is written against a child state under construction, which is how
//! several peasants' actions are folded into one successor.

pub mod create;
pub mod deposit;
pub mod harvest;
pub mod movement;

pub use create::*;
pub use deposit::*;
pub use harvest::*;
pub use movement::*;

use crate::{GameState, PeasantId, PlannerError, PlannerResult, Position};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable tag for each action variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Move,
    Harvest,
    Deposit,
    Create,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Move => "Move",
            ActionKind::Harvest => "Harvest",
            ActionKind::Deposit => "Deposit",
            ActionKind::Create => "Create",
        };
        f.write_str(name)
    }
}

/// One grounded action bound to the peasant performing it.
///
/// The text form is `ActionName(param1, param2, ...)`:
///
/// ```
/// use harvest_planner::{DepositAction, PeasantId, Position, StripsAction};
///
/// let deposit = StripsAction::Deposit(DepositAction::new(
///     PeasantId(2),
///     Position::new(3, 3),
///     Position::new(4, 4),
/// ));
/// assert_eq!(deposit.to_string(), "Deposit(2)");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum StripsAction {
    Move(MoveAction),
    Harvest(HarvestAction),
    Deposit(DepositAction),
    Create(CreateAction),
}

impl StripsAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            StripsAction::Move(_) => ActionKind::Move,
            StripsAction::Harvest(_) => ActionKind::Harvest,
            StripsAction::Deposit(_) => ActionKind::Deposit,
            StripsAction::Create(_) => ActionKind::Create,
        }
    }

    /// The peasant performing the action.
    pub fn peasant(&self) -> PeasantId {
        match self {
            StripsAction::Move(action) => action.peasant(),
            StripsAction::Harvest(action) => action.peasant(),
            StripsAction::Deposit(action) => action.peasant(),
            StripsAction::Create(action) => action.producer(),
        }
    }

    /// Path cost of the action: travel distance for Move, 1 for the rest.
    pub fn cost(&self) -> f64 {
        match self {
            StripsAction::Move(action) => action.cost(),
            StripsAction::Harvest(_) | StripsAction::Deposit(_) | StripsAction::Create(_) => 1.0,
        }
    }

    pub fn preconditions_met(&self, state: &GameState) -> bool {
        match self {
            StripsAction::Move(action) => action.preconditions_met(state),
            StripsAction::Harvest(action) => action.preconditions_met(state),
            StripsAction::Deposit(action) => action.preconditions_met(state),
            StripsAction::Create(action) => action.preconditions_met(state),
        }
    }

    /// Applies this action alone to `state`, producing a new state.
    pub fn apply(&self, state: &GameState) -> PlannerResult<GameState> {
        state.apply_joint(JointAction::single(self.clone()))
    }

    /// Writes this action's effects into a child state under construction.
    pub(crate) fn apply_effects(&self, draft: &mut GameState) -> PlannerResult<()> {
        match self {
            StripsAction::Move(action) => action.apply_effects(draft),
            StripsAction::Harvest(action) => action.apply_effects(draft),
            StripsAction::Deposit(action) => action.apply_effects(draft),
            StripsAction::Create(action) => action.apply_effects(draft),
        }
    }

    /// Position of the object this action is aimed at.
    pub fn target_position(&self, state: &GameState) -> Position {
        match self {
            StripsAction::Move(action) => action.target_position(),
            StripsAction::Harvest(action) => action.resource_position(),
            StripsAction::Deposit(_) | StripsAction::Create(_) => state.town_hall_position(),
        }
    }

    /// The finite resource tile this action competes for, if any.
    ///
    /// Town-hall targets never compete, so Deposit, Create and a Move toward
    /// the hall return None.
    pub fn contended_resource(&self) -> Option<Position> {
        match self {
            StripsAction::Move(action) if action.target().is_resource() => {
                Some(action.target_position())
            }
            StripsAction::Harvest(action) => Some(action.resource_position()),
            _ => None,
        }
    }

    pub(crate) fn precondition_failure(&self) -> PlannerError {
        PlannerError::PreconditionFailure {
            action: self.to_string(),
        }
    }
}

impl fmt::Display for StripsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StripsAction::Move(action) => {
                let destination = action.destination();
                write!(f, "Move({}, {}, {})", action.peasant(), destination.x, destination.y)
            }
            StripsAction::Harvest(action) => {
                let resource = action.resource_position();
                write!(f, "Harvest({}, {}, {})", action.peasant(), resource.x, resource.y)
            }
            StripsAction::Deposit(action) => write!(f, "Deposit({})", action.peasant()),
            StripsAction::Create(action) => write!(f, "Create({})", action.producer()),
        }
    }
}

/// One action per acting peasant, applied atomically as a single step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointAction {
    actions: Vec<StripsAction>,
}

impl JointAction {
    pub fn new(actions: Vec<StripsAction>) -> Self {
        Self { actions }
    }

    pub fn single(action: StripsAction) -> Self {
        Self {
            actions: vec![action],
        }
    }

    pub fn actions(&self) -> &[StripsAction] {
        &self.actions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StripsAction> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// The action performed by `peasant` in this step, if it acted.
    pub fn for_peasant(&self, peasant: PeasantId) -> Option<&StripsAction> {
        self.actions.iter().find(|action| action.peasant() == peasant)
    }

    /// The first Create in this step, if any.
    pub fn create(&self) -> Option<&StripsAction> {
        self.actions
            .iter()
            .find(|action| action.kind() == ActionKind::Create)
    }

    /// Summed cost of every component action.
    pub fn cost(&self) -> f64 {
        self.actions.iter().map(StripsAction::cost).sum()
    }
}

impl<'a> IntoIterator for &'a JointAction {
    type Item = &'a StripsAction;
    type IntoIter = std::slice::Iter<'a, StripsAction>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

impl fmt::Display for JointAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.actions.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", rendered.join(", "))
    }
}
