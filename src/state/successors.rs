//! # Successor Generation
//!
//! Enumerates what each peasant could do next and merges the per-peasant
//! options into joint actions.
//!
//! Generation runs in two phases:
//! 1. Every peasant gets its own candidate list. Each candidate is tried alone
//!    against the parent and dropped if that fails.
//! 2. The candidate lists are combined depth-first into one action per
//!    peasant. A partial combination is cut as soon as more peasants converge
//!    on a resource tile than it has chunks left for.

use crate::{
    CreateAction, DepositAction, GameState, HarvestAction, JointAction, Landmark, MapObject,
    MoveAction, Peasant, Position, StripsAction,
};
use log::trace;
use std::collections::HashMap;

impl GameState {
    /// Candidate actions for one peasant, before any of them is tried.
    ///
    /// An empty-handed peasant considers every active node, gold mines first:
    /// a Harvest when it is already set up for one, and a Move toward the
    /// node. A loaded peasant considers a Deposit and a Move back to the
    /// hall. A peasant whose last action was a Move does not move again.
    pub fn candidate_actions(&self, peasant: &Peasant) -> Vec<StripsAction> {
        let may_move = !self.moved_last(peasant.id());
        let mut candidates = Vec::new();

        if peasant.is_empty() {
            for node in self.resources() {
                let harvest = HarvestAction::new(peasant, node);
                if harvest.preconditions_met(self) {
                    candidates.push(StripsAction::Harvest(harvest));
                }
                if may_move {
                    self.push_move(
                        &mut candidates,
                        peasant,
                        node.resource().source(),
                        node.position(),
                    );
                }
            }
        } else {
            let deposit = DepositAction::for_peasant(self, peasant);
            if deposit.preconditions_met(self) {
                candidates.push(StripsAction::Deposit(deposit));
            }
            if may_move {
                self.push_move(
                    &mut candidates,
                    peasant,
                    Landmark::TownHall,
                    self.town_hall_position(),
                );
            }
        }

        if peasant.position().is_adjacent(self.town_hall_position()) {
            let create = CreateAction::new(peasant.id());
            if create.preconditions_met(self) {
                candidates.push(StripsAction::Create(create));
            }
        }
        candidates
    }

    fn push_move(
        &self,
        candidates: &mut Vec<StripsAction>,
        peasant: &Peasant,
        target: Landmark,
        target_position: Position,
    ) {
        match MoveAction::toward(self, peasant.id(), target, target_position) {
            Ok(step) => candidates.push(StripsAction::Move(step)),
            Err(err) => trace!("peasant {} cannot move: {}", peasant.id(), err),
        }
    }

    /// Candidates for `peasant` paired with the child each produces alone.
    pub fn tentative_children(&self, peasant: &Peasant) -> Vec<(StripsAction, GameState)> {
        self.candidate_actions(peasant)
            .into_iter()
            .filter_map(|action| match action.apply(self) {
                Ok(child) => Some((action, child)),
                Err(err) => {
                    trace!("dropping {}: {}", action, err);
                    None
                }
            })
            .collect()
    }

    /// Every child state reachable in one joint step.
    ///
    /// With a single peasant the tentative children are the successors.
    /// Otherwise each child carries one action per peasant. A peasant with
    /// no viable candidate leaves this state without children.
    pub fn successors(&self) -> Vec<GameState> {
        let mut per_peasant = Vec::with_capacity(self.peasants().len());
        for peasant in self.peasants() {
            let children = self.tentative_children(peasant);
            if children.is_empty() {
                trace!("peasant {} has nothing to do", peasant.id());
                return Vec::new();
            }
            per_peasant.push(children);
        }

        if per_peasant.len() == 1 {
            return per_peasant
                .pop()
                .map(|children| children.into_iter().map(|(_, child)| child).collect())
                .unwrap_or_default();
        }

        let options: Vec<Vec<StripsAction>> = per_peasant
            .into_iter()
            .map(|children| children.into_iter().map(|(action, _)| action).collect())
            .collect();
        let mut merge = JointMerge {
            parent: self,
            options: &options,
            chosen: Vec::with_capacity(options.len()),
            claims: HashMap::new(),
            children: Vec::new(),
        };
        merge.extend(0);
        merge.children
    }
}

/// Depth-first cross product over the per-peasant candidate lists.
struct JointMerge<'a> {
    parent: &'a GameState,
    options: &'a [Vec<StripsAction>],
    chosen: Vec<StripsAction>,
    /// Peasants currently aimed at each resource tile
    claims: HashMap<Position, u32>,
    children: Vec<GameState>,
}

impl<'a> JointMerge<'a> {
    fn extend(&mut self, depth: usize) {
        let all: &'a [Vec<StripsAction>] = self.options;
        let Some(options) = all.get(depth) else {
            let joint = JointAction::new(self.chosen.clone());
            match self.parent.apply_joint(joint) {
                Ok(child) => self.children.push(child),
                Err(err) => trace!("joint action rejected: {}", err),
            }
            return;
        };

        for action in options {
            let claim = action.contended_resource();
            if let Some(tile) = claim {
                if !self.has_room(tile) {
                    trace!("pruned {} on a crowded resource at {}", action, tile);
                    continue;
                }
                *self.claims.entry(tile).or_insert(0) += 1;
            }

            self.chosen.push(action.clone());
            self.extend(depth + 1);
            self.chosen.pop();

            if let Some(tile) = claim {
                if let Some(count) = self.claims.get_mut(&tile) {
                    *count -= 1;
                }
            }
        }
    }

    /// Whether one more peasant can converge on `tile` without exceeding
    /// what is left in it. A single claimant is always allowed.
    fn has_room(&self, tile: Position) -> bool {
        let claimants = self.claims.get(&tile).copied().unwrap_or(0) + 1;
        if claimants < 2 {
            return true;
        }
        self.parent
            .resource_at(tile)
            .is_some_and(|node| node.harvest_capacity() >= claimants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActionKind, MapExtent, PeasantId, PlanningGoal, ResourceNode, TownHall};

    fn hall() -> TownHall {
        TownHall::new(Position::new(1, 1))
    }

    #[test]
    fn test_single_peasant_candidates() {
        let state = GameState::builder(MapExtent::new(10, 10), hall())
            .peasant(Position::new(2, 2))
            .resource(ResourceNode::forest(Position::new(6, 2), 300))
            .resource(ResourceNode::gold_mine(Position::new(6, 6), 300))
            .goal(PlanningGoal::new(100, 100, false))
            .build()
            .unwrap();
        let peasant = state.peasant(PeasantId(0)).unwrap();
        let candidates = state.candidate_actions(peasant);

        // Gold mines come before forests
        let targets: Vec<Position> = candidates
            .iter()
            .map(|action| action.target_position(&state))
            .collect();
        assert_eq!(targets, vec![Position::new(6, 6), Position::new(6, 2)]);
        assert!(candidates.iter().all(|a| a.kind() == ActionKind::Move));
        assert_eq!(state.successors().len(), 2);
    }

    #[test]
    fn test_no_move_after_move() {
        let state = GameState::builder(MapExtent::new(10, 10), hall())
            .peasant(Position::new(2, 2))
            .resource(ResourceNode::forest(Position::new(6, 2), 300))
            .goal(PlanningGoal::new(100, 0, false))
            .build()
            .unwrap();
        let walked = state.successors().into_iter().next().unwrap();
        let kinds: Vec<ActionKind> = walked
            .candidate_actions(walked.peasant(PeasantId(0)).unwrap())
            .iter()
            .map(StripsAction::kind)
            .collect();
        assert_eq!(kinds, vec![ActionKind::Harvest]);
    }

    #[test]
    fn test_loaded_peasant_heads_home() {
        let state = GameState::builder(MapExtent::new(10, 10), hall())
            .peasant_carrying(Position::new(5, 5), crate::ResourceKind::Wood, 100)
            .resource(ResourceNode::forest(Position::new(6, 2), 300))
            .goal(PlanningGoal::new(100, 0, false))
            .build()
            .unwrap();
        let candidates = state.candidate_actions(state.peasant(PeasantId(0)).unwrap());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].target_position(&state), Position::new(1, 1));
    }

    #[test]
    fn test_small_forest_takes_one_claimant() {
        let state = GameState::builder(MapExtent::new(10, 10), hall())
            .peasant(Position::new(5, 1))
            .peasant(Position::new(5, 3))
            .resource(ResourceNode::forest(Position::new(6, 2), 100))
            .resource(ResourceNode::forest(Position::new(8, 8), 300))
            .goal(PlanningGoal::new(200, 0, false))
            .build()
            .unwrap();

        // The small forest only has room for one of them
        for child in state.successors() {
            let claims = child
                .last_action()
                .unwrap()
                .iter()
                .filter(|action| action.contended_resource() == Some(Position::new(6, 2)))
                .count();
            assert!(claims <= 1);
        }
    }

    #[test]
    fn test_crowded_mine_prunes_joint_moves() {
        // Two peasants, one mine with room for a single harvester
        let state = GameState::builder(MapExtent::new(10, 10), hall())
            .peasant(Position::new(2, 2))
            .peasant(Position::new(3, 3))
            .resource(ResourceNode::gold_mine(Position::new(7, 7), 150))
            .goal(PlanningGoal::new(0, 100, false))
            .build()
            .unwrap();
        assert!(state.successors().is_empty());

        // With a forest around, the second peasant is rerouted
        let state = GameState::builder(MapExtent::new(10, 10), hall())
            .peasant(Position::new(2, 2))
            .peasant(Position::new(3, 3))
            .resource(ResourceNode::gold_mine(Position::new(7, 7), 150))
            .resource(ResourceNode::forest(Position::new(2, 7), 300))
            .goal(PlanningGoal::new(0, 100, false))
            .build()
            .unwrap();
        let children = state.successors();
        assert_eq!(children.len(), 3);
        for child in &children {
            let joint = child.last_action().unwrap();
            assert_eq!(joint.len(), 2);
            let at_mine = joint
                .iter()
                .filter(|action| action.contended_resource() == Some(Position::new(7, 7)))
                .count();
            assert!(at_mine <= 1);
        }
    }

    #[test]
    fn test_joint_cost_is_sum_of_parts() {
        let state = GameState::builder(MapExtent::new(10, 10), hall())
            .peasant(Position::new(2, 2))
            .peasant(Position::new(2, 3))
            .resource(ResourceNode::forest(Position::new(6, 2), 500))
            .goal(PlanningGoal::new(200, 0, false))
            .build()
            .unwrap();
        let children = state.successors();
        assert_eq!(children.len(), 1);
        let child = &children[0];
        let joint = child.last_action().unwrap();
        assert!((child.cost() - joint.cost()).abs() < 1e-9);
        assert_eq!(joint.len(), 2);
    }

    #[test]
    fn test_harvests_drain_shared_node_in_order() {
        // Both peasants stand ready at a forest holding 200
        let root = GameState::builder(MapExtent::new(10, 10), hall())
            .peasant(Position::new(5, 1))
            .peasant(Position::new(5, 3))
            .resource(ResourceNode::forest(Position::new(6, 2), 200))
            .goal(PlanningGoal::new(200, 0, false))
            .build()
            .unwrap();
        let ready = root
            .successors()
            .into_iter()
            .find(|child| {
                child
                    .peasants()
                    .iter()
                    .all(|peasant| peasant.is_next_to_forest())
            })
            .unwrap();

        let harvested = ready.successors();
        assert_eq!(harvested.len(), 1);
        let child = &harvested[0];
        assert!(child.forests().is_empty());
        assert!(child.peasants().iter().all(|p| p.carried_amount() == 100));
    }
}
