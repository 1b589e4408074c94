//! # Search Module
//!
//! The A* driver that turns a start state into a plan.
//!
//! States live in an arena owned by a single [`Planner::search`] call; each
//! node records the index of its parent so the plan can be rebuilt once a
//! goal state is popped. Duplicate states are recognised by their
//! [`StateFingerprint`] and only re-entered when reached more cheaply.

pub mod heuristic;

pub use heuristic::*;

use crate::config::DEFAULT_MAX_EXPANSIONS;
use crate::{GameState, JointAction, Plan, PlannerError, PlannerResult, StateFingerprint};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::Instant;

/// Index of a state in the search arena.
pub type StateId = usize;

/// Limits and heuristic choice for one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// States expanded before giving up
    pub max_expansions: usize,
    /// Wall-clock limit in milliseconds, if any
    #[serde(default)]
    pub time_budget_ms: Option<u64>,
    #[serde(default)]
    pub heuristic: HeuristicKind,
}

impl SearchConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            time_budget_ms: None,
            heuristic: HeuristicKind::default(),
        }
    }

    /// A small budget so tests fail fast instead of searching for long.
    pub fn for_testing() -> Self {
        Self {
            max_expansions: 20_000,
            time_budget_ms: None,
            heuristic: HeuristicKind::default(),
        }
    }

    pub fn with_heuristic(mut self, heuristic: HeuristicKind) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters collected during one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// States taken off the frontier and expanded
    pub expanded: usize,
    /// Child states produced by successor generation
    pub generated: usize,
    /// Children discarded because an equal or cheaper copy was known
    pub duplicates: usize,
    /// Already expanded states reached again more cheaply
    pub reopened: usize,
}

struct SearchNode {
    state: GameState,
    parent: Option<StateId>,
    key: StateFingerprint,
}

/// Frontier entry, ordered so the binary heap pops the lowest `f` first.
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: f64,
    g: f64,
    order: u64,
    id: StateId,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lower f first, then deeper g, then first inserted
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| self.g.total_cmp(&other.g))
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// A* planner over [`GameState`]s.
#[derive(Debug, Clone)]
pub struct Planner<H: Heuristic = HeuristicKind> {
    config: SearchConfig,
    heuristic: H,
}

impl Planner<HeuristicKind> {
    /// Creates a planner using the heuristic named in `config`.
    pub fn new(config: SearchConfig) -> Self {
        let heuristic = config.heuristic;
        Self { config, heuristic }
    }
}

impl<H: Heuristic> Planner<H> {
    /// Creates a planner with a custom heuristic.
    pub fn with_heuristic(config: SearchConfig, heuristic: H) -> Self {
        Self { config, heuristic }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Searches for a cheapest-first plan from `start` to its goal.
    ///
    /// Returns [`PlannerError::InvalidGoal`] without searching when the goal
    /// cannot be reached from `start`, [`PlannerError::SearchExhausted`]
    /// when every reachable state has been expanded, and
    /// [`PlannerError::BudgetExhausted`] when the expansion or time budget
    /// runs out first.
    pub fn search(&self, start: GameState) -> PlannerResult<Plan> {
        start.check_goal_feasible()?;

        let started = Instant::now();
        let mut stats = SearchStats::default();
        let mut arena: Vec<SearchNode> = Vec::new();
        let mut open = BinaryHeap::new();
        let mut best_g: HashMap<StateFingerprint, f64> = HashMap::new();
        let mut closed: HashSet<StateFingerprint> = HashSet::new();
        let mut order: u64 = 0;

        let key = start.fingerprint();
        let f = self.heuristic.estimate(&start);
        best_g.insert(key.clone(), 0.0);
        arena.push(SearchNode {
            state: start,
            parent: None,
            key,
        });
        open.push(OpenEntry {
            f,
            g: 0.0,
            order,
            id: 0,
        });

        while let Some(entry) = open.pop() {
            let node = &arena[entry.id];
            if best_g.get(&node.key).is_some_and(|best| entry.g > *best) {
                // Superseded by a cheaper copy pushed later
                continue;
            }

            if node.state.is_goal() {
                let plan = Plan::new(rebuild_steps(&arena, entry.id), entry.g, stats);
                info!(
                    "Plan found: {} actions, cost {:.2}, {} states expanded",
                    plan.len(),
                    plan.cost(),
                    stats.expanded
                );
                return Ok(plan);
            }

            let out_of_time = self
                .config
                .time_budget_ms
                .is_some_and(|ms| started.elapsed().as_millis() >= u128::from(ms));
            if stats.expanded >= self.config.max_expansions || out_of_time {
                info!("Search budget exhausted after {} expansions", stats.expanded);
                return Err(PlannerError::BudgetExhausted {
                    expanded: stats.expanded,
                });
            }

            stats.expanded += 1;
            closed.insert(node.key.clone());
            let children = node.state.successors();

            for child in children {
                stats.generated += 1;
                let key = child.fingerprint();
                let g = child.cost();
                if best_g.get(&key).is_some_and(|best| *best <= g) {
                    stats.duplicates += 1;
                    continue;
                }
                if closed.contains(&key) {
                    stats.reopened += 1;
                }

                best_g.insert(key.clone(), g);
                let f = g + self.heuristic.estimate(&child);
                let id = arena.len();
                arena.push(SearchNode {
                    state: child,
                    parent: Some(entry.id),
                    key,
                });
                order += 1;
                open.push(OpenEntry { f, g, order, id });
            }

            if stats.expanded % 10_000 == 0 {
                debug!(
                    "Expanded {} states, {} generated, {} on the frontier",
                    stats.expanded,
                    stats.generated,
                    open.len()
                );
            }
        }

        info!("No plan found after {} expansions", stats.expanded);
        Err(PlannerError::SearchExhausted {
            expanded: stats.expanded,
        })
    }
}

/// Walks parent links back from `goal` and returns the joint actions
/// oldest first.
fn rebuild_steps(arena: &[SearchNode], goal: StateId) -> Vec<JointAction> {
    let mut steps = Vec::new();
    let mut current = Some(goal);
    while let Some(id) = current {
        let node = &arena[id];
        if let (Some(_), Some(step)) = (node.parent, node.state.last_action()) {
            steps.push(step.clone());
        }
        current = node.parent;
    }
    steps.reverse();
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MapExtent, PlanningGoal, Position, ResourceNode, TownHall};

    fn one_forest(goal: PlanningGoal) -> GameState {
        GameState::builder(MapExtent::new(10, 10), TownHall::new(Position::new(1, 1)))
            .peasant(Position::new(2, 2))
            .resource(ResourceNode::forest(Position::new(6, 2), 400))
            .goal(goal)
            .build()
            .unwrap()
    }

    fn entry(f: f64, g: f64, order: u64) -> OpenEntry {
        OpenEntry { f, g, order, id: 0 }
    }

    #[test]
    fn test_open_set_ordering() {
        let mut open = BinaryHeap::new();
        open.push(entry(5.0, 1.0, 0));
        open.push(entry(3.0, 1.0, 1));
        open.push(entry(3.0, 2.0, 2));
        open.push(entry(3.0, 2.0, 3));

        let popped: Vec<u64> = std::iter::from_fn(|| open.pop().map(|e| e.order)).collect();
        assert_eq!(popped, vec![2, 3, 1, 0]);
    }

    #[test]
    fn test_goal_at_root_yields_empty_plan() {
        let planner = Planner::new(SearchConfig::for_testing());
        let plan = planner.search(one_forest(PlanningGoal::new(0, 0, false))).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.cost(), 0.0);
    }

    #[test]
    fn test_single_trip_plan() {
        let planner = Planner::new(SearchConfig::for_testing());
        let plan = planner.search(one_forest(PlanningGoal::new(100, 0, false))).unwrap();
        let rendered: Vec<String> = plan.actions().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["Move(0, 5, 2)", "Harvest(0, 6, 2)", "Move(0, 2, 2)", "Deposit(0)"]
        );
        assert!((plan.cost() - (3.0 + 1.0 + 3.0 + 1.0)).abs() < 1e-9);
        assert!(plan.stats().expanded >= 4);
    }

    #[test]
    fn test_admissible_heuristic_finds_plan() {
        let config = SearchConfig::for_testing().with_heuristic(HeuristicKind::RemainingTrips);
        let plan = Planner::new(config)
            .search(one_forest(PlanningGoal::new(200, 0, false)))
            .unwrap();
        // Two full round trips
        assert_eq!(plan.len(), 8);
        assert!((plan.cost() - 16.0).abs() < 1e-9);
        assert!(plan.actions().last().is_some_and(|a| a.to_string() == "Deposit(0)"));
    }

    #[test]
    fn test_budget_exhaustion() {
        let config = SearchConfig::for_testing().with_max_expansions(1);
        let result = Planner::new(config).search(one_forest(PlanningGoal::new(400, 0, false)));
        assert!(matches!(
            result,
            Err(PlannerError::BudgetExhausted { expanded: 1 })
        ));
    }

    #[test]
    fn test_invalid_goal_is_rejected_before_search() {
        let planner = Planner::new(SearchConfig::for_testing());
        let result = planner.search(one_forest(PlanningGoal::new(500, 0, false)));
        assert!(matches!(result, Err(PlannerError::InvalidGoal(_))));
    }

    #[test]
    fn test_custom_heuristic() {
        struct Blind;
        impl Heuristic for Blind {
            fn estimate(&self, _state: &GameState) -> f64 {
                0.0
            }
        }

        let planner = Planner::with_heuristic(SearchConfig::for_testing(), Blind);
        let plan = planner.search(one_forest(PlanningGoal::new(100, 0, false))).unwrap();
        assert_eq!(plan.len(), 4);
    }
}
