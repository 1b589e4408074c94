//! # Heuristics
//!
//! Cost-to-go estimates for the A* driver.
//!
//! Two formulations are provided:
//! - [`RemainingTripsHeuristic`] counts the deposits and harvests still
//!   needed. It never overestimates, so plans found with it are optimal.
//! - [`PairwiseHeuristic`] weighs the travel still ahead by how many peasants
//!   share it and adds a lookup table over each peasant's last two actions.
//!   It is not admissible but steers the search through multi-peasant and
//!   Create problems much faster.

use crate::config::{HARVEST_AMOUNT, OVERSHOOT_PENALTY};
use crate::{
    ActionKind, GameState, JointAction, MapObject, Peasant, Position, ResourceKind, StripsAction,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Estimates the remaining cost from a state to the goal.
pub trait Heuristic {
    fn estimate(&self, state: &GameState) -> f64;
}

/// Deposits plus harvests still needed to cover both thresholds.
///
/// Each Harvest and Deposit costs 1 and carries at most one chunk, so this
/// is a lower bound on the remaining cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemainingTripsHeuristic;

impl RemainingTripsHeuristic {
    /// Trips needed for a single resource.
    pub fn trips(state: &GameState, kind: ResourceKind) -> u32 {
        let need = state.goal().required(kind).saturating_sub(state.stock(kind));
        let deposits = need.div_ceil(HARVEST_AMOUNT);
        let carriers = u32::try_from(
            state
                .peasants()
                .iter()
                .filter(|peasant| peasant.carrying() == Some(kind))
                .count(),
        )
        .unwrap_or(u32::MAX);
        deposits + deposits.saturating_sub(carriers)
    }
}

impl Heuristic for RemainingTripsHeuristic {
    fn estimate(&self, state: &GameState) -> f64 {
        f64::from(Self::trips(state, ResourceKind::Wood) + Self::trips(state, ResourceKind::Gold))
    }
}

/// Action cost still ahead, summed over every peasant.
///
/// Each missing chunk is priced as one round trip to the nearest node of its
/// kind. Work already under way is taken off that price: an empty peasant
/// standing at a node has done the outbound walk, and a loaded peasant only
/// owes the walk home and the Deposit. Along a useful action the total drops
/// by about that action's cost. Gold spent on Create raises the gold still
/// missing, and with it the work.
pub fn remaining_work(state: &GameState) -> f64 {
    let mut work = 0.0;
    for kind in [ResourceKind::Wood, ResourceKind::Gold] {
        let need = state.goal().required(kind).saturating_sub(state.stock(kind));
        let uncarried = u64::from(need).saturating_sub(state.carried(kind));
        let chunks = uncarried.div_ceil(u64::from(HARVEST_AMOUNT));
        if chunks == 0 {
            continue;
        }

        let trip = round_trip(state, kind);
        let mut walked: Vec<f64> = state
            .peasants()
            .iter()
            .filter(|peasant| is_ready_to_harvest(state, peasant, kind))
            .map(|peasant| (trip - 2.0 - distance_home(state, peasant)).max(0.0))
            .collect();
        walked.sort_by(|a, b| b.total_cmp(a));
        let credit: f64 = walked
            .iter()
            .take(usize::try_from(chunks).unwrap_or(usize::MAX))
            .sum();

        work += chunks as f64 * trip - credit;
    }

    for peasant in state.peasants().iter().filter(|peasant| !peasant.is_empty()) {
        work += distance_home(state, peasant) + 1.0;
    }
    work
}

/// How many times over the current peasants the workforce can still grow.
///
/// 1 when Create is off or the population cap is reached.
pub fn workforce_scale(state: &GameState) -> f64 {
    let present = state.peasant_count().max(1);
    let reachable = if state.goal().allow_create {
        state.food_cap().max(present)
    } else {
        present
    };
    f64::from(reachable) / f64::from(present)
}

/// Move, Harvest, Move back and Deposit for the cheapest node of `kind`.
fn round_trip(state: &GameState, kind: ResourceKind) -> f64 {
    let hall = state.town_hall_position();
    let leg = state
        .resources()
        .filter(|node| node.resource() == kind)
        .filter_map(|node| {
            let at_node = state.approach_cell(node.position(), hall)?;
            let at_hall = state.approach_cell(hall, at_node)?;
            Some(at_hall.euclidean_distance(at_node))
        })
        .min_by(f64::total_cmp)
        .unwrap_or_else(|| {
            let extent = state.extent();
            f64::from(extent.width).hypot(f64::from(extent.height))
        });
    2.0 + 2.0 * leg
}

fn is_ready_to_harvest(state: &GameState, peasant: &Peasant, kind: ResourceKind) -> bool {
    peasant.is_empty()
        && peasant.is_next_to(kind.source())
        && state.resources().any(|node| {
            node.resource() == kind
                && peasant.position().is_adjacent(node.position())
        })
}

/// Cost of the Move that would bring `peasant` next to the town hall.
fn distance_home(state: &GameState, peasant: &Peasant) -> f64 {
    if peasant.is_next_to_town_hall() {
        return 0.0;
    }
    let from = peasant.position();
    let hall = state.town_hall_position();
    let to: Position = state.approach_cell(hall, from).unwrap_or(hall);
    from.euclidean_distance(to)
}

/// Weights applied to the remaining need when a pairing makes progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairwiseWeights {
    pub wood: f64,
    pub gold: f64,
    /// Added when a peasant goes after a resource whose goal is already met
    pub overshoot_penalty: f64,
    /// Multiplier on the remaining work
    pub work: f64,
    /// Harvest followed by a Move
    pub carry_home: f64,
    /// Deposit followed by a Create
    pub reinvest: f64,
    /// Move followed by a Deposit
    pub unload: f64,
}

impl Default for PairwiseWeights {
    fn default() -> Self {
        Self {
            wood: 2.0,
            gold: 4.0,
            overshoot_penalty: OVERSHOOT_PENALTY,
            work: 3.0,
            carry_home: 5.0,
            reinvest: 5.0,
            unload: 1.0,
        }
    }
}

/// Remaining work scaled by the workforce, adjusted by how each peasant's
/// last two actions fit together.
///
/// The base is `work × remaining_work × workforce_scale`. While Create may
/// still add peasants the work is priced as if shared by the full
/// population, so adding a peasant lowers the estimate when enough work is
/// left to pay back the gold it costs.
///
/// | prior   | last             | adjustment       |
/// |---------|------------------|------------------|
/// | Move    | Harvest          | progress         |
/// | Move    | Deposit          | `-unload`        |
/// | Harvest | Move             | `-carry_home`    |
/// | Deposit | Move to resource | progress         |
/// | Create  | Move to resource | progress         |
/// | Deposit | Create           | `-reinvest`      |
///
/// "Progress" lowers the estimate in proportion to what is still needed of
/// the resource involved, or adds the overshoot penalty when that resource
/// is already covered. A peasant that did not act in the prior step is
/// paired with the Create that produced it. Adjustments are averaged over
/// the peasants that have a pairing, so they do not grow with the
/// population.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PairwiseHeuristic {
    pub weights: PairwiseWeights,
}

impl PairwiseHeuristic {
    pub fn new(weights: PairwiseWeights) -> Self {
        Self { weights }
    }

    fn progress(&self, state: &GameState, kind: ResourceKind) -> f64 {
        let required = state.goal().required(kind);
        let stock = state.stock(kind);
        if stock >= required {
            return self.weights.overshoot_penalty;
        }
        let weight = match kind {
            ResourceKind::Wood => self.weights.wood,
            ResourceKind::Gold => self.weights.gold,
        };
        -weight * f64::from(required - stock) / f64::from(HARVEST_AMOUNT)
    }

    /// Adjustment for one peasant whose previous action was `prior`.
    pub fn pairing(&self, state: &GameState, prior: &StripsAction, last: &StripsAction) -> f64 {
        match (prior.kind(), last) {
            (ActionKind::Move, StripsAction::Harvest(harvest)) => {
                self.progress(state, harvest.resource())
            }
            (ActionKind::Move, StripsAction::Deposit(_)) => -self.weights.unload,
            (ActionKind::Harvest, StripsAction::Move(_)) => -self.weights.carry_home,
            (ActionKind::Deposit | ActionKind::Create, StripsAction::Move(step)) => step
                .target()
                .resource()
                .map_or(0.0, |kind| self.progress(state, kind)),
            (ActionKind::Deposit, StripsAction::Create(_)) => -self.weights.reinvest,
            _ => 0.0,
        }
    }

    /// Mean pairing over the peasants of `last` that have a prior action.
    pub fn lineage_adjustment(
        &self,
        state: &GameState,
        prior: &JointAction,
        last: &JointAction,
    ) -> f64 {
        let (total, paired) = last
            .iter()
            .filter_map(|action| {
                prior
                    .for_peasant(action.peasant())
                    .or_else(|| prior.create())
                    .map(|paired| self.pairing(state, paired, action))
            })
            .fold((0.0, 0u32), |(total, paired), value| (total + value, paired + 1));
        if paired == 0 {
            0.0
        } else {
            total / f64::from(paired)
        }
    }
}

impl Heuristic for PairwiseHeuristic {
    fn estimate(&self, state: &GameState) -> f64 {
        let mut estimate = self.weights.work * workforce_scale(state) * remaining_work(state);
        if let (Some(last), Some(prior)) = (state.last_action(), state.prior_action()) {
            estimate += self.lineage_adjustment(state, prior, last);
        }
        estimate
    }
}

/// Selects a heuristic by name, for configuration and the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeuristicKind {
    #[default]
    Pairwise,
    RemainingTrips,
}

impl Heuristic for HeuristicKind {
    fn estimate(&self, state: &GameState) -> f64 {
        match self {
            HeuristicKind::Pairwise => PairwiseHeuristic::default().estimate(state),
            HeuristicKind::RemainingTrips => RemainingTripsHeuristic.estimate(state),
        }
    }
}

impl fmt::Display for HeuristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeuristicKind::Pairwise => f.write_str("pairwise"),
            HeuristicKind::RemainingTrips => f.write_str("remaining-trips"),
        }
    }
}

impl FromStr for HeuristicKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pairwise" => Ok(HeuristicKind::Pairwise),
            "remaining-trips" | "remaining_trips" => Ok(HeuristicKind::RemainingTrips),
            other => Err(format!(
                "unknown heuristic '{other}', expected 'pairwise' or 'remaining-trips'"
            )),
        }
    }
}
