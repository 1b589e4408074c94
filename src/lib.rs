//! # Harvest Planner
//!
//! A forward state-space planner for peasants gathering wood and gold.
//!
//! ## Architecture Overview
//!
//! The planner is built from a handful of small layers, leaves first:
//!
//! - **World**: grid geometry, the typed map objects (peasants, forests, gold
//!   mines, the town hall) and the snapshot format the engine hands us
//! - **Actions**: the four STRIPS actions (Move, Harvest, Deposit, Create), each
//!   a precondition plus an effect on a state
//! - **State**: immutable search nodes and successor generation, including the
//!   joint-action merge across several peasants
//! - **Search**: the A* driver and the pluggable heuristics
//! - **Plan**: the ordered action list, its text/JSON forms and the engine
//!   commands each action maps onto
//!
//! ## Example
//!
//! ```
//! use harvest_planner::{
//!     GameState, MapExtent, Planner, PlanningGoal, Position, ResourceNode, SearchConfig,
//!     TownHall,
//! };
//!
//! let state = GameState::builder(MapExtent::new(10, 10), TownHall::new(Position::new(1, 1)))
//!     .peasant(Position::new(2, 2))
//!     .resource(ResourceNode::forest(Position::new(6, 2), 400))
//!     .goal(PlanningGoal::new(100, 0, false))
//!     .build()
//!     .unwrap();
//!
//! let plan = Planner::new(SearchConfig::default()).search(state).unwrap();
//! assert_eq!(plan.len(), 4);
//! ```

pub mod actions;
pub mod commands;
pub mod plan;
pub mod search;
pub mod state;
pub mod world;

pub use actions::*;
pub use commands::*;
pub use plan::*;
pub use search::*;
pub use state::*;
pub use world::*;

/// Core error type for the planner.
#[derive(thiserror::Error, Debug)]
pub enum PlannerError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The world snapshot cannot be turned into a start state
    #[error("Invalid world snapshot: {0}")]
    InvalidSnapshot(String),

    /// An action names a peasant the state does not contain
    #[error("Unknown peasant {0}")]
    UnknownPeasant(PeasantId),

    /// An action was applied to a state where its guard is false
    #[error("Precondition failed for {action}")]
    PreconditionFailure { action: String },

    /// No free cell next to the target
    #[error("No reachable approach to {target}")]
    UnreachableTarget { target: Position },

    /// Harvest against a node with nothing left
    #[error("Resource at {position} is exhausted")]
    ResourceExhausted { position: Position },

    /// Create beyond the food cap
    #[error("Population cap of {cap} reached")]
    PopulationCapReached { cap: u32 },

    /// The goal cannot be met from this start state
    #[error("Invalid goal: {0}")]
    InvalidGoal(String),

    /// The frontier emptied without reaching a goal state
    #[error("No plan found after expanding {expanded} states")]
    SearchExhausted { expanded: usize },

    /// The expansion or time budget ran out before a goal state
    #[error("Search budget exhausted after expanding {expanded} states")]
    BudgetExhausted { expanded: usize },
}

/// Result type used throughout the planner.
pub type PlannerResult<T> = Result<T, PlannerError>;

/// Version information for the planner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Planner constants.
pub mod config {
    /// Units of wood or gold taken by one Harvest
    pub const HARVEST_AMOUNT: u32 = 100;

    /// Gold spent by one Create
    pub const PEASANT_GOLD_COST: u32 = 400;

    /// Penalty for pairings that revisit an already satisfied resource
    pub const OVERSHOOT_PENALTY: f64 = 1000.0;

    /// Default number of expansions before the search gives up
    pub const DEFAULT_MAX_EXPANSIONS: usize = 250_000;

    /// Default plan file written by the command line tool
    pub const DEFAULT_PLAN_PATH: &str = "saves/plan.txt";
}
