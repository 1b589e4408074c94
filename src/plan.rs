//! # Plans
//!
//! The ordered result of a successful search and its text and JSON forms.

use crate::{JointAction, PlannerResult, SearchStats, StripsAction};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Joint steps from the start state to a goal state, oldest first.
///
/// The text form lists one action per line:
///
/// ```text
/// Move(0, 5, 2)
/// Harvest(0, 6, 2)
/// Move(0, 2, 2)
/// Deposit(0)
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    steps: Vec<JointAction>,
    cost: f64,
    #[serde(default)]
    stats: SearchStats,
}

impl Plan {
    pub fn new(steps: Vec<JointAction>, cost: f64, stats: SearchStats) -> Self {
        Self { steps, cost, stats }
    }

    /// Joint steps in execution order.
    pub fn steps(&self) -> &[JointAction] {
        &self.steps
    }

    /// Every individual action, oldest first.
    pub fn actions(&self) -> impl Iterator<Item = &StripsAction> {
        self.steps.iter().flat_map(JointAction::iter)
    }

    /// Number of individual actions.
    pub fn len(&self) -> usize {
        self.steps.iter().map(JointAction::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total path cost of the plan.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn to_json(&self) -> PlannerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> PlannerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Writes the text form to `path`, creating parent directories.
    pub fn write_text(&self, path: impl AsRef<Path>) -> PlannerResult<()> {
        write_creating_dirs(path.as_ref(), &self.to_string())
    }

    /// Writes the JSON form to `path`, creating parent directories.
    pub fn write_json(&self, path: impl AsRef<Path>) -> PlannerResult<()> {
        write_creating_dirs(path.as_ref(), &self.to_json()?)
    }

    /// Reads a plan previously written with [`Plan::write_json`].
    pub fn read_json(path: impl AsRef<Path>) -> PlannerResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

fn write_creating_dirs(path: &Path, contents: &str) -> PlannerResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)?;
    Ok(())
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for action in self.actions() {
            writeln!(f, "{action}")?;
        }
        Ok(())
    }
}
