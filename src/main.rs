//! # Harvest Planner Main Entry Point
//!
//! Loads a world snapshot, plans a gathering sequence and writes it out.

use clap::Parser;
use harvest_planner::{
    config, GameState, HeuristicKind, Planner, PlannerError, PlannerResult, PlanningGoal,
    SearchConfig, WorldSnapshot,
};
use log::{error, info, LevelFilter};
use std::path::PathBuf;
use std::process::ExitCode;

/// Command line arguments for the harvest planner.
#[derive(Parser, Debug)]
#[command(name = "harvest-planner")]
#[command(about = "Plans wood and gold gathering for a group of peasants")]
#[command(version)]
struct Args {
    /// World snapshot in JSON
    #[arg(short, long)]
    scenario: PathBuf,

    /// Wood the plan has to stockpile
    #[arg(long, default_value_t = 0)]
    wood: u32,

    /// Gold the plan has to stockpile
    #[arg(long, default_value_t = 0)]
    gold: u32,

    /// Allow training new peasants with gold
    #[arg(long)]
    build_peasants: bool,

    /// Where to write the plan
    #[arg(short, long, default_value = config::DEFAULT_PLAN_PATH)]
    output: PathBuf,

    /// Write the plan as JSON instead of one action per line
    #[arg(long)]
    json: bool,

    /// Heuristic guiding the search (pairwise, remaining-trips)
    #[arg(long, default_value = "pairwise")]
    heuristic: HeuristicKind,

    /// States to expand before giving up
    #[arg(long, default_value_t = config::DEFAULT_MAX_EXPANSIONS)]
    max_expansions: usize,

    /// Stop searching after this many milliseconds
    #[arg(long)]
    time_budget_ms: Option<u64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    info!("Starting harvest planner v{}", harvest_planner::VERSION);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(PlannerError::InvalidGoal(reason)) => {
            error!("Goal cannot be reached: {}", reason);
            ExitCode::from(2)
        }
        Err(PlannerError::SearchExhausted { expanded }) => {
            error!("No plan exists; explored all {} reachable states", expanded);
            ExitCode::from(3)
        }
        Err(err) => {
            error!("Planning failed: {}", err);
            ExitCode::FAILURE
        }
    }
}

/// Sets up env_logger at the requested level.
fn initialize_logging(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .init();
}

fn run(args: &Args) -> PlannerResult<()> {
    let snapshot = WorldSnapshot::load(&args.scenario)?;
    let goal = PlanningGoal::new(args.wood, args.gold, args.build_peasants);
    let start = GameState::from_snapshot(&snapshot, goal)?;
    info!(
        "Loaded {}: {} peasants, {} forests, {} gold mines",
        args.scenario.display(),
        start.peasant_count(),
        start.forests().len(),
        start.gold_mines().len()
    );

    let config = SearchConfig {
        max_expansions: args.max_expansions,
        time_budget_ms: args.time_budget_ms,
        heuristic: args.heuristic,
    };
    let plan = Planner::new(config).search(start)?;

    print!("{plan}");
    if args.json {
        plan.write_json(&args.output)?;
    } else {
        plan.write_text(&args.output)?;
    }
    info!(
        "Wrote {} actions to {} ({} states expanded)",
        plan.len(),
        args.output.display(),
        plan.stats().expanded
    );
    Ok(())
}
