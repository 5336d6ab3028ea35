//! Headless Tavern Runner
//!
//! Runs the tavern for a number of simulated days with the autopilot making
//! the player's decisions, printing a summary each day.

use clap::Parser;
use std::path::PathBuf;
use std::process;

use tavern_core::autopilot::{self, AUTOPILOT_INTERVAL};
use tavern_core::clock::clock_constants::SIM_SECONDS_PER_REAL_SECOND;
use tavern_core::{EventLog, SaveGame, Tavern, TavernConfig};
use tavern_events::{EventKind, TavernEvent, SECONDS_PER_DAY};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "tavern_sim")]
#[command(about = "Headless tavern simulation")]
struct Args {
    /// Random seed; overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Number of simulated days to run
    #[arg(long, default_value_t = 3)]
    days: u64,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resume from a save file
    #[arg(long)]
    load: Option<PathBuf>,

    /// Write a save file here at every autosave and at the end
    #[arg(long)]
    save: Option<PathBuf>,

    /// Write the event log (JSONL) here; appended to when resuming
    #[arg(long)]
    events: Option<PathBuf>,

    /// Time multiplier (0-10]
    #[arg(long, default_value_t = 10.0)]
    multiplier: f32,
}

fn load_config(args: &Args) -> TavernConfig {
    let mut config = match &args.config {
        Some(path) => TavernConfig::from_file(path).unwrap_or_else(|e| {
            eprintln!("Error: could not load config {}: {}", path.display(), e);
            process::exit(1);
        }),
        None => TavernConfig::load_or_default(),
    };
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    config
}

fn write_save(tavern: &Tavern, path: &PathBuf) {
    if let Err(e) = tavern.snapshot().save_to_file(path) {
        eprintln!("Warning: could not write save {}: {}", path.display(), e);
    }
}

/// Logs drained events and reports whether an autosave was requested.
fn handle_events(events: &[TavernEvent], log: &mut EventLog) -> bool {
    if let Err(e) = log.record(events) {
        eprintln!("Warning: could not write events: {}", e);
    }
    events
        .iter()
        .any(|e| e.kind == EventKind::AutosaveRequested)
}

fn print_summary(tavern: &mut Tavern) {
    let summary = tavern.summary();
    println!(
        "[{}] gold {:>5}  renown {:>5.1}  loyalty {:>5.1}  quests: {} posted, {} out, {} won, {} lost",
        summary.timestamp.date(),
        summary.gold,
        summary.renown,
        summary.mean_loyalty,
        summary.quests.posted,
        summary.quests.in_progress,
        summary.quests.succeeded,
        summary.quests.failed,
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if !(args.multiplier > 0.0) {
        eprintln!("Error: --multiplier must be greater than zero");
        process::exit(1);
    }
    let config = load_config(&args);

    println!("Tavern Simulation");
    println!("=================");
    println!("Seed: {}", config.simulation.seed);
    println!("Days: {}", args.days);
    println!();

    let mut tavern = Tavern::with_default_content(config);
    if let Some(path) = &args.load {
        match SaveGame::load_from_file(path) {
            Ok(save) => tavern.restore(save),
            Err(e) => {
                eprintln!("Error: could not load save {}: {}", path.display(), e);
                process::exit(1);
            }
        }
    }
    tavern.set_time_multiplier(args.multiplier);

    let mut log = match &args.events {
        Some(path) => {
            let opened = if args.load.is_some() {
                EventLog::append(path)
            } else {
                EventLog::create(path)
            };
            opened.unwrap_or_else(|e| {
                eprintln!("Warning: could not open event log {}: {}", path.display(), e);
                EventLog::tally_only()
            })
        }
        None => EventLog::tally_only(),
    };

    let end = tavern.now().plus_seconds(args.days * SECONDS_PER_DAY);
    let multiplier = tavern.clock().multiplier() as f64;
    // Real time per autopilot pass, so each pass covers a quarter hour
    let real_step = AUTOPILOT_INTERVAL as f64 / (SIM_SECONDS_PER_REAL_SECOND * multiplier);
    let mut day = tavern.now().day_index();

    while tavern.now() < end {
        if tavern.advance_clock(real_step) == 0 {
            continue;
        }
        autopilot::step(&mut tavern.ctx());

        let events = tavern.drain_events();
        if handle_events(&events, &mut log) {
            if let Some(path) = &args.save {
                write_save(&tavern, path);
            }
        }

        let today = tavern.now().day_index();
        if today != day {
            print_summary(&mut tavern);
            day = today;
        }
    }

    if let Err(e) = log.flush() {
        eprintln!("Warning: could not flush event log: {}", e);
    }
    if let Some(path) = &args.save {
        write_save(&tavern, path);
    }

    println!();
    print_summary(&mut tavern);
    println!("Simulation complete. Logged {} events.", log.total());
    for (event_type, count) in log.tally() {
        println!("  {:<12} {}", format!("{:?}", event_type), count);
    }
}
