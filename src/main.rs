//! Kraken Watch headless runner
//!
//! Runs the simulation at the fixed timestep with a scripted lamp sweep and
//! logs what happened.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use glam::Vec2;
use log::LevelFilter;

use kraken_watch::Tuning;
use kraken_watch::consts::SIM_DT;
use kraken_watch::sim::{GameEvent, GamePhase, TickInput, World, tick};

/// Headless kraken-watch simulation
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON tuning file (defaults are used when omitted)
    #[arg(short, long)]
    tuning: Option<PathBuf>,

    /// Run seed
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 300.0)]
    seconds: f32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let env = Env::default().default_filter_or(level.to_string());
    let _ = Builder::from_env(env).try_init();
}

/// Lamp path: a slow figure-eight over the middle of the harbor
fn lamp_at(t: f32) -> Vec2 {
    Vec2::new((t * 0.4).sin() * 6.0, (t * 0.7).sin() * 4.0)
}

fn event_name(event: &GameEvent) -> &'static str {
    match event {
        GameEvent::BoatSpawned { .. } => "boat spawned",
        GameEvent::BoatRetired { .. } => "boat retired",
        GameEvent::BoatScored { .. } => "boat scored",
        GameEvent::BoatWrecked { .. } => "boat wrecked",
        GameEvent::BoatSunk { .. } => "boat sunk",
        GameEvent::Explosion { .. } => "explosion",
        GameEvent::MonsterSpawned { .. } => "kraken surfaced",
        GameEvent::MonsterEnraged { .. } => "kraken enraged",
        GameEvent::MonsterCalmed { .. } => "kraken calmed",
        GameEvent::ChestSpawned { .. } => "chest spawned",
        GameEvent::ChestCollected { .. } => "chest collected",
        GameEvent::ChestExpired { .. } => "chest expired",
        GameEvent::ScoreChanged(_) => "score changed",
        GameEvent::LivesChanged(_) => "lives changed",
        GameEvent::GameOver => "game over",
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let tuning = match &args.tuning {
        Some(path) => Tuning::load(path).with_context(|| format!("loading tuning from {}", path.display()))?,
        None => Tuning::default(),
    };

    log::info!("Kraken Watch (headless) starting with seed {}", args.seed);
    let mut world = World::new(tuning, args.seed).context("invalid tuning")?;

    let total_ticks = (args.seconds.max(0.0) / SIM_DT).round() as u64;
    let mut tally: BTreeMap<&'static str, u32> = BTreeMap::new();

    for i in 0..total_ticks {
        let input = TickInput {
            light_pos: Some(lamp_at(i as f32 * SIM_DT)),
            pause: false,
        };
        tick(&mut world, &input, SIM_DT);

        for event in world.drain_events() {
            *tally.entry(event_name(&event)).or_default() += 1;
        }

        if world.phase == GamePhase::GameOver {
            log::info!("Ran out of lives after {:.1}s", i as f32 * SIM_DT);
            break;
        }
    }

    log::info!(
        "Finished: score {}, lives {}/{}, {} boats afloat",
        world.ledger.score,
        world.ledger.lives,
        world.ledger.max_lives,
        world.boat_count()
    );
    for (name, count) in &tally {
        log::info!("  {:<16} {}", name, count);
    }

    Ok(())
}
