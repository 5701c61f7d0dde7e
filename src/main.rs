//! Lane Runner headless runner
//!
//! Drives one race at a fixed frame rate with the autopilot at the wheel and
//! reports how far it got.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use lane_runner::consts::{DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH, MAX_TICK_DT};
use lane_runner::{RaceSession, RaceState, StageConfig, TickInput, Tuning, Viewport};

#[derive(Parser)]
#[command(name = "lane-runner")]
#[command(about = "Run a lane-runner race headless")]
struct Cli {
    /// Stage to race (1-based)
    #[arg(long, default_value = "1")]
    stage: u32,

    /// RNG seed
    #[arg(long, default_value = "1")]
    seed: u64,

    /// Viewport width in pixels
    #[arg(long, default_value_t = DEFAULT_VIEWPORT_WIDTH)]
    width: f32,

    /// Viewport height in pixels
    #[arg(long, default_value_t = DEFAULT_VIEWPORT_HEIGHT)]
    height: f32,

    /// Stop after this much simulated time
    #[arg(long, default_value = "300")]
    max_seconds: f32,

    /// JSON tuning file; missing fields keep their defaults
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Hold the starting lane instead of letting the autopilot drive
    #[arg(long)]
    manual: bool,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Summary {
    stage: u32,
    seed: u64,
    lanes: usize,
    state: RaceState,
    distance: f32,
    collected: u32,
    seconds: f32,
    ticks: u64,
}

fn load_tuning(path: Option<&PathBuf>) -> Result<Tuning> {
    let Some(path) = path else {
        return Ok(Tuning::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading tuning file {}", path.display()))?;
    Tuning::from_json(&text).with_context(|| format!("loading tuning from {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let tuning = load_tuning(cli.tuning.as_ref())?;
    let config = StageConfig::preset(cli.stage, &tuning)?;
    let viewport = Viewport::new(cli.width, cli.height)?;
    let mut session = RaceSession::start_with_tuning(config, tuning, viewport, cli.seed)?;

    let input = TickInput {
        autopilot: !cli.manual,
        ..Default::default()
    };
    let ticks_per_second = (1.0 / MAX_TICK_DT).round() as u64;
    let max_ticks = (cli.max_seconds.max(0.0) / MAX_TICK_DT).ceil() as u64;

    while session.time_ticks() < max_ticks {
        let result = session.tick_input(MAX_TICK_DT, &input);
        if result.state.is_terminal() {
            break;
        }
        if session.time_ticks() % ticks_per_second == 0 {
            log::info!(
                "t={:>5.1}s  distance {:>7.1}m  speed {:>5.0}px/s  lane {}  obstacles {}  \
                 collected {}",
                session.elapsed_seconds(),
                result.distance,
                result.scroll_speed,
                result.player_lane,
                result.obstacles.len(),
                result.collected_count
            );
        }
    }

    let summary = Summary {
        stage: cli.stage,
        seed: cli.seed,
        lanes: session.lanes().len(),
        state: session.state(),
        distance: session.distance(),
        collected: session.collected(),
        seconds: session.elapsed_seconds(),
        ticks: session.time_ticks(),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let outcome = match summary.state {
            RaceState::Complete { .. } => "complete",
            RaceState::Crashed { .. } => "crashed",
            RaceState::Racing | RaceState::Finishing { .. } => "out of time",
        };
        println!(
            "stage {} ({} lanes, seed {}): {} after {:.1}s, {:.1}m, {} collected",
            summary.stage,
            summary.lanes,
            summary.seed,
            outcome,
            summary.seconds,
            summary.distance,
            summary.collected
        );
    }
    Ok(())
}
