//! Motion CLI
//!
//! Simulate motions headlessly and print their frames as JSON.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use motion_animation::{
    EntranceType, FrameScheduler, MotionController, MotionDescriptor, SpringConfig,
    SpringController, StaggerItem, StaggerPlan,
};
use motion_core::{MotionConfig, MotionEntry, MotionStore};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod frames;
mod input;

use frames::{Frame, Recorder};

#[derive(Parser)]
#[command(name = "motion")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Headless motion simulator", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine config file (defaults to ./motion.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a timed motion to completion and print every frame
    Simulate {
        #[command(flatten)]
        motion: MotionArgs,
    },

    /// Run a motion with spring physics and print every frame
    Spring {
        #[command(flatten)]
        motion: MotionArgs,

        /// Spring preset (gentle, wobbly, stiff, snappy, molasses)
        #[arg(short, long)]
        preset: Option<String>,
    },

    /// Print the per-item delays and variants of a staggered group
    Stagger {
        #[command(flatten)]
        motion: MotionArgs,

        /// Number of items
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,

        /// Delay between items (ms)
        #[arg(short, long, default_value = "100")]
        stagger: u32,

        /// Stagger order
        #[arg(short, long, value_enum, default_value = "forward")]
        direction: StaggerOrder,

        /// Cap the stagger after this many steps
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List entrance presets with their hidden and visible states
    Presets {
        /// Pretty-print JSON
        #[arg(long)]
        pretty: bool,
    },
}

/// Which motion to run and how to print it
#[derive(Args)]
struct MotionArgs {
    /// Descriptor file (.toml or .json)
    #[arg(short = 'f', long)]
    descriptor: Option<PathBuf>,

    /// Entrance preset used when no descriptor file is given
    #[arg(short, long, default_value = "fadeIn")]
    entrance: String,

    /// Stop after this many frames
    #[arg(long, default_value = "600")]
    max_frames: usize,

    /// Include the full visual state in each frame
    #[arg(long)]
    full: bool,

    /// Pretty-print JSON
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum StaggerOrder {
    Forward,
    Reverse,
    Center,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries JSON
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = input::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Simulate { motion } => cmd_simulate(&config, &motion),
        Commands::Spring { motion, preset } => cmd_spring(&config, &motion, preset.as_deref()),
        Commands::Stagger {
            motion,
            count,
            stagger,
            direction,
            limit,
        } => cmd_stagger(&config, &motion, count, stagger, direction, limit),
        Commands::Presets { pretty } => cmd_presets(&config, pretty),
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn descriptor(args: &MotionArgs) -> Result<MotionDescriptor> {
    input::resolve_descriptor(args.descriptor.as_deref(), &args.entrance)
}

/// Element id used for simulated motions
const ELEMENT: &str = "element";

#[derive(Serialize)]
struct SimulationOutput {
    frames: Vec<Frame>,
    /// Final store entry of the element
    store: Option<MotionEntry>,
}

/// Advance the scheduler until idle and report what was recorded
fn drain(
    scheduler: &FrameScheduler,
    config: &MotionConfig,
    args: &MotionArgs,
    recorder: &Recorder,
    store: &MotionStore,
) -> Result<()> {
    let frames = scheduler.run_until_idle(config.frame.frame_ms(), args.max_frames);
    if scheduler.has_pending() {
        warn!(
            "Stopped after {} frames with work still pending (looping motion?)",
            frames
        );
    }
    info!("Recorded {} frames", recorder.len());
    let output = SimulationOutput {
        frames: recorder.take(),
        store: store.get_state(ELEMENT),
    };
    print_json(&output, args.pretty)
}

fn cmd_simulate(config: &MotionConfig, args: &MotionArgs) -> Result<()> {
    let descriptor = descriptor(args)?;
    let scheduler = FrameScheduler::new();
    let store = MotionStore::from_config(config);
    let controller = MotionController::new(ELEMENT, &descriptor, config, scheduler.handle())
        .with_store(store.clone());

    let recorder = Recorder::new();
    {
        let recorder = recorder.clone();
        let handle = scheduler.handle();
        let full = args.full;
        controller.on_update(move |state| recorder.push(Frame::new(handle.now(), state, full)));
    }
    controller.on_complete(|| info!("Motion completed"));

    let motion = controller.motion();
    info!(
        "Simulating {}ms motion ({} properties, easing {})",
        motion.duration_ms,
        motion.properties.len(),
        motion.easing.name()
    );
    controller.trigger();
    drain(&scheduler, config, args, &recorder, &store)
}

fn cmd_spring(config: &MotionConfig, args: &MotionArgs, preset: Option<&str>) -> Result<()> {
    let descriptor = descriptor(args)?;
    let spring = match preset {
        Some(name) => SpringConfig::preset(name).with_context(|| {
            format!(
                "Unknown spring preset '{}'. Valid presets: {:?}",
                name,
                ["gentle", "wobbly", "stiff", "snappy", "molasses"]
            )
        })?,
        None => SpringConfig::from(&config.spring),
    };

    let scheduler = FrameScheduler::new();
    let store = MotionStore::from_config(config);
    let controller = SpringController::new(ELEMENT, &descriptor, spring, config, scheduler.handle())
        .with_store(store.clone());

    let recorder = Recorder::new();
    {
        let recorder = recorder.clone();
        let handle = scheduler.handle();
        let full = args.full;
        controller.on_update(move |state| recorder.push(Frame::new(handle.now(), state, full)));
    }
    controller.on_rest(|| info!("Springs at rest"));

    info!(
        "Simulating spring (stiffness {}, damping {}, mass {})",
        spring.stiffness, spring.damping, spring.mass
    );
    controller.trigger();
    drain(&scheduler, config, args, &recorder, &store)
}

#[derive(Serialize)]
struct StaggerOutput {
    total_duration_ms: u32,
    items: Vec<StaggerItem>,
}

fn cmd_stagger(
    config: &MotionConfig,
    args: &MotionArgs,
    count: usize,
    stagger: u32,
    order: StaggerOrder,
    limit: Option<usize>,
) -> Result<()> {
    let motion = descriptor(args)?.resolve(config);
    let mut plan = StaggerPlan::new(count, stagger, motion);
    plan = match order {
        StaggerOrder::Forward => plan,
        StaggerOrder::Reverse => plan.reverse(),
        StaggerOrder::Center => plan.from_center(),
    };
    if let Some(limit) = limit {
        plan = plan.limit(limit);
    }

    let output = StaggerOutput {
        total_duration_ms: plan.total_duration_ms(),
        items: plan.items(),
    };
    print_json(&output, args.pretty)
}

#[derive(Serialize)]
struct PresetOutput {
    name: &'static str,
    easing: String,
    hidden_opacity: f32,
    hidden_transform: String,
    visible_opacity: f32,
    visible_transform: String,
}

fn cmd_presets(config: &MotionConfig, pretty: bool) -> Result<()> {
    let presets: Vec<PresetOutput> = EntranceType::ALL
        .iter()
        .map(|entrance| {
            let motion = MotionDescriptor::entrance(*entrance).resolve(config);
            let hidden = motion.hidden_state();
            let visible = motion.visible_state();
            PresetOutput {
                name: entrance.name(),
                easing: motion.easing.to_css(),
                hidden_opacity: hidden.opacity,
                hidden_transform: hidden.transform_css(),
                visible_opacity: visible.opacity,
                visible_transform: visible.transform_css(),
            }
        })
        .collect();
    print_json(&presets, pretty)
}
