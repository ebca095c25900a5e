// SPDX-License-Identifier: MIT OR Apache-2.0
//! `twosify` command line.
//!
//! Prints keying patterns, lists the available actions and runs one action
//! against a scene file:
//!
//! ```text
//! twosify frames 1 24 threes-fours
//! twosify run key-twos --scene shot.json --select hero,prop
//! twosify run ghost-make --scene shot.json --ghost-targets body --time 12
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use twosify_timing::{format_key_list, StepPreset, TimeRange};
use twosify_tools::{Action, CopyMode, MemoryScene, SceneHost, Session, ToolConfig};

#[derive(Parser, Debug)]
#[command(name = "twosify", version, about = "Stepped keying and key timing tools")]
struct Cli {
    /// Configuration file (RON); defaults to twosify.ron in the snapshot folder
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the frames a preset keys over a range
    Frames {
        #[arg(allow_negative_numbers = true)]
        start: i32,
        #[arg(allow_negative_numbers = true)]
        end: i32,
        /// ones, twos, threes, twos-threes or threes-fours
        preset: String,
    },
    /// List action names and labels
    Actions,
    /// Run one action against a scene file
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Action name, see `twosify actions`
    action: String,
    /// Scene file (JSON)
    #[arg(long)]
    scene: PathBuf,
    /// Objects to select before running
    #[arg(long, value_delimiter = ',')]
    select: Vec<String>,
    /// Current time before running
    #[arg(long)]
    time: Option<f64>,
    /// Copy/paste in channel mode
    #[arg(long)]
    channels: bool,
    /// Ghost targets
    #[arg(long, value_delimiter = ',')]
    ghost_targets: Vec<String>,
    /// Ghost opacity, 0 to 10
    #[arg(long)]
    opacity: Option<f64>,
    /// Camera for camera-attach
    #[arg(long)]
    camera: Option<String>,
    /// Master control for camera-attach
    #[arg(long)]
    master: Option<String>,
    /// Key times for camera-attach, e.g. "1, 6, 12"
    #[arg(long)]
    keys: Option<String>,
    /// Run without writing the scene back
    #[arg(long)]
    dry_run: bool,
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("twosify_app={level}").parse()?)
        .add_directive(format!("twosify_tools={level}").parse()?)
        .add_directive(format!("twosify_timing={level}").parse()?);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<ToolConfig> {
    match path {
        Some(path) => ToolConfig::load(path).with_context(|| format!("reading config {}", path.display())),
        None => Ok(ToolConfig::load_default()?),
    }
}

fn print_frames(start: i32, end: i32, preset: &str) -> Result<()> {
    let range = TimeRange::new(start, end)?;
    let preset = StepPreset::from_name(preset).ok_or_else(|| {
        let names: Vec<&str> = StepPreset::all().iter().map(StepPreset::name).collect();
        anyhow!("unknown preset '{preset}', expected one of: {}", names.join(", "))
    })?;
    println!("{}", format_key_list(&preset.frames(range)?.to_times()));
    Ok(())
}

fn print_actions() {
    for action in Action::all() {
        println!("{:<22} {}", action.name(), action.label());
    }
}

fn run(args: RunArgs, config: ToolConfig) -> Result<()> {
    let action = Action::from_name(&args.action)
        .ok_or_else(|| anyhow!("unknown action '{}', see `twosify actions`", args.action))?;
    let mut scene = MemoryScene::load(&args.scene).with_context(|| format!("loading {}", args.scene.display()))?;

    let mut session = Session::new(config);
    if args.channels {
        session.copy_mode = CopyMode::Channels;
    }
    if !args.select.is_empty() {
        scene.select(&args.select)?;
    }
    if let Some(time) = args.time {
        scene.set_current_time(time);
    }
    if !args.ghost_targets.is_empty() {
        session.ghost.targets = args.ghost_targets;
    }
    if let Some(opacity) = args.opacity {
        session.ghost.opacity = opacity.clamp(0.0, 10.0);
    }
    if args.camera.is_some() {
        session.camera.camera = args.camera;
    }
    if args.master.is_some() {
        session.camera.master = args.master;
    }
    if let Some(keys) = &args.keys {
        session.camera.set_key_list(keys)?;
    }

    let result = session.dispatch(&mut scene, action);
    for message in scene.messages() {
        println!("{message}");
    }
    result.with_context(|| format!("{action} failed"))?;

    if args.dry_run {
        tracing::info!("Dry run, {} not written", args.scene.display());
    } else {
        scene.save(&args.scene)?;
        tracing::debug!("Wrote {}", args.scene.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    let config = load_config(cli.config.as_ref())?;

    match cli.cmd {
        Command::Frames { start, end, preset } => print_frames(start, end, &preset),
        Command::Actions => {
            print_actions();
            Ok(())
        }
        Command::Run(args) => run(args, config),
    }
}
