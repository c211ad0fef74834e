use anyhow::Context as _;
use carscene_common::DriveCommand;
use carscene_input::{InputController, parse_script, run_script};
use carscene_kernel::{SceneState, Tuning};
use carscene_render::{RecordingBackend, SceneRenderer};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "carscene-cli", about = "Headless tools for the car scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML file overriding movement tuning
    #[arg(long, global = true)]
    tuning: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, tuning and tracked keys
    Info,
    /// Replay a key script and print the resulting scene state
    Drive {
        /// Steps like "w*10 a+w*5 p"; keys joined with '+', tick count after '*'
        #[arg(short, long)]
        script: String,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
        /// Include the state after every command
        #[arg(long)]
        trace: bool,
    },
    /// Render one frame headlessly and print its draw list
    Frame {
        /// Key script to replay before rendering
        #[arg(short, long)]
        script: Option<String>,
    },
}

/// State after one command of a replay.
#[derive(Debug, Serialize)]
struct TraceEntry {
    command: String,
    state: SceneState,
}

#[derive(Debug, Serialize)]
struct DriveReport {
    commands: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    trace: Vec<TraceEntry>,
    state: SceneState,
}

/// Replay `script` from the tuning's start pose.
fn drive(tuning: &Tuning, script: &str, trace: bool) -> anyhow::Result<DriveReport> {
    let steps = parse_script(script).context("parse key script")?;
    let mut input = InputController::new(tuning.tick_period());
    let mut state = SceneState::new(tuning);
    let mut entries = Vec::new();
    let mut commands = 0;

    run_script(&mut input, &steps, Instant::now(), |cmd: DriveCommand| {
        state.apply(&cmd, tuning);
        commands += 1;
        if trace {
            entries.push(TraceEntry {
                command: cmd.to_string(),
                state: state.clone(),
            });
        }
    });

    tracing::debug!(steps = steps.len(), commands, "script replayed");
    Ok(DriveReport {
        commands,
        trace: entries,
        state,
    })
}

fn render_frame(state: &SceneState) -> anyhow::Result<RecordingBackend> {
    let mut renderer = SceneRenderer::new();
    let mut backend = RecordingBackend::new();
    renderer.render(state, &mut backend)?;
    Ok(backend)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let tuning = match &cli.tuning {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("carscene-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "tuning: step={} turn={}° wheel={}° door={}°/{}° tick={}Hz",
                tuning.step,
                tuning.turn_deg,
                tuning.wheel_step_deg,
                tuning.door_step_deg,
                tuning.door_max_deg,
                tuning.tick_hz
            );
            let a = &tuning.arena;
            println!(
                "arena: x=[{}, {}] z=[{}, {}]",
                a.min_x, a.max_x, a.min_z, a.max_z
            );
            println!("start: {}", SceneState::new(&tuning));
            let keys: Vec<_> = carscene_input::TrackedKey::ALL
                .iter()
                .map(|k| format!("{k}={:?}", k.role()))
                .collect();
            println!("keys: {}", keys.join(" "));
        }
        Commands::Drive {
            script,
            json,
            trace,
        } => {
            let report = drive(&tuning, &script, trace)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for entry in &report.trace {
                    println!("{:<6} {}", entry.command, entry.state);
                }
                println!("commands: {}", report.commands);
                println!("{}", report.state);
            }
        }
        Commands::Frame { script } => {
            let state = match script {
                Some(script) => drive(&tuning, &script, false)?.state,
                None => SceneState::new(&tuning),
            };
            let backend = render_frame(&state)?;
            println!("{state}");
            print!("{}", backend.summary());
        }
    }

    Ok(())
}
