//! Command-line front end.
//!
//! # Usage
//!
//! ```bash
//! # Run a configuration, writing frames.json and summary.json to DIR_OUT
//! vibrissa run --config whiskers.json
//!
//! # Stop after 20 frames, writing to another directory
//! vibrissa run --config whiskers.json --frames 20 --out /tmp/run
//!
//! # Print the default parameter table
//! vibrissa defaults
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use vibrissa::{
    FrameRecorder, Parameters, RecordingStats, RunStatus, Simulation, VibrissaError,
};

#[derive(Parser, Debug)]
#[command(name = "vibrissa")]
#[command(author, version, about = "Rodent whisker array simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a simulation from a JSON parameter file
    Run {
        /// Parameter file
        #[arg(short, long)]
        config: PathBuf,

        /// Output directory (overrides DIR_OUT)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Stop after this many frames
        #[arg(long)]
        frames: Option<u64>,

        /// Log every frame
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the default parameters as JSON
    Defaults,
}

#[derive(Serialize)]
struct RunReport {
    status: String,
    frames: u64,
    substeps: u64,
    time: f64,
    recording: RecordingStats,
    kinetic_energy: Vec<(String, f64)>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Commands::Defaults => match Parameters::default().to_json() {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{e}");
                ExitCode::FAILURE
            }
        },
        Commands::Run {
            config,
            out,
            frames,
            verbose,
        } => {
            let params = match Parameters::from_json_file(&config) {
                Ok(params) => params,
                Err(e) => {
                    eprintln!("{e}");
                    return ExitCode::FAILURE;
                }
            };
            init_logging(&params, verbose);
            match run(params, out, frames) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("{e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

/// `RUST_LOG` wins; otherwise PRINT (or `--verbose`) picks the level.
fn init_logging(params: &Parameters, verbose: bool) {
    let level = match (params.print, verbose || params.debug) {
        (p, _) if p >= 2 => "trace",
        (1, _) | (_, true) => "debug",
        _ => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,vibrissa={level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
    info!("vibrissa v{}", env!("CARGO_PKG_VERSION"));
}

fn run(params: Parameters, out: Option<PathBuf>, frames: Option<u64>) -> vibrissa::Result<()> {
    if params.save_video || params.file_video.is_some() {
        warn!("video output is not supported, only kinematics are saved");
    }
    let dir_out = out.unwrap_or_else(|| params.dir_out.clone());
    let mut sim = Simulation::from_parameters(&params)?;

    let mut recorder = FrameRecorder::new();
    let outcome = sim.run_for(frames.unwrap_or(u64::MAX), |frame| {
        for whisker in &frame.whiskers {
            if let Some(tip) = whisker.links.last() {
                debug!(
                    frame = frame.frame,
                    whisker = %whisker.name,
                    tip = ?tip.position,
                    contacts = whisker.contacts.iter().filter(|c| **c).count(),
                    "kinematics"
                );
            }
        }
        if params.save {
            recorder.record(frame.clone());
        }
    });

    // Frames up to a divergence are still worth keeping.
    if params.save {
        save(&dir_out, &sim, &recorder)?;
    }
    let summary = outcome?;
    info!(
        frames = summary.frames,
        time = summary.time,
        status = ?summary.status,
        "done"
    );
    Ok(())
}

fn save(dir: &Path, sim: &Simulation, recorder: &FrameRecorder) -> vibrissa::Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| VibrissaError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    recorder.to_json_file(dir.join("frames.json"))?;

    let summary = sim.summary();
    let status = match summary.status {
        RunStatus::Running => "stopped".to_string(),
        RunStatus::Terminated => "terminated".to_string(),
        RunStatus::Failed { last_valid_frame } => {
            format!("failed after frame {last_valid_frame}")
        }
    };
    let report = RunReport {
        status,
        frames: summary.frames,
        substeps: summary.substeps,
        time: summary.time,
        recording: recorder.stats(),
        kinetic_energy: sim.kinetic_energies(),
    };
    let path = dir.join("summary.json");
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&path, json).map_err(|source| VibrissaError::Io { path, source })?;
    info!(dir = %dir.display(), frames = recorder.len(), "saved recording");
    Ok(())
}
