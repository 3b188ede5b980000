//! `tagfusion-cli` – TagFusion Command Line Interface
//!
//! ```text
//! tagfusion replay <recording.jsonl> [--config <path>] [--json] [--realtime]
//! tagfusion config [init] [--config <path>]
//! tagfusion help
//! ```
//!
//! `replay` feeds a recorded telemetry stream through the fusion engine and
//! prints one line per tick (or one JSON object per tick with `--json`).
//! Ctrl-C stops the replay after the current frame.

mod args;
mod config;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use colored::{ColoredString, Colorize};
use serde::Serialize;
use tracing::{info, warn};

use tagfusion_middleware::SnapshotStore;
use tagfusion_perception::MultiCameraFusion;
use tagfusion_runtime::replay::{Frame, Recording, Replayer};
use tagfusion_types::{CameraStatus, FusionError, FusionResult, PerCameraResult};

use args::{Cli, Command, ConfigAction};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr via tracing; tick output goes to stdout.
    let _guard = tagfusion_runtime::init_tracing("tagfusion");

    let config = cli.config.as_deref();
    let outcome = match cli.command {
        Command::Config { action: None } => show_config(config),
        Command::Config {
            action: Some(ConfigAction::Init),
        } => init_config(config),
        Command::Replay {
            recording,
            json,
            realtime,
        } => replay(config, &recording, json, realtime),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

fn show_config(path: Option<&Path>) -> Result<(), FusionError> {
    let cfg = config::load(path);
    let raw = toml::to_string_pretty(&cfg)
        .map_err(|e| FusionError::Config(format!("failed to serialize config: {e}")))?;
    print!("{raw}");
    Ok(())
}

fn init_config(path: Option<&Path>) -> Result<(), FusionError> {
    let path = path.map_or_else(config::config_path, Path::to_path_buf);
    if path.exists() {
        println!(
            "  {} {} already exists; leaving it untouched.",
            "!".yellow().bold(),
            path.display().to_string().bold()
        );
        return Ok(());
    }
    config::save_to(&config::Config::default(), &path)?;
    println!(
        "  {} Config written to {}",
        "✓".green().bold(),
        path.display().to_string().bold()
    );
    Ok(())
}

fn replay(
    config_path: Option<&Path>,
    recording: &Path,
    json: bool,
    realtime: bool,
) -> Result<(), FusionError> {
    let cfg = config::load(config_path);
    let recording = Recording::load(recording)?;

    let store = Arc::new(SnapshotStore::new());
    let engine = MultiCameraFusion::new(Arc::clone(&store), cfg.tag_layout(), cfg.to_fusion_config());

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let stop = Arc::new(AtomicBool::new(false));
    let stop_for_handler = Arc::clone(&stop);
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("{}", "⚠  Ctrl-C received – stopping replay …".yellow().bold());
        stop_for_handler.store(true, Ordering::Release);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler; replay cannot be interrupted cleanly");
    }

    let mut replayer = Replayer::new(engine, store)
        .realtime(realtime)
        .with_stop_flag(stop);

    let mut write_error: Option<serde_json::Error> = None;
    let summary = replayer.run(&recording, |frame, result| {
        if json {
            if write_error.is_none()
                && let Err(e) = print_json(frame, result)
            {
                write_error = Some(e);
            }
        } else {
            print_tick(frame, result);
        }
    });
    if let Some(e) = write_error {
        return Err(FusionError::Config(format!("failed to serialize result: {e}")));
    }

    info!(
        frames = summary.frames,
        posed = summary.posed_frames,
        occluded = summary.occluded_frames,
        stopped = summary.stopped,
        "replay complete"
    );
    if !json {
        println!();
        println!(
            "  {} frames, {} with a fused pose, {} occluded{}",
            summary.frames.to_string().bold(),
            summary.posed_frames,
            summary.occluded_frames,
            if summary.stopped { " (stopped)" } else { "" }
        );
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

/// One `--json` output line.
#[derive(Serialize)]
struct TickRecord<'a> {
    t: f64,
    result: &'a FusionResult,
}

fn print_json(frame: &Frame, result: &FusionResult) -> Result<(), serde_json::Error> {
    let line = serde_json::to_string(&TickRecord { t: frame.t, result })?;
    println!("{line}");
    Ok(())
}

fn status_label(status: CameraStatus) -> ColoredString {
    let label = format!("{status:<8}");
    match status {
        CameraStatus::Ok => label.green(),
        CameraStatus::Degraded => label.yellow(),
        CameraStatus::Lost => label.red(),
    }
}

fn print_camera(cam: &PerCameraResult) {
    let command = match cam.command() {
        Some(cmd) if cam.aligned() => cmd.green().bold(),
        Some(cmd) => cmd.normal(),
        None => "-".dimmed(),
    };
    let tag = cam.tag_id.map_or_else(|| "-".to_string(), |id| id.to_string());
    println!(
        "    {:<16} {} tag {:<4} {}",
        cam.camera,
        status_label(cam.status),
        tag,
        command
    );
}

fn print_tick(frame: &Frame, result: &FusionResult) {
    let pose = result.final_pose.map_or_else(
        || "pose -".dimmed().to_string(),
        |p| {
            format!(
                "pose ({:.2}, {:.2}, {:.1}°)",
                p.x(),
                p.y(),
                p.rotation().degrees()
            )
        },
    );
    let distance = result
        .final_distance_m
        .map_or_else(|| "-".to_string(), |d| format!("{d:.2} m"));
    let confidence = format!("{:.2}", result.confidence_scale);
    let confidence = if result.confidence_scale >= 1.0 {
        confidence.green()
    } else if result.confidence_scale > 0.0 {
        confidence.yellow()
    } else {
        confidence.red()
    };

    println!(
        "{} conf {}  {}  dist {}{}",
        format!("t={:>8.3}", frame.t).dimmed(),
        confidence,
        pose,
        distance,
        if result.occlusion {
            "  OCCLUDED".red().bold().to_string()
        } else {
            String::new()
        }
    );
    for cam in &result.cameras {
        print_camera(cam);
    }
}
