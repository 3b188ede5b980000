//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

const ENVIRONMENT_HELP: &str = "\
Environment:
  TAGFUSION_DROPOUT_SCALE      override dropout_scale
  TAGFUSION_OCCLUSION_WINDOW   override occlusion_window_s
  TAGFUSION_LOG_FORMAT=json    JSON logs on stderr
  RUST_LOG                     log filter (default info)
  OTEL_EXPORTER_OTLP_ENDPOINT  export spans over OTLP/HTTP";

/// Multi-camera fiducial pose fusion and alignment guidance.
#[derive(Debug, Parser)]
#[command(name = "tagfusion", version, after_help = ENVIRONMENT_HELP)]
pub struct Cli {
    /// Config file to use instead of `~/.tagfusion/config.toml`.
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Feed a recorded JSON-lines telemetry stream through the engine.
    Replay {
        /// Recording file, one `{"t": .., "values": {..}}` frame per line.
        recording: PathBuf,

        /// Print one JSON object per tick instead of the coloured summary.
        #[arg(long)]
        json: bool,

        /// Pace frames by their timestamps.
        #[arg(long)]
        realtime: bool,
    },
    /// Print the effective configuration.
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum ConfigAction {
    /// Write the default configuration file when none exists.
    Init,
}
