//! `shellcast` command-line tool.
//!
//! Inspects, validates, plays, and converts recordings written by the
//! shellcast recorder.

mod commands;
mod logging;
mod player;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use shellcast::{Config, EnvConfig};

/// Inspect, play, and convert terminal session recordings.
#[derive(Debug, Parser)]
#[command(name = "shellcast", version, about)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(long, global = true, env = "SHELLCAST_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a summary and statistics for a recording.
    Info {
        /// Recording file.
        file: PathBuf,
    },

    /// Check that recording files are well formed.
    Validate {
        /// Recording files.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Replay a recording to this terminal.
    Play {
        /// Recording file.
        file: PathBuf,

        /// Playback speed multiplier (0.1 to 4).
        #[arg(short, long)]
        speed: Option<f64>,

        /// Play straight through without keyboard controls.
        #[arg(long)]
        no_controls: bool,
    },

    /// Convert a recording to asciicast v2.
    Export {
        /// Recording file.
        file: PathBuf,

        /// Destination `.cast` file.
        #[arg(short, long, value_name = "OUT")]
        output: PathBuf,

        /// Cap pauses at this many seconds.
        #[arg(long, value_name = "SECS")]
        idle_limit: Option<f64>,

        /// Leave keyboard input out of the cast.
        #[arg(long)]
        no_input: bool,
    },

    /// Convert an asciicast v2 file to a recording.
    Import {
        /// Source `.cast` file.
        cast: PathBuf,

        /// Destination recording file.
        #[arg(short, long, value_name = "OUT")]
        output: PathBuf,

        /// Session name to store in the recording.
        #[arg(long)]
        session_name: Option<String>,

        /// Connection id to store in the recording.
        #[arg(long)]
        connection_id: Option<String>,
    },

    /// List the recordings in the storage directory.
    List {
        /// Directory to list instead of the configured one.
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> shellcast::Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let config = config.with_env(&EnvConfig::default());
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli, config: Config) -> shellcast::Result<ExitCode> {
    match cli.command {
        Command::Info { file } => commands::info(&file),
        Command::Validate { files } => Ok(commands::validate(&files)),
        Command::Play {
            file,
            speed,
            no_controls,
        } => {
            player::play(&file, &config.playback, speed, !no_controls).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Export {
            file,
            output,
            idle_limit,
            no_input,
        } => commands::export(&file, &output, idle_limit, no_input),
        Command::Import {
            cast,
            output,
            session_name,
            connection_id,
        } => commands::import(&cast, &output, session_name, connection_id),
        Command::List { dir } => {
            let dir = dir.unwrap_or_else(|| config.storage.directory.clone());
            commands::list(&dir)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("shellcast: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config.logging, cli.verbose);

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("shellcast: {e}");
            ExitCode::FAILURE
        }
    }
}
