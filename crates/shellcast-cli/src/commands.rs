//! Non-interactive subcommands.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{TimeZone, Utc};
use shellcast::recording::generate_recording_summary;
use shellcast::{
    AsciicastOptions, FileStore, RecordingStore, ShellcastError, read_asciicast,
    read_recording_file, write_asciicast, write_recording_file,
};

/// `shellcast info`
pub fn info(path: &Path) -> shellcast::Result<ExitCode> {
    let file = read_recording_file(path)?;
    println!("{}", generate_recording_summary(&file));
    Ok(ExitCode::SUCCESS)
}

/// `shellcast validate`: report each file, fail if any is invalid.
pub fn validate(paths: &[PathBuf]) -> ExitCode {
    let mut failures = 0usize;
    for path in paths {
        match read_recording_file(path) {
            Ok(file) => println!("ok       {} ({} events)", path.display(), file.events.len()),
            Err(e) => {
                failures += 1;
                tracing::debug!(path = %path.display(), error = %e, "validation failed");
                println!("invalid  {}: {e}", path.display());
            }
        }
    }

    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// `shellcast export`
pub fn export(
    path: &Path,
    output: &Path,
    idle_limit: Option<f64>,
    no_input: bool,
) -> shellcast::Result<ExitCode> {
    let file = read_recording_file(path)?;

    let mut options = AsciicastOptions::new();
    if let Some(limit) = idle_limit {
        if !limit.is_finite() || limit <= 0.0 {
            return Err(ShellcastError::config("--idle-limit must be a positive number"));
        }
        options = options.with_idle_time_limit(limit);
    }
    if no_input {
        options = options.without_input();
    }

    let handle = ShellcastError::with_io_context(
        File::create(output),
        format!("creating {}", output.display()),
    )?;
    let mut writer = BufWriter::new(handle);
    write_asciicast(&mut writer, &file, &options)?;
    ShellcastError::with_io_context(writer.flush(), format!("writing {}", output.display()))?;

    tracing::info!(from = %path.display(), to = %output.display(), "exported asciicast");
    Ok(ExitCode::SUCCESS)
}

/// `shellcast import`
pub fn import(
    cast: &Path,
    output: &Path,
    session_name: Option<String>,
    connection_id: Option<String>,
) -> shellcast::Result<ExitCode> {
    let handle = ShellcastError::with_io_context(
        File::open(cast),
        format!("opening {}", cast.display()),
    )?;
    let mut file = read_asciicast(BufReader::new(handle))?;
    if let Some(name) = session_name {
        file.metadata.session_name = name;
    }
    if let Some(id) = connection_id {
        file.metadata.connection_id = id;
    }

    write_recording_file(output, &file)?;
    tracing::info!(from = %cast.display(), to = %output.display(), events = file.events.len(), "imported asciicast");
    Ok(ExitCode::SUCCESS)
}

/// `shellcast list`
pub fn list(dir: &Path) -> shellcast::Result<ExitCode> {
    let store = FileStore::new(dir);
    let recordings = store.list()?;
    if recordings.is_empty() {
        println!("no recordings in {}", dir.display());
        return Ok(ExitCode::SUCCESS);
    }

    for stored in recordings {
        let metadata = &stored.metadata;
        let started = Utc
            .timestamp_millis_opt(metadata.start_time)
            .single()
            .map_or_else(|| metadata.start_time.to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        println!(
            "{:<40} {:<20} {started}  {:>7.1}s  {:>6} events",
            stored.name, metadata.session_name, metadata.duration, metadata.event_count
        );
    }
    Ok(ExitCode::SUCCESS)
}
