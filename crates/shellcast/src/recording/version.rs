//! Format version gate.
//!
//! Only `1.0` exists today. Migrations for later versions hook in here.

use super::format::{FORMAT_VERSION, RecordingFile};
use crate::error::{Result, ShellcastError};

/// Whether the file was written by an older format version.
#[must_use]
pub fn is_recording_file_outdated(file: &RecordingFile) -> bool {
    file.version != FORMAT_VERSION
}

/// Bring a file up to the current format version.
///
/// Files already at the current version pass through unchanged. Versions
/// without a known migration are rejected rather than guessed at.
pub fn upgrade_recording_file(file: RecordingFile) -> Result<RecordingFile> {
    if !is_recording_file_outdated(&file) {
        return Ok(file);
    }

    tracing::warn!(version = %file.version, "no migration available for recording version");
    Err(ShellcastError::UnsupportedVersion {
        version: file.version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::format::{RecordingMetadata, TerminalSize};

    fn file() -> RecordingFile {
        RecordingFile::new(
            RecordingMetadata::new("c", "s", 0, TerminalSize::default()),
            Vec::new(),
        )
    }

    #[test]
    fn current_version_passes_through() {
        let f = file();
        assert!(!is_recording_file_outdated(&f));
        assert_eq!(upgrade_recording_file(f.clone()).unwrap(), f);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut f = file();
        f.version = "0.9".to_string();
        assert!(is_recording_file_outdated(&f));
        let err = upgrade_recording_file(f).unwrap_err();
        assert!(matches!(err, ShellcastError::UnsupportedVersion { version } if version == "0.9"));
    }
}
