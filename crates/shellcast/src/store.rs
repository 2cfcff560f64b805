//! Persistence for finished recordings.
//!
//! [`RecordingStore`] is the seam a host plugs its own storage into;
//! [`FileStore`] keeps one pretty-printed JSON file per recording in a
//! directory.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, ShellcastError};
use crate::recording::{
    RecordingFile, RecordingMetadata, deserialize_recording_file, generate_default_file_name,
    serialize_recording_file,
};

/// Give up on collision suffixes after this many attempts.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// A recording held by a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecording {
    /// Store-relative name used for `load` and `delete`.
    pub name: String,
    /// Location on disk.
    pub path: PathBuf,
    /// The recording's metadata.
    pub metadata: RecordingMetadata,
}

/// Storage backend for recordings.
pub trait RecordingStore {
    /// Persist a recording under a fresh name.
    fn save(&self, file: &RecordingFile) -> Result<StoredRecording>;

    /// Load a recording by name.
    fn load(&self, name: &str) -> Result<RecordingFile>;

    /// Every valid recording, oldest first.
    fn list(&self) -> Result<Vec<StoredRecording>>;

    /// Remove a recording by name.
    fn delete(&self, name: &str) -> Result<()>;
}

/// Read and validate one recording file.
pub fn read_recording_file(path: &Path) -> Result<RecordingFile> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ShellcastError::NotFound {
                name: path.display().to_string(),
            });
        }
        Err(e) => {
            return Err(ShellcastError::io_context(
                format!("reading recording {}", path.display()),
                e,
            ));
        }
    };
    deserialize_recording_file(&content).ok_or_else(|| {
        ShellcastError::invalid_recording(format!("{} failed validation", path.display()))
    })
}

/// Write one recording file as pretty JSON, replacing any existing file.
pub fn write_recording_file(path: &Path, file: &RecordingFile) -> Result<()> {
    let json = serialize_recording_file(file)?;
    ShellcastError::with_io_context(
        fs::write(path, json),
        format!("writing recording {}", path.display()),
    )
}

/// Directory-backed store.
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `directory`. The directory is created on
    /// first save.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// The store's directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let plain = !name.is_empty()
            && Path::new(name).file_name().is_some_and(|f| f == name)
            && name != ".."
            && name != ".";
        if plain {
            Ok(self.directory.join(name))
        } else {
            Err(ShellcastError::NotFound {
                name: name.to_string(),
            })
        }
    }

    fn candidate_name(base: &str, attempt: u32) -> String {
        if attempt == 0 {
            return base.to_string();
        }
        let stem = base.strip_suffix(".json").unwrap_or(base);
        format!("{stem}-{attempt}.json")
    }

    /// Write a freshly created file, deleting it again if the write fails.
    fn write_or_remove<W: Write>(path: &Path, mut handle: W, bytes: &[u8]) -> Result<()> {
        let written = handle.write_all(bytes).and_then(|()| handle.flush());
        drop(handle);
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(path) {
                tracing::warn!(path = %path.display(), error = %cleanup, "failed to remove partial recording");
            }
            return Err(ShellcastError::io_context(
                format!("writing {}", path.display()),
                e,
            ));
        }
        Ok(())
    }

    fn read(name: &str, path: &Path) -> Result<RecordingFile> {
        read_recording_file(path).map_err(|e| match e {
            ShellcastError::NotFound { .. } => ShellcastError::NotFound {
                name: name.to_string(),
            },
            ShellcastError::InvalidRecording { .. } => {
                ShellcastError::invalid_recording(format!("{name} failed validation"))
            }
            other => other,
        })
    }
}

impl RecordingStore for FileStore {
    fn save(&self, file: &RecordingFile) -> Result<StoredRecording> {
        ShellcastError::with_io_context(
            fs::create_dir_all(&self.directory),
            format!("creating {}", self.directory.display()),
        )?;

        let json = serialize_recording_file(file)?;
        let base = generate_default_file_name(&file.metadata.session_name, file.start_time());

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = Self::candidate_name(&base, attempt);
            let path = self.directory.join(&name);
            let handle = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(handle) => handle,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(ShellcastError::io_context(
                        format!("creating {}", path.display()),
                        e,
                    ));
                }
            };
            Self::write_or_remove(&path, handle, json.as_bytes())?;

            tracing::info!(path = %path.display(), events = file.events.len(), "recording saved");
            return Ok(StoredRecording {
                name,
                path,
                metadata: file.metadata.clone(),
            });
        }

        Err(ShellcastError::io_context(
            format!("no free file name for {base}"),
            std::io::Error::from(ErrorKind::AlreadyExists),
        ))
    }

    fn load(&self, name: &str) -> Result<RecordingFile> {
        let path = self.path_for(name)?;
        Self::read(name, &path)
    }

    fn list(&self) -> Result<Vec<StoredRecording>> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ShellcastError::io_context(
                    format!("listing {}", self.directory.display()),
                    e,
                ));
            }
        };

        let mut recordings = Vec::new();
        for entry in entries {
            let entry = ShellcastError::with_io_context(entry, "listing recordings")?;
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            match Self::read(&name, &path) {
                Ok(file) => recordings.push(StoredRecording {
                    name,
                    path,
                    metadata: file.metadata,
                }),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping recording"),
            }
        }

        recordings.sort_by(|a, b| {
            a.metadata
                .start_time
                .cmp(&b.metadata.start_time)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(recordings)
    }

    fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "recording deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ShellcastError::NotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(ShellcastError::io_context(
                format!("deleting {}", path.display()),
                e,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_names() {
        assert_eq!(FileStore::candidate_name("a_1.json", 0), "a_1.json");
        assert_eq!(FileStore::candidate_name("a_1.json", 2), "a_1-2.json");
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::StorageFull))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_write_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, "{").unwrap();

        let err = FileStore::write_or_remove(&path, FailingWriter, b"{}").unwrap_err();
        assert!(matches!(err, ShellcastError::IoWithContext { .. }));
        assert!(!path.exists());
        assert!(FileStore::new(dir.path()).list().unwrap().is_empty());
    }

    #[test]
    fn successful_write_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("whole.json");
        let handle = fs::File::create(&path).unwrap();
        FileStore::write_or_remove(&path, handle, b"{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn rejects_path_like_names() {
        let store = FileStore::new("/tmp/none");
        for name in ["", ".", "..", "../x.json", "a/b.json"] {
            assert!(
                matches!(store.path_for(name), Err(ShellcastError::NotFound { .. })),
                "{name}"
            );
        }
        assert!(store.path_for("ok.json").is_ok());
    }
}
