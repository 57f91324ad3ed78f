//! File-backed [`DocumentRepository`]: one JSON file per store.
//!
//! # Files
//!
//! For a store at `data/envs.json`:
//!
//! | Path                          | Purpose                                   |
//! |-------------------------------|-------------------------------------------|
//! | `data/envs.json`              | the document                              |
//! | `data/envs.json.lock`         | advisory lock held for a whole cycle      |
//! | `data/.envs.json.<uuid>.tmp`  | staging file for an atomic save (transient)|
//!
//! # Write modes
//!
//! [`WriteMode::Atomic`] writes the new document to a staging file in the same
//! directory, fsyncs it, and renames it over the target, so a crash mid-save
//! leaves either the old or the new document, never a truncated one.
//! [`WriteMode::Overwrite`] truncates the target and writes in place.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use toggler_core::Document;

use crate::application::repository::{DocumentRepository, RepositoryLock, StoreError};

/// How a save replaces the document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Write a staging file, fsync, rename over the target.
    #[default]
    Atomic,
    /// Truncate and rewrite the target in place.
    Overwrite,
}

/// A document store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
    write_mode: WriteMode,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>, write_mode: WriteMode) -> Self {
        Self {
            path: path.into(),
            write_mode,
        }
    }

    /// Path of the document file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the advisory lock file next to the document.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Creates the directory holding the document if it does not exist.
    fn ensure_parent_dir(&self) -> std::io::Result<()> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
            _ => Ok(()),
        }
    }

    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_string());
        self.path
            .with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4()))
    }

    fn write_atomic(&self, bytes: &[u8]) -> std::io::Result<()> {
        let staging = self.staging_path();
        let result = (|| {
            let mut file = File::create(&staging)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&staging, &self.path)
        })();
        if result.is_err() {
            let _ = fs::remove_file(&staging);
        }
        result?;
        self.sync_parent_dir();
        Ok(())
    }

    /// Makes the rename durable.  Directories cannot be opened for syncing on
    /// every platform, so failures here are only traced.
    fn sync_parent_dir(&self) {
        #[cfg(unix)]
        {
            let dir = match self.path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir,
                _ => Path::new("."),
            };
            if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
                trace!(dir = %dir.display(), "directory sync skipped: {e}");
            }
        }
    }
}

impl DocumentRepository for JsonFileRepository {
    fn open(&self) -> Result<Document, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => {
                debug!(path = %self.path.display(), bytes = bytes.len(), "store read");
                Document::from_json(&bytes).map_err(|source| StoreError::Decode {
                    path: self.path.clone(),
                    source,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound {
                path: self.path.clone(),
            }),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, document: &Document) -> Result<(), StoreError> {
        let bytes = document.to_json().map_err(StoreError::Encode)?;
        self.ensure_parent_dir().map_err(|e| self.io_error(e))?;

        match self.write_mode {
            WriteMode::Atomic => self.write_atomic(&bytes),
            WriteMode::Overwrite => fs::write(&self.path, &bytes),
        }
        .map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), bytes = bytes.len(), mode = ?self.write_mode, "store written");
        Ok(())
    }

    fn lock(&self) -> Result<RepositoryLock, StoreError> {
        let lock_path = self.lock_path();
        let lock_error = |source: std::io::Error| StoreError::Lock {
            path: lock_path.clone(),
            source,
        };

        self.ensure_parent_dir().map_err(&lock_error)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(&lock_error)?;
        file.lock_exclusive().map_err(&lock_error)?;
        trace!(path = %lock_path.display(), "store lock acquired");

        // Closing the file releases the lock.
        Ok(RepositoryLock::holding(file))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
