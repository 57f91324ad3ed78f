//! Storage abstraction consumed by the flag use cases.
//!
//! The use cases only need three things from storage: read the whole document,
//! write the whole document, and hold an exclusive lock across a
//! read-modify-write cycle.  [`DocumentRepository`] captures exactly that, so
//! the file-backed implementation in `infrastructure::storage` can be replaced
//! with a mock in tests.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use toggler_core::{Document, DocumentError};

/// Error type for document storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing document does not exist yet.
    ///
    /// Callers recover from this by starting with an empty [`Document`].
    #[error("document store not found at {path}")]
    NotFound { path: PathBuf },

    /// Reading or writing the backing document failed.
    #[error("I/O error accessing store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing document exists but is not valid.
    #[error("store at {path} is corrupt: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    /// The in-memory document could not be encoded for writing.
    #[error("failed to encode store: {0}")]
    Encode(#[source] DocumentError),

    /// The exclusive cycle lock could not be taken.
    #[error("failed to lock store at {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Exclusive hold on a repository, released when dropped.
///
/// Implementations stash whatever keeps their lock alive (an open lock file,
/// for instance) inside the guard.
pub struct RepositoryLock {
    held: Option<Box<dyn Send>>,
}

impl RepositoryLock {
    /// A guard that holds nothing.  Used by repositories without locking.
    pub fn none() -> Self {
        Self { held: None }
    }

    /// A guard that keeps `resource` alive until it is dropped.
    pub fn holding<T: Send + 'static>(resource: T) -> Self {
        Self {
            held: Some(Box::new(resource)),
        }
    }

    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }
}

impl fmt::Debug for RepositoryLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryLock")
            .field("held", &self.is_held())
            .finish()
    }
}

/// Whole-document persistence.
///
/// All methods block; async callers run them on the blocking thread pool.
#[cfg_attr(test, mockall::automock)]
pub trait DocumentRepository: Send + Sync {
    /// Reads and decodes the whole document.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when no document exists yet, [`StoreError::Io`]
    /// when it cannot be read, [`StoreError::Decode`] when it is corrupt.
    fn open(&self) -> Result<Document, StoreError>;

    /// Encodes `document` and replaces the stored document with it.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] on write failure, [`StoreError::Encode`] if the
    /// document cannot be encoded.
    fn save(&self, document: &Document) -> Result<(), StoreError>;

    /// Blocks until this caller holds the exclusive cycle lock.
    ///
    /// # Errors
    ///
    /// [`StoreError::Lock`] if the lock cannot be taken.
    fn lock(&self) -> Result<RepositoryLock, StoreError>;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
