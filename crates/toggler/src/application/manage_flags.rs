//! ManageFlagsUseCase: the load → mutate → save cycle behind every request.
//!
//! Each call to [`FlagService`] opens the backing document, pulls the
//! [`State`] out of its `"state"` record, applies one in-memory operation, and
//! (when something changed) writes the whole document back.  Nothing is cached
//! between calls.
//!
//! # Concurrency
//!
//! Two overlapping cycles against the same file can interleave so that the
//! second save overwrites the first one's change (a lost update).
//! [`ConcurrencyMode::Serialized`] rules this out by holding an async mutex
//! and the repository's exclusive lock for the whole cycle.
//! [`ConcurrencyMode::Unsynchronized`] runs cycles without any lock and keeps
//! the lost-update behaviour.
//!
//! ```text
//! request ─► [cycle mutex] ─► [repository lock] ─► open ─► get "state"
//!                                                           │
//!             save ◄─ set "state" ◄─ append / update ◄──────┘
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use toggler_core::{Document, DocumentError, Flag, FlagKey, State, STATE_RECORD};

use crate::application::repository::{DocumentRepository, RepositoryLock, StoreError};

/// Error type for flag use cases.
#[derive(Debug, Error)]
pub enum FlagServiceError {
    /// The backing document could not be read, written, or locked.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The `"state"` record could not be decoded or encoded.
    #[error("state record error: {0}")]
    Record(#[from] DocumentError),

    /// The largest stored key is already `FlagKey::MAX`; nothing was written.
    #[error("flag key space exhausted")]
    KeySpaceExhausted,

    /// The blocking task running the cycle panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// How overlapping load → mutate → save cycles are coordinated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyMode {
    /// One cycle at a time, in-process and across processes.
    #[default]
    Serialized,
    /// No coordination; concurrent writers can lose updates.
    Unsynchronized,
}

/// Result of [`FlagService::update_flag`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A flag matched; carries the full flag list after the change.
    Updated(Vec<Flag>),
    /// No flag has the requested key; nothing was written.
    NotFound,
}

/// What a cycle's mutation wants done with the state afterwards.
enum Cycle<T> {
    Persist(T),
    Discard(T),
}

/// Opens the document, substituting (and writing) an empty one when the store
/// does not exist yet.
///
/// # Errors
///
/// Any [`StoreError`] other than `NotFound` from `open`, or a failure writing
/// the bootstrap document.
pub fn open_or_bootstrap(repository: &dyn DocumentRepository) -> Result<Document, StoreError> {
    match repository.open() {
        Ok(document) => Ok(document),
        Err(StoreError::NotFound { path }) => {
            warn!(path = %path.display(), "store not found, creating an empty one");
            let document = Document::new();
            repository.save(&document)?;
            Ok(document)
        }
        Err(e) => Err(e),
    }
}

/// Extracts the state record; an absent record yields an empty state.
///
/// # Errors
///
/// Returns [`DocumentError::RecordShape`] if the record exists but is not a
/// state.
pub fn load_state(document: &Document) -> Result<State, DocumentError> {
    Ok(document.get(STATE_RECORD)?.unwrap_or_default())
}

/// Flag use cases over a [`DocumentRepository`].
///
/// Shared between concurrent callers behind an `Arc`.
pub struct FlagService {
    repository: Arc<dyn DocumentRepository>,
    concurrency: ConcurrencyMode,
    cycle: Mutex<()>,
}

impl FlagService {
    pub fn new(repository: Arc<dyn DocumentRepository>, concurrency: ConcurrencyMode) -> Self {
        Self {
            repository,
            concurrency,
            cycle: Mutex::new(()),
        }
    }

    pub fn concurrency(&self) -> ConcurrencyMode {
        self.concurrency
    }

    /// Returns the current state for rendering a listing.
    ///
    /// Creates the store on first access.
    ///
    /// # Errors
    ///
    /// Returns [`FlagServiceError`] if the store cannot be read or is corrupt.
    pub async fn get_state(&self) -> Result<State, FlagServiceError> {
        self.run_cycle(|state| Cycle::Discard(state.clone())).await
    }

    /// Appends a flag with the next key and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`FlagServiceError`] if the store cannot be read, is corrupt, or
    /// cannot be written.  Nothing is appended in that case.  Returns
    /// [`FlagServiceError::KeySpaceExhausted`] without writing when no key is
    /// left to allocate.
    pub async fn add_flag(&self) -> Result<Flag, FlagServiceError> {
        let flag = self
            .run_cycle(|state| match state.append_flag() {
                Some(flag) => Cycle::Persist(Some(flag)),
                None => Cycle::Discard(None),
            })
            .await?
            .ok_or(FlagServiceError::KeySpaceExhausted)?;
        info!(key = flag.key, title = %flag.title, "flag added");
        Ok(flag)
    }

    /// Sets the value of flag `key` and persists it.
    ///
    /// An unknown key is reported as [`UpdateOutcome::NotFound`], not as an
    /// error, and leaves the store untouched.
    ///
    /// # Errors
    ///
    /// Returns [`FlagServiceError`] if the store cannot be read, is corrupt, or
    /// cannot be written.
    pub async fn update_flag(
        &self,
        key: FlagKey,
        value: bool,
    ) -> Result<UpdateOutcome, FlagServiceError> {
        let outcome = self
            .run_cycle(move |state| {
                if state.update_flag_value(key, value) {
                    Cycle::Persist(UpdateOutcome::Updated(state.flags().to_vec()))
                } else {
                    Cycle::Discard(UpdateOutcome::NotFound)
                }
            })
            .await?;
        match &outcome {
            UpdateOutcome::Updated(_) => info!(key, value, "flag updated"),
            UpdateOutcome::NotFound => debug!(key, "update for unknown flag"),
        }
        Ok(outcome)
    }

    /// Runs one load → `mutation` → save cycle on the blocking pool, holding
    /// both locks for its whole duration in serialized mode.
    async fn run_cycle<T, F>(&self, mutation: F) -> Result<T, FlagServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&mut State) -> Cycle<T> + Send + 'static,
    {
        let _cycle = match self.concurrency {
            ConcurrencyMode::Serialized => Some(self.cycle.lock().await),
            ConcurrencyMode::Unsynchronized => None,
        };

        let repository = Arc::clone(&self.repository);
        let concurrency = self.concurrency;
        tokio::task::spawn_blocking(move || -> Result<T, FlagServiceError> {
            let _lock = match concurrency {
                ConcurrencyMode::Serialized => repository.lock()?,
                ConcurrencyMode::Unsynchronized => RepositoryLock::none(),
            };

            let mut document = open_or_bootstrap(repository.as_ref())?;
            let mut state = load_state(&document)?;
            debug!(flags = state.len(), "state loaded");

            match mutation(&mut state) {
                Cycle::Persist(value) => {
                    document.set(STATE_RECORD, &state)?;
                    repository.save(&document)?;
                    debug!(flags = state.len(), "state saved");
                    Ok(value)
                }
                Cycle::Discard(value) => Ok(value),
            }
        })
        .await?
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
