//! # toggler-core
//!
//! Shared library for Toggler containing the flag entities, key allocation,
//! and the JSON document codec.
//!
//! This crate has no file-system, runtime, or CLI dependencies.
//!
//! # Architecture overview
//!
//! Toggler keeps an ordered list of named boolean flags ("envs") in a single
//! JSON file.  Every request loads the whole file, changes it in memory, and
//! writes the whole file back.  This crate holds the two pieces of that cycle
//! that do not touch the disk:
//!
//! - **`domain`**: the [`Flag`] and [`State`] types plus the operations run
//!   between load and save: allocating a key, appending a flag, and updating a
//!   flag's value.
//!
//! - **`document`**: the [`Document`] container, a map from record name to raw
//!   JSON value.  The flag list lives under the [`STATE_RECORD`] record.

pub mod document;
pub mod domain;

pub use document::{Document, DocumentError, STATE_RECORD};
pub use domain::flag::{Flag, FlagKey, State, DEFAULT_TITLE_PREFIX};
