//! Storage infrastructure: the flag document and the configuration file.
//!
//! - `json_file` implements [`crate::application::repository::DocumentRepository`]
//!   over one JSON file, with atomic or in-place saves and an advisory lock
//!   file for serialized cycles.
//! - `config` reads and writes the TOML configuration, falling back to
//!   defaults when the file does not exist yet.

pub mod config;
pub mod json_file;
