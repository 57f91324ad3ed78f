//! Application layer use cases.
//!
//! Use cases in this layer orchestrate the core types to fulfil a request and
//! depend on the [`repository::DocumentRepository`] trait rather than on the
//! file system, so storage can be swapped out in tests.
//!
//! # Sub-modules
//!
//! - **`repository`**   – The storage abstraction and its error type.
//!
//! - **`manage_flags`** – Listing, appending, and updating flags, each as one
//!   load → mutate → save cycle with optional serialization.
//!
//! - **`payload`**      – Decoding the JSON body of an update request.

pub mod manage_flags;
pub mod payload;
pub mod repository;
