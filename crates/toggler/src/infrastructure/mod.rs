//! Infrastructure layer.
//!
//! Contains the file-system adapters behind the application layer's traits.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `toggler_core`, but MUST NOT be imported by the `application` layer or the
//! core crate.

pub mod storage;
