//! Domain entities for Toggler.
//!
//! Pure data and in-memory operations with no file-system or runtime
//! dependencies.  Everything here can be exercised without touching disk:
//! the persistence layer loads a [`flag::State`], calls into this module, and
//! writes the result back.

/// Flags, the ordered flag collection, and key allocation.
///
/// See [`flag::State`] for the main type.
pub mod flag;
