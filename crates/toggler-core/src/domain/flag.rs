//! Flag collection entities and the in-memory operations applied between a
//! load and a save.
//!
//! A [`State`] is the single aggregate persisted under the `"state"` record of
//! the backing document.  Flags keep their insertion order; that order is the
//! one every caller iterates and renders.
//!
//! # Key allocation
//!
//! Keys are allocated as `1 + max(existing keys, 0)`, so an empty state hands
//! out key `1` and key `0` is never produced.  Flags cannot be removed, which
//! means a key is never handed out twice.  Once a stored key reaches
//! [`FlagKey::MAX`] no further key can be allocated and appends are refused.

use serde::{Deserialize, Deserializer, Serialize};

/// Integer key identifying a flag within a [`State`].
pub type FlagKey = i64;

/// Prefix of the title synthesised for a newly appended flag (`env1`, `env2`, ...).
pub const DEFAULT_TITLE_PREFIX: &str = "env";

/// One togglable environment switch.
///
/// Field names are serialized exactly as `Key`, `Title` and `Value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    #[serde(rename = "Key")]
    pub key: FlagKey,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Value")]
    pub value: bool,
}

impl Flag {
    /// Builds a flag with the default title for `key` and a `false` value.
    pub fn with_default_title(key: FlagKey) -> Self {
        Self {
            key,
            title: format!("{DEFAULT_TITLE_PREFIX}{key}"),
            value: false,
        }
    }
}

/// The ordered collection of flags; the unit of persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    // Older documents carry `"Envs": null` for an empty list.
    #[serde(rename = "Envs", default, deserialize_with = "null_as_empty")]
    envs: Vec<Flag>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Flag>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Flag>>::deserialize(deserializer)?.unwrap_or_default())
}

impl State {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state holding `flags` in the given order.
    ///
    /// The caller is responsible for key uniqueness; this is intended for
    /// fixtures and for rebuilding a state from trusted storage.
    pub fn from_flags(flags: Vec<Flag>) -> Self {
        Self { envs: flags }
    }

    /// All flags in insertion order.
    pub fn flags(&self) -> &[Flag] {
        &self.envs
    }

    /// Consumes the state, returning its flags in insertion order.
    pub fn into_flags(self) -> Vec<Flag> {
        self.envs
    }

    pub fn len(&self) -> usize {
        self.envs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envs.is_empty()
    }

    /// Returns the flag with `key`, if any.
    pub fn flag(&self, key: FlagKey) -> Option<&Flag> {
        self.envs.iter().find(|f| f.key == key)
    }

    /// Returns the key the next appended flag will receive.
    ///
    /// This is `1 + max(key)` over all flags, with an empty state (or one whose
    /// keys are all non-positive) allocating `1`.  Returns `None` when the
    /// largest key is already [`FlagKey::MAX`].
    pub fn allocate_key(&self) -> Option<FlagKey> {
        let max_key = self.envs.iter().map(|f| f.key).fold(0, FlagKey::max);
        max_key.checked_add(1)
    }

    /// Appends a new flag with a freshly allocated key, a default title and a
    /// `false` value.  Returns a copy of the appended flag, or `None` (leaving
    /// the state untouched) when the key space is exhausted.
    pub fn append_flag(&mut self) -> Option<Flag> {
        let flag = Flag::with_default_title(self.allocate_key()?);
        self.envs.push(flag.clone());
        Some(flag)
    }

    /// Sets the value of the flag identified by `key`.
    ///
    /// Returns `true` when a flag matched.  An unknown key leaves the state
    /// untouched and returns `false`; it is not an error.
    pub fn update_flag_value(&mut self, key: FlagKey, value: bool) -> bool {
        match self.envs.iter_mut().find(|f| f.key == key) {
            Some(flag) => {
                flag.value = value;
                true
            }
            None => false,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
