//! In-memory form of the on-disk JSON document.
//!
//! The document is a top-level JSON object mapping record names to arbitrary
//! JSON values:
//!
//! ```text
//! {
//!   "state": { "Envs": [ { "Key": 1, "Title": "env1", "Value": false } ] }
//! }
//! ```
//!
//! Records are kept as raw [`serde_json::Value`]s and only decoded into a
//! concrete type when a caller asks for them with [`Document::get`].  This
//! module does no file I/O; reading and writing the bytes is the storage
//! layer's job.

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Name of the record holding the persisted [`crate::State`].
pub const STATE_RECORD: &str = "state";

/// Errors produced while encoding or decoding a document or one of its records.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The document text is not a JSON object of named records.
    #[error("malformed document: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The document could not be serialized to JSON text.
    #[error("failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),

    /// A record exists but does not have the requested shape.
    #[error("record '{name}' has an unexpected shape: {source}")]
    RecordShape {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be converted into a record.
    #[error("record '{name}' could not be encoded: {source}")]
    RecordEncode {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A named-record container serialized as a single JSON object.
///
/// Records are ordered by name, so saving the same document twice yields
/// byte-identical output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    records: BTreeMap<String, Value>,
}

impl Document {
    /// Creates a document with no records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes document text.
    ///
    /// A zero-length (or whitespace-only) input is treated as a freshly created
    /// file and yields an empty document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Malformed`] when the text is not a JSON object.
    pub fn from_json(bytes: &[u8]) -> Result<Self, DocumentError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new());
        }
        let records = serde_json::from_slice(bytes).map_err(DocumentError::Malformed)?;
        Ok(Self { records })
    }

    /// Encodes the whole document as compact JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Encode`] if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>, DocumentError> {
        serde_json::to_vec(&self.records).map_err(DocumentError::Encode)
    }

    /// Decodes the record `name` into `T`.
    ///
    /// Returns `Ok(None)` when the record is absent; callers that want
    /// "absent behaves like empty" should use `unwrap_or_default()`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::RecordShape`] when the record exists but cannot
    /// be decoded as `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, DocumentError> {
        let Some(raw) = self.records.get(name) else {
            debug!(record = name, "record absent");
            return Ok(None);
        };
        T::deserialize(raw)
            .map(Some)
            .map_err(|source| DocumentError::RecordShape {
                name: name.to_string(),
                source,
            })
    }

    /// Stores `value` under `name`, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::RecordEncode`] if `value` cannot be represented
    /// as JSON (for example a map with non-string keys).
    pub fn set<T: Serialize>(&mut self, name: &str, value: &T) -> Result<(), DocumentError> {
        let raw = serde_json::to_value(value).map_err(|source| DocumentError::RecordEncode {
            name: name.to_string(),
            source,
        })?;
        self.records.insert(name.to_string(), raw);
        Ok(())
    }

    /// Returns `true` when a record named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Record names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::flag::State;

    #[test]
    fn test_new_document_has_no_records() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.names().count(), 0);
    }

    #[test]
    fn test_get_absent_record_returns_none() {
        let doc = Document::new();
        let state: Option<State> = doc.get(STATE_RECORD).unwrap();
        assert!(state.is_none());
    }

    #[test]
    fn test_absent_record_and_empty_state_look_the_same_to_callers() {
        // Arrange: one document without the record, one with an empty state
        let absent = Document::new();
        let mut empty = Document::new();
        empty.set(STATE_RECORD, &State::new()).unwrap();

        // Act
        let a: State = absent.get(STATE_RECORD).unwrap().unwrap_or_default();
        let b: State = empty.get(STATE_RECORD).unwrap().unwrap_or_default();

        // Assert
        assert_eq!(a, b);
    }

    #[test]
    fn test_set_replaces_previous_record() {
        let mut doc = Document::new();
        let mut state = State::new();
        doc.set(STATE_RECORD, &state).unwrap();

        state.append_flag().unwrap();
        doc.set(STATE_RECORD, &state).unwrap();

        let stored: State = doc.get(STATE_RECORD).unwrap().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(doc.names().collect::<Vec<_>>(), [STATE_RECORD]);
    }

    #[test]
    fn test_get_with_wrong_shape_returns_record_shape_error() {
        let mut doc = Document::new();
        doc.set(STATE_RECORD, &"not a state").unwrap();

        let result = doc.get::<State>(STATE_RECORD);

        assert!(matches!(
            result,
            Err(DocumentError::RecordShape { ref name, .. }) if name == STATE_RECORD
        ));
    }

    #[test]
    fn test_to_json_writes_exact_record_layout() {
        let mut doc = Document::new();
        let mut state = State::new();
        state.append_flag().unwrap();
        doc.set(STATE_RECORD, &state).unwrap();

        let text = String::from_utf8(doc.to_json().unwrap()).unwrap();

        assert_eq!(
            text,
            r#"{"state":{"Envs":[{"Key":1,"Title":"env1","Value":false}]}}"#
        );
    }

    #[test]
    fn test_from_json_reads_empty_object() {
        let doc = Document::from_json(b"{}").unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_from_json_treats_zero_length_input_as_empty_document() {
        assert!(Document::from_json(b"").unwrap().is_empty());
        assert!(Document::from_json(b" \n").unwrap().is_empty());
    }

    #[test]
    fn test_from_json_rejects_non_object_document() {
        assert!(matches!(
            Document::from_json(b"[1, 2, 3]"),
            Err(DocumentError::Malformed(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_truncated_document() {
        assert!(matches!(
            Document::from_json(br#"{"state":{"Envs":[{"Key":1"#),
            Err(DocumentError::Malformed(_))
        ));
    }

    #[test]
    fn test_unknown_records_survive_a_rewrite() {
        // Arrange: a document with an extra record next to "state"
        let text = br#"{"other":{"x":1},"state":{"Envs":null}}"#;
        let mut doc = Document::from_json(text).unwrap();

        // Act
        let mut state: State = doc.get(STATE_RECORD).unwrap().unwrap_or_default();
        state.append_flag().unwrap();
        doc.set(STATE_RECORD, &state).unwrap();
        let reread = Document::from_json(&doc.to_json().unwrap()).unwrap();

        // Assert
        assert!(reread.contains("other"));
        assert_eq!(reread.get::<State>(STATE_RECORD).unwrap().unwrap().len(), 1);
    }
}
