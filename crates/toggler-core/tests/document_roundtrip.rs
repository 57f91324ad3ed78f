//! Integration tests for the toggler-core document codec and flag operations.
//!
//! These tests drive a state through the public API the way the storage layer
//! does: decode a document, pull out the state record, mutate it, put it back,
//! and encode the document again.

use toggler_core::{Document, Flag, State, STATE_RECORD};

/// Encodes `doc` and decodes the result, as a save followed by a load would.
fn reload(doc: &Document) -> Document {
    let bytes = doc.to_json().expect("encode must succeed");
    Document::from_json(&bytes).expect("decode must succeed")
}

fn state_of(doc: &Document) -> State {
    doc.get(STATE_RECORD)
        .expect("state record must decode")
        .unwrap_or_default()
}

#[test]
fn test_fresh_document_yields_empty_state() {
    let doc = reload(&Document::new());
    assert!(state_of(&doc).is_empty());
}

#[test]
fn test_state_round_trips_keys_titles_values_and_order() {
    // Arrange: a state with sparse keys and mixed values
    let original = State::from_flags(vec![
        Flag {
            key: 4,
            title: "staging".to_string(),
            value: true,
        },
        Flag {
            key: 2,
            title: "env2".to_string(),
            value: false,
        },
        Flag {
            key: 9,
            title: "ünïcode title".to_string(),
            value: true,
        },
    ]);
    let mut doc = Document::new();
    doc.set(STATE_RECORD, &original).expect("set");

    // Act
    let restored = state_of(&reload(&doc));

    // Assert
    assert_eq!(restored, original);
}

#[test]
fn test_reading_twice_without_saving_is_idempotent() {
    let mut doc = Document::new();
    let mut state = State::new();
    state.append_flag().unwrap();
    state.append_flag().unwrap();
    doc.set(STATE_RECORD, &state).expect("set");
    let doc = reload(&doc);

    assert_eq!(state_of(&doc), state_of(&doc));
}

#[test]
fn test_concrete_append_and_update_scenario() {
    let mut doc = Document::new();

    // First append: [{1, env1, false}]
    let mut state = state_of(&doc);
    state.append_flag().unwrap();
    doc.set(STATE_RECORD, &state).expect("set");
    doc = reload(&doc);
    assert_eq!(
        state_of(&doc).flags(),
        &[Flag {
            key: 1,
            title: "env1".to_string(),
            value: false,
        }]
    );

    // Second append: [{1, ..}, {2, env2, false}]
    let mut state = state_of(&doc);
    state.append_flag().unwrap();
    doc.set(STATE_RECORD, &state).expect("set");
    doc = reload(&doc);
    assert_eq!(state_of(&doc).flag(2).map(|f| f.title.as_str()), Some("env2"));

    // Update key 2 -> true
    let mut state = state_of(&doc);
    assert!(state.update_flag_value(2, true));
    doc.set(STATE_RECORD, &state).expect("set");
    doc = reload(&doc);
    let state = state_of(&doc);
    assert!(!state.flag(1).unwrap().value);
    assert!(state.flag(2).unwrap().value);

    // Update unknown key 99 -> not found, nothing changes
    let mut unchanged = state.clone();
    assert!(!unchanged.update_flag_value(99, true));
    assert_eq!(unchanged, state);
}

#[test]
fn test_document_written_by_older_tooling_is_readable() {
    // An empty list was historically written as null.
    let text = br#"{"state":{"Envs":null}}"#;
    let doc = Document::from_json(text).expect("decode");

    let mut state = state_of(&doc);
    let flag = state.append_flag().unwrap();

    assert_eq!(flag.key, 1);
}
