use serde_json::{json, Value};

use crate::State;

#[test]
fn write_and_get_bookmark() {
    let state = State::new().write_bookmark("app-users", "replication_key_value", json!(42));
    assert_eq!(
        state.get_bookmark("app-users", "replication_key_value"),
        Some(&json!(42))
    );
    assert_eq!(state.get_bookmark("app-users", "version"), None);
    assert_eq!(state.get_bookmark("other-stream", "replication_key_value"), None);
}

#[test]
fn clear_bookmark_removes_only_that_key() {
    let state = State::new()
        .write_bookmark("app-users", "replication_key", json!("SEQ"))
        .write_bookmark("app-users", "replication_key_value", json!(7))
        .clear_bookmark("app-users", "replication_key_value");
    assert_eq!(state.get_bookmark("app-users", "replication_key"), Some(&json!("SEQ")));
    assert_eq!(state.get_bookmark("app-users", "replication_key_value"), None);
}

#[test]
fn clear_bookmark_on_unknown_stream_is_a_no_op() {
    let state = State::new().clear_bookmark("missing", "version");
    assert_eq!(state, State::new());
}

#[test]
fn retain_bookmark_keys_evicts_everything_else() {
    // bookmarks written by an incremental pass, then the stream is switched
    // to full-table replication
    let state = State::new()
        .write_bookmark("app-users", "replication_key", json!("SEQ"))
        .write_bookmark("app-users", "replication_key_value", json!(7))
        .write_bookmark("app-users", "version", json!(1672574400123i64))
        .write_bookmark("app-orders", "replication_key", json!("TS"));

    let state = state.retain_bookmark_keys("app-users", &["version", "last_pk_fetched", "max_pk_values"]);

    assert_eq!(state.get_bookmark("app-users", "replication_key"), None);
    assert_eq!(state.get_bookmark("app-users", "replication_key_value"), None);
    assert_eq!(state.get_bookmark("app-users", "version"), Some(&json!(1672574400123i64)));
    // other streams untouched
    assert_eq!(state.get_bookmark("app-orders", "replication_key"), Some(&json!("TS")));
}

#[test]
fn stream_version_prefers_stored_value() {
    let state = State::new().write_bookmark("app-users", "version", json!(12345i64));
    assert_eq!(state.stream_version("app-users"), 12345);
}

#[test]
fn stream_version_mints_epoch_millis_when_absent() {
    let before = chrono::Utc::now().timestamp_millis();
    let version = State::new().stream_version("app-users");
    let after = chrono::Utc::now().timestamp_millis();
    assert!(version >= before && version <= after);
}

#[test]
fn serialized_layout_matches_the_wire_format() {
    let state = State::new()
        .write_bookmark("app-users", "replication_key", json!("SEQ"))
        .write_bookmark("app-users", "replication_key_value", json!(7));
    let value: Value = serde_json::to_value(&state).unwrap();
    assert_eq!(
        value,
        json!({
            "bookmarks": {
                "app-users": {
                    "replication_key": "SEQ",
                    "replication_key_value": 7
                }
            }
        })
    );
}

#[test]
fn empty_blob_deserializes_to_empty_state() {
    let state: State = serde_json::from_str("{}").unwrap();
    assert_eq!(state, State::new());
}

#[test]
fn persist_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let state = State::new()
        .write_bookmark("app-users", "version", json!(1672574400123i64))
        .write_bookmark("app-users", "replication_key_value", json!("2023-01-01T12:00:00+00:00"));
    state.persist(&path).unwrap();

    let loaded = State::load(&path).unwrap();
    assert_eq!(loaded, state);
}

#[test]
fn load_missing_file_yields_empty_state() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = State::load(&dir.path().join("does-not-exist.json")).unwrap();
    assert_eq!(loaded, State::new());
}

#[test]
fn persist_replaces_previous_checkpoint_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let first = State::new().write_bookmark("app-users", "replication_key_value", json!(1));
    first.persist(&path).unwrap();
    let second = State::new().write_bookmark("app-users", "replication_key_value", json!(2));
    second.persist(&path).unwrap();

    assert_eq!(State::load(&path).unwrap(), second);
    // only the checkpoint file remains, no leftover temp files
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn load_rejects_corrupt_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{not json").unwrap();
    assert!(State::load(&path).is_err());
}
