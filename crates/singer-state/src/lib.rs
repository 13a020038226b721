//! Versioned bookmark state for resumable stream extraction.
//!
//! The state is a JSON blob of per-stream bookmark maps:
//!
//! ```json
//! {
//!   "bookmarks": {
//!     "db-table": {
//!       "replication_key": "updated_at",
//!       "replication_key_value": "2023-01-01T12:00:00+00:00",
//!       "version": 1672574400123
//!     }
//!   }
//! }
//! ```
//!
//! Bookmark operations are pure: each consumes the state and returns the
//! updated value, so callers decide exactly when a snapshot is emitted or
//! persisted. Persistence is atomic (write-temp-then-rename) so an external
//! reader never observes a partial checkpoint.

mod file;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bookmark keys for one stream.
pub type StreamBookmarks = BTreeMap<String, Value>;

/// Persisted tap state: a bookmark map keyed by stream identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub bookmarks: BTreeMap<String, StreamBookmarks>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one bookmark key for a stream.
    pub fn get_bookmark(&self, tap_stream_id: &str, key: &str) -> Option<&Value> {
        self.bookmarks
            .get(tap_stream_id)
            .and_then(|bookmarks| bookmarks.get(key))
    }

    /// Write one bookmark key, returning the updated state.
    pub fn write_bookmark(mut self, tap_stream_id: &str, key: &str, value: Value) -> Self {
        self.bookmarks
            .entry(tap_stream_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
        self
    }

    /// Remove one bookmark key, returning the updated state.
    pub fn clear_bookmark(mut self, tap_stream_id: &str, key: &str) -> Self {
        if let Some(bookmarks) = self.bookmarks.get_mut(tap_stream_id) {
            bookmarks.remove(key);
        }
        self
    }

    /// Evict every bookmark key for the stream that is not in `allowed`.
    ///
    /// Run before each sync pass so bookmarks written by a previously
    /// configured replication strategy cannot leak into the current one.
    pub fn retain_bookmark_keys(mut self, tap_stream_id: &str, allowed: &[&str]) -> Self {
        if let Some(bookmarks) = self.bookmarks.get_mut(tap_stream_id) {
            bookmarks.retain(|key, _| allowed.contains(&key.as_str()));
        }
        self
    }

    /// The stored stream version, or a freshly minted one.
    ///
    /// A version is wall-clock epoch milliseconds identifying one full-resync
    /// generation. Minting is the only non-deterministic operation here;
    /// callers write the result back immediately so it happens at most once
    /// per resync.
    pub fn stream_version(&self, tap_stream_id: &str) -> i64 {
        self.get_bookmark(tap_stream_id, "version")
            .and_then(Value::as_i64)
            .unwrap_or_else(mint_version)
    }
}

/// Epoch milliseconds, the wire format for stream versions.
pub fn mint_version() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
