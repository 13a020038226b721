//! Incremental replication: a cursor-ordered range scan.

use serde_json::Value;
use singer_state::State;

use crate::catalog::CatalogEntry;
use crate::config::Config;
use crate::error::TapError;
use crate::messages::{Message, MessageWriter};
use crate::query;
use crate::source::Db2Source;

/// Bookmark keys valid for incremental streams.
const BOOKMARK_KEYS: &[&str] = &["replication_key", "replication_key_value", "version"];

/// Run one incremental pass over a stream.
///
/// The bookmarked cursor value is only trusted while the bookmarked cursor
/// column matches the configured one; on mismatch the stale value is dropped
/// and the scan restarts over the full range. Rows at the bookmark boundary
/// are re-read (`>=` predicate), so duplicates at the boundary are expected
/// and gaps are not possible.
pub(crate) async fn sync_table(
    source: &mut dyn Db2Source,
    config: &Config,
    entry: &CatalogEntry,
    mut state: State,
    columns: &[String],
    writer: &mut dyn MessageWriter,
) -> anyhow::Result<State> {
    state = state.retain_bookmark_keys(&entry.tap_stream_id, BOOKMARK_KEYS);

    let replication_key = entry
        .replication_key()
        .ok_or_else(|| TapError::InvalidCatalogEntry {
            stream: entry.tap_stream_id.clone(),
            reason: "INCREMENTAL replication requires a replication-key".to_string(),
        })?
        .to_string();

    let bookmarked_key = state
        .get_bookmark(&entry.tap_stream_id, "replication_key")
        .and_then(Value::as_str)
        .map(str::to_string);

    let cursor_value = if bookmarked_key.as_deref() == Some(replication_key.as_str()) {
        state
            .get_bookmark(&entry.tap_stream_id, "replication_key_value")
            .cloned()
    } else {
        if bookmarked_key.is_some() {
            tracing::info!(
                stream = %entry.tap_stream_id,
                configured = %replication_key,
                "replication key changed, discarding stale cursor value"
            );
        }
        state = state.write_bookmark(
            &entry.tap_stream_id,
            "replication_key",
            Value::String(replication_key.clone()),
        );
        state = state.clear_bookmark(&entry.tap_stream_id, "replication_key_value");
        None
    };

    let stream_version = state.stream_version(&entry.tap_stream_id);
    state = state.write_bookmark(&entry.tap_stream_id, "version", Value::from(stream_version));

    writer.write(&Message::ActivateVersion {
        stream: entry.stream_name(config.include_schemas_in_destination_stream_name),
        version: stream_version,
    })?;

    tracing::info!(
        stream = %entry.tap_stream_id,
        replication_key = %replication_key,
        offset = config.offset_value,
        has_cursor = cursor_value.is_some(),
        "starting incremental sync"
    );

    let mut select = query::build_select(entry, columns)?;
    query::apply_replication_filter(
        &mut select,
        &replication_key,
        entry.column_format(&replication_key),
        cursor_value.as_ref(),
        config.offset_value,
    )?;
    if let Some(limit) = config.abort_at_record_count {
        query::apply_record_limit(&mut select, limit);
    }

    super::common::sync_query(source, config, entry, state, &select, columns, stream_version, writer)
        .await
}
