//! Full-table replication, also used for the initial load of LOG_BASED
//! streams.

use serde_json::Value;
use singer_state::State;

use crate::catalog::CatalogEntry;
use crate::config::Config;
use crate::messages::{Message, MessageWriter};
use crate::query;
use crate::source::Db2Source;

/// Bookmark keys valid for full-table streams.
const BOOKMARK_KEYS: &[&str] = &["version", "last_pk_fetched", "max_pk_values"];

/// Run one full scan over a stream.
///
/// A fresh scan mints a new version; a scan that was interrupted mid-table
/// (`last_pk_fetched` still present) keeps the version it started with, so
/// resumed records replace into the same generation. The interrupt bookmarks
/// are cleared once the scan completes, and the closing ACTIVATE_VERSION
/// tells the destination the generation is authoritative.
pub(crate) async fn sync_table(
    source: &mut dyn Db2Source,
    config: &Config,
    entry: &CatalogEntry,
    mut state: State,
    columns: &[String],
    writer: &mut dyn MessageWriter,
) -> anyhow::Result<State> {
    state = state.retain_bookmark_keys(&entry.tap_stream_id, BOOKMARK_KEYS);

    let resuming = state
        .get_bookmark(&entry.tap_stream_id, "last_pk_fetched")
        .is_some();
    let stream_version = if resuming {
        state.stream_version(&entry.tap_stream_id)
    } else {
        singer_state::mint_version()
    };
    state = state.write_bookmark(&entry.tap_stream_id, "version", Value::from(stream_version));

    let stream = entry.stream_name(config.include_schemas_in_destination_stream_name);
    writer.write(&Message::ActivateVersion {
        stream: stream.clone(),
        version: stream_version,
    })?;

    tracing::info!(
        stream = %entry.tap_stream_id,
        version = stream_version,
        resuming,
        "starting full-table sync"
    );

    let mut select = query::build_select(entry, columns)?;
    if let Some(limit) = config.abort_at_record_count {
        query::apply_record_limit(&mut select, limit);
    }

    state = super::common::sync_query(
        source,
        config,
        entry,
        state,
        &select,
        columns,
        stream_version,
        writer,
    )
    .await?;

    // the scan completed; interrupt bookmarks no longer mean anything
    state = state.clear_bookmark(&entry.tap_stream_id, "last_pk_fetched");
    state = state.clear_bookmark(&entry.tap_stream_id, "max_pk_values");

    writer.write(&Message::ActivateVersion {
        stream,
        version: stream_version,
    })?;
    writer.write(&Message::State {
        value: state.clone(),
    })?;
    Ok(state)
}
