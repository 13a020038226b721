//! Extraction engine: replication strategy selection and the sync loop.

mod common;
mod full_table;
mod incremental;

use serde_json::Value;
use singer_state::State;

use crate::catalog::{CatalogEntry, ReplicationMethod};
use crate::config::Config;
use crate::error::TapError;
use crate::messages::{Message, MessageWriter};
use crate::source::Db2Source;

/// Sync one stream end to end, returning the advanced state.
///
/// Strategy follows the stream's `replication-method` metadata: INCREMENTAL
/// runs a cursor-ordered range scan, FULL_TABLE runs a full scan, and
/// LOG_BASED streams route their initial load through the full scan (the
/// change-log reader itself is an external collaborator). A partition
/// context is rejected: DB2 table streams cannot be partitioned.
pub async fn sync_stream(
    source: &mut dyn Db2Source,
    config: &Config,
    entry: &CatalogEntry,
    state: State,
    partition: Option<&Value>,
    writer: &mut dyn MessageWriter,
) -> anyhow::Result<State> {
    if partition.is_some() {
        return Err(TapError::UnsupportedPartition {
            stream: entry.stream.clone(),
        }
        .into());
    }

    let columns = entry.selected_columns();
    if columns.is_empty() {
        tracing::warn!(stream = %entry.tap_stream_id, "no columns selected, skipping stream");
        return Ok(state);
    }

    writer.write(&Message::Schema {
        stream: entry.stream_name(config.include_schemas_in_destination_stream_name),
        schema: entry.schema.clone(),
        key_properties: entry.key_properties().to_vec(),
        bookmark_properties: entry.replication_key().map(|key| vec![key.to_string()]),
    })?;

    match entry.replication_method() {
        ReplicationMethod::Incremental => {
            incremental::sync_table(source, config, entry, state, &columns, writer).await
        }
        ReplicationMethod::FullTable | ReplicationMethod::LogBased => {
            full_table::sync_table(source, config, entry, state, &columns, writer).await
        }
    }
}
