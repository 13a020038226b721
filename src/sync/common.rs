//! Shared streaming loop for all replication strategies.

use chrono::Utc;
use db2_types::{encode_row, EncodeOptions};
use serde_json::Value;
use singer_state::State;

use crate::catalog::{CatalogEntry, ReplicationMethod};
use crate::config::Config;
use crate::error::TapError;
use crate::messages::{Message, MessageWriter};
use crate::metrics::RecordCounter;
use crate::query::SelectQuery;
use crate::source::Db2Source;

/// Execute the query and stream every row out as a RECORD.
///
/// One `time_extracted` is stamped per execution. The bookmark advances with
/// each row before the record is emitted, a STATE snapshot goes out every
/// `checkpoint_interval` rows (an interval of zero disables periodic
/// snapshots) and once unconditionally at exhaustion, so any emitted
/// checkpoint summarizes exactly the records written before it.
pub(crate) async fn sync_query(
    source: &mut dyn Db2Source,
    config: &Config,
    entry: &CatalogEntry,
    mut state: State,
    query: &SelectQuery,
    columns: &[String],
    stream_version: i64,
    writer: &mut dyn MessageWriter,
) -> anyhow::Result<State> {
    let stream = entry.stream_name(config.include_schemas_in_destination_stream_name);
    let database = entry.database_name()?.to_string();
    let column_types = entry.column_types();
    let options = EncodeOptions {
        use_date_datatype: config.use_date_datatype,
    };
    let replication_method = entry.replication_method();
    let replication_key = state
        .get_bookmark(&entry.tap_stream_id, "replication_key")
        .and_then(Value::as_str)
        .map(str::to_string);
    let key_properties = entry.key_properties().to_vec();

    let time_extracted = Utc::now();
    tracing::info!(stream = %entry.tap_stream_id, sql = %query.sql, "executing extraction query");
    let mut cursor = source
        .execute(&query.sql, &query.params)
        .await
        .map_err(TapError::from)?;

    let mut counter = RecordCounter::new(database, entry.table());
    let mut rows_saved: u64 = 0;

    while let Some(row) = cursor.next_row().await {
        let row = row.map_err(TapError::from)?;
        counter.increment();
        rows_saved += 1;

        let record = encode_row(&row, columns, &column_types, options);

        match replication_method {
            ReplicationMethod::FullTable | ReplicationMethod::LogBased => {
                if !key_properties.is_empty() {
                    let last_pk: serde_json::Map<String, Value> = record
                        .iter()
                        .filter(|(name, _)| key_properties.contains(name))
                        .map(|(name, value)| (name.clone(), value.clone()))
                        .collect();
                    state = state.write_bookmark(
                        &entry.tap_stream_id,
                        "last_pk_fetched",
                        Value::Object(last_pk),
                    );
                }
            }
            ReplicationMethod::Incremental => {
                if let Some(key) = &replication_key {
                    state = state.write_bookmark(
                        &entry.tap_stream_id,
                        "replication_key",
                        Value::String(key.clone()),
                    );
                    if let Some(cursor_value) = record.get(key) {
                        state = state.write_bookmark(
                            &entry.tap_stream_id,
                            "replication_key_value",
                            cursor_value.clone(),
                        );
                    }
                }
            }
        }

        writer.write(&Message::Record {
            stream: stream.clone(),
            record: Value::Object(record),
            version: stream_version,
            time_extracted,
        })?;

        if config.checkpoint_interval > 0 && rows_saved % config.checkpoint_interval == 0 {
            writer.write(&Message::State {
                value: state.clone(),
            })?;
        }

        if let Some(limit) = config.abort_at_record_count {
            if rows_saved > limit {
                writer.write(&Message::State {
                    value: state.clone(),
                })?;
                counter.finish();
                return Err(TapError::RecordLimitExceeded {
                    stream: entry.tap_stream_id.clone(),
                    limit,
                }
                .into());
            }
        }
    }

    counter.finish();
    writer.write(&Message::State {
        value: state.clone(),
    })?;
    Ok(state)
}
