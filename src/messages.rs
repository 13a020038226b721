//! Singer protocol messages.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use singer_state::State;

/// One Singer message on the wire, serialized as a single JSON line with a
/// `type` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Message {
    #[serde(rename = "SCHEMA")]
    Schema {
        stream: String,
        schema: Value,
        key_properties: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        bookmark_properties: Option<Vec<String>>,
    },
    #[serde(rename = "RECORD")]
    Record {
        stream: String,
        record: Value,
        version: i64,
        time_extracted: DateTime<Utc>,
    },
    #[serde(rename = "STATE")]
    State { value: State },
    /// Tells the destination which resync generation is now authoritative.
    #[serde(rename = "ACTIVATE_VERSION")]
    ActivateVersion { stream: String, version: i64 },
}

/// Sink for emitted messages.
///
/// Implementations must preserve write order: a STATE checkpoint is only
/// meaningful after every record it summarizes.
pub trait MessageWriter {
    fn write(&mut self, message: &Message) -> anyhow::Result<()>;
}

/// Writes messages to stdout, one JSON document per line.
#[derive(Debug, Default)]
pub struct StdoutWriter;

impl MessageWriter for StdoutWriter {
    fn write(&mut self, message: &Message) -> anyhow::Result<()> {
        use std::io::Write;
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer(&mut stdout, message)?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
