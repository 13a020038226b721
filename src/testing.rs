//! In-memory fixtures for exercising the sync engine without a database.

use std::cmp::Ordering;

use async_trait::async_trait;
use db2_types::SqlValue;
use serde_json::Value;

use crate::catalog::{Catalog, CatalogEntry};
use crate::messages::{Message, MessageWriter};
use crate::source::{Db2Source, RowCursor, SourceError};

/// A canned table served from memory.
///
/// When a cursor column is configured, `execute` honors the contract the
/// incremental query builder establishes: rows are filtered by the bound
/// cursor parameter (`>=`) and returned in ascending cursor order whenever
/// the statement carries an ORDER BY.
pub struct MockSource {
    rows: Vec<Vec<SqlValue>>,
    cursor_column: Option<usize>,
    fail_next: Option<SourceError>,
    /// Every statement handed to `execute`, for assertions.
    pub executed: Vec<(String, Vec<SqlValue>)>,
}

impl MockSource {
    pub fn new(rows: Vec<Vec<SqlValue>>) -> Self {
        MockSource {
            rows,
            cursor_column: None,
            fail_next: None,
            executed: Vec::new(),
        }
    }

    /// Positional index of the cursor column within the row tuples.
    pub fn with_cursor_column(mut self, index: usize) -> Self {
        self.cursor_column = Some(index);
        self
    }

    /// Make the next `execute` call fail.
    pub fn failing_with(mut self, error: SourceError) -> Self {
        self.fail_next = Some(error);
        self
    }
}

#[async_trait]
impl Db2Source for MockSource {
    async fn execute(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Box<dyn RowCursor>, SourceError> {
        self.executed.push((sql.to_string(), params.to_vec()));
        if let Some(error) = self.fail_next.take() {
            return Err(error);
        }

        let mut rows = self.rows.clone();
        if let Some(index) = self.cursor_column {
            if let Some(bound) = params.first() {
                rows.retain(|row| compare_values(&row[index], bound) != Ordering::Less);
            }
            if sql.contains("ORDER BY") {
                rows.sort_by(|a, b| compare_values(&a[index], &b[index]));
            }
        }
        Ok(Box::new(MockCursor {
            rows: rows.into_iter(),
        }))
    }
}

struct MockCursor {
    rows: std::vec::IntoIter<Vec<SqlValue>>,
}

#[async_trait]
impl RowCursor for MockCursor {
    async fn next_row(&mut self) -> Option<Result<Vec<SqlValue>, SourceError>> {
        self.rows.next().map(Ok)
    }
}

fn compare_values(a: &SqlValue, b: &SqlValue) -> Ordering {
    match (a, b) {
        (SqlValue::Int(x), SqlValue::Int(y)) => x.cmp(y),
        (SqlValue::Float(x), SqlValue::Float(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (SqlValue::Text(x), SqlValue::Text(y)) => x.cmp(y),
        (SqlValue::Date(x), SqlValue::Date(y)) => x.cmp(y),
        (SqlValue::DateTime(x), SqlValue::DateTime(y)) => x.cmp(y),
        (SqlValue::Decimal(x), SqlValue::Decimal(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Captures messages in memory for assertions.
#[derive(Debug, Default)]
pub struct BufferWriter {
    pub messages: Vec<Message>,
}

impl BufferWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<&Value> {
        self.messages
            .iter()
            .filter_map(|message| match message {
                Message::Record { record, .. } => Some(record),
                _ => None,
            })
            .collect()
    }

    pub fn states(&self) -> Vec<&singer_state::State> {
        self.messages
            .iter()
            .filter_map(|message| match message {
                Message::State { value } => Some(value),
                _ => None,
            })
            .collect()
    }
}

impl MessageWriter for BufferWriter {
    fn write(&mut self, message: &Message) -> anyhow::Result<()> {
        self.messages.push(message.clone());
        Ok(())
    }
}

/// Parse a single catalog stream out of raw JSON.
pub fn entry_from_json(stream: Value) -> anyhow::Result<CatalogEntry> {
    let catalog = Catalog::from_value(serde_json::json!({ "streams": [stream] }))?;
    catalog
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("catalog stream did not parse"))
}
