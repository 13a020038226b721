//! Database access seam.
//!
//! The actual DB2 client lives behind these traits, keeping the extraction
//! engine testable without a running server and free of driver specifics.

use async_trait::async_trait;
use db2_types::SqlValue;
use thiserror::Error;

/// Failure modes a driver implementation can surface.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to acquire or use a connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// The database rejected or aborted a query.
    #[error("query execution error: {0}")]
    Query(String),
}

/// A DB2 connection capable of executing parameterized SELECT statements.
///
/// The SELECT list ordering of `sql` defines the positional layout of every
/// row the returned cursor yields; callers hand the same column ordering to
/// the row codec.
#[async_trait]
pub trait Db2Source: Send {
    async fn execute(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Box<dyn RowCursor>, SourceError>;
}

/// A forward-only, lazily produced sequence of raw rows.
///
/// Finite, not restartable, consumed exactly once per sync pass.
#[async_trait]
pub trait RowCursor: Send {
    /// The next raw row, or `None` once the result set is exhausted.
    async fn next_row(&mut self) -> Option<Result<Vec<SqlValue>, SourceError>>;
}
