//! Error types for the extraction core.

use thiserror::Error;

/// Fatal errors raised by the extraction core.
///
/// Nothing here is retried at this layer; recovery policy belongs to the
/// caller driving the tap.
#[derive(Debug, Error)]
pub enum TapError {
    /// An identifier contains a double quote and cannot be safely quoted.
    #[error("cannot escape identifier {0:?}: it contains a double quote")]
    UnescapableIdentifier(String),

    /// A partition context was supplied for a stream that cannot be
    /// partitioned.
    #[error("stream '{stream}' does not support partitioning")]
    UnsupportedPartition { stream: String },

    /// The configured record-count limit was exceeded mid-stream.
    ///
    /// The query fetches one row past the limit, so hitting this means more
    /// data exists beyond the threshold.
    #[error("stream '{stream}' exceeded the configured limit of {limit} records")]
    RecordLimitExceeded { stream: String, limit: u64 },

    /// The catalog entry is missing something the chosen strategy requires.
    #[error("invalid catalog entry for stream '{stream}': {reason}")]
    InvalidCatalogEntry { stream: String, reason: String },

    /// A bookmarked cursor value cannot be interpreted for the query.
    #[error("invalid replication-key value {value}: {reason}")]
    InvalidCursorValue { value: String, reason: String },

    /// The underlying database driver failed.
    #[error(transparent)]
    Source(#[from] crate::source::SourceError),
}
