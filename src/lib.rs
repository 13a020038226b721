//! tap-db2: Singer tap core for DB2 relational databases.
//!
//! The library takes an externally supplied catalog (stream descriptors plus
//! selection/replication metadata), selects a replication strategy per
//! stream, builds parameterized range queries, and drives the extraction loop
//! through a row codec, emitting RECORD / STATE / SCHEMA / ACTIVATE_VERSION
//! messages while durably advancing resumable bookmarks.
//!
//! The database client itself sits behind the [`source::Db2Source`] trait;
//! discovery, configuration declaration, and the CLI entry point are external
//! collaborators.
//!
//! ```ignore
//! let mut source = connect(&config).await?;
//! let mut writer = StdoutWriter;
//! let mut state = State::load(&state_path)?;
//! for entry in catalog.selected_streams() {
//!     state = sync::sync_stream(&mut source, &config, entry, state, None, &mut writer).await?;
//!     state.persist(&state_path)?;
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod messages;
pub mod metrics;
pub mod query;
pub mod source;
pub mod sync;
pub mod testing;

pub use catalog::{Catalog, CatalogEntry, ReplicationMethod};
pub use config::Config;
pub use error::TapError;
pub use messages::{Message, MessageWriter, StdoutWriter};
pub use source::{Db2Source, RowCursor, SourceError};
