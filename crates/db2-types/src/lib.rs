//! Raw DB2 value model and row codec.
//!
//! A driver yields rows as positional [`SqlValue`] tuples. The codec in
//! [`encode_row`] canonicalizes each value into a JSON-representable scalar
//! using the column's declared [`ColumnType`], so that everything downstream
//! deals in plain `serde_json::Value`s.

mod encode;
mod schema;
mod value;

pub use encode::{encode_row, encode_value, EncodeOptions};
pub use schema::{ColumnFormat, ColumnType};
pub use value::SqlValue;
