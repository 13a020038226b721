//! SELECT statement assembly for table extraction.

use chrono::{DateTime, Duration, Utc};
use db2_types::{ColumnFormat, SqlValue};
use serde_json::Value;

use crate::catalog::CatalogEntry;
use crate::error::TapError;

/// A parameterized SELECT ready for [`crate::source::Db2Source::execute`].
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Quote an identifier for DB2, folding it to upper case first.
///
/// DB2 folds unquoted identifiers to upper case and the catalog stores the
/// folded names, so quoting the folded form keeps both sides consistent.
/// An embedded double quote cannot be escaped and is rejected outright.
pub fn escape_identifier(identifier: &str) -> Result<String, TapError> {
    if identifier.contains('"') {
        return Err(TapError::UnescapableIdentifier(identifier.to_string()));
    }
    Ok(format!("\"{}\"", identifier.to_uppercase()))
}

/// Build the base projection over the stream's schema and table.
///
/// Literal `%` characters are doubled so they survive the driver's
/// parameter-substitution pass.
pub fn build_select(entry: &CatalogEntry, columns: &[String]) -> Result<SelectQuery, TapError> {
    let escaped_columns = columns
        .iter()
        .map(|column| escape_identifier(column))
        .collect::<Result<Vec<_>, _>>()?;
    let sql = format!(
        "SELECT {} FROM {}.{}",
        escaped_columns.join(","),
        escape_identifier(entry.database_name()?)?,
        escape_identifier(entry.table())?,
    );
    Ok(SelectQuery {
        sql: sql.replace('%', "%%"),
        params: Vec::new(),
    })
}

/// Append the incremental range predicate and ordering.
///
/// With a bookmarked cursor value the predicate is
/// `WHERE "KEY" >= :replication_key_value`. The configured offset is applied
/// asymmetrically: timestamp cursors get `offset_value` seconds added to the
/// bound parameter, every other cursor gets ` + (offset)` concatenated into
/// the SQL text after the marker, because DB2 rejects parameter markers in
/// that expression position. With a configured cursor but no bookmarked
/// value, only the `ORDER BY` is appended. The ascending order is what makes
/// the advancing bookmark monotone.
pub fn apply_replication_filter(
    query: &mut SelectQuery,
    replication_key: &str,
    cursor_format: Option<ColumnFormat>,
    cursor_value: Option<&Value>,
    offset_value: i64,
) -> Result<(), TapError> {
    let escaped_key = escape_identifier(replication_key)?;
    if let Some(value) = cursor_value {
        query
            .sql
            .push_str(&format!(" WHERE {escaped_key} >= :replication_key_value"));
        if cursor_format == Some(ColumnFormat::DateTime) {
            query.params.push(offset_timestamp(value, offset_value)?);
        } else {
            query.sql.push_str(&format!(" + ({offset_value})"));
            query.params.push(cursor_param(value));
        }
    }
    query.sql.push_str(&format!(" ORDER BY {escaped_key} ASC"));
    Ok(())
}

/// Cap the result one row past the abort threshold.
pub fn apply_record_limit(query: &mut SelectQuery, abort_at_record_count: u64) {
    query
        .sql
        .push_str(&format!(" FETCH FIRST {} ROWS ONLY", abort_at_record_count + 1));
}

fn offset_timestamp(value: &Value, offset_value: i64) -> Result<SqlValue, TapError> {
    let raw = value.as_str().ok_or_else(|| TapError::InvalidCursorValue {
        value: value.to_string(),
        reason: "timestamp cursor value must be a string".to_string(),
    })?;
    let parsed = DateTime::parse_from_rfc3339(raw).map_err(|e| TapError::InvalidCursorValue {
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    let adjusted = parsed.with_timezone(&Utc) + Duration::seconds(offset_value);
    Ok(SqlValue::DateTime(adjusted.naive_utc()))
}

fn cursor_param(value: &Value) -> SqlValue {
    if let Some(i) = value.as_i64() {
        SqlValue::Int(i)
    } else if let Some(f) = value.as_f64() {
        SqlValue::Float(f)
    } else if let Some(s) = value.as_str() {
        SqlValue::Text(s.to_string())
    } else {
        SqlValue::Text(value.to_string())
    }
}
