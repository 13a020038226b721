//! Catalog model: stream descriptors supplied by the discovery collaborator.
//!
//! A Singer catalog carries metadata as a flat list of breadcrumb-keyed
//! entries. Parsing materializes that list into an explicit two-level
//! structure, [`StreamMetadata`] for the `[]` breadcrumb and one
//! [`ColumnMetadata`] per `["properties", <name>]` breadcrumb, so the rest of
//! the engine never touches dynamic breadcrumb paths.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::Context;
use db2_types::{ColumnFormat, ColumnType};
use serde::Deserialize;
use serde_json::Value;

use crate::error::TapError;

/// Replication strategy for one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ReplicationMethod {
    #[serde(rename = "FULL_TABLE")]
    FullTable,
    #[serde(rename = "INCREMENTAL")]
    Incremental,
    /// Change-log replication. The log reader is an external collaborator;
    /// this engine only runs its initial full load.
    #[serde(rename = "LOG_BASED")]
    LogBased,
}

/// Stream-scoped metadata (the `[]` breadcrumb).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StreamMetadata {
    pub selected: Option<bool>,
    #[serde(rename = "replication-method")]
    pub replication_method: Option<ReplicationMethod>,
    #[serde(rename = "replication-key")]
    pub replication_key: Option<String>,
    #[serde(rename = "database-name")]
    pub database_name: Option<String>,
    #[serde(rename = "is-view")]
    pub is_view: Option<bool>,
    #[serde(rename = "table-key-properties")]
    pub table_key_properties: Vec<String>,
    #[serde(rename = "view-key-properties")]
    pub view_key_properties: Vec<String>,
}

/// Column-scoped metadata (a `["properties", <name>]` breadcrumb).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ColumnMetadata {
    pub selected: Option<bool>,
    pub inclusion: Option<String>,
    #[serde(rename = "sql-datatype")]
    pub sql_datatype: Option<String>,
}

/// One stream descriptor with its metadata materialized.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// `<schema>-<table>` identifier, unique across the catalog.
    pub tap_stream_id: String,
    /// Destination stream name (usually the bare table name).
    pub stream: String,
    /// Physical table name; falls back to `stream` when absent.
    pub table_name: Option<String>,
    /// Raw JSON schema, re-emitted verbatim in SCHEMA messages.
    pub schema: Value,
    pub stream_metadata: StreamMetadata,
    pub column_metadata: BTreeMap<String, ColumnMetadata>,
    /// Parsed `format` tag per schema property.
    column_formats: BTreeMap<String, Option<ColumnFormat>>,
}

/// The full catalog handed to the tap.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub streams: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    streams: Vec<RawCatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct RawCatalogEntry {
    tap_stream_id: String,
    stream: String,
    #[serde(default)]
    table_name: Option<String>,
    schema: Value,
    #[serde(default)]
    metadata: Vec<MetadataEntry>,
}

#[derive(Debug, Deserialize)]
struct MetadataEntry {
    breadcrumb: Vec<String>,
    metadata: Value,
}

impl Catalog {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog file {}", path.display()))?;
        let raw: Value = serde_json::from_str(&content)
            .with_context(|| format!("invalid catalog file {}", path.display()))?;
        Self::from_value(raw)
    }

    pub fn from_value(value: Value) -> anyhow::Result<Self> {
        let raw: RawCatalog = serde_json::from_value(value).context("invalid catalog document")?;
        let streams = raw
            .streams
            .into_iter()
            .map(CatalogEntry::from_raw)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Catalog { streams })
    }

    /// Streams the operator selected for extraction.
    pub fn selected_streams(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.streams.iter().filter(|entry| entry.is_selected())
    }

    pub fn get_stream(&self, tap_stream_id: &str) -> Option<&CatalogEntry> {
        self.streams
            .iter()
            .find(|entry| entry.tap_stream_id == tap_stream_id)
    }
}

impl CatalogEntry {
    fn from_raw(raw: RawCatalogEntry) -> anyhow::Result<Self> {
        let mut stream_metadata = StreamMetadata::default();
        let mut column_metadata = BTreeMap::new();

        for entry in raw.metadata {
            match entry.breadcrumb.as_slice() {
                [] => {
                    stream_metadata = serde_json::from_value(entry.metadata).with_context(|| {
                        format!("invalid stream metadata for '{}'", raw.tap_stream_id)
                    })?;
                }
                [first, column] if first == "properties" => {
                    let parsed: ColumnMetadata =
                        serde_json::from_value(entry.metadata).with_context(|| {
                            format!(
                                "invalid metadata for column '{}' of '{}'",
                                column, raw.tap_stream_id
                            )
                        })?;
                    column_metadata.insert(column.clone(), parsed);
                }
                other => anyhow::bail!(
                    "unsupported metadata breadcrumb {:?} in stream '{}'",
                    other,
                    raw.tap_stream_id
                ),
            }
        }

        let mut column_formats = BTreeMap::new();
        if let Some(properties) = raw.schema.get("properties").and_then(Value::as_object) {
            for (name, property) in properties {
                let format = property
                    .get("format")
                    .and_then(Value::as_str)
                    .and_then(ColumnFormat::parse);
                column_formats.insert(name.clone(), format);
            }
        }

        Ok(CatalogEntry {
            tap_stream_id: raw.tap_stream_id,
            stream: raw.stream,
            table_name: raw.table_name,
            schema: raw.schema,
            stream_metadata,
            column_metadata,
            column_formats,
        })
    }

    pub fn is_selected(&self) -> bool {
        self.stream_metadata.selected.unwrap_or(false)
    }

    /// Singer field-selection rules: `automatic` inclusion always syncs,
    /// `unsupported` never does, anything else follows the column's own
    /// `selected` flag (defaulting to selected).
    pub fn column_is_selected(&self, column: &str) -> bool {
        let metadata = self.column_metadata.get(column);
        match metadata.and_then(|m| m.inclusion.as_deref()) {
            Some("automatic") => true,
            Some("unsupported") => false,
            _ => metadata.and_then(|m| m.selected).unwrap_or(true),
        }
    }

    /// Selected columns, sorted by name. The same ordering defines the
    /// SELECT list, so it matches row tuple positions exactly.
    pub fn selected_columns(&self) -> Vec<String> {
        self.column_formats
            .keys()
            .filter(|name| self.column_is_selected(name))
            .cloned()
            .collect()
    }

    /// Configured strategy, defaulting to a full scan.
    pub fn replication_method(&self) -> ReplicationMethod {
        self.stream_metadata
            .replication_method
            .unwrap_or(ReplicationMethod::FullTable)
    }

    pub fn replication_key(&self) -> Option<&str> {
        self.stream_metadata.replication_key.as_deref()
    }

    /// Key properties identifying a row: view keys for views, table keys
    /// otherwise.
    pub fn key_properties(&self) -> &[String] {
        if self.stream_metadata.is_view.unwrap_or(false) {
            &self.stream_metadata.view_key_properties
        } else {
            &self.stream_metadata.table_key_properties
        }
    }

    pub fn database_name(&self) -> Result<&str, TapError> {
        self.stream_metadata
            .database_name
            .as_deref()
            .ok_or_else(|| TapError::InvalidCatalogEntry {
                stream: self.tap_stream_id.clone(),
                reason: "missing database-name metadata".to_string(),
            })
    }

    /// Physical table name to query.
    pub fn table(&self) -> &str {
        self.table_name.as_deref().unwrap_or(&self.stream)
    }

    /// Destination stream name. With schema inclusion enabled the
    /// `tap_stream_id` is used with `-` folded to `_`, so records from
    /// same-named tables in different schemas stay distinct.
    pub fn stream_name(&self, include_schemas: bool) -> String {
        if include_schemas {
            self.tap_stream_id.replace('-', "_")
        } else {
            self.stream.clone()
        }
    }

    pub fn column_format(&self, column: &str) -> Option<ColumnFormat> {
        self.column_formats.get(column).copied().flatten()
    }

    /// Declared type per column, for the row codec.
    pub fn column_types(&self) -> HashMap<String, ColumnType> {
        self.column_formats
            .iter()
            .map(|(name, format)| {
                let sql_type = self
                    .column_metadata
                    .get(name)
                    .and_then(|m| m.sql_datatype.clone());
                (name.clone(), ColumnType::new(sql_type, *format))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users_catalog() -> Value {
        json!({
            "streams": [{
                "tap_stream_id": "APP-USERS",
                "stream": "USERS",
                "table_name": "USERS",
                "schema": {
                    "type": "object",
                    "properties": {
                        "ID": {"type": ["integer"]},
                        "NAME": {"type": ["null", "string"]},
                        "TS": {"type": ["null", "string"], "format": "date-time"},
                        "PRICE": {"type": ["null", "string"], "format": "singer.decimal"},
                        "SECRET": {"type": ["null", "string"]}
                    }
                },
                "metadata": [
                    {"breadcrumb": [], "metadata": {
                        "selected": true,
                        "replication-method": "INCREMENTAL",
                        "replication-key": "TS",
                        "database-name": "APP",
                        "table-key-properties": ["ID"]
                    }},
                    {"breadcrumb": ["properties", "ID"], "metadata": {
                        "inclusion": "automatic", "sql-datatype": "integer"
                    }},
                    {"breadcrumb": ["properties", "NAME"], "metadata": {
                        "selected": true, "sql-datatype": "varchar"
                    }},
                    {"breadcrumb": ["properties", "TS"], "metadata": {
                        "selected": true, "sql-datatype": "timestamp"
                    }},
                    {"breadcrumb": ["properties", "PRICE"], "metadata": {
                        "selected": true, "sql-datatype": "decimal"
                    }},
                    {"breadcrumb": ["properties", "SECRET"], "metadata": {
                        "selected": false, "sql-datatype": "varchar"
                    }}
                ]
            }]
        })
    }

    #[test]
    fn parses_two_level_metadata() {
        let catalog = Catalog::from_value(users_catalog()).unwrap();
        let entry = catalog.get_stream("APP-USERS").unwrap();
        assert!(entry.is_selected());
        assert_eq!(entry.replication_method(), ReplicationMethod::Incremental);
        assert_eq!(entry.replication_key(), Some("TS"));
        assert_eq!(entry.database_name().unwrap(), "APP");
        assert_eq!(entry.key_properties(), ["ID".to_string()]);
        assert_eq!(
            entry.column_metadata.get("ID").unwrap().sql_datatype.as_deref(),
            Some("integer")
        );
    }

    #[test]
    fn rejects_unknown_breadcrumbs() {
        let catalog = json!({
            "streams": [{
                "tap_stream_id": "APP-USERS",
                "stream": "USERS",
                "schema": {"type": "object", "properties": {}},
                "metadata": [
                    {"breadcrumb": ["something", "else", "entirely"], "metadata": {}}
                ]
            }]
        });
        assert!(Catalog::from_value(catalog).is_err());
    }

    #[test]
    fn selection_rules() {
        let catalog = Catalog::from_value(users_catalog()).unwrap();
        let entry = catalog.get_stream("APP-USERS").unwrap();
        // automatic inclusion wins over a missing selected flag
        assert!(entry.column_is_selected("ID"));
        assert!(entry.column_is_selected("NAME"));
        assert!(!entry.column_is_selected("SECRET"));
        assert_eq!(
            entry.selected_columns(),
            vec!["ID".to_string(), "NAME".to_string(), "PRICE".to_string(), "TS".to_string()]
        );
    }

    #[test]
    fn column_types_merge_datatype_and_format() {
        let catalog = Catalog::from_value(users_catalog()).unwrap();
        let entry = catalog.get_stream("APP-USERS").unwrap();
        let types = entry.column_types();
        assert_eq!(types.get("TS").unwrap().format, Some(ColumnFormat::DateTime));
        assert_eq!(types.get("TS").unwrap().sql_type.as_deref(), Some("timestamp"));
        assert!(types.get("PRICE").unwrap().is_decimal());
        assert_eq!(entry.column_format("TS"), Some(ColumnFormat::DateTime));
        assert_eq!(entry.column_format("NAME"), None);
    }

    #[test]
    fn stream_name_folds_schema_prefix() {
        let catalog = Catalog::from_value(users_catalog()).unwrap();
        let entry = catalog.get_stream("APP-USERS").unwrap();
        assert_eq!(entry.stream_name(false), "USERS");
        assert_eq!(entry.stream_name(true), "APP_USERS");
    }

    #[test]
    fn unselected_streams_are_filtered() {
        let mut value = users_catalog();
        value["streams"][0]["metadata"][0]["metadata"]["selected"] = json!(false);
        let catalog = Catalog::from_value(value).unwrap();
        assert_eq!(catalog.selected_streams().count(), 0);
    }
}
