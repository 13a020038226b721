//! Per-column type metadata driving the row codec.

/// JSON-schema `format` tag a catalog property can declare for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFormat {
    /// `"date-time"`
    DateTime,
    /// `"date"`
    Date,
    /// `"singer.decimal"` — stringified exactly, never coerced to float
    Decimal,
}

impl ColumnFormat {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "date-time" => Some(ColumnFormat::DateTime),
            "date" => Some(ColumnFormat::Date),
            "singer.decimal" => Some(ColumnFormat::Decimal),
            _ => None,
        }
    }
}

/// Declared type information for one column.
///
/// Both fields are optional: catalogs produced by older discovery runs can
/// omit the `sql-datatype` metadata, and most columns carry no format tag.
/// The codec treats a missing field as "no special handling".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnType {
    /// Raw `sql-datatype` string from column metadata, e.g. `"varbinary"`.
    pub sql_type: Option<String>,
    /// Parsed JSON-schema format tag from the property definition.
    pub format: Option<ColumnFormat>,
}

impl ColumnType {
    pub fn new(sql_type: Option<String>, format: Option<ColumnFormat>) -> Self {
        ColumnType { sql_type, format }
    }

    /// True for the fixed and varying binary datatypes.
    pub fn is_binary(&self) -> bool {
        matches!(
            self.sql_type.as_deref().map(str::to_lowercase).as_deref(),
            Some("binary") | Some("varbinary")
        )
    }

    /// True when the declared datatype names a boolean.
    pub fn is_boolean(&self) -> bool {
        self.sql_type
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains("boolean"))
    }

    /// True when the column is tagged with the exact-decimal format.
    pub fn is_decimal(&self) -> bool {
        self.format == Some(ColumnFormat::Decimal)
    }
}
