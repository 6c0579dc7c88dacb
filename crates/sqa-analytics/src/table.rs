//! In-memory tabular view of the dataset
//!
//! A [`DataTable`] is the filtered view handed to the analytics executor:
//! scope-restricted rows from the daily snapshot with column types coerced
//! per the schema registry. It is rebuilt per request and never persisted.
//!
//! Coercion never fails a request: a numeric or datetime value that does
//! not parse becomes [`Cell::Null`].

use crate::schema::{self, ColumnType};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// One typed value in the view
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing or unparsable value
    Null,
    /// Text value
    Text(String),
    /// Numeric value
    Number(f64),
    /// UTC timestamp
    Timestamp(DateTime<Utc>),
    /// Boolean flag
    Flag(bool),
    /// List of strings
    List(Vec<String>),
}

impl Cell {
    /// True for [`Cell::Null`]
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Cell::Flag(b) => write!(f, "{b}"),
            Cell::List(items) => write!(f, "{}", items.join(";")),
        }
    }
}

/// Scope-restricted, type-coerced projection of the snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl DataTable {
    /// Table with no rows and no columns
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from JSON record objects, coercing cells per the
    /// schema registry. Non-object records are skipped. Column order is
    /// first-seen order across the records.
    #[must_use]
    pub fn from_records(records: &[Value]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            if let Value::Object(map) = record {
                for key in map.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
            }
        }

        let rows = records
            .iter()
            .filter_map(Value::as_object)
            .map(|map| {
                columns
                    .iter()
                    .map(|column| coerce(column, map.get(column)))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Column names in table order
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows
    #[inline]
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    #[inline]
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when the table holds no rows
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, if present
    #[inline]
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `(row, column name)`, if both exist
    #[must_use]
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Value counts for one column, keyed by rendered cell text.
    /// Null cells are not counted.
    #[must_use]
    pub fn facets(&self, column: &str) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        let Some(idx) = self.column_index(column) else {
            return counts;
        };
        for row in &self.rows {
            if let Some(cell) = row.get(idx) {
                if !cell.is_null() {
                    *counts.entry(cell.to_string()).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    /// First `n` rows rendered as a markdown table, model-visible columns
    /// only. Used as the literal sample in the code-generation prompt.
    #[must_use]
    pub fn head_markdown(&self, n: usize) -> String {
        let visible: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !schema::is_internal(c))
            .map(|(i, _)| i)
            .collect();

        let mut out = String::new();
        let header: Vec<&str> = visible.iter().map(|&i| self.columns[i].as_str()).collect();
        out.push_str(&format!("| {} |\n", header.join(" | ")));
        out.push_str(&format!("|{}\n", "---|".repeat(visible.len())));

        for row in self.rows.iter().take(n) {
            let cells: Vec<String> = visible
                .iter()
                .map(|&i| row.get(i).map(ToString::to_string).unwrap_or_default())
                .collect();
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
        out
    }

    /// Serialize the view back to JSON records, for sandbox bindings.
    #[must_use]
    pub fn to_records(&self) -> Value {
        let records: Vec<Value> = self
            .rows
            .iter()
            .map(|row| {
                let map: serde_json::Map<String, Value> = self
                    .columns
                    .iter()
                    .zip(row.iter())
                    .map(|(c, cell)| (c.clone(), cell_to_value(cell)))
                    .collect();
                Value::Object(map)
            })
            .collect();
        Value::Array(records)
    }
}

fn cell_to_value(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Text(s) => Value::String(s.clone()),
        Cell::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
        Cell::Timestamp(ts) => Value::String(ts.to_rfc3339()),
        Cell::Flag(b) => Value::Bool(*b),
        Cell::List(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
    }
}

/// Coerce one JSON value into a cell according to the registry; columns
/// without a registry entry keep their natural JSON shape.
fn coerce(column: &str, value: Option<&Value>) -> Cell {
    let Some(value) = value else {
        return Cell::Null;
    };
    if value.is_null() {
        return Cell::Null;
    }

    match schema::column_type(column) {
        Some(ColumnType::Numeric) => coerce_number(value),
        Some(ColumnType::Datetime) => value
            .as_str()
            .and_then(parse_timestamp)
            .map_or(Cell::Null, Cell::Timestamp),
        Some(ColumnType::Flag) => coerce_flag(value),
        Some(ColumnType::List) => coerce_list(value),
        Some(ColumnType::Text | ColumnType::Categorical) => match value {
            Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        },
        None => coerce_untyped(value),
    }
}

fn coerce_number(value: &Value) -> Cell {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .map_or(Cell::Null, Cell::Number)
}

fn coerce_flag(value: &Value) -> Cell {
    match value {
        Value::Bool(b) => Cell::Flag(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "y" | "yes" | "1" => Cell::Flag(true),
            "false" | "n" | "no" | "0" => Cell::Flag(false),
            _ => Cell::Null,
        },
        _ => Cell::Null,
    }
}

fn coerce_list(value: &Value) -> Cell {
    match value {
        Value::Array(items) => Cell::List(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
        ),
        Value::String(s) => Cell::List(vec![s.clone()]),
        _ => Cell::Null,
    }
}

fn coerce_untyped(value: &Value) -> Cell {
    match value {
        Value::String(s) => Cell::Text(s.clone()),
        Value::Bool(b) => Cell::Flag(*b),
        Value::Number(n) => n.as_f64().map_or(Cell::Null, Cell::Number),
        Value::Array(_) => coerce_list(value),
        _ => Cell::Null,
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|ndt| Utc.from_utc_datetime(&ndt))
        })
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|ndt| Utc.from_utc_datetime(&ndt))
        })
}
