use std::fmt;
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read workbook {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse workbook: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    #[error("table '{table}' not found in sheet '{sheet}'")]
    TableNotFound { sheet: String, table: String },

    #[error("table '{0}' has no header row")]
    MissingHeader(String),
}

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// A single loosely-typed spreadsheet value.
///
/// In the JSON export a cell is `null`, a boolean, a number, a string,
/// `{"datetime": "2024-01-31T00:00:00"}` or `{"duration_secs": 86400}`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
    DateTime { datetime: NaiveDateTime },
    Duration { duration_secs: i64 },
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Trimmed string form of the cell, `None` when empty or blank.
    pub fn as_text(&self) -> Option<String> {
        let s = match self {
            Cell::Empty => return None,
            Cell::Text(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Text(s) => f.write_str(s),
            Cell::DateTime { datetime } => write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S")),
            Cell::Duration { duration_secs } => write!(f, "{duration_secs}s"),
        }
    }
}

impl From<&Value> for Cell {
    /// Store records come back as JSON; route them through the same coercion.
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Empty,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
            Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Table / SheetSource
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn header(&self) -> Result<&[Cell], SourceError> {
        self.rows
            .first()
            .map(Vec::as_slice)
            .ok_or_else(|| SourceError::MissingHeader(self.name.clone()))
    }

    /// Every row after the header.
    pub fn data_rows(&self) -> &[Vec<Cell>] {
        self.rows.get(1..).unwrap_or(&[])
    }
}

/// Read access to a spreadsheet document: sheets contain named tables,
/// tables contain rows of cells with the header as the first row.
pub trait SheetSource {
    fn table(&self, sheet: &str, table: &str) -> Result<&Table, SourceError>;
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub tables: Vec<Table>,
}

/// A workbook exported to JSON: `{"sheets": [{"name", "tables": [{"name", "rows"}]}]}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JsonWorkbook {
    pub sheets: Vec<Sheet>,
}

impl JsonWorkbook {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn from_value(value: Value) -> Result<Self, SourceError> {
        Ok(serde_json::from_value(value)?)
    }
}

impl SheetSource for JsonWorkbook {
    fn table(&self, sheet: &str, table: &str) -> Result<&Table, SourceError> {
        let found = self
            .sheets
            .iter()
            .find(|s| s.name == sheet)
            .ok_or_else(|| SourceError::SheetNotFound(sheet.to_string()))?;

        found
            .tables
            .iter()
            .find(|t| t.name == table)
            .ok_or_else(|| SourceError::TableNotFound {
                sheet: sheet.to_string(),
                table: table.to_string(),
            })
    }
}
