//! Column data provider contract.
//!
//! The evaluator never reads row data itself: every `Table[Column]` is
//! resolved through a [`DataProvider`] supplied by the caller. Providers may
//! do I/O and may fail; the evaluator neither retries nor times them.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{FormulaError, ReferenceKind};

/// A raw cell value as delivered by a data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Best-effort numeric reading.
    ///
    /// Numbers pass through, booleans read as 1/0 and text is trimmed and
    /// parsed. Blanks, unparsable text and non-finite results yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            CellValue::Null => return None,
            CellValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            CellValue::Number(n) => *n,
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        n.is_finite().then_some(n)
    }

    /// Canonical text form used for distinct-value comparison.
    ///
    /// Whole numbers drop their fractional part so that `1` and `1.0` compare
    /// equal, and equal the text `"1"`.
    pub fn canonical_string(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => {
                let mut buffer = ryu::Buffer::new();
                let formatted = buffer.format(*n);
                formatted
                    .strip_suffix(".0")
                    .unwrap_or(formatted)
                    .to_string()
            }
            CellValue::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "null"),
            other => write!(f, "{}", other.canonical_string()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// Errors a data provider may report.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("Unknown table: '{0}'")]
    UnknownTable(String),

    #[error("Unknown column '{column}' on table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("{0}")]
    Unavailable(String),
}

impl From<ProviderError> for FormulaError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::UnknownTable(table) => FormulaError::unknown(ReferenceKind::Table, table),
            ProviderError::UnknownColumn { table, column } => {
                FormulaError::unknown(ReferenceKind::Column, format!("{}[{}]", table, column))
            }
            ProviderError::Unavailable(msg) => FormulaError::Provider(msg),
        }
    }
}

/// Source of column vectors for formula evaluation.
pub trait DataProvider {
    /// Fetch every value of `table[column]`, in row order.
    fn get_column(&self, table: &str, column: &str) -> Result<Vec<CellValue>, ProviderError>;
}

impl<P: DataProvider + ?Sized> DataProvider for &P {
    fn get_column(&self, table: &str, column: &str) -> Result<Vec<CellValue>, ProviderError> {
        (**self).get_column(table, column)
    }
}

/// Error loading an [`InMemoryProvider`] from disk.
#[derive(Debug, thiserror::Error)]
pub enum ProviderLoadError {
    #[error("Failed to read data file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse data file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Column data held in memory, keyed by table then column.
///
/// Serialized as `{ "Table": { "Column": [values...] } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryProvider {
    tables: HashMap<String, HashMap<String, Vec<CellValue>>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a column.
    pub fn with_column<V: Into<CellValue>>(
        mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.insert_column(table, column, values);
        self
    }

    /// Add or replace a column.
    pub fn insert_column<V: Into<CellValue>>(
        &mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) {
        self.tables
            .entry(table.into())
            .or_default()
            .insert(column.into(), values.into_iter().map(Into::into).collect());
    }

    /// Parse the JSON document form.
    pub fn from_json_str(json: &str) -> Result<Self, ProviderLoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load the JSON document form from a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ProviderLoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

impl DataProvider for InMemoryProvider {
    fn get_column(&self, table: &str, column: &str) -> Result<Vec<CellValue>, ProviderError> {
        let columns = self
            .tables
            .get(table)
            .ok_or_else(|| ProviderError::UnknownTable(table.to_string()))?;
        columns
            .get(column)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            })
    }
}
