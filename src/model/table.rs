// src/model/table.rs
use serde::{Deserialize, Serialize};

use crate::model::types::{DataType, TableSource};

/// A column in a table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub dtype: DataType,
    #[serde(default)]
    pub is_key: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
    /// `table.column` this foreign key points at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: DataType) -> Self {
        Self {
            name: name.into(),
            dtype,
            is_key: false,
            is_foreign_key: false,
            references: None,
        }
    }

    /// Builder: mark as the table's key.
    pub fn key(mut self) -> Self {
        self.is_key = true;
        self
    }

    /// Builder: mark as a foreign key pointing at `table.column`.
    ///
    /// The target is not checked here; see
    /// [`DataModel::integrity_findings`](crate::model::DataModel::integrity_findings).
    pub fn references(mut self, target: impl Into<String>) -> Self {
        self.is_foreign_key = true;
        self.references = Some(target.into());
        self
    }

    /// Split `references` into `(table, column)`, if well-formed.
    pub fn reference_target(&self) -> Option<(&str, &str)> {
        let target = self.references.as_deref()?;
        let (table, column) = target.split_once('.')?;
        if table.is_empty() || column.is_empty() {
            return None;
        }
        Some((table, column))
    }
}

/// A table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Advisory row-count hint.
    #[serde(default)]
    pub row_count: u64,
    #[serde(default)]
    pub source: TableSource,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            row_count: 0,
            source: TableSource::default(),
        }
    }

    /// Builder: append a column.
    ///
    /// Duplicates are not rejected here; [`DataModel::add_table`](crate::model::DataModel::add_table)
    /// checks them when the table is registered.
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_row_count(mut self, row_count: u64) -> Self {
        self.row_count = row_count;
        self
    }

    pub fn with_source(mut self, source: TableSource) -> Self {
        self.source = source;
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// First column name that appears more than once.
    pub(crate) fn duplicate_column(&self) -> Option<&str> {
        self.columns.iter().enumerate().find_map(|(i, col)| {
            self.columns[..i]
                .iter()
                .any(|prev| prev.name == col.name)
                .then_some(col.name.as_str())
        })
    }
}
