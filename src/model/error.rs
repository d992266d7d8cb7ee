//! Structural errors raised by model operations.

use std::fmt;

use thiserror::Error;

use crate::formula::FormulaError;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// The kind of schema element a lookup failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Table,
    Column,
    Relationship,
    Measure,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Table => write!(f, "table"),
            ElementKind::Column => write!(f, "column"),
            ElementKind::Relationship => write!(f, "relationship"),
            ElementKind::Measure => write!(f, "measure"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Table '{0}' already exists")]
    DuplicateTable(String),

    #[error("Column '{column}' already exists in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("Measure '{0}' already exists")]
    DuplicateMeasure(String),

    #[error("{kind} not found: '{name}'")]
    NotFound { kind: ElementKind, name: String },

    /// A relationship endpoint does not exist in the registry.
    #[error("Unknown relationship endpoint: {table}.{column}")]
    UnknownEndpoint { table: String, column: String },

    #[error("Relationship {from_table}.{from_column} -> {to_table}.{to_column} already exists")]
    DuplicateRelationship {
        from_table: String,
        from_column: String,
        to_table: String,
        to_column: String,
    },

    #[error("Relationship id '{0}' is already in use")]
    DuplicateRelationshipId(String),

    /// Self-relationships must use two distinct columns.
    #[error("Self-relationship on '{table}' must use distinct columns (got '{column}' twice)")]
    SelfReferencingColumn { table: String, column: String },

    /// The validator rejected a measure expression.
    #[error("Invalid measure expression: {}", errors.join("; "))]
    InvalidMeasure { errors: Vec<String> },

    #[error(transparent)]
    Formula(#[from] FormulaError),
}

impl ModelError {
    pub(crate) fn not_found(kind: ElementKind, name: impl Into<String>) -> Self {
        ModelError::NotFound {
            kind,
            name: name.into(),
        }
    }
}
