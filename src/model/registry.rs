//! Table and column registry operations on [`DataModel`].
//!
//! Lookups fail with [`ModelError::NotFound`] instead of returning `None`.
//! Foreign-key `references` are not checked on write; use
//! [`DataModel::integrity_findings`] to list the ones that do not resolve.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use super::error::{ElementKind, ModelError, ModelResult};
use super::table::{Column, Table};
use super::DataModel;

/// An advisory referential-integrity problem. Never blocks a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityFinding {
    /// `is_foreign_key` is set but `references` is not.
    MissingReference { table: String, column: String },
    /// `references` is not of the form `table.column`.
    MalformedReference {
        table: String,
        column: String,
        reference: String,
    },
    /// `references` names a table or column that does not exist.
    UnresolvedReference {
        table: String,
        column: String,
        reference: String,
    },
}

impl fmt::Display for IntegrityFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityFinding::MissingReference { table, column } => {
                write!(f, "{}.{} is a foreign key without a reference", table, column)
            }
            IntegrityFinding::MalformedReference {
                table,
                column,
                reference,
            } => write!(
                f,
                "{}.{} has malformed reference '{}' (expected table.column)",
                table, column, reference
            ),
            IntegrityFinding::UnresolvedReference {
                table,
                column,
                reference,
            } => write!(
                f,
                "{}.{} references '{}', which does not exist",
                table, column, reference
            ),
        }
    }
}

impl DataModel {
    /// Register a table. Fails if the name is taken or the table carries
    /// duplicate column names.
    pub fn add_table(&mut self, table: Table) -> ModelResult<()> {
        if self.tables.iter().any(|t| t.name == table.name) {
            return Err(ModelError::DuplicateTable(table.name));
        }
        if let Some(column) = table.duplicate_column() {
            return Err(ModelError::DuplicateColumn {
                table: table.name.clone(),
                column: column.to_string(),
            });
        }

        debug!(model = %self.id, table = %table.name, columns = table.columns.len(), "added table");
        self.tables.push(table);
        self.touch();
        Ok(())
    }

    /// Append a column to an existing table.
    pub fn add_column(&mut self, table: &str, column: Column) -> ModelResult<()> {
        let target = self
            .tables
            .iter_mut()
            .find(|t| t.name == table)
            .ok_or_else(|| ModelError::not_found(ElementKind::Table, table))?;

        if target.has_column(&column.name) {
            return Err(ModelError::DuplicateColumn {
                table: table.to_string(),
                column: column.name,
            });
        }

        debug!(model = %self.id, table, column = %column.name, "added column");
        target.columns.push(column);
        self.touch();
        Ok(())
    }

    pub fn get_table(&self, name: &str) -> ModelResult<&Table> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| ModelError::not_found(ElementKind::Table, name))
    }

    pub fn get_column(&self, table: &str, name: &str) -> ModelResult<&Column> {
        self.get_table(table)?
            .column(name)
            .ok_or_else(|| ModelError::not_found(ElementKind::Column, format!("{}.{}", table, name)))
    }

    /// Remove a table and every relationship that touches it.
    pub fn remove_table(&mut self, name: &str) -> ModelResult<Table> {
        let index = self
            .tables
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| ModelError::not_found(ElementKind::Table, name))?;

        let table = self.tables.remove(index);
        let before = self.relationships.len();
        self.relationships.retain(|r| !r.touches(name));

        debug!(
            model = %self.id,
            table = name,
            dropped_relationships = before - self.relationships.len(),
            "removed table"
        );
        self.touch();
        Ok(table)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Foreign-key columns whose `references` are missing, malformed or
    /// unresolved, in table then column order.
    pub fn integrity_findings(&self) -> Vec<IntegrityFinding> {
        let mut findings = Vec::new();

        for table in &self.tables {
            for column in table.columns.iter().filter(|c| c.is_foreign_key) {
                let finding = match (&column.references, column.reference_target()) {
                    (None, _) => Some(IntegrityFinding::MissingReference {
                        table: table.name.clone(),
                        column: column.name.clone(),
                    }),
                    (Some(reference), None) => Some(IntegrityFinding::MalformedReference {
                        table: table.name.clone(),
                        column: column.name.clone(),
                        reference: reference.clone(),
                    }),
                    (Some(reference), Some((ref_table, ref_column))) => self
                        .get_column(ref_table, ref_column)
                        .is_err()
                        .then(|| IntegrityFinding::UnresolvedReference {
                            table: table.name.clone(),
                            column: column.name.clone(),
                            reference: reference.clone(),
                        }),
                };
                findings.extend(finding);
            }
        }

        for finding in &findings {
            warn!(model = %self.id, %finding, "integrity finding");
        }
        findings
    }
}
