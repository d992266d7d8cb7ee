//! Relationship inference from schema metadata.
//!
//! A pure function of the tables it is given: no table or relationship is
//! modified, and nothing is committed. Accepted suggestions are added with
//! [`DataModel::accept_suggestion`](crate::model::DataModel::accept_suggestion).
//!
//! # Example
//!
//! ```
//! use analytica::model::{Column, DataType, Table};
//! use analytica::semantic::inference::infer;
//!
//! let tables = vec![
//!     Table::new("Orders").with_column(Column::new("customers_id", DataType::Number)),
//!     Table::new("Customers").with_column(Column::new("id", DataType::Number)),
//! ];
//! let suggestions = infer(&tables);
//! assert_eq!(suggestions[0].to.to_string(), "Customers.id");
//! assert_eq!(suggestions[0].confidence, 0.95);
//! ```

mod engine;
mod rules;

pub use engine::{infer, InferenceConfig, InferenceEngine};
pub use rules::{default_rules, InferenceRule, RuleMatch};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Confidence assigned by each rule.
pub mod thresholds {
    pub mod confidence {
        /// Same column name on both sides, ignoring case.
        pub const IDENTICAL_NAME: f64 = 0.90;
        /// `<table>_id` pointing at that table's `id`.
        pub const FOREIGN_KEY_PATTERN: f64 = 0.95;
    }
}

/// One side of a suggested relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Endpoint {
    pub table: String,
    pub column: String,
}

impl Endpoint {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// A proposed relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub from: Endpoint,
    pub to: Endpoint,
    /// Confidence score (0.0 to 1.0)
    pub confidence: f64,
    pub reason: String,
    /// The rule that produced it
    pub rule: String,
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({:.2}, {})",
            self.from, self.to, self.confidence, self.reason
        )
    }
}

/// A unique key identifying a relationship by its endpoints.
///
/// All table/column names are stored in lowercase for case-insensitive
/// comparison.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct RelationshipKey {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
}

impl RelationshipKey {
    #[must_use]
    pub fn new(from_table: &str, from_column: &str, to_table: &str, to_column: &str) -> Self {
        Self {
            from_table: from_table.to_lowercase(),
            from_column: from_column.to_lowercase(),
            to_table: to_table.to_lowercase(),
            to_column: to_column.to_lowercase(),
        }
    }

    #[must_use]
    pub fn from_suggestion(s: &Suggestion) -> Self {
        Self::new(&s.from.table, &s.from.column, &s.to.table, &s.to.column)
    }
}
