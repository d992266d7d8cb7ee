//! The semantic data model document.
//!
//! A [`DataModel`] owns a model's tables, relationships and measures, and is
//! the unit that gets persisted. It is mutated only through its methods:
//!
//! - **Registry** ([`registry`]): tables and columns
//! - **Relationship graph** ([`graph`]): directed edges between columns
//! - **Measures** ([`measure`]): validated formulas, evaluated on demand
//!
//! Every successful mutation strictly advances `updated_at`.

pub mod error;
pub mod graph;
pub mod measure;
pub mod registry;
pub mod relationship;
pub mod table;
pub mod types;

pub use error::{ElementKind, ModelError, ModelResult};
pub use graph::TableCycle;
pub use measure::{Measure, QuickMeasure};
pub use registry::IntegrityFinding;
pub use relationship::Relationship;
pub use table::{Column, Table};
pub use types::{Cardinality, CrossFilter, DataType, MeasureFormat, TableSource};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A complete semantic model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataModel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub measures: Vec<Measure>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: String,
}

/// Listing entry for a stored model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub id: String,
    pub name: String,
    pub table_count: usize,
    pub updated_at: DateTime<Utc>,
    pub owner: String,
}

impl DataModel {
    /// Create an empty model with a fresh id.
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name, owner)
    }

    pub fn with_id(id: impl Into<String>, name: impl Into<String>, owner: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            tables: Vec::new(),
            relationships: Vec::new(),
            measures: Vec::new(),
            created_at: now,
            updated_at: now,
            owner: owner.into(),
        }
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            table_count: self.tables.len(),
            updated_at: self.updated_at,
            owner: self.owner.clone(),
        }
    }

    /// Replay a document from an untrusted source (an import file, say)
    /// through the checked operations: tables, then relationships, then
    /// measures. Fails with the first rejected element. Id, name, owner
    /// and timestamps carry over.
    pub fn rebuild(self) -> ModelResult<DataModel> {
        let mut model = DataModel::with_id(self.id, self.name, self.owner);
        for table in self.tables {
            model.add_table(table)?;
        }
        for rel in self.relationships {
            model.add_relationship(rel)?;
        }
        for measure in self.measures {
            model.create_measure(measure)?;
        }
        model.created_at = self.created_at;
        model.updated_at = self.updated_at.max(self.created_at);
        Ok(model)
    }

    /// Advance `updated_at`, strictly, even if the clock has not moved.
    pub(crate) fn touch(&mut self) {
        let floor = self.updated_at.max(self.created_at) + Duration::microseconds(1);
        self.updated_at = Utc::now().max(floor);
    }
}
