// src/model/relationship.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::types::{Cardinality, CrossFilter};

/// A directed edge between two table/column endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    #[serde(default)]
    pub cardinality: Cardinality,
    #[serde(default)]
    pub cross_filter: CrossFilter,
}

impl Relationship {
    pub fn new(
        id: impl Into<String>,
        from: (impl Into<String>, impl Into<String>),
        to: (impl Into<String>, impl Into<String>),
    ) -> Self {
        Self {
            id: id.into(),
            from_table: from.0.into(),
            from_column: from.1.into(),
            to_table: to.0.into(),
            to_column: to.1.into(),
            cardinality: Cardinality::default(),
            cross_filter: CrossFilter::default(),
        }
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn with_cross_filter(mut self, cross_filter: CrossFilter) -> Self {
        self.cross_filter = cross_filter;
        self
    }

    /// The identity used for duplicate detection; ignores id and metadata.
    pub fn endpoints(&self) -> (&str, &str, &str, &str) {
        (
            &self.from_table,
            &self.from_column,
            &self.to_table,
            &self.to_column,
        )
    }

    pub fn is_self_relationship(&self) -> bool {
        self.from_table == self.to_table
    }

    pub fn touches(&self, table: &str) -> bool {
        self.from_table == table || self.to_table == table
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{} ({}, {})",
            self.from_table,
            self.from_column,
            self.to_table,
            self.to_column,
            self.cardinality.symbol(),
            self.cross_filter
        )
    }
}
