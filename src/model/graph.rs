//! Relationship graph operations on [`DataModel`].
//!
//! Edges are committed only when both endpoints exist in the registry and
//! no edge with the same endpoints is present. Cycles are allowed at commit
//! time; [`DataModel::is_acyclic`] and [`DataModel::cycles`] let traversal
//! users refuse them.

use std::collections::HashMap;

use petgraph::algo::{is_cyclic_directed, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;
use uuid::Uuid;

use super::error::{ElementKind, ModelError, ModelResult};
use super::relationship::Relationship;
use super::types::{Cardinality, CrossFilter};
use super::DataModel;
use crate::semantic::inference::Suggestion;

/// Tables that form one strongly-connected group of relationships, sorted
/// by name.
pub type TableCycle = Vec<String>;

impl DataModel {
    /// Commit a relationship.
    pub fn add_relationship(&mut self, rel: Relationship) -> ModelResult<()> {
        self.check_endpoint(&rel.from_table, &rel.from_column)?;
        self.check_endpoint(&rel.to_table, &rel.to_column)?;

        if rel.is_self_relationship() && rel.from_column == rel.to_column {
            return Err(ModelError::SelfReferencingColumn {
                table: rel.from_table,
                column: rel.from_column,
            });
        }

        if self
            .relationships
            .iter()
            .any(|existing| existing.endpoints() == rel.endpoints())
        {
            return Err(ModelError::DuplicateRelationship {
                from_table: rel.from_table,
                from_column: rel.from_column,
                to_table: rel.to_table,
                to_column: rel.to_column,
            });
        }

        if self.relationships.iter().any(|existing| existing.id == rel.id) {
            return Err(ModelError::DuplicateRelationshipId(rel.id));
        }

        debug!(model = %self.id, relationship = %rel, id = %rel.id, "added relationship");
        self.relationships.push(rel);
        self.touch();
        Ok(())
    }

    /// Build and commit a relationship with a generated id. Returns the id.
    pub fn create_relationship(
        &mut self,
        from: (&str, &str),
        to: (&str, &str),
        cardinality: Cardinality,
        cross_filter: CrossFilter,
    ) -> ModelResult<String> {
        let id = self.fresh_relationship_id();
        let rel = Relationship::new(id.clone(), from, to)
            .with_cardinality(cardinality)
            .with_cross_filter(cross_filter);
        self.add_relationship(rel)?;
        Ok(id)
    }

    /// Commit an inferred relationship. Suggestions are never committed
    /// implicitly.
    pub fn accept_suggestion(
        &mut self,
        suggestion: &Suggestion,
        cardinality: Cardinality,
        cross_filter: CrossFilter,
    ) -> ModelResult<String> {
        self.create_relationship(
            (&suggestion.from.table, &suggestion.from.column),
            (&suggestion.to.table, &suggestion.to.column),
            cardinality,
            cross_filter,
        )
    }

    pub fn get_relationship(&self, id: &str) -> ModelResult<&Relationship> {
        self.relationships
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| ModelError::not_found(ElementKind::Relationship, id))
    }

    pub fn remove_relationship(&mut self, id: &str) -> ModelResult<Relationship> {
        let index = self
            .relationships
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ModelError::not_found(ElementKind::Relationship, id))?;
        let rel = self.relationships.remove(index);
        debug!(model = %self.id, relationship = %rel, "removed relationship");
        self.touch();
        Ok(rel)
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Whether the table-level graph has no cycles (self-relationships count).
    pub fn is_acyclic(&self) -> bool {
        let graph = self.table_graph();
        !is_cyclic_directed(&graph)
    }

    /// Every strongly-connected group of tables that contains a cycle.
    pub fn cycles(&self) -> Vec<TableCycle> {
        let graph = self.table_graph();

        let mut cycles: Vec<TableCycle> = tarjan_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut tables: Vec<String> = scc.into_iter().map(|idx| graph[idx].to_string()).collect();
                tables.sort();
                tables
            })
            .collect();
        cycles.sort();
        cycles
    }

    fn table_graph(&self) -> DiGraph<&str, &str> {
        let mut graph = DiGraph::new();
        let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();

        for name in self.table_names() {
            nodes.insert(name, graph.add_node(name));
        }
        for rel in &self.relationships {
            if let (Some(&from), Some(&to)) =
                (nodes.get(rel.from_table.as_str()), nodes.get(rel.to_table.as_str()))
            {
                graph.add_edge(from, to, rel.id.as_str());
            }
        }
        graph
    }

    fn check_endpoint(&self, table: &str, column: &str) -> ModelResult<()> {
        if self.get_column(table, column).is_err() {
            return Err(ModelError::UnknownEndpoint {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
        Ok(())
    }

    fn fresh_relationship_id(&self) -> String {
        loop {
            let candidate: String = Uuid::new_v4().simple().to_string()[..8].to_string();
            if !self.relationships.iter().any(|r| r.id == candidate) {
                return candidate;
            }
        }
    }
}
