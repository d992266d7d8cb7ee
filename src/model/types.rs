//! Enumerated attributes shared by tables, relationships and measures.
//!
//! All of these serialize as the lower-case / kebab-case strings used in the
//! persisted model document.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Logical type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    String,
    Number,
    Date,
    Boolean,
}

impl DataType {
    /// Parse a type name, accepting common spreadsheet/database aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "string" | "text" | "varchar" | "str" => Some(DataType::String),
            "number" | "numeric" | "int" | "integer" | "float" | "decimal" | "double" => {
                Some(DataType::Number)
            }
            "date" | "datetime" | "timestamp" => Some(DataType::Date),
            "boolean" | "bool" => Some(DataType::Boolean),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Number)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::String => write!(f, "string"),
            DataType::Number => write!(f, "number"),
            DataType::Date => write!(f, "date"),
            DataType::Boolean => write!(f, "boolean"),
        }
    }
}

/// Where a table's rows came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableSource {
    #[default]
    Upload,
    Database,
    Api,
}

impl fmt::Display for TableSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSource::Upload => write!(f, "upload"),
            TableSource::Database => write!(f, "database"),
            TableSource::Api => write!(f, "api"),
        }
    }
}

/// Cardinality of a relationship between two table endpoints.
///
/// By convention the `to` side holds the unique key in a many-to-one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    /// One-to-one relationship
    OneToOne,
    /// One-to-many relationship
    OneToMany,
    /// Many-to-one relationship
    #[default]
    ManyToOne,
    /// Many-to-many relationship
    ManyToMany,
}

impl Cardinality {
    /// Short notation, e.g. `N:1`.
    pub fn symbol(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "1:1",
            Cardinality::OneToMany => "1:N",
            Cardinality::ManyToOne => "N:1",
            Cardinality::ManyToMany => "N:N",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::OneToOne => write!(f, "one-to-one"),
            Cardinality::OneToMany => write!(f, "one-to-many"),
            Cardinality::ManyToOne => write!(f, "many-to-one"),
            Cardinality::ManyToMany => write!(f, "many-to-many"),
        }
    }
}

impl FromStr for Cardinality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "one-to-one" | "1:1" => Ok(Cardinality::OneToOne),
            "one-to-many" | "1:n" => Ok(Cardinality::OneToMany),
            "many-to-one" | "n:1" => Ok(Cardinality::ManyToOne),
            "many-to-many" | "n:n" => Ok(Cardinality::ManyToMany),
            other => Err(format!("unknown cardinality '{}'", other)),
        }
    }
}

/// Direction in which a relationship propagates filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossFilter {
    /// One-way, from the `to` side to the `from` side.
    #[default]
    Single,
    /// Bidirectional.
    Both,
}

impl fmt::Display for CrossFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossFilter::Single => write!(f, "single"),
            CrossFilter::Both => write!(f, "both"),
        }
    }
}

impl FromStr for CrossFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(CrossFilter::Single),
            "both" => Ok(CrossFilter::Both),
            other => Err(format!("unknown cross-filter direction '{}'", other)),
        }
    }
}

/// Display hint for a measure; does not affect evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureFormat {
    #[default]
    Number,
    Currency,
    Percent,
    Date,
}

impl fmt::Display for MeasureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureFormat::Number => write!(f, "number"),
            MeasureFormat::Currency => write!(f, "currency"),
            MeasureFormat::Percent => write!(f, "percent"),
            MeasureFormat::Date => write!(f, "date"),
        }
    }
}
