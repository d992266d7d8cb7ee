//! # Analytica
//!
//! A semantic data model engine: typed table schemas, a relationship
//! graph, heuristic relationship inference, and aggregate measures written
//! in a small formula language.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │             Tables + Columns  (model::registry)          │
//! └─────────────────────────────────────────────────────────┘
//!            │                                │
//!            ▼ [semantic::inference]          │
//! ┌──────────────────────────┐                │
//! │  Suggestions (never      │                │
//! │  auto-committed)         │                │
//! └──────────────────────────┘                │
//!            │ accept                         │
//!            ▼                                ▼
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │  Relationship graph      │   │  Measures                │
//! │  (model::graph)          │   │  validate -> store       │
//! └──────────────────────────┘   └──────────────────────────┘
//!                                             │
//!                                             ▼ [formula]
//! ┌─────────────────────────────────────────────────────────┐
//! │   lexer -> parser -> Expr -> evaluator <- DataProvider   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! A [`model::DataModel`] is the unit of persistence; [`store`] defines the
//! document-store contract and two implementations of it.
//!
//! ## Example
//!
//! ```
//! use analytica::prelude::*;
//!
//! let mut model = DataModel::new("Retail", "alice");
//! model.add_table(
//!     Table::new("Sales")
//!         .with_column(Column::new("Amount", DataType::Number))
//!         .with_column(Column::new("Region", DataType::String)),
//! )?;
//! model.create_measure(Measure::new("Revenue", "SUM(Sales[Amount])"))?;
//!
//! let data = InMemoryProvider::new().with_column("Sales", "Amount", [120.0, 80.0]);
//! assert_eq!(model.evaluate_measure("Revenue", &data)?, 200.0);
//! # Ok::<(), analytica::model::ModelError>(())
//! ```

pub mod config;
pub mod formula;
pub mod model;
pub mod semantic;
pub mod store;

/// Commonly used types.
pub mod prelude {
    pub use crate::formula::{
        CellValue, DataProvider, Formula, FormulaError, FormulaErrorKind, InMemoryProvider,
        ValidationReport, Validator,
    };
    pub use crate::model::{
        Cardinality, Column, CrossFilter, DataModel, DataType, Measure, MeasureFormat,
        ModelError, QuickMeasure, Relationship, Table, TableSource,
    };
    pub use crate::semantic::inference::{infer, InferenceConfig, InferenceEngine, Suggestion};
    pub use crate::store::{FileStore, ModelStore, SqliteStore, StoreError};
}
