//! Measure formula language.
//!
//! A closed, non-Turing-complete subset of a BI formula dialect:
//!
//! - **Aggregate calls**: `SUM`, `AVERAGE`, `COUNT`, `MIN`, `MAX` and
//!   `DISTINCTCOUNT` applied to a single `Table[Column]`
//! - **Arithmetic**: numeric literals, unary minus, `+ - * /` with the usual
//!   precedence, and parentheses
//!
//! Formulas are tokenized by the [`lexer`], parsed into an [`Expr`] tree by
//! the [`parser`], and evaluated by folding that tree over column vectors
//! pulled from a [`DataProvider`]. There is no other execution path.
//!
//! # Example
//!
//! ```
//! use analytica::formula::{Formula, InMemoryProvider};
//!
//! let provider = InMemoryProvider::new()
//!     .with_column("Sales", "Amount", [100.0, 250.0])
//!     .with_column("Sales", "Tax", [10.0, 25.0]);
//!
//! let formula = Formula::parse("SUM(Sales[Amount]) + SUM(Sales[Tax])").unwrap();
//! assert_eq!(formula.evaluate(&provider).unwrap(), 385.0);
//! ```

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod provider;
pub mod validate;

pub use ast::{AggregateFunc, BinaryOp, ColumnRef, Expr};
pub use error::{FormulaError, FormulaErrorKind, FormulaResult, ReferenceKind, Span};
pub use parser::{ParseOptions, DEFAULT_MAX_DEPTH};
pub use provider::{CellValue, DataProvider, InMemoryProvider, ProviderError, ProviderLoadError};
pub use validate::{validate, ValidationReport, Validator};

/// A parsed formula together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parse with default limits.
    pub fn parse(source: &str) -> FormulaResult<Self> {
        Self::parse_with(source, &ParseOptions::default())
    }

    /// Parse with explicit limits.
    pub fn parse_with(source: &str, options: &ParseOptions) -> FormulaResult<Self> {
        let expr = parser::parse_expr(source, options)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Distinct column references, in order of first appearance.
    pub fn references(&self) -> Vec<&ColumnRef> {
        self.expr.distinct_references()
    }

    /// Evaluate against a data provider.
    pub fn evaluate<P>(&self, provider: &P) -> FormulaResult<f64>
    where
        P: DataProvider + ?Sized,
    {
        eval::evaluate_expr(&self.expr, provider)
    }
}

/// Parse and evaluate formula text in one step.
pub fn evaluate<P>(source: &str, provider: &P) -> FormulaResult<f64>
where
    P: DataProvider + ?Sized,
{
    Formula::parse(source)?.evaluate(provider)
}
