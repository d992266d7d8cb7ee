//! Error types for the measure formula language.
//!
//! Every failure surfaced by the lexer, parser or evaluator is a
//! [`FormulaError`]. Callers that need to branch on the failure class use
//! [`FormulaError::kind`] instead of matching message text.

use std::fmt;

use thiserror::Error;

/// Byte range into the formula source.
pub type Span = std::ops::Range<usize>;

/// Result type for formula operations.
pub type FormulaResult<T> = Result<T, FormulaError>;

/// What an unresolved name was expected to refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Function,
    Table,
    Column,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Function => write!(f, "function"),
            ReferenceKind::Table => write!(f, "table"),
            ReferenceKind::Column => write!(f, "column"),
        }
    }
}

/// Errors raised while parsing or evaluating a formula.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    /// Malformed token stream, unbalanced parentheses or brackets.
    #[error("Syntax error at {span:?}: {message}")]
    Syntax { message: String, span: Span },

    /// A function, table or column name that does not resolve.
    #[error("Unknown {kind}: '{name}'")]
    UnknownReference { kind: ReferenceKind, name: String },

    /// A value that cannot be read as a number where one is required.
    #[error("Type mismatch in {function}({table}[{column}]): value '{value}' is not numeric")]
    TypeMismatch {
        function: String,
        table: String,
        column: String,
        value: String,
    },

    /// An explicit division by zero, or an average over zero rows.
    #[error("Division by zero: {context}")]
    DivisionByZero { context: String },

    /// MIN or MAX over a column with no rows.
    #[error("{function}({table}[{column}]) has no rows to aggregate")]
    EmptyAggregate {
        function: String,
        table: String,
        column: String,
    },

    /// An aggregate or operator produced infinity or NaN.
    #[error("Result is not a finite number: {context}")]
    NonFinite { context: String },

    /// The data provider failed for a reason other than a missing reference.
    #[error("Data provider error: {0}")]
    Provider(String),
}

/// Discriminant of a [`FormulaError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaErrorKind {
    Syntax,
    UnknownReference,
    TypeMismatch,
    DivisionByZero,
    EmptyAggregate,
    NonFinite,
    Provider,
}

impl fmt::Display for FormulaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormulaErrorKind::Syntax => "syntax",
            FormulaErrorKind::UnknownReference => "unknown-reference",
            FormulaErrorKind::TypeMismatch => "type-mismatch",
            FormulaErrorKind::DivisionByZero => "division-by-zero",
            FormulaErrorKind::EmptyAggregate => "empty-aggregate",
            FormulaErrorKind::NonFinite => "non-finite",
            FormulaErrorKind::Provider => "provider",
        };
        f.write_str(name)
    }
}

impl FormulaError {
    pub(crate) fn syntax(message: impl Into<String>, span: Span) -> Self {
        FormulaError::Syntax {
            message: message.into(),
            span,
        }
    }

    pub(crate) fn unknown(kind: ReferenceKind, name: impl Into<String>) -> Self {
        FormulaError::UnknownReference {
            kind,
            name: name.into(),
        }
    }

    /// The error class, for callers that branch on it.
    pub fn kind(&self) -> FormulaErrorKind {
        match self {
            FormulaError::Syntax { .. } => FormulaErrorKind::Syntax,
            FormulaError::UnknownReference { .. } => FormulaErrorKind::UnknownReference,
            FormulaError::TypeMismatch { .. } => FormulaErrorKind::TypeMismatch,
            FormulaError::DivisionByZero { .. } => FormulaErrorKind::DivisionByZero,
            FormulaError::EmptyAggregate { .. } => FormulaErrorKind::EmptyAggregate,
            FormulaError::NonFinite { .. } => FormulaErrorKind::NonFinite,
            FormulaError::Provider(_) => FormulaErrorKind::Provider,
        }
    }

    /// Source location, for errors that have one.
    pub fn span(&self) -> Option<&Span> {
        match self {
            FormulaError::Syntax { span, .. } => Some(span),
            _ => None,
        }
    }
}
