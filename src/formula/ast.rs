//! Expression tree for parsed formulas.

use std::collections::HashSet;
use std::fmt;

/// Aggregate functions available in measure formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunc {
    Sum,
    Average,
    Count,
    Min,
    Max,
    DistinctCount,
}

impl AggregateFunc {
    /// Every supported function, in documentation order.
    pub const ALL: [AggregateFunc; 6] = [
        AggregateFunc::Sum,
        AggregateFunc::Average,
        AggregateFunc::Count,
        AggregateFunc::Min,
        AggregateFunc::Max,
        AggregateFunc::DistinctCount,
    ];

    /// Resolve a function name, ignoring case.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    /// Canonical (upper-case) function name.
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Average => "AVERAGE",
            AggregateFunc::Count => "COUNT",
            AggregateFunc::Min => "MIN",
            AggregateFunc::Max => "MAX",
            AggregateFunc::DistinctCount => "DISTINCTCOUNT",
        }
    }

    /// Whether every input value must coerce to a number.
    pub fn requires_numeric(&self) -> bool {
        matches!(
            self,
            AggregateFunc::Sum | AggregateFunc::Average | AggregateFunc::Min | AggregateFunc::Max
        )
    }
}

impl fmt::Display for AggregateFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// A `Table[Column]` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bare = self
            .table
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && self.table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if bare {
            write!(f, "{}[{}]", self.table, self.column)
        } else {
            write!(f, "'{}'[{}]", self.table, self.column)
        }
    }
}

/// Formula expression AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),

    /// `FUNC(Table[Column])`
    Aggregate { func: AggregateFunc, column: ColumnRef },

    /// Unary minus
    Negate(Box<Expr>),

    /// Binary arithmetic
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn aggregate(func: AggregateFunc, table: impl Into<String>, column: impl Into<String>) -> Self {
        Expr::Aggregate {
            func,
            column: ColumnRef::new(table, column),
        }
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Visit every column reference in left-to-right order.
    pub fn walk_references<'a>(&'a self, visit: &mut impl FnMut(&'a ColumnRef)) {
        match self {
            Expr::Number(_) => {}
            Expr::Aggregate { column, .. } => visit(column),
            Expr::Negate(inner) => inner.walk_references(visit),
            Expr::Binary { left, right, .. } => {
                left.walk_references(visit);
                right.walk_references(visit);
            }
        }
    }

    /// Distinct column references, in order of first appearance.
    pub fn distinct_references(&self) -> Vec<&ColumnRef> {
        let mut seen = HashSet::new();
        let mut refs = Vec::new();
        self.walk_references(&mut |r| {
            if seen.insert(r) {
                refs.push(r);
            }
        });
        refs
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Aggregate { func, column } => write!(f, "{}({})", func, column),
            Expr::Negate(inner) => write!(f, "-{}", inner),
            Expr::Binary { left, op, right } => write!(f, "({} {} {})", left, op.symbol(), right),
        }
    }
}
