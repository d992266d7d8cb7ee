//! Formula evaluation over provider-supplied column data.
//!
//! Evaluation runs in two phases: every distinct `Table[Column]` in the tree
//! is fetched from the provider first, so an unresolved reference fails
//! before any arithmetic happens; then the tree is folded bottom-up.

use std::collections::{HashMap, HashSet};

use super::ast::{AggregateFunc, BinaryOp, ColumnRef, Expr};
use super::error::{FormulaError, FormulaResult};
use super::provider::{CellValue, DataProvider};

/// Evaluate a parsed expression against a data provider.
pub fn evaluate_expr<P>(expr: &Expr, provider: &P) -> FormulaResult<f64>
where
    P: DataProvider + ?Sized,
{
    let refs = expr.distinct_references();
    let mut columns: HashMap<&ColumnRef, Vec<CellValue>> = HashMap::with_capacity(refs.len());
    for r in refs {
        let values = provider.get_column(&r.table, &r.column)?;
        columns.insert(r, values);
    }

    eval(expr, &columns)
}

fn eval(expr: &Expr, columns: &HashMap<&ColumnRef, Vec<CellValue>>) -> FormulaResult<f64> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Aggregate { func, column } => {
            // Every reference was fetched in the resolution pass.
            let values = columns.get(column).map(Vec::as_slice).unwrap_or_default();
            aggregate(*func, column, values)
        }
        Expr::Negate(inner) => Ok(-eval(inner, columns)?),
        Expr::Binary { left, op, right } => {
            let l = eval(left, columns)?;
            let r = eval(right, columns)?;
            let context = || format!("{} {} {}", left, op.symbol(), right);
            let value = match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                BinaryOp::Div => {
                    if r == 0.0 {
                        return Err(FormulaError::DivisionByZero { context: context() });
                    }
                    l / r
                }
            };
            ensure_finite(value, context)
        }
    }
}

/// Apply one aggregate function to a column's raw values.
pub fn aggregate(func: AggregateFunc, column: &ColumnRef, values: &[CellValue]) -> FormulaResult<f64> {
    if !func.requires_numeric() {
        return Ok(match func {
            AggregateFunc::DistinctCount => {
                let distinct: HashSet<String> = values.iter().map(CellValue::canonical_string).collect();
                distinct.len() as f64
            }
            _ => values.len() as f64,
        });
    }

    let numbers = numeric_values(func, column, values)?;
    let value = match func {
        AggregateFunc::Sum => numbers.iter().sum(),
        AggregateFunc::Average => mean(&numbers).ok_or_else(|| FormulaError::DivisionByZero {
            context: format!("{}({}) over zero rows", func, column),
        })?,
        AggregateFunc::Min => numbers
            .into_iter()
            .reduce(f64::min)
            .ok_or_else(|| empty_aggregate(func, column))?,
        _ => numbers
            .into_iter()
            .reduce(f64::max)
            .ok_or_else(|| empty_aggregate(func, column))?,
    };
    ensure_finite(value, || format!("{}({})", func, column))
}

/// Running mean; stays finite whenever every input is finite.
fn mean(numbers: &[f64]) -> Option<f64> {
    if numbers.is_empty() {
        return None;
    }
    let mut mean = 0.0;
    for (i, x) in numbers.iter().enumerate() {
        let n = (i + 1) as f64;
        mean += x / n - mean / n;
    }
    Some(mean)
}

fn ensure_finite(value: f64, context: impl FnOnce() -> String) -> FormulaResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormulaError::NonFinite { context: context() })
    }
}

/// Coerce every value; the first failure rejects the whole aggregate.
fn numeric_values(func: AggregateFunc, column: &ColumnRef, values: &[CellValue]) -> FormulaResult<Vec<f64>> {
    values
        .iter()
        .map(|v| {
            v.as_number().ok_or_else(|| FormulaError::TypeMismatch {
                function: func.name().to_string(),
                table: column.table.clone(),
                column: column.column.clone(),
                value: v.to_string(),
            })
        })
        .collect()
}

fn empty_aggregate(func: AggregateFunc, column: &ColumnRef) -> FormulaError {
    FormulaError::EmptyAggregate {
        function: func.name().to_string(),
        table: column.table.clone(),
        column: column.column.clone(),
    }
}
