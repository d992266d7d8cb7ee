//! Parser for measure formulas using chumsky.
//!
//! Consumes the token stream produced by the lexer. Grammar (lowest to
//! highest precedence):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := '-' unary | primary
//! primary := NUMBER | '(' expr ')' | FUNC '(' table COLUMN ')'
//! table   := IDENT | QUOTED_NAME
//! ```
//!
//! Operators within a level associate to the left. Nesting of parentheses
//! and unary minus is bounded by [`ParseOptions::max_depth`]; the token
//! stream is checked against the limit before the recursive grammar runs.

use chumsky::error::RichReason;
use chumsky::input::{Input, ValueInput};
use chumsky::prelude::*;

use super::ast::{AggregateFunc, BinaryOp, ColumnRef, Expr};
use super::error::{FormulaError, FormulaResult, ReferenceKind, Span};
use super::lexer::{lex_spanned, Token};

/// Default nesting limit for parentheses and unary minus.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Parser limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum nesting of parentheses and unary minus.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Grammar output. Function names resolve only once a call is well formed,
/// so an unknown function in a valid call surfaces here rather than as a
/// parse error.
type Built = FormulaResult<Expr>;

fn to_span(span: SimpleSpan) -> Span {
    span.start..span.end
}

/// Parse formula source into an expression tree.
pub fn parse_expr(source: &str, options: &ParseOptions) -> FormulaResult<Expr> {
    let tokens = lex_spanned(source)?;
    if tokens.is_empty() {
        return Err(FormulaError::syntax("empty formula", 0..source.len()));
    }
    check_nesting(&tokens, options.max_depth)?;

    let len = source.len();
    let eoi: SimpleSpan = (len..len).into();
    let token_stream = tokens
        .as_slice()
        .map(eoi, |(tok, span): &(Token<'_>, SimpleSpan)| (tok, span));
    let (built, errs) = parser().parse(token_stream).into_output_errors();

    if let Some(err) = errs.into_iter().next() {
        return Err(FormulaError::syntax(describe_parse_error(&err), to_span(*err.span())));
    }

    built.unwrap_or_else(|| Err(FormulaError::syntax("could not parse formula", 0..len)))
}

/// Create the formula parser.
///
/// Generic over any `ValueInput` yielding [`Token`]s with `SimpleSpan`s.
pub fn parser<'tokens, 'src: 'tokens, I>(
) -> impl Parser<'tokens, I, Built, extra::Err<Rich<'tokens, Token<'src>, SimpleSpan>>>
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = SimpleSpan>,
{
    recursive(|expr| {
        let number = select! {
            Token::Number(text) => text,
        }
        .labelled("number")
        .try_map(|text, span| match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Built::Ok(Expr::Number(value))),
            _ => Err(Rich::custom(span, format!("number '{}' is out of range", text))),
        });

        let table = select! {
            Token::Ident(name) => name.to_string(),
            Token::QuotedName(name) => name.to_string(),
        }
        .labelled("table name");

        let column = select! {
            Token::Column(name) => name,
        }
        .labelled("[column]")
        .try_map(|name, span| {
            if name.trim().is_empty() {
                Err(Rich::custom(span, "empty column name"))
            } else {
                Ok(name.to_string())
            }
        });

        let column_ref = table
            .then(column)
            .map(|(table, column)| ColumnRef { table, column });

        let call = select! {
            Token::Ident(name) => name,
        }
        .labelled("aggregate function")
        .map_with(|name, e| (name, e.span()))
        .then(
            column_ref
                .clone()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        )
        .map(|((name, name_span), column)| -> Built {
            let func = AggregateFunc::parse(name).ok_or_else(|| {
                tracing::debug!(function = name, span = ?to_span(name_span), "unknown aggregate function");
                FormulaError::unknown(ReferenceKind::Function, name)
            })?;
            Ok(Expr::Aggregate { func, column })
        });

        // Table[Column] outside a call.
        let bare_column = column_ref.try_map(|column, span| {
            Err::<Built, _>(Rich::custom(
                span,
                format!("column reference {} must be wrapped in an aggregate function", column),
            ))
        });

        let group = expr.delimited_by(just(Token::LParen), just(Token::RParen));

        let atom = choice((number, call, bare_column, group));

        let unary = just(Token::Minus)
            .repeated()
            .foldr(atom, |_, operand: Built| operand.map(|e| Expr::Negate(Box::new(e))));

        let product_op = select! {
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
        };
        let product = unary
            .clone()
            .foldl(product_op.then(unary).repeated(), combine);

        let sum_op = select! {
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
        };
        product
            .clone()
            .foldl(sum_op.then(product).repeated(), combine)
    })
    .then_ignore(end())
}

fn combine(left: Built, (op, right): (BinaryOp, Built)) -> Built {
    Ok(Expr::binary(left?, op, right?))
}

fn describe_parse_error(err: &Rich<'_, Token<'_>, SimpleSpan>) -> String {
    if let RichReason::Custom(message) = err.reason() {
        return message.clone();
    }
    match err.found() {
        Some(tok) => format!("unexpected '{}'", tok),
        None => "unexpected end of formula".to_string(),
    }
}

enum Frame {
    Group,
    Call,
    Negate,
}

/// Check parenthesis balance and nesting depth over the raw tokens.
///
/// Groups and prefix minus count toward the depth; the parentheses of an
/// aggregate call do not.
fn check_nesting(tokens: &[(Token<'_>, SimpleSpan)], max_depth: usize) -> FormulaResult<()> {
    let mut frames: Vec<(Frame, SimpleSpan)> = Vec::new();
    let mut depth = 0usize;
    let mut prev: Option<&Token<'_>> = None;

    for (tok, span) in tokens {
        match tok {
            Token::Minus if is_prefix_position(prev) => {
                enter(&mut depth, max_depth, *span)?;
                frames.push((Frame::Negate, *span));
            }
            Token::LParen => {
                if matches!(prev, Some(Token::Ident(_))) {
                    frames.push((Frame::Call, *span));
                } else {
                    enter(&mut depth, max_depth, *span)?;
                    frames.push((Frame::Group, *span));
                }
            }
            Token::RParen => {
                close_negations(&mut frames, &mut depth);
                match frames.pop() {
                    Some((Frame::Group, _)) => depth -= 1,
                    Some((Frame::Call, _)) => {}
                    _ => {
                        return Err(FormulaError::syntax(
                            "unbalanced ')' without matching '('",
                            to_span(*span),
                        ))
                    }
                }
                close_negations(&mut frames, &mut depth);
            }
            Token::Number(_) => close_negations(&mut frames, &mut depth),
            _ => {}
        }
        prev = Some(tok);
    }

    match frames
        .iter()
        .rev()
        .find(|(frame, _)| !matches!(frame, Frame::Negate))
    {
        Some((_, span)) => Err(FormulaError::syntax(
            "unbalanced '(' is never closed",
            to_span(*span),
        )),
        None => Ok(()),
    }
}

fn enter(depth: &mut usize, max_depth: usize, span: SimpleSpan) -> FormulaResult<()> {
    *depth += 1;
    if *depth > max_depth {
        return Err(FormulaError::syntax(
            format!("expression nested deeper than {} levels", max_depth),
            to_span(span),
        ));
    }
    Ok(())
}

/// Pop the prefix minus frames whose operand just ended.
fn close_negations(frames: &mut Vec<(Frame, SimpleSpan)>, depth: &mut usize) {
    while matches!(frames.last(), Some((Frame::Negate, _))) {
        frames.pop();
        *depth -= 1;
    }
}

fn is_prefix_position(prev: Option<&Token<'_>>) -> bool {
    matches!(
        prev,
        None | Some(Token::LParen | Token::Plus | Token::Minus | Token::Star | Token::Slash | Token::Comma)
    )
}
