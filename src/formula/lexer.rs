//! Lexer for the measure formula language.
//!
//! Converts formula source text into a sequence of tokens with span
//! information. Bracketed column names (`[Unit Price]`) and quoted table
//! names (`'Sales Data'`) are single tokens so that names with spaces never
//! reach the parser.

use chumsky::prelude::*;

use super::error::{FormulaError, FormulaResult, Span};

/// A token in a formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    /// A bare identifier: a function name or an unquoted table name.
    Ident(&'src str),
    /// A single-quoted table name (contents without quotes).
    QuotedName(&'src str),
    /// A bracketed column name (contents without brackets).
    Column(&'src str),
    /// A numeric literal.
    Number(&'src str),

    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `,`
    Comma,
}

impl<'src> std::fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "{}", s),
            Token::QuotedName(s) => write!(f, "'{}'", s),
            Token::Column(s) => write!(f, "[{}]", s),
            Token::Number(s) => write!(f, "{}", s),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Comma => write!(f, ","),
        }
    }
}

/// Create a lexer for formulas.
///
/// Returns a parser that tokenizes the input string into a sequence of
/// tokens with span information, skipping whitespace.
pub fn lexer<'src>(
) -> impl Parser<'src, &'src str, Vec<(Token<'src>, SimpleSpan)>, extra::Err<Rich<'src, char>>> {
    let ident = text::ident().map(Token::Ident);

    // 'Table Name'
    let quoted = just('\'')
        .ignore_then(none_of('\'').repeated().to_slice())
        .then_ignore(just('\''))
        .map(Token::QuotedName);

    // [Column Name]
    let column = just('[')
        .ignore_then(none_of("[]").repeated().to_slice())
        .then_ignore(just(']'))
        .map(Token::Column);

    let number = text::digits(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .map(Token::Number);

    let symbol = choice((
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Star),
        just('/').to(Token::Slash),
        just(',').to(Token::Comma),
    ));

    let token = choice((ident, quoted, column, number, symbol)).map_with(|tok, e| (tok, e.span()));

    token
        .padded()
        .repeated()
        .collect()
        .padded()
        .then_ignore(end())
}

/// Lex a formula into tokens with byte spans.
///
/// The first lexical error is reported as [`FormulaError::Syntax`].
pub fn lex(source: &str) -> FormulaResult<Vec<(Token<'_>, Span)>> {
    Ok(lex_spanned(source)?
        .into_iter()
        .map(|(tok, span)| (tok, span.start..span.end))
        .collect())
}

/// Like [`lex`], keeping chumsky spans for the token-level parser.
pub(crate) fn lex_spanned(source: &str) -> FormulaResult<Vec<(Token<'_>, SimpleSpan)>> {
    let (tokens, errs) = lexer().parse(source).into_output_errors();

    if let Some(err) = errs.into_iter().next() {
        let span = err.span();
        return Err(FormulaError::syntax(
            describe_lex_error(source, span.start..span.end, &err.to_string()),
            span.start..span.end,
        ));
    }

    Ok(tokens.unwrap_or_default())
}

/// Prefer a targeted message for the common unclosed-delimiter cases.
fn describe_lex_error(source: &str, span: Span, fallback: &str) -> String {
    let before = &source[..span.start.min(source.len())];
    let open_brackets = before.matches('[').count();
    let close_brackets = before.matches(']').count();
    if open_brackets > close_brackets {
        return "unclosed '[' in column reference".to_string();
    }
    if source[span.start.min(source.len())..].starts_with(']') {
        return "unexpected ']' without matching '['".to_string();
    }
    if before.matches('\'').count() % 2 == 1 {
        return "unclosed quote in table name".to_string();
    }
    fallback.to_string()
}
