//! Static pre-check for measure expressions.
//!
//! Validation is cheaper and more lenient than parsing: it checks delimiter
//! balance and looks for anything that resembles a measure. Measure creation
//! is gated on the result. With [`Validator::strict`] the real parser also
//! runs and its error is added to the report.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ast::AggregateFunc;
use super::parser::{parse_expr, ParseOptions};

/// `FUNC(` for any recognized aggregate, ignoring case.
static AGGREGATE_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(SUM|AVERAGE|COUNT|MIN|MAX|DISTINCTCOUNT)\s*\(").expect("valid regex")
});

/// `Table[Column]` or `'Table Name'[Column]`.
static COLUMN_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[A-Za-z_]\w*|'[^']*')\s*\[[^\]]*\]").expect("valid regex"));

/// Any `name(` call.
static FUNCTION_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z_]\w*)\s*\(").expect("valid regex"));

pub const UNBALANCED_PARENTHESES: &str = "Unbalanced parentheses";
pub const UNBALANCED_BRACKETS: &str = "Unbalanced brackets";
pub const UNCLOSED_QUOTE: &str = "Unclosed quote";
pub const NO_MEASURE_CONTENT: &str =
    "Expression does not use a recognized aggregate function or Table[Column] reference";

/// Outcome of validating one expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Configurable expression validator.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    strict_syntax: bool,
    parse_options: ParseOptions,
}

impl Validator {
    /// A validator that also runs the parser.
    pub fn strict() -> Self {
        Self {
            strict_syntax: true,
            ..Default::default()
        }
    }

    /// Builder: enable/disable the parser pass.
    pub fn with_strict_syntax(mut self, enabled: bool) -> Self {
        self.strict_syntax = enabled;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict_syntax
    }

    /// Builder: parser limits for the strict pass.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    /// Validate an expression.
    ///
    /// Checks run in order: parenthesis balance, bracket balance, quote
    /// closure, then the non-fatal content warnings. Only delimiter problems
    /// (and, in strict mode, parse errors) make the expression invalid.
    pub fn validate(&self, expression: &str) -> ValidationReport {
        let mut report = ValidationReport {
            valid: true,
            ..Default::default()
        };

        let scan = scan_delimiters(expression);
        if let Some(detail) = scan.paren_error {
            report.error(format!("{}: {}", UNBALANCED_PARENTHESES, detail));
        }
        if let Some(detail) = scan.bracket_error {
            report.error(format!("{}: {}", UNBALANCED_BRACKETS, detail));
        }
        if let Some(detail) = scan.quote_error {
            report.error(format!("{}: {}", UNCLOSED_QUOTE, detail));
        }

        if !AGGREGATE_CALL.is_match(expression) && !COLUMN_REF.is_match(expression) {
            report.warning(NO_MEASURE_CONTENT);
        }

        let unsupported: BTreeSet<&str> = FUNCTION_CALL
            .captures_iter(&scan.masked)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .filter(|name| AggregateFunc::parse(name).is_none())
            .collect();
        for name in unsupported {
            report.warning(format!(
                "Unsupported function '{}' will fail at evaluation",
                name
            ));
        }

        if self.strict_syntax && report.valid {
            if let Err(err) = parse_expr(expression, &self.parse_options) {
                report.error(err.to_string());
            }
        }

        report
    }
}

/// Validate with the default (non-strict) validator.
pub fn validate(expression: &str) -> ValidationReport {
    Validator::default().validate(expression)
}

struct DelimiterScan {
    paren_error: Option<String>,
    bracket_error: Option<String>,
    quote_error: Option<String>,
    /// The expression with bracket and quote contents blanked out.
    masked: String,
}

/// Single pass over the expression. Parentheses inside `[...]` or `'...'`
/// belong to names and are not counted. A quote that never closes is
/// reported, and the text after it is rescanned as ordinary characters.
fn scan_delimiters(expression: &str) -> DelimiterScan {
    let (mut scan, unclosed_quote) = scan_from(expression, None);
    if let Some(pos) = unclosed_quote {
        (scan, _) = scan_from(expression, Some(pos));
        scan.quote_error = Some(format!("quote at position {} is never closed", pos));
    }
    scan
}

/// Returns the scan and the position of a quote left open at the end.
/// `literal_quote` is a quote position to treat as an ordinary character.
fn scan_from(expression: &str, literal_quote: Option<usize>) -> (DelimiterScan, Option<usize>) {
    let mut paren_depth: usize = 0;
    let mut paren_error = None;
    let mut bracket_open: Option<usize> = None;
    let mut bracket_error = None;
    let mut quote_open: Option<usize> = None;
    let mut masked = String::with_capacity(expression.len());

    for (pos, ch) in expression.char_indices() {
        if quote_open.is_some() {
            if ch == '\'' {
                quote_open = None;
                masked.push(ch);
            } else {
                masked.push(' ');
            }
            continue;
        }
        if bracket_open.is_some() {
            match ch {
                ']' => {
                    bracket_open = None;
                    masked.push(ch);
                }
                '[' => {
                    bracket_error.get_or_insert_with(|| format!("nested '[' at position {}", pos));
                    masked.push(' ');
                }
                _ => masked.push(' '),
            }
            continue;
        }

        match ch {
            '\'' if literal_quote != Some(pos) => quote_open = Some(pos),
            '[' => bracket_open = Some(pos),
            ']' => {
                bracket_error
                    .get_or_insert_with(|| format!("']' at position {} has no matching '['", pos));
            }
            '(' => paren_depth += 1,
            ')' => {
                if paren_depth == 0 {
                    paren_error
                        .get_or_insert_with(|| format!("')' at position {} has no matching '('", pos));
                } else {
                    paren_depth -= 1;
                }
            }
            _ => {}
        }
        masked.push(ch);
    }

    if let Some(pos) = bracket_open {
        bracket_error.get_or_insert_with(|| format!("'[' at position {} is never closed", pos));
    }
    if paren_depth > 0 {
        paren_error.get_or_insert_with(|| format!("{} '(' never closed", paren_depth));
    }

    let scan = DelimiterScan {
        paren_error,
        bracket_error,
        quote_error: None,
        masked,
    };
    (scan, quote_open)
}
