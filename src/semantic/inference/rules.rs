//! Inference rules for relationship discovery.
//!
//! Each rule looks at one ordered pair of tables and reports every column
//! pair it believes is a join.

use super::thresholds;
use crate::model::Table;

/// A naming heuristic with a fixed confidence.
#[derive(Debug, Clone)]
pub struct InferenceRule {
    /// Rule identifier, as used in configuration
    pub name: &'static str,
    /// Reason attached to suggestions from this rule
    pub reason: &'static str,
    /// Confidence assigned to every match
    pub base_confidence: f64,
    matcher: RuleMatcher,
}

#[derive(Debug, Clone)]
enum RuleMatcher {
    /// Column names equal ignoring case (e.g., Orders.CustomerKey -> Customers.customerkey)
    IdenticalName,
    /// `<table>_id` in the source pointing at `id` in that table (e.g., orders.customers_id -> customers.id)
    ForeignKeyPattern,
}

/// A column pair matched by a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub from_column: String,
    pub to_column: String,
    pub confidence: f64,
    pub rule_name: &'static str,
    pub reason: &'static str,
}

impl InferenceRule {
    /// Try this rule on the ordered pair `from -> to`.
    pub fn try_match(&self, from: &Table, to: &Table) -> Vec<RuleMatch> {
        match self.matcher {
            RuleMatcher::IdenticalName => self.match_identical_name(from, to),
            RuleMatcher::ForeignKeyPattern => self.match_foreign_key_pattern(from, to),
        }
    }

    fn match_identical_name(&self, from: &Table, to: &Table) -> Vec<RuleMatch> {
        let mut matches = vec![];

        for from_col in &from.columns {
            let from_lower = from_col.name.to_lowercase();
            for to_col in &to.columns {
                if to_col.name.to_lowercase() == from_lower {
                    matches.push(self.matched(&from_col.name, &to_col.name));
                }
            }
        }

        matches
    }

    fn match_foreign_key_pattern(&self, from: &Table, to: &Table) -> Vec<RuleMatch> {
        // The target key is matched literally.
        if !to.has_column("id") {
            return vec![];
        }

        let expected = format!("{}_id", to.name.to_lowercase());
        from.columns
            .iter()
            .filter(|col| col.name.to_lowercase() == expected)
            .map(|col| self.matched(&col.name, "id"))
            .collect()
    }

    fn matched(&self, from_column: &str, to_column: &str) -> RuleMatch {
        RuleMatch {
            from_column: from_column.to_string(),
            to_column: to_column.to_string(),
            confidence: self.base_confidence,
            rule_name: self.name,
            reason: self.reason,
        }
    }
}

/// Returns the default set of inference rules.
pub fn default_rules() -> Vec<InferenceRule> {
    vec![
        InferenceRule {
            name: "identical_name",
            reason: "identical column names",
            base_confidence: thresholds::confidence::IDENTICAL_NAME,
            matcher: RuleMatcher::IdenticalName,
        },
        InferenceRule {
            name: "foreign_key_pattern",
            reason: "foreign-key naming pattern",
            base_confidence: thresholds::confidence::FOREIGN_KEY_PATTERN,
            matcher: RuleMatcher::ForeignKeyPattern,
        },
    ]
}
