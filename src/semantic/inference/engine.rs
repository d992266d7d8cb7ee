//! Inference engine: applies the enabled rules to every ordered pair of
//! tables and orders the result deterministically.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::{debug, warn};

use super::rules::{default_rules, InferenceRule};
use super::{Endpoint, RelationshipKey, Suggestion};
use crate::model::Table;

/// Configuration for the inference engine.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Suggestions below this confidence are dropped
    pub min_confidence: f64,
    /// Keep only the best suggestion per endpoint pair (case-insensitive)
    pub deduplicate: bool,
    /// Names of the rules to run
    pub rules: Vec<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.0,
            deduplicate: false,
            rules: default_rules().iter().map(|r| r.name.to_string()).collect(),
        }
    }
}

impl InferenceConfig {
    /// Builder: set minimum confidence.
    pub fn with_min_confidence(mut self, threshold: f64) -> Self {
        self.min_confidence = threshold.clamp(0.0, 1.0);
        self
    }

    /// Builder: enable/disable deduplication.
    pub fn with_deduplicate(mut self, enabled: bool) -> Self {
        self.deduplicate = enabled;
        self
    }

    /// Builder: choose which rules run.
    pub fn with_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules = rules.into_iter().map(Into::into).collect();
        self
    }
}

/// The relationship inference engine.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    rules: Vec<InferenceRule>,
    config: InferenceConfig,
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self::with_config(InferenceConfig::default())
    }
}

impl InferenceEngine {
    /// Create an engine with custom configuration. Unknown rule names are
    /// logged and skipped.
    pub fn with_config(config: InferenceConfig) -> Self {
        for name in &config.rules {
            if !default_rules().iter().any(|r| r.name == name) {
                warn!(rule = %name, "unknown inference rule ignored");
            }
        }

        let rules = default_rules()
            .into_iter()
            .filter(|r| config.rules.iter().any(|name| name == r.name))
            .collect();

        Self { rules, config }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn rules(&self) -> &[InferenceRule] {
        &self.rules
    }

    /// Propose relationships between `tables`.
    ///
    /// The output depends only on the set of tables, not their order:
    /// confidence descending, then `from`, then `to`, then rule name.
    #[must_use]
    pub fn infer(&self, tables: &[Table]) -> Vec<Suggestion> {
        let mut suggestions = Vec::new();

        for from in tables {
            for to in tables {
                if from.name == to.name {
                    continue;
                }
                for rule in &self.rules {
                    for m in rule.try_match(from, to) {
                        suggestions.push(Suggestion {
                            from: Endpoint::new(&from.name, m.from_column),
                            to: Endpoint::new(&to.name, m.to_column),
                            confidence: m.confidence,
                            reason: m.reason.to_string(),
                            rule: m.rule_name.to_string(),
                        });
                    }
                }
            }
        }

        suggestions.retain(|s| s.confidence >= self.config.min_confidence);
        suggestions.sort_by(compare);

        if self.config.deduplicate {
            let mut seen: HashSet<RelationshipKey> = HashSet::new();
            suggestions.retain(|s| seen.insert(RelationshipKey::from_suggestion(s)));
        }

        debug!(tables = tables.len(), suggestions = suggestions.len(), "inferred relationships");
        suggestions
    }
}

/// Highest confidence first, then `from`, `to` and rule name ascending.
///
/// Endpoints compare as `(table, column)` tuples, not as `table.column`
/// strings: table `A` sorts before `A-B` regardless of column, although
/// `"A-B.x" < "A.x"` as text.
fn compare(a: &Suggestion, b: &Suggestion) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.from.cmp(&b.from))
        .then_with(|| a.to.cmp(&b.to))
        .then_with(|| a.rule.cmp(&b.rule))
}

/// Run the default engine.
#[must_use]
pub fn infer(tables: &[Table]) -> Vec<Suggestion> {
    InferenceEngine::default().infer(tables)
}
