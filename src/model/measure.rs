// src/model/measure.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{ElementKind, ModelError, ModelResult};
use super::types::MeasureFormat;
use super::DataModel;
use crate::formula::{
    ColumnRef, DataProvider, Formula, FormulaError, ParseOptions, ReferenceKind, ValidationReport,
    Validator,
};

/// A named, reusable formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    pub name: String,
    /// Formula source text.
    pub expression: String,
    #[serde(default)]
    pub format: MeasureFormat,
    #[serde(default)]
    pub description: String,
}

impl Measure {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            format: MeasureFormat::default(),
            description: String::new(),
        }
    }

    pub fn with_format(mut self, format: MeasureFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Canned measure templates over a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuickMeasure {
    Total,
    Average,
    Count,
    DistinctCount,
    Minimum,
    Maximum,
    /// Change of `col` relative to `col_previous`.
    PercentChange,
}

impl QuickMeasure {
    pub const ALL: [QuickMeasure; 7] = [
        QuickMeasure::Total,
        QuickMeasure::Average,
        QuickMeasure::Count,
        QuickMeasure::DistinctCount,
        QuickMeasure::Minimum,
        QuickMeasure::Maximum,
        QuickMeasure::PercentChange,
    ];

    /// Formula text for `table[column]`.
    pub fn expression(&self, table: &str, column: &str) -> String {
        let current = ColumnRef::new(table, column);
        match self {
            QuickMeasure::Total => format!("SUM({})", current),
            QuickMeasure::Average => format!("AVERAGE({})", current),
            QuickMeasure::Count => format!("COUNT({})", current),
            QuickMeasure::DistinctCount => format!("DISTINCTCOUNT({})", current),
            QuickMeasure::Minimum => format!("MIN({})", current),
            QuickMeasure::Maximum => format!("MAX({})", current),
            QuickMeasure::PercentChange => {
                let previous = ColumnRef::new(table, format!("{}_previous", column));
                format!(
                    "(SUM({cur}) - SUM({prev})) / SUM({prev})",
                    cur = current,
                    prev = previous
                )
            }
        }
    }

    /// Display format the generated measure gets.
    pub fn format(&self) -> MeasureFormat {
        match self {
            QuickMeasure::PercentChange => MeasureFormat::Percent,
            _ => MeasureFormat::Number,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            QuickMeasure::Total => "total",
            QuickMeasure::Average => "average",
            QuickMeasure::Count => "count",
            QuickMeasure::DistinctCount => "distinct-count",
            QuickMeasure::Minimum => "minimum",
            QuickMeasure::Maximum => "maximum",
            QuickMeasure::PercentChange => "percent-change",
        }
    }
}

impl fmt::Display for QuickMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QuickMeasure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        QuickMeasure::ALL
            .into_iter()
            .find(|q| q.label() == wanted)
            .ok_or_else(|| format!("unknown quick measure '{}'", s))
    }
}

impl DataModel {
    /// Validate and store a measure with the default validator.
    ///
    /// On success the validator's report is returned so its warnings can be
    /// shown. On failure nothing is stored and the errors are returned.
    pub fn create_measure(&mut self, measure: Measure) -> ModelResult<ValidationReport> {
        self.create_measure_with(measure, &Validator::default())
    }

    pub fn create_measure_with(
        &mut self,
        measure: Measure,
        validator: &Validator,
    ) -> ModelResult<ValidationReport> {
        if self.measures.iter().any(|m| m.name == measure.name) {
            return Err(ModelError::DuplicateMeasure(measure.name));
        }

        let report = validator.validate(&measure.expression);
        if !report.valid {
            return Err(ModelError::InvalidMeasure {
                errors: report.errors,
            });
        }

        debug!(
            model = %self.id,
            measure = %measure.name,
            warnings = report.warnings.len(),
            "created measure"
        );
        self.measures.push(measure);
        self.touch();
        Ok(report)
    }

    /// Generate and store a quick measure named `name`.
    pub fn add_quick_measure(
        &mut self,
        name: impl Into<String>,
        kind: QuickMeasure,
        table: &str,
        column: &str,
    ) -> ModelResult<ValidationReport> {
        let measure = Measure::new(name, kind.expression(table, column))
            .with_format(kind.format())
            .with_description(format!("{} of {}[{}]", kind, table, column));
        self.create_measure(measure)
    }

    pub fn get_measure(&self, name: &str) -> ModelResult<&Measure> {
        self.measures
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| ModelError::not_found(ElementKind::Measure, name))
    }

    pub fn remove_measure(&mut self, name: &str) -> ModelResult<Measure> {
        let index = self
            .measures
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| ModelError::not_found(ElementKind::Measure, name))?;
        let measure = self.measures.remove(index);
        debug!(model = %self.id, measure = name, "removed measure");
        self.touch();
        Ok(measure)
    }

    /// Evaluate a stored measure.
    ///
    /// Every `Table[Column]` must exist in this model's registry before the
    /// provider is consulted.
    pub fn evaluate_measure<P>(&self, name: &str, provider: &P) -> ModelResult<f64>
    where
        P: DataProvider + ?Sized,
    {
        self.evaluate_measure_with(name, provider, &ParseOptions::default())
    }

    pub fn evaluate_measure_with<P>(
        &self,
        name: &str,
        provider: &P,
        options: &ParseOptions,
    ) -> ModelResult<f64>
    where
        P: DataProvider + ?Sized,
    {
        let measure = self.get_measure(name)?;
        let formula = Formula::parse_with(&measure.expression, options)?;

        for reference in formula.references() {
            let table = self
                .get_table(&reference.table)
                .map_err(|_| FormulaError::UnknownReference {
                    kind: ReferenceKind::Table,
                    name: reference.table.clone(),
                })?;
            if !table.has_column(&reference.column) {
                return Err(FormulaError::UnknownReference {
                    kind: ReferenceKind::Column,
                    name: format!("{}[{}]", reference.table, reference.column),
                }
                .into());
            }
        }

        Ok(formula.evaluate(provider)?)
    }
}
