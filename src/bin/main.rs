//! Analytica CLI - inspect and evaluate stored semantic models
//!
//! Usage:
//!   analytica validate <expression> [--strict]
//!   analytica import <model.json>
//!   analytica list [--owner <owner>]
//!   analytica show <id>
//!   analytica infer <id> [--accept <n>...]
//!   analytica check <id>
//!   analytica eval <id> <measure> --data <data.json>
//!   analytica delete <id>
//!
//! The store location comes from analytica.toml (see `Settings::load`).

use analytica::config::Settings;
use analytica::formula::{FormulaError, InMemoryProvider, Span};
use analytica::model::{Cardinality, CrossFilter, DataModel, ModelError};
use analytica::semantic::InferenceEngine;
use analytica::store::{open_store, ModelStore};
use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "analytica")]
#[command(about = "Analytica - semantic data models, relationship inference and measures")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a measure expression without storing it
    Validate {
        expression: String,

        /// Also run the full parser
        #[arg(long)]
        strict: bool,
    },

    /// Store a model document read from a JSON file
    Import {
        file: PathBuf,
    },

    /// List stored models, newest first
    List {
        #[arg(short, long)]
        owner: Option<String>,
    },

    /// Print a model's tables, relationships and measures
    Show {
        id: String,
    },

    /// Suggest relationships for a model
    Infer {
        id: String,

        /// Commit the suggestion at this position (repeatable)
        #[arg(short, long)]
        accept: Vec<usize>,

        #[arg(long, default_value = "many-to-one")]
        cardinality: Cardinality,

        #[arg(long, default_value = "single")]
        cross_filter: CrossFilter,
    },

    /// Report advisory integrity findings and relationship cycles
    Check {
        id: String,
    },

    /// Evaluate a stored measure against column data
    Eval {
        id: String,
        measure: String,

        /// JSON file of the form {"Table": {"Column": [values...]}}
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Delete a stored model
    Delete {
        id: String,
    },
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Commands::Validate { expression, strict } = &cli.command {
        return cmd_validate(&settings, expression, *strict);
    }

    let store = match open_store(&settings.store) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error opening store: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let store = store.as_ref();

    match cli.command {
        Commands::Validate { .. } => ExitCode::SUCCESS,
        Commands::Import { file } => cmd_import(store, file),
        Commands::List { owner } => cmd_list(store, owner.as_deref()),
        Commands::Show { id } => with_model(store, &id, cmd_show),
        Commands::Infer {
            id,
            accept,
            cardinality,
            cross_filter,
        } => cmd_infer(&settings, store, &id, &accept, cardinality, cross_filter),
        Commands::Check { id } => with_model(store, &id, cmd_check),
        Commands::Eval { id, measure, data } => cmd_eval(&settings, store, &id, &measure, data),
        Commands::Delete { id } => cmd_delete(store, &id),
    }
}

fn init_logging() {
    let default_level = "warn";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_model(store: &dyn ModelStore, id: &str) -> Option<DataModel> {
    match store.load_required(id) {
        Ok(model) => Some(model),
        Err(e) => {
            eprintln!("Error loading model: {}", e);
            None
        }
    }
}

fn with_model(store: &dyn ModelStore, id: &str, f: fn(&DataModel) -> ExitCode) -> ExitCode {
    match load_model(store, id) {
        Some(model) => f(&model),
        None => ExitCode::FAILURE,
    }
}

fn cmd_validate(settings: &Settings, expression: &str, strict: bool) -> ExitCode {
    let validator = settings
        .validator()
        .with_strict_syntax(strict || settings.validation.strict_syntax);
    let report = validator.validate(expression);

    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    if report.valid {
        println!("OK: expression is valid");
        return ExitCode::SUCCESS;
    }

    for error in &report.errors {
        eprintln!("error: {}", error);
    }
    if validator.is_strict() {
        if let Err(e) = analytica::formula::Formula::parse_with(expression, &settings.formula.parse_options()) {
            render_formula_error(expression, &e);
        }
    }
    ExitCode::FAILURE
}

fn cmd_import(store: &dyn ModelStore, file: PathBuf) -> ExitCode {
    let content = match fs::read_to_string(&file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let document: DataModel = match serde_json::from_str(&content) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error parsing model '{}': {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let model = match document.rebuild() {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Rejected model '{}': {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match store.save(&model) {
        Ok(()) => {
            println!("Imported {} ({})", model.name, model.id);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error saving model: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_list(store: &dyn ModelStore, owner: Option<&str>) -> ExitCode {
    let summaries = match store.list(owner) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error listing models: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if summaries.is_empty() {
        println!("No models stored.");
        return ExitCode::SUCCESS;
    }

    for s in &summaries {
        println!(
            "{}  {}  ({} tables, owner {}, updated {})",
            s.id,
            s.name,
            s.table_count,
            s.owner,
            s.updated_at.to_rfc3339()
        );
    }
    ExitCode::SUCCESS
}

fn cmd_show(model: &DataModel) -> ExitCode {
    println!("Model: {} ({})", model.name, model.id);
    println!("Owner: {}", model.owner);
    println!();

    if !model.tables.is_empty() {
        println!("Tables:");
        for table in &model.tables {
            println!("  - {} ({} rows, source: {})", table.name, table.row_count, table.source);
            for col in &table.columns {
                let mut flags = Vec::new();
                if col.is_key {
                    flags.push("key".to_string());
                }
                if let Some(target) = &col.references {
                    flags.push(format!("-> {}", target));
                }
                println!("      {}: {} {}", col.name, col.dtype, flags.join(" "));
            }
        }
        println!();
    }

    if !model.relationships.is_empty() {
        println!("Relationships:");
        for rel in &model.relationships {
            println!("  - [{}] {}", rel.id, rel);
        }
        println!();
    }

    if model.measures.is_empty() {
        println!("No measures defined.");
    } else {
        println!("Measures:");
        for measure in &model.measures {
            println!("  - {} = {} ({})", measure.name, measure.expression, measure.format);
        }
    }

    ExitCode::SUCCESS
}

fn cmd_infer(
    settings: &Settings,
    store: &dyn ModelStore,
    id: &str,
    accept: &[usize],
    cardinality: Cardinality,
    cross_filter: CrossFilter,
) -> ExitCode {
    let Some(mut model) = load_model(store, id) else {
        return ExitCode::FAILURE;
    };

    let engine = InferenceEngine::with_config(settings.inference.to_config());
    let suggestions = engine.infer(&model.tables);

    if suggestions.is_empty() {
        println!("No relationships suggested.");
    }
    for (i, s) in suggestions.iter().enumerate() {
        println!("{:>3}. {}", i, s);
    }

    if accept.is_empty() {
        return ExitCode::SUCCESS;
    }

    for &index in accept {
        let Some(suggestion) = suggestions.get(index) else {
            eprintln!("No suggestion at position {}", index);
            return ExitCode::FAILURE;
        };
        match model.accept_suggestion(suggestion, cardinality, cross_filter) {
            Ok(rel_id) => println!("Accepted {} as [{}]", suggestion, rel_id),
            Err(e) => {
                eprintln!("Error accepting suggestion {}: {}", index, e);
                return ExitCode::FAILURE;
            }
        }
    }

    match store.save(&model) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error saving model: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_check(model: &DataModel) -> ExitCode {
    let findings = model.integrity_findings();
    for finding in &findings {
        println!("warning: {}", finding);
    }

    let cycles = model.cycles();
    for cycle in &cycles {
        println!("cycle: {}", cycle.join(" <-> "));
    }

    if findings.is_empty() && cycles.is_empty() {
        println!("OK: no integrity findings");
    }
    ExitCode::SUCCESS
}

fn cmd_eval(
    settings: &Settings,
    store: &dyn ModelStore,
    id: &str,
    measure: &str,
    data: PathBuf,
) -> ExitCode {
    let Some(model) = load_model(store, id) else {
        return ExitCode::FAILURE;
    };

    let provider = match InMemoryProvider::from_path(&data) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error loading data '{}': {}", data.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match model.evaluate_measure_with(measure, &provider, &settings.formula.parse_options()) {
        Ok(value) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Err(ModelError::Formula(e)) => {
            let source = model
                .get_measure(measure)
                .map(|m| m.expression.as_str())
                .unwrap_or_default();
            render_formula_error(source, &e);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Evaluation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_delete(store: &dyn ModelStore, id: &str) -> ExitCode {
    match store.delete(id) {
        Ok(true) => {
            println!("Deleted {}", id);
            ExitCode::SUCCESS
        }
        Ok(false) => {
            eprintln!("Model not found: {}", id);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error deleting model: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Print a formula error, with a source snippet when it has a location.
fn render_formula_error(source: &str, err: &FormulaError) {
    let Some(span) = err.span() else {
        eprintln!("{} error: {}", err.kind(), err);
        return;
    };

    let span = char_span(source, span);
    let printed = Report::build(ReportKind::Error, span.clone())
        .with_message("Syntax error in formula")
        .with_label(
            Label::new(span)
                .with_message(err.to_string())
                .with_color(Color::Red),
        )
        .finish()
        .eprint(Source::from(source));

    if printed.is_err() {
        eprintln!("{}", err);
    }
}

/// Convert a byte span into the character span ariadne expects. Zero-width
/// spans (e.g. end of input) are widened to one character when one exists.
fn char_span(source: &str, span: &Span) -> Span {
    let to_char = |byte: usize| source.char_indices().take_while(|(i, _)| *i < byte).count();
    let start = to_char(span.start);
    let end = to_char(span.end);
    if start == end && start < source.chars().count() {
        start..start + 1
    } else {
        start..end
    }
}
