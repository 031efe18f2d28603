//! AIngle Evidence CLI
//!
//! Loads a rule catalog, asserts facts into one reasoning context and prints
//! the ranked diagnoses.
//!
//! ## Usage
//!
//! ```bash
//! # Built-in respiratory catalog
//! aingle-evidence fever cough shortness_of_breath fatigue
//!
//! # Custom catalog, JSON output, top 5
//! aingle-evidence --catalog clinic.catalog --json --top 5 fever "rash(Patient)"
//!
//! # Legacy three-file layout
//! aingle-evidence --legacy sintomas.txt diagnosticos.txt regras.txt febre tosse
//!
//! # Commutative certainty merge
//! AINGLE_EVIDENCE_CERTAINTY_MERGE=mean aingle-evidence fever
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use aingle_evidence::{
    BuiltinRules, Catalog, CertaintyMerge, Diagnosis, EngineConfig, InferenceEngine, Predicate,
    Result,
};
use clap::Parser;
use serde::Serialize;

/// Weighted partial-match diagnosis over a rule catalog
#[derive(Parser, Debug)]
#[command(name = "aingle-evidence")]
#[command(author = "Apilium Technologies")]
#[command(version)]
#[command(about = "Rank diagnoses from asserted facts using a weighted rule catalog", long_about = None)]
struct Args {
    /// Facts to assert: catalog aliases or predicate literals like `fever(Patient)`
    facts: Vec<String>,

    /// Catalog file to load (defaults to the built-in respiratory catalog)
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Legacy symptom, diagnosis and rule files to load instead of a catalog
    #[arg(
        long,
        num_args = 3,
        value_names = ["SYMPTOMS", "DIAGNOSES", "RULES"],
        conflicts_with = "catalog"
    )]
    legacy: Option<Vec<PathBuf>>,

    /// Reasoning context the facts are asserted into
    #[arg(long, default_value = "patient")]
    context: String,

    /// Certainty merge policy (running_average or mean)
    #[arg(long)]
    merge: Option<CertaintyMerge>,

    /// Hide diagnoses below this probability
    #[arg(long)]
    min_probability: Option<f64>,

    /// Show at most this many diagnoses
    #[arg(long)]
    top: Option<usize>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    catalog: &'a str,
    context: &'a str,
    facts: Vec<String>,
    diagnoses: &'a [Diagnosis],
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let catalog = match (&args.catalog, args.legacy.as_deref()) {
        (Some(path), _) => {
            let report = Catalog::load(path)?;
            for diagnostic in &report.diagnostics {
                eprintln!("warning: {}: {}", path.display(), diagnostic);
            }
            report.catalog
        }
        (None, Some([symptoms, diagnoses, rules])) => {
            let report = Catalog::load_legacy(symptoms, diagnoses, rules)?;
            for diagnostic in &report.diagnostics {
                eprintln!("warning: {}", diagnostic);
            }
            report.catalog
        }
        _ => BuiltinRules::respiratory(),
    };

    let mut config = EngineConfig::from_env();
    if let Some(policy) = args.merge {
        config.certainty_merge = policy;
    }
    if let Some(threshold) = args.min_probability {
        config.min_probability = threshold;
    }
    if let Some(top) = args.top {
        config.max_results = Some(top);
    }

    let facts = args
        .facts
        .iter()
        .map(|input| catalog.resolve_fact(input))
        .collect::<Result<Vec<Predicate>>>()?;

    let engine = InferenceEngine::with_config(catalog.rules().clone(), config)?;
    log::info!(
        "Asserting {} facts into '{}' against {} rules",
        facts.len(),
        args.context,
        engine.rules().len()
    );
    let ranked = engine.assert_facts(args.context.as_str(), facts);
    let asserted = engine.facts(&args.context);

    if args.json {
        let report = JsonReport {
            catalog: catalog.name(),
            context: &args.context,
            facts: asserted.iter().map(ToString::to_string).collect(),
            diagnoses: &ranked,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Catalog: {} ({} rules)", catalog.name(), engine.rules().len());
    println!("Context: {}", args.context);
    println!();
    for fact in &asserted {
        println!("Fact: {}", fact);
    }
    println!();

    if ranked.is_empty() {
        println!("No diagnosis is supported by the asserted facts.");
        return Ok(());
    }

    let width = ranked
        .iter()
        .map(|d| d.predicate.to_string().len())
        .max()
        .unwrap_or(0);
    println!("{:<width$}  {:>9}  {:>11}", "Diagnosis", "Certainty", "Probability");
    for diagnosis in &ranked {
        println!(
            "{:<width$}  {:>9.2}  {:>11.2}",
            diagnosis.predicate.to_string(),
            diagnosis.certainty,
            diagnosis.probability
        );
    }

    Ok(())
}
