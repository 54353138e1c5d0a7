//! CLI entry point for the reconciler tool.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use reconciler_core::{
    CandidateMatch, Catalog, RawRecord, ReconcileConfig, Reconciler, ReferenceIndex, RuleEngine,
    SimilarityDistribution,
};
use tracing::{debug, info, warn};

mod cli;

use cli::{Args, Command};

fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    match args.command {
        Command::Merge {
            primary,
            secondary,
            name_threshold,
            brand_threshold,
            config,
            analyze_only,
            show_all,
            output,
        } => run_merge(&MergeRequest {
            primary,
            secondary,
            name_threshold,
            brand_threshold,
            config,
            analyze_only,
            show_all,
            output,
        }),
        Command::Check {
            ingredients,
            file,
            groups,
            reference,
            config,
        } => run_check(&CheckRequest {
            ingredients,
            file,
            groups,
            reference,
            config,
        }),
    }
}

struct CheckRequest {
    ingredients: Option<String>,
    file: Option<PathBuf>,
    groups: Vec<String>,
    reference: Option<PathBuf>,
    config: Option<PathBuf>,
}

struct MergeRequest {
    primary: PathBuf,
    secondary: PathBuf,
    name_threshold: Option<f64>,
    brand_threshold: Option<f64>,
    config: Option<PathBuf>,
    analyze_only: bool,
    show_all: bool,
    output: Option<PathBuf>,
}

/// Loads file config when given, otherwise defaults.
fn load_config(path: Option<&Path>) -> Result<ReconcileConfig> {
    match path {
        Some(path) => {
            ReconcileConfig::from_path(path).context("failed to load configuration file")
        }
        None => Ok(ReconcileConfig::default()),
    }
}

/// Catalog name from the file stem, used for logs and conflict suffixes.
fn catalog_name(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "catalog".to_string(), |stem| stem.to_string_lossy().into_owned())
}

fn run_merge(request: &MergeRequest) -> Result<()> {
    let mut config = load_config(request.config.as_deref())?;
    if let Some(threshold) = request.name_threshold {
        config.matching.name_threshold = threshold;
    }
    if let Some(threshold) = request.brand_threshold {
        config.matching.brand_threshold = threshold;
    }

    // Validation runs here, before any record is processed; CLI overrides
    // are checked the same as file values.
    let reconciler = Reconciler::new(config)?;

    let primary = Catalog::from_path(catalog_name(&request.primary), &request.primary)?;
    let secondary = Catalog::from_path(catalog_name(&request.secondary), &request.secondary)?;
    info!(%primary, %secondary, "catalogs loaded");

    let outcome = reconciler.run(&primary, &secondary);

    for report in &outcome.ambiguous {
        warn!(%report, "ambiguous match resolved by tie-break");
    }

    if request.analyze_only {
        print_candidates(&outcome.candidates, request.show_all);
        print!("{}", SimilarityDistribution::from_candidates(&outcome.candidates));
        println!("{}", outcome.summary);
        return Ok(());
    }

    let table_json =
        serde_json::to_string_pretty(&outcome.table).context("failed to serialize table")?;
    match &request.output {
        Some(path) => {
            std::fs::write(path, table_json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), rows = outcome.table.len(), "canonical table written");
        }
        None => println!("{table_json}"),
    }

    info!(summary = %outcome.summary, "done");
    Ok(())
}

/// Prints candidate matches, best first, top 10 unless `--show-all`.
fn print_candidates(candidates: &[CandidateMatch], show_all: bool) {
    let mut sorted: Vec<&CandidateMatch> = candidates.iter().collect();
    sorted.sort_by(|a, b| {
        b.kind
            .cmp(&a.kind)
            .then_with(|| b.name_similarity.total_cmp(&a.name_similarity))
            .then_with(|| b.brand_similarity.total_cmp(&a.brand_similarity))
    });

    let shown = if show_all { sorted.len() } else { sorted.len().min(10) };
    println!("{} candidate matches (showing {shown}):", sorted.len());
    for candidate in &sorted[..shown] {
        println!(
            "  [{}] {:.3}/{:.3}  {} ({}) <-> {} ({})",
            candidate.kind,
            candidate.name_similarity,
            candidate.brand_similarity,
            candidate.primary_name.as_deref().unwrap_or("-"),
            candidate.primary_brand.as_deref().unwrap_or("-"),
            candidate.secondary_name.as_deref().unwrap_or("-"),
            candidate.secondary_brand.as_deref().unwrap_or("-"),
        );
    }
}

fn run_check(request: &CheckRequest) -> Result<()> {
    let config = load_config(request.config.as_deref())?;
    let engine = RuleEngine::new(config.rules)?;

    let ingredient_list = match (&request.ingredients, &request.file) {
        (Some(list), _) => list.clone(),
        (None, Some(path)) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let record: RawRecord =
                serde_json::from_str(&text).context("product file is not a JSON record")?;
            record.ingredients.unwrap_or_default()
        }
        (None, None) => bail!("provide an ingredient list via --ingredients or --file"),
    };

    let warnings = engine.evaluate_ingredients(&ingredient_list, &request.groups);
    if warnings.is_empty() {
        println!("No allergen or interaction warnings found.");
    } else {
        for warning in &warnings {
            println!("{warning}");
        }
    }

    if let Some(path) = &request.reference {
        let index = ReferenceIndex::from_path(path)?;
        let tokens = engine.tokenize(&ingredient_list);
        let details = index.details_for(&tokens);
        println!("Ingredient details ({} of {} matched):", details.len(), tokens.len());
        for entry in details {
            let rating = entry
                .rating
                .map_or_else(|| "unrated".to_string(), |rating| format!("{rating:.1}"));
            println!("  {} [{rating}] {}", entry.name, entry.functions);
        }
    }

    debug!(warnings = warnings.len(), "check complete");
    Ok(())
}
