//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Reconcile skincare product catalogs and answer ingredient-safety queries.
///
/// Reconciler merges independently sourced catalogs into one canonical
/// product table and evaluates ingredient lists against allergen groups and
/// interaction rules.
#[derive(Parser, Debug)]
#[command(name = "reconciler")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge a secondary catalog into a primary catalog
    Merge {
        /// Primary catalog (JSON array of records)
        primary: PathBuf,

        /// Secondary catalog (JSON array of records)
        secondary: PathBuf,

        /// Name similarity threshold for merging (0.0-1.0)
        #[arg(long)]
        name_threshold: Option<f64>,

        /// Brand similarity threshold for candidate retention (0.0-1.0)
        #[arg(long)]
        brand_threshold: Option<f64>,

        /// Configuration file (JSON); CLI thresholds override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only analyze candidate matches without performing the merge
        #[arg(long)]
        analyze_only: bool,

        /// Show all candidate matches instead of just the top 10
        #[arg(long)]
        show_all: bool,

        /// Write the canonical table to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evaluate an ingredient list against allergen groups and interaction rules
    Check {
        /// Ingredient list, separator-delimited
        #[arg(long, conflicts_with = "file")]
        ingredients: Option<String>,

        /// JSON file holding one product record to evaluate
        #[arg(long)]
        file: Option<PathBuf>,

        /// Allergen group ids to check (default: all configured groups)
        #[arg(long)]
        groups: Vec<String>,

        /// Ingredient reference catalog (JSON); adds per-ingredient details
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}
