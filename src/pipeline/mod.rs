//! Full reconciliation run: normalize, block, scan, map, merge, categorize.
//!
//! Single-threaded and batch-oriented. Runs are finite, offline, and
//! idempotent: identical inputs reproduce the identical canonical table and
//! warnings.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::{info, instrument};

use crate::blocking;
use crate::catalog::{CanonicalProduct, Catalog, KeyedRecord, RawRecord};
use crate::category;
use crate::config::{ConfigError, ReconcileConfig};
use crate::matching::{self, CandidateMatch};
use crate::merge::{self, AmbiguousMatch};
use crate::normalize;
use crate::rules::RuleEngine;

/// A record excluded from reconciliation because it cannot be identified.
#[derive(Debug, Clone, Serialize)]
pub struct MalformedRecord {
    /// Which catalog it came from.
    pub catalog: String,
    /// Zero-based position in that catalog.
    pub index: usize,
    /// The record itself, untouched.
    pub record: RawRecord,
}

/// Counts reported after every run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunSummary {
    /// Rows in the canonical table.
    pub table_rows: usize,
    /// Keys matched exactly during blocking.
    pub exact_matched: usize,
    /// Candidate pairs retained by the similarity scan.
    pub candidates: usize,
    /// Primary rows that received secondary columns.
    pub merged: usize,
    /// Primary rows that received nothing from the secondary catalog.
    pub unmatched_primary: usize,
    /// Secondary records left over after the merge (the addendum).
    pub unmatched_secondary: usize,
    /// Ambiguous duplicate-key collisions resolved by the tie-break.
    pub ambiguous: usize,
    /// Records excluded as unidentifiable.
    pub malformed: usize,
    /// Products whose category labels disagree between catalogs.
    pub category_mismatches: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} canonical rows ({} exact, {} candidates, {} merged); \
             {} unmatched primary, {} unmatched secondary, {} ambiguous, \
             {} malformed, {} category mismatches",
            self.table_rows,
            self.exact_matched,
            self.candidates,
            self.merged,
            self.unmatched_primary,
            self.unmatched_secondary,
            self.ambiguous,
            self.malformed,
            self.category_mismatches
        )
    }
}

/// Everything a reconciliation run produces. No partial output is ever
/// silently dropped: leftovers and failures come back in their own lists.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The canonical product table, one row per usable primary record.
    pub table: Vec<CanonicalProduct>,
    /// Secondary-only records that never matched a primary key.
    pub addendum: Vec<KeyedRecord>,
    /// Candidate pairs from the similarity scan, for operator analysis.
    pub candidates: Vec<CandidateMatch>,
    /// Duplicate-key collisions the tie-break resolved.
    pub ambiguous: Vec<AmbiguousMatch>,
    /// Records excluded as unidentifiable.
    pub malformed: Vec<MalformedRecord>,
    /// Counts for the operator.
    pub summary: RunSummary,
}

/// The reconciliation pipeline, configured once and reusable across runs.
#[derive(Debug, Clone)]
pub struct Reconciler {
    config: ReconcileConfig,
    engine: RuleEngine,
}

impl Reconciler {
    /// Builds a reconciler, validating the whole configuration up front.
    ///
    /// # Errors
    /// Returns [`ConfigError`] before any record is processed.
    pub fn new(config: ReconcileConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let engine = RuleEngine::new(config.rules.clone())?;
        Ok(Self { config, engine })
    }

    /// The rule engine for per-product safety queries.
    #[must_use]
    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Runs the full pipeline over two catalogs.
    ///
    /// Per-record failures are local: unidentifiable records land in the
    /// malformed side list and the run always completes.
    #[must_use]
    #[instrument(skip_all, fields(primary = %primary.name, secondary = %secondary.name))]
    pub fn run(&self, primary: &Catalog, secondary: &Catalog) -> RunOutcome {
        let mut malformed = Vec::new();
        let keyed_primary = key_catalog(primary, &mut malformed);
        let keyed_secondary = key_catalog(secondary, &mut malformed);

        let split = blocking::split_exact(&keyed_primary, &keyed_secondary);

        let candidates = matching::find_candidates(
            &split.unmatched_primary,
            &split.unmatched_secondary,
            &self.config.matching,
        );

        let (mapping, ambiguous) = merge::build_key_mapping(&candidates);

        let outcome = merge::merge(
            &keyed_primary,
            &keyed_secondary,
            &mapping,
            &self.config.merge_columns(),
            &secondary.name,
        );
        let mut table = outcome.table;

        // Secondary category labels by rewritten key, first occurrence wins
        // to mirror the merge's de-duplication.
        let mut secondary_labels: HashMap<String, Option<String>> = HashMap::new();
        for record in &keyed_secondary {
            if let Some(key) = record.match_key.as_deref() {
                secondary_labels
                    .entry(mapping.rewrite(key).to_string())
                    .or_insert_with(|| record.record.category_label.clone());
            }
        }

        let mut category_mismatches = 0usize;
        for (product, keyed) in table.iter_mut().zip(&keyed_primary) {
            let secondary_label = keyed
                .match_key
                .as_deref()
                .and_then(|key| secondary_labels.get(key))
                .and_then(Option::as_deref);
            let resolution = category::resolve_category(
                keyed.record.category_label.as_deref(),
                secondary_label,
            );
            if resolution.mismatched {
                category_mismatches += 1;
            }
            product.category = category::finalize_category(
                resolution.value,
                &product.match_key,
                &self.config.category_overrides,
            );
        }

        let summary = RunSummary {
            table_rows: table.len(),
            exact_matched: split.matched_count(),
            candidates: candidates.len(),
            merged: outcome.merged_count,
            unmatched_primary: table.len() - outcome.merged_count,
            unmatched_secondary: outcome.addendum.len(),
            ambiguous: ambiguous.len(),
            malformed: malformed.len(),
            category_mismatches,
        };
        info!(%summary, "reconciliation run complete");

        RunOutcome {
            table,
            addendum: outcome.addendum,
            candidates,
            ambiguous,
            malformed,
            summary,
        }
    }
}

/// Normalizes a catalog, diverting unidentifiable records to the side list.
fn key_catalog(catalog: &Catalog, malformed: &mut Vec<MalformedRecord>) -> Vec<KeyedRecord> {
    let mut keyed = Vec::with_capacity(catalog.records.len());
    for (index, record) in catalog.records.iter().enumerate() {
        if record.is_unidentifiable() {
            malformed.push(MalformedRecord {
                catalog: catalog.name.clone(),
                index,
                record: record.clone(),
            });
        } else {
            keyed.push(normalize::keyed(record.clone()));
        }
    }
    keyed
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(brand: &str, name: &str, extra: serde_json::Value) -> RawRecord {
        let mut record = RawRecord {
            brand: Some(brand.into()),
            name: Some(name.into()),
            ..RawRecord::default()
        };
        if let serde_json::Value::Object(map) = extra {
            record.extra = map.into_iter().collect();
        }
        record
    }

    fn reconciler() -> Reconciler {
        Reconciler::new(ReconcileConfig::default()).unwrap()
    }

    #[test]
    fn test_run_exact_block_match_merges_without_scan() {
        let primary = Catalog::new(
            "base",
            vec![record("Acme", "Glow Serum", json!({"price": 10.0}))],
        );
        let secondary = Catalog::new(
            "sephora",
            vec![record("Acme", "Glow  Serum!", json!({"review_score": 4.5}))],
        );

        let outcome = reconciler().run(&primary, &secondary);

        assert_eq!(outcome.summary.exact_matched, 1);
        assert_eq!(outcome.summary.candidates, 0, "no residual to scan");
        assert_eq!(outcome.table.len(), 1);
        assert_eq!(
            outcome.table[0].columns.get("review_score"),
            Some(&json!(4.5))
        );
        assert!(outcome.addendum.is_empty());
    }

    #[test]
    fn test_run_fuzzy_match_via_candidates() {
        let primary = Catalog::new(
            "base",
            vec![record("Acme", "Hydrating Night Cream", json!({}))],
        );
        let secondary = Catalog::new(
            "sephora",
            vec![record("Acme", "Hydrating Night Creame", json!({"size": "50ml"}))],
        );

        let outcome = reconciler().run(&primary, &secondary);

        assert_eq!(outcome.summary.exact_matched, 0);
        assert_eq!(outcome.summary.candidates, 1);
        assert_eq!(outcome.summary.merged, 1);
        assert_eq!(outcome.table[0].columns.get("size"), Some(&json!("50ml")));
    }

    #[test]
    fn test_run_isolates_malformed_records() {
        let primary = Catalog::new(
            "base",
            vec![
                record("Acme", "Glow Serum", json!({})),
                RawRecord::default(),
            ],
        );
        let secondary = Catalog::new("sephora", vec![]);

        let outcome = reconciler().run(&primary, &secondary);

        assert_eq!(outcome.summary.malformed, 1);
        assert_eq!(outcome.malformed[0].catalog, "base");
        assert_eq!(outcome.malformed[0].index, 1);
        assert_eq!(outcome.table.len(), 1, "run completes despite bad records");
    }

    #[test]
    fn test_run_resolves_categories_with_consensus_and_overrides() {
        let mut primary_record = record("Acme", "Glow Serum", json!({}));
        primary_record.category_label = Some("Moisturizer".into());
        let mut secondary_record = record("Acme", "Glow Serum", json!({}));
        secondary_record.category_label = Some("moisturizers".into());

        let mut other = record("Acme", "Night Toner", json!({}));
        other.category_label = Some("toner".into());
        let mut other_secondary = record("Acme", "Night Toner", json!({}));
        other_secondary.category_label = Some("treatment".into());

        let config = ReconcileConfig {
            category_overrides: std::collections::BTreeMap::from([(
                "acme_night_toner".to_string(),
                "treatment".to_string(),
            )]),
            ..ReconcileConfig::default()
        };
        let reconciler = Reconciler::new(config).unwrap();

        let outcome = reconciler.run(
            &Catalog::new("base", vec![primary_record, other]),
            &Catalog::new("sephora", vec![secondary_record, other_secondary]),
        );

        assert_eq!(outcome.table[0].category.as_deref(), Some("moisturizer"));
        // Labels disagreed, but the override (keyed by match key) fills it.
        assert_eq!(outcome.summary.category_mismatches, 1);
        assert_eq!(outcome.table[1].category.as_deref(), Some("treatment"));
    }

    #[test]
    fn test_run_is_idempotent() {
        let primary = Catalog::new(
            "base",
            vec![
                record("Acme", "Glow Serum", json!({"price": 10.0})),
                record("Acme", "Night Cream", json!({"price": 20.0})),
                record("Glow Cosmetics", "Day Cream", json!({})),
            ],
        );
        let secondary = Catalog::new(
            "sephora",
            vec![
                record("Acme", "Glow Serum", json!({"review_score": 4.5})),
                record("Acme", "Night Creame", json!({"review_score": 3.0})),
                record("Other", "Lone Toner", json!({})),
            ],
        );

        let reconciler = reconciler();
        let first = reconciler.run(&primary, &secondary);
        let second = reconciler.run(&primary, &secondary);

        let first_json = serde_json::to_string(&first.table).unwrap();
        let second_json = serde_json::to_string(&second.table).unwrap();
        assert_eq!(first_json, second_json, "same inputs, same canonical table");
        assert_eq!(first.addendum.len(), second.addendum.len());
    }

    #[test]
    fn test_engine_evaluates_canonical_products() {
        let mut with_ingredients = record("Acme", "Glow Serum", json!({}));
        with_ingredients.ingredients = Some("Retinol, Glycolic Acid, Parfum".into());

        let reconciler = reconciler();
        let outcome = reconciler.run(
            &Catalog::new("base", vec![with_ingredients]),
            &Catalog::new("sephora", vec![]),
        );

        let warnings = reconciler.engine().evaluate(&outcome.table[0], &[]);
        assert!(
            warnings.len() >= 2,
            "expected fragrance and retinol+AHA warnings, got {warnings:?}"
        );
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ReconcileConfig {
            matching: crate::config::MatchConfig {
                name_threshold: 7.0,
                brand_threshold: 0.85,
            },
            ..ReconcileConfig::default()
        };
        assert!(Reconciler::new(config).is_err());
    }
}
