//! Key mapping and left-join merge of the secondary catalog into the primary.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::{CanonicalProduct, KeyedRecord};
use crate::matching::CandidateMatch;

/// One-directional map from secondary match keys to primary match keys.
///
/// Each secondary key maps to at most one primary key; collisions resolve by
/// the total order in [`build_key_mapping`].
#[derive(Debug, Clone, Default)]
pub struct KeyMapping {
    map: HashMap<String, String>,
}

impl KeyMapping {
    /// Primary key a secondary key was mapped to, if any.
    #[must_use]
    pub fn get(&self, secondary_key: &str) -> Option<&str> {
        self.map.get(secondary_key).map(String::as_str)
    }

    /// Rewrites a secondary key, passing it through unchanged when unmapped.
    #[must_use]
    pub fn rewrite<'a>(&'a self, secondary_key: &'a str) -> &'a str {
        self.get(secondary_key).unwrap_or(secondary_key)
    }

    /// Number of mapped keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when no keys are mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Operator warning: two merge candidates targeted the same secondary key
/// with different primary keys. Non-fatal; the tie-break kept one.
#[derive(Debug, Clone, Serialize)]
pub struct AmbiguousMatch {
    /// The contested secondary key.
    pub secondary_key: String,
    /// Primary key the tie-break kept.
    pub kept_primary: String,
    /// Primary key the tie-break discarded.
    pub discarded_primary: String,
    /// Name similarity of the kept candidate.
    pub kept_name_similarity: f64,
    /// Name similarity of the discarded candidate.
    pub discarded_name_similarity: f64,
}

impl fmt::Display for AmbiguousMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ambiguous match for '{}': kept '{}' ({:.3}), discarded '{}' ({:.3})",
            self.secondary_key,
            self.kept_primary,
            self.kept_name_similarity,
            self.discarded_primary,
            self.discarded_name_similarity
        )
    }
}

/// Builds the secondary→primary key mapping from merge-worthy candidates.
///
/// Only candidates with `should_merge` and full keys on both sides
/// contribute. Duplicate secondary keys resolve by a documented total
/// order: highest name similarity, then highest brand similarity, then
/// lexicographic primary key. Collisions that discard a *different*
/// primary key are reported as [`AmbiguousMatch`] warnings.
#[must_use]
pub fn build_key_mapping(candidates: &[CandidateMatch]) -> (KeyMapping, Vec<AmbiguousMatch>) {
    let mut retained: Vec<&CandidateMatch> = candidates
        .iter()
        .filter(|candidate| {
            candidate.should_merge
                && candidate.primary_key.is_some()
                && candidate.secondary_key.is_some()
        })
        .collect();

    retained.sort_by(|a, b| {
        b.name_similarity
            .total_cmp(&a.name_similarity)
            .then_with(|| b.brand_similarity.total_cmp(&a.brand_similarity))
            .then_with(|| a.primary_key.cmp(&b.primary_key))
    });

    let mut mapping = KeyMapping::default();
    let mut ambiguous = Vec::new();

    for candidate in retained {
        let (Some(secondary_key), Some(primary_key)) =
            (&candidate.secondary_key, &candidate.primary_key)
        else {
            continue;
        };
        match mapping.map.get(secondary_key) {
            None => {
                mapping
                    .map
                    .insert(secondary_key.clone(), primary_key.clone());
            }
            Some(kept) if kept != primary_key => {
                let report = AmbiguousMatch {
                    secondary_key: secondary_key.clone(),
                    kept_primary: kept.clone(),
                    discarded_primary: primary_key.clone(),
                    kept_name_similarity: candidates
                        .iter()
                        .find(|c| {
                            c.secondary_key.as_deref() == Some(secondary_key.as_str())
                                && c.primary_key.as_deref() == Some(kept.as_str())
                        })
                        .map_or(0.0, |c| c.name_similarity),
                    discarded_name_similarity: candidate.name_similarity,
                };
                warn!(%report, "duplicate secondary key in candidate set");
                ambiguous.push(report);
            }
            Some(_) => {}
        }
    }

    debug!(
        mapped = mapping.len(),
        ambiguous = ambiguous.len(),
        "key mapping built"
    );
    (mapping, ambiguous)
}

/// Result of merging the secondary catalog into the primary.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The canonical table: one row per primary record, in primary order.
    pub table: Vec<CanonicalProduct>,
    /// Secondary records whose (rewritten) key matched no primary record.
    /// The table is a left join; callers needing the union append these.
    pub addendum: Vec<KeyedRecord>,
    /// Primary rows that received secondary columns.
    pub merged_count: usize,
}

/// Left-joins selected secondary columns onto the primary catalog.
///
/// Secondary keys are first rewritten through `mapping`, then de-duplicated
/// keeping the first occurrence. Column-name collisions with the primary
/// schema keep the primary value and append the secondary one under
/// `<column>_<suffix>`; primary data is never overwritten. Every primary
/// record appears exactly once in the output.
#[must_use]
pub fn merge(
    primary: &[KeyedRecord],
    secondary: &[KeyedRecord],
    mapping: &KeyMapping,
    columns_to_merge: &[String],
    suffix: &str,
) -> MergeOutcome {
    // Secondary side: rewrite keys, de-duplicate keeping first occurrence.
    let mut by_key: HashMap<String, &KeyedRecord> = HashMap::new();
    let mut deduped: Vec<(String, &KeyedRecord)> = Vec::new();
    for record in secondary {
        let Some(key) = record.match_key.as_deref() else {
            continue;
        };
        let rewritten = mapping.rewrite(key).to_string();
        if !by_key.contains_key(&rewritten) {
            by_key.insert(rewritten.clone(), record);
            deduped.push((rewritten, record));
        }
    }

    // Schema-level collision detection: a secondary column is suffixed when
    // the primary table carries a column of that name anywhere.
    let mut primary_schema: HashSet<&str> =
        HashSet::from(["brand", "name", "category_label", "ingredients"]);
    for record in primary {
        primary_schema.extend(record.record.extra.keys().map(String::as_str));
    }

    let mut table = Vec::with_capacity(primary.len());
    let mut merged_count = 0usize;
    let mut joined_keys: HashSet<&str> = HashSet::new();

    for record in primary {
        let match_key = record
            .match_key
            .clone()
            .or_else(|| record.partial_key())
            .unwrap_or_default();

        let mut columns: BTreeMap<String, serde_json::Value> = record.record.extra.clone();

        if let Some(key) = record.match_key.as_deref()
            && let Some(secondary_record) = by_key.get(key)
        {
            joined_keys.insert(key);
            merged_count += 1;
            for column in columns_to_merge {
                let Some(value) = secondary_record.record.column(column) else {
                    continue;
                };
                let target = if primary_schema.contains(column.as_str()) {
                    format!("{column}_{suffix}")
                } else {
                    column.clone()
                };
                columns.insert(target, value);
            }
        }

        table.push(CanonicalProduct {
            match_key,
            brand: record.record.brand.clone(),
            name: record.record.name.clone(),
            category: None,
            ingredients: record.record.ingredients.clone(),
            columns,
        });
    }

    let addendum: Vec<KeyedRecord> = deduped
        .iter()
        .filter(|(key, _)| !joined_keys.contains(key.as_str()))
        .map(|(_, record)| (*record).clone())
        .collect();

    debug!(
        table = table.len(),
        merged = merged_count,
        addendum = addendum.len(),
        "merge complete"
    );

    MergeOutcome {
        table,
        addendum,
        merged_count,
    }
}
