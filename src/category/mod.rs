//! Category reconciliation across catalogs.
//!
//! Catalogs label the same product differently (`Moisturizer` vs
//! `moisturizers`). Consensus keeps the agreements, tolerates plural
//! variants, and leaves genuine disagreements unresolved for the operator.
//! Snapshot-specific patches belong in the override table, keyed by match
//! key, not by row position.

use std::collections::BTreeMap;

/// Fixed label rewrites applied after consensus and overrides.
const SYNONYMS: &[(&str, &str)] = &[("eye cream", "eye care")];

/// Outcome of reconciling one product's category labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryResolution {
    /// The reconciled category, when the labels agree (or only one exists).
    pub value: Option<String>,
    /// True when both labels exist and disagree.
    pub mismatched: bool,
}

/// Reconciles the two catalogs' category labels for one product.
///
/// Agreement (case-insensitive, tolerating the secondary being the plural
/// of the primary) keeps the primary label, lower-cased. A missing side
/// defers to the other. Disagreement yields no category and is flagged.
#[must_use]
pub fn resolve_category(primary: Option<&str>, secondary: Option<&str>) -> CategoryResolution {
    let normalize = |label: &str| label.trim().to_lowercase();
    match (primary.map(normalize), secondary.map(normalize)) {
        (None, None) => CategoryResolution {
            value: None,
            mismatched: false,
        },
        (Some(label), None) | (None, Some(label)) => CategoryResolution {
            value: Some(label),
            mismatched: false,
        },
        (Some(primary), Some(secondary)) => {
            if primary == secondary || format!("{primary}s") == secondary {
                CategoryResolution {
                    value: Some(primary),
                    mismatched: false,
                }
            } else {
                CategoryResolution {
                    value: None,
                    mismatched: true,
                }
            }
        }
    }
}

/// Applies the override table and synonym rewrites to a resolved category.
///
/// Overrides are keyed by match key so they survive reordering and fresh
/// data loads. Synonyms run last, covering overridden values too.
#[must_use]
pub fn finalize_category(
    resolved: Option<String>,
    match_key: &str,
    overrides: &BTreeMap<String, String>,
) -> Option<String> {
    let category = overrides
        .get(match_key)
        .map(|value| value.trim().to_lowercase())
        .or(resolved)?;
    let rewritten = SYNONYMS
        .iter()
        .find(|(from, _)| *from == category)
        .map_or(category, |(_, to)| (*to).to_string());
    Some(rewritten)
}
