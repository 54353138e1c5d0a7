//! Exact-match split on blocking keys.
//!
//! Two records with equal match keys are the same product, no comparison
//! needed. This removes the bulk of both catalogs in O(|A|+|B|) before the
//! quadratic similarity scan ever runs.

use std::collections::HashSet;

use tracing::debug;

use crate::catalog::KeyedRecord;

/// Result of partitioning two catalogs by exact key intersection.
#[derive(Debug, Clone, Default)]
pub struct ExactSplit {
    /// Keys present in both catalogs.
    pub matched_keys: HashSet<String>,
    /// Primary records whose key appears in no secondary record (or who
    /// have no full key at all). Source order preserved.
    pub unmatched_primary: Vec<KeyedRecord>,
    /// Secondary records whose key appears in no primary record, same rules.
    pub unmatched_secondary: Vec<KeyedRecord>,
}

impl ExactSplit {
    /// Number of exactly matched keys.
    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.matched_keys.len()
    }
}

/// Splits both catalogs into exact matches and residuals.
///
/// Records without a full match key can never be blocked; they always land
/// on the unmatched side so the similarity scan can still consider them via
/// whatever partial fields exist.
#[must_use]
pub fn split_exact(primary: &[KeyedRecord], secondary: &[KeyedRecord]) -> ExactSplit {
    let primary_keys: HashSet<&str> = primary
        .iter()
        .filter_map(|record| record.match_key.as_deref())
        .collect();
    let secondary_keys: HashSet<&str> = secondary
        .iter()
        .filter_map(|record| record.match_key.as_deref())
        .collect();

    let matched_keys: HashSet<String> = primary_keys
        .intersection(&secondary_keys)
        .map(|key| (*key).to_string())
        .collect();

    let unmatched_primary: Vec<KeyedRecord> = primary
        .iter()
        .filter(|record| {
            record
                .match_key
                .as_deref()
                .is_none_or(|key| !matched_keys.contains(key))
        })
        .cloned()
        .collect();
    let unmatched_secondary: Vec<KeyedRecord> = secondary
        .iter()
        .filter(|record| {
            record
                .match_key
                .as_deref()
                .is_none_or(|key| !matched_keys.contains(key))
        })
        .cloned()
        .collect();

    debug!(
        matched = matched_keys.len(),
        unmatched_primary = unmatched_primary.len(),
        unmatched_secondary = unmatched_secondary.len(),
        "exact-match split complete"
    );

    ExactSplit {
        matched_keys,
        unmatched_primary,
        unmatched_secondary,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::RawRecord;
    use crate::normalize;

    fn keyed(brand: &str, name: &str) -> KeyedRecord {
        normalize::keyed(RawRecord {
            brand: Some(brand.into()),
            name: Some(name.into()),
            ..RawRecord::default()
        })
    }

    #[test]
    fn test_split_exact_partitions_by_key_intersection() {
        let primary = vec![keyed("Acme", "Glow Serum"), keyed("Acme", "Night Cream")];
        let secondary = vec![keyed("Acme", "Glow  Serum!"), keyed("Other", "Toner")];

        let split = split_exact(&primary, &secondary);

        assert_eq!(split.matched_count(), 1);
        assert!(split.matched_keys.contains("acme_glow_serum"));
        assert_eq!(split.unmatched_primary.len(), 1);
        assert_eq!(
            split.unmatched_primary[0].match_key.as_deref(),
            Some("acme_night_cream")
        );
        assert_eq!(split.unmatched_secondary.len(), 1);
        assert_eq!(
            split.unmatched_secondary[0].match_key.as_deref(),
            Some("other_toner")
        );
    }

    #[test]
    fn test_split_exact_keyless_records_stay_unmatched() {
        let keyless = normalize::keyed(RawRecord {
            brand: Some("Acme".into()),
            ..RawRecord::default()
        });
        let primary = vec![keyless];
        let secondary = vec![keyed("Acme", "Glow Serum")];

        let split = split_exact(&primary, &secondary);

        assert_eq!(split.matched_count(), 0);
        assert_eq!(split.unmatched_primary.len(), 1);
        assert_eq!(split.unmatched_secondary.len(), 1);
    }

    #[test]
    fn test_split_exact_empty_inputs() {
        let split = split_exact(&[], &[]);
        assert_eq!(split.matched_count(), 0);
        assert!(split.unmatched_primary.is_empty());
        assert!(split.unmatched_secondary.is_empty());
    }
}
