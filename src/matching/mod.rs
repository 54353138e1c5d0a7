//! Pairwise similarity scan over records the exact-match split left behind.
//!
//! Cost is O(|A|×|B|), acceptable only because blocking has already removed
//! every exact match and the residual is small.

use std::fmt;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::catalog::KeyedRecord;
use crate::config::MatchConfig;

/// Classification of a candidate pair by name-match strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Name similarity above threshold but below 1.0.
    HighSimilarity,
    /// Identical standardized names (similarity exactly 1.0).
    Exact,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighSimilarity => write!(f, "high_similarity"),
            Self::Exact => write!(f, "exact"),
        }
    }
}

/// A pair of unmatched records from the two catalogs with their similarity
/// scores. Ephemeral: produced during one reconciliation pass, not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateMatch {
    /// Primary record's full match key, when it has one.
    pub primary_key: Option<String>,
    /// Secondary record's full match key, when it has one.
    pub secondary_key: Option<String>,
    /// Raw primary name/brand for operator-facing listings.
    pub primary_name: Option<String>,
    /// Raw primary brand.
    pub primary_brand: Option<String>,
    /// Raw secondary name.
    pub secondary_name: Option<String>,
    /// Raw secondary brand.
    pub secondary_brand: Option<String>,
    /// Normalized edit-distance ratio over standardized names, in [0, 1].
    pub name_similarity: f64,
    /// Normalized edit-distance ratio over standardized brands, in [0, 1].
    pub brand_similarity: f64,
    /// `Exact` iff `name_similarity == 1.0`.
    pub kind: MatchKind,
    /// True iff `name_similarity >= name_threshold` (non-strict, unlike the
    /// retention filter; the asymmetry is deliberate and preserved).
    pub should_merge: bool,
}

/// Similarity between two optional standardized fields.
///
/// Absence on both sides carries no match signal and scores 0.0 rather than
/// the 1.0 that `normalized_levenshtein("", "")` would report.
fn field_similarity(left: Option<&str>, right: Option<&str>) -> f64 {
    match (left, right) {
        (None, None) => 0.0,
        _ => strsim::normalized_levenshtein(left.unwrap_or(""), right.unwrap_or("")),
    }
}

/// Exhaustive pairwise comparison of the unmatched residuals.
///
/// A pair is retained iff `name_similarity > name_threshold` OR
/// `brand_similarity > brand_threshold` (strict: boundary values are
/// excluded). Inputs are not mutated; output order follows the scan order
/// (primary outer, secondary inner), which is deterministic for fixed
/// inputs.
#[must_use]
#[instrument(skip_all, fields(primary = unmatched_primary.len(), secondary = unmatched_secondary.len()))]
pub fn find_candidates(
    unmatched_primary: &[KeyedRecord],
    unmatched_secondary: &[KeyedRecord],
    config: &MatchConfig,
) -> Vec<CandidateMatch> {
    let mut candidates = Vec::new();

    for primary in unmatched_primary {
        for secondary in unmatched_secondary {
            let name_similarity =
                field_similarity(primary.name_std.as_deref(), secondary.name_std.as_deref());
            let brand_similarity =
                field_similarity(primary.brand_std.as_deref(), secondary.brand_std.as_deref());

            if name_similarity > config.name_threshold
                || brand_similarity > config.brand_threshold
            {
                let kind = if (name_similarity - 1.0).abs() < f64::EPSILON {
                    MatchKind::Exact
                } else {
                    MatchKind::HighSimilarity
                };
                candidates.push(CandidateMatch {
                    primary_key: primary.match_key.clone(),
                    secondary_key: secondary.match_key.clone(),
                    primary_name: primary.record.name.clone(),
                    primary_brand: primary.record.brand.clone(),
                    secondary_name: secondary.record.name.clone(),
                    secondary_brand: secondary.record.brand.clone(),
                    name_similarity,
                    brand_similarity,
                    kind,
                    should_merge: name_similarity >= config.name_threshold,
                });
            }
        }
    }

    debug!(candidates = candidates.len(), "similarity scan complete");
    candidates
}

/// Half-open similarity buckets used by the operator-facing distribution
/// report. Candidates at exactly 1.0 fall outside every bucket and show up
/// in the exact count instead.
const BUCKETS: [(f64, f64); 4] = [(0.80, 0.85), (0.85, 0.90), (0.90, 0.95), (0.95, 1.0)];

/// Bucketed counts of candidate similarities for operator analysis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimilarityDistribution {
    /// Per-bucket counts of name similarity.
    pub name_counts: [usize; 4],
    /// Per-bucket counts of brand similarity.
    pub brand_counts: [usize; 4],
    /// Candidates classified exact.
    pub exact: usize,
    /// Candidates classified high-similarity.
    pub high_similarity: usize,
}

impl SimilarityDistribution {
    /// Tallies a candidate list into the fixed buckets.
    #[must_use]
    pub fn from_candidates(candidates: &[CandidateMatch]) -> Self {
        let mut distribution = Self::default();
        for candidate in candidates {
            match candidate.kind {
                MatchKind::Exact => distribution.exact += 1,
                MatchKind::HighSimilarity => distribution.high_similarity += 1,
            }
            for (i, (lower, upper)) in BUCKETS.iter().enumerate() {
                if candidate.name_similarity >= *lower && candidate.name_similarity < *upper {
                    distribution.name_counts[i] += 1;
                }
                if candidate.brand_similarity >= *lower && candidate.brand_similarity < *upper {
                    distribution.brand_counts[i] += 1;
                }
            }
        }
        distribution
    }
}

impl fmt::Display for SimilarityDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} exact, {} high-similarity candidates",
            self.exact, self.high_similarity
        )?;
        writeln!(f, "Name similarity distribution:")?;
        for (i, (lower, upper)) in BUCKETS.iter().enumerate() {
            writeln!(f, "  {lower:.2}-{upper:.2}: {}", self.name_counts[i])?;
        }
        writeln!(f, "Brand similarity distribution:")?;
        for (i, (lower, upper)) in BUCKETS.iter().enumerate() {
            writeln!(f, "  {lower:.2}-{upper:.2}: {}", self.brand_counts[i])?;
        }
        Ok(())
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

    fn config(name_threshold: f64, brand_threshold: f64) -> MatchConfig {
        MatchConfig {
            name_threshold,
            brand_threshold,
        }
    }

    #[test]
    fn test_identical_normalized_names_classify_exact() {
        // Different raw spellings, same standardized name.
        let primary = vec![keyed("Acme", "Glow Serum")];
        let secondary = vec![keyed("Acmee", "Glow  Serum!")];

        let candidates = find_candidates(&primary, &secondary, &config(0.8, 0.85));

        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert!((candidate.name_similarity - 1.0).abs() < f64::EPSILON);
        assert_eq!(candidate.kind, MatchKind::Exact);
        assert!(candidate.should_merge);
    }

    #[test]
    fn test_candidate_filter_is_strict_at_boundary() {
        // "abcd" vs "abcx": levenshtein 1 over len 4 => similarity 0.75.
        let primary = vec![keyed("zzz", "abcd")];
        let secondary = vec![keyed("yyy", "abcx")];

        let at_boundary = find_candidates(&primary, &secondary, &config(0.75, 0.99));
        assert!(
            at_boundary.is_empty(),
            "similarity equal to the threshold must be excluded"
        );

        let below_boundary = find_candidates(&primary, &secondary, &config(0.74, 0.99));
        assert_eq!(below_boundary.len(), 1);
        assert_eq!(below_boundary[0].kind, MatchKind::HighSimilarity);
    }

    #[test]
    fn test_should_merge_is_non_strict_at_boundary() {
        // Admitted via brand similarity; name similarity sits exactly on the
        // name threshold, where should_merge's >= comparison includes it.
        let primary = vec![keyed("glowco", "abcd")];
        let secondary = vec![keyed("glowco", "abcx")];

        let candidates = find_candidates(&primary, &secondary, &config(0.75, 0.8));

        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert!((candidate.name_similarity - 0.75).abs() < 1e-9);
        assert!(
            candidate.should_merge,
            "should_merge uses >= and must include the boundary"
        );
    }

    #[test]
    fn test_brand_only_admission_without_merge() {
        let primary = vec![keyed("Glow Cosmetics", "Day Cream")];
        let secondary = vec![keyed("Glow Cosmetic", "Eye Stick")];

        let candidates = find_candidates(&primary, &secondary, &config(0.8, 0.85));

        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert!(candidate.brand_similarity > 0.85);
        assert!(candidate.name_similarity < 0.8);
        assert!(!candidate.should_merge);
    }

    #[test]
    fn test_missing_fields_score_zero_not_one() {
        let nameless_a = normalize::keyed(RawRecord {
            brand: Some("Acme".into()),
            ..RawRecord::default()
        });
        let nameless_b = normalize::keyed(RawRecord {
            brand: Some("Acme".into()),
            ..RawRecord::default()
        });

        let candidates = find_candidates(&[nameless_a], &[nameless_b], &config(0.8, 0.85));

        assert_eq!(candidates.len(), 1, "identical brands should admit the pair");
        let candidate = &candidates[0];
        assert!(
            candidate.name_similarity.abs() < f64::EPSILON,
            "two absent names must not look identical"
        );
        assert!(!candidate.should_merge);
    }

    #[test]
    fn test_scan_is_exhaustive_and_order_stable() {
        let primary = vec![keyed("Acme", "Serum One"), keyed("Acme", "Serum Two")];
        let secondary = vec![keyed("Acme", "Serum Onee"), keyed("Acme", "Serum Twoo")];

        let first = find_candidates(&primary, &secondary, &config(0.8, 0.99));
        let second = find_candidates(&primary, &secondary, &config(0.8, 0.99));

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.primary_key, b.primary_key);
            assert_eq!(a.secondary_key, b.secondary_key);
        }
    }

    #[test]
    fn test_distribution_counts_buckets_and_kinds() {
        let primary = vec![keyed("Acme", "Glow Serum"), keyed("Acme", "Serum One")];
        let secondary = vec![keyed("Acme", "Glow Serum"), keyed("Acme", "Serum Onee")];

        // All four cross pairs are admitted: the identical brand (1.0) clears
        // the 0.99 brand threshold for every combination.
        let candidates = find_candidates(&primary, &secondary, &config(0.8, 0.99));
        let distribution = SimilarityDistribution::from_candidates(&candidates);

        assert_eq!(candidates.len(), 4);
        assert_eq!(distribution.exact, 1);
        assert_eq!(distribution.high_similarity, 3);
        // "serum_one" vs "serum_onee" scores 0.9, landing in [0.90, 0.95).
        assert_eq!(distribution.name_counts, [0, 0, 1, 0]);
        // Brand similarity is exactly 1.0 everywhere, outside every bucket.
        assert_eq!(distribution.brand_counts, [0, 0, 0, 0]);
    }
}
