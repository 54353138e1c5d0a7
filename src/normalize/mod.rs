//! Name and brand standardization for blocking-key construction.
//!
//! Normalization is pure, total, and idempotent: feeding an output back in
//! returns it unchanged, and no input panics.

use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::{KeyedRecord, RawRecord};

/// Parenthesised substrings are dropped entirely, including the parens.
#[allow(clippy::expect_used)]
static PARENTHESISED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*?\)").expect("parenthesised pattern is valid"));

/// Marketing punctuation replaced with underscore before collapsing.
#[allow(clippy::expect_used)]
static SPECIAL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[™®©&+/()%!-]").expect("special-character class is valid"));

/// Runs of whitespace or underscores collapse to a single underscore.
#[allow(clippy::expect_used)]
static SEPARATOR_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_]+").expect("separator-run pattern is valid"));

/// Known brand misspellings and encoding artifacts, keyed by their
/// *standardized* form so that casing, punctuation, and parenthesised
/// suffixes are already out of the way when the table is consulted.
///
/// The `est√_e` key is what the `Est√©e Lauder` UTF-8/Mac-Roman mojibake
/// reduces to once `©` goes through special-character replacement.
const BRAND_FIXES: &[(&str, &str)] = &[
    ("est√_e_lauder", "estée_lauder"),
    ("dr._roebuck's", "dr_roebuck's"),
    ("dr._roebucks", "dr_roebuck's"),
    ("dr_roebucks", "dr_roebuck's"),
];

/// Standardizes a free-text product or brand name into a comparable key
/// fragment.
///
/// Steps, in order: lower-case; strip parenthesised substrings; replace
/// special characters with `_`; collapse whitespace/underscore runs; trim
/// leading and trailing underscores. Inputs that are empty (or reduce to
/// nothing) yield `None`.
#[must_use]
pub fn normalize_name(raw: &str) -> Option<String> {
    let lowered = raw.to_lowercase();
    let without_parens = PARENTHESISED.replace_all(&lowered, "");
    let replaced = SPECIAL_CHARS.replace_all(&without_parens, "_");
    let collapsed = SEPARATOR_RUNS.replace_all(&replaced, "_");
    let trimmed = collapsed.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Standardizes a brand name: [`normalize_name`] plus the misspelling
/// lookup, so every spelling of a known-problem brand lands on one key.
#[must_use]
pub fn normalize_brand(raw: &str) -> Option<String> {
    let standardized = normalize_name(raw)?;
    let fixed = BRAND_FIXES
        .iter()
        .find(|(wrong, _)| *wrong == standardized)
        .map_or(standardized, |(_, correct)| (*correct).to_string());
    Some(fixed)
}

/// Builds the blocking key from standardized brand and name.
///
/// Underscore is safe as the separator: the normalizer collapses underscore
/// runs inside either side, so the join point is unambiguous for equality
/// purposes.
#[must_use]
pub fn match_key(brand_std: &str, name_std: &str) -> String {
    format!("{brand_std}_{name_std}")
}

/// Normalizes one raw record into a keyed record.
///
/// Missing or un-normalizable brand/name fields propagate as `None`; the
/// match key exists only when both sides do.
#[must_use]
pub fn keyed(record: RawRecord) -> KeyedRecord {
    let brand_std = record.brand.as_deref().and_then(normalize_brand);
    let name_std = record.name.as_deref().and_then(normalize_name);
    let match_key = match (&brand_std, &name_std) {
        (Some(brand), Some(name)) => Some(match_key(brand, name)),
        _ => None,
    };
    KeyedRecord {
        record,
        brand_std,
        name_std,
        match_key,
    }
}
