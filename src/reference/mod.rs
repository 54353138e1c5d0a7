//! Ingredient reference enrichment.
//!
//! Joins a product's token set against a reference catalog of ingredient
//! write-ups (description, functions, benefits, rating) by exact
//! normalized-name lookup.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::catalog::CatalogError;

/// One ingredient write-up after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceEntry {
    /// Lower-cased ingredient name, the lookup key.
    pub name: String,
    /// Prose description.
    pub description: String,
    /// Functional roles, as published.
    pub functions: String,
    /// Benefit list, split from the `;;`-delimited source field.
    pub benefits: Vec<String>,
    /// Ingredient category labels.
    pub category: String,
    /// Numeric rating on a 1–5 scale; textual ratings are converted, and
    /// unrated entries stay `None`.
    pub rating: Option<f64>,
}

/// Raw reference row as exported; ratings arrive as text or numbers.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceRecord {
    /// Ingredient name as printed.
    pub ingredient_name: String,
    /// Prose description.
    #[serde(default)]
    pub description: Option<String>,
    /// Functional roles.
    #[serde(default)]
    pub functions: Option<String>,
    /// `;;`-delimited benefits.
    #[serde(default)]
    pub benefits: Option<String>,
    /// Category labels.
    #[serde(default)]
    pub categories: Option<String>,
    /// `BEST`/`GOOD`/… or a number.
    #[serde(default)]
    pub rating: Option<Value>,
}

/// Converts a textual or numeric rating to the 1–5 scale.
///
/// Unrecognized text and `NOT RATED` convert to `None`.
#[must_use]
pub fn convert_rating(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => match text.trim().to_uppercase().as_str() {
            "BEST" => Some(5.0),
            "GOOD" => Some(4.0),
            "AVERAGE" => Some(3.0),
            "BAD" => Some(2.0),
            "WORST" => Some(1.0),
            _ => None,
        },
        _ => None,
    }
}

/// Splits the `;;`-delimited benefits field, dropping empties.
#[must_use]
pub fn split_benefits(raw: &str) -> Vec<String> {
    raw.split(";;")
        .map(str::trim)
        .filter(|benefit| !benefit.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Case-insensitive ingredient-name index over reference entries.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    entries: HashMap<String, ReferenceEntry>,
}

impl ReferenceIndex {
    /// Builds the index from raw reference rows. Later duplicates of a name
    /// replace earlier ones, matching a keyed re-load of the source export.
    #[must_use]
    pub fn from_records(records: Vec<ReferenceRecord>) -> Self {
        let mut entries = HashMap::with_capacity(records.len());
        for record in records {
            let name = record.ingredient_name.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            let entry = ReferenceEntry {
                name: name.clone(),
                description: record.description.unwrap_or_default(),
                functions: record.functions.unwrap_or_default(),
                benefits: record
                    .benefits
                    .as_deref()
                    .map(split_benefits)
                    .unwrap_or_default(),
                category: record.categories.unwrap_or_default(),
                rating: record.rating.as_ref().and_then(convert_rating),
            };
            entries.insert(name, entry);
        }
        debug!(entries = entries.len(), "reference index built");
        Self { entries }
    }

    /// Loads the index from a JSON file holding an array of reference rows.
    ///
    /// # Errors
    /// Returns [`CatalogError`] when the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let records: Vec<ReferenceRecord> =
            serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self::from_records(records))
    }

    /// Looks up one ingredient by name, case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ReferenceEntry> {
        self.entries.get(&name.trim().to_lowercase())
    }

    /// Entries for every token present in the index, in token order.
    #[must_use]
    pub fn details_for(&self, tokens: &BTreeSet<String>) -> Vec<&ReferenceEntry> {
        tokens
            .iter()
            .filter_map(|token| self.entries.get(token))
            .collect()
    }

    /// Number of indexed ingredients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the index holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
