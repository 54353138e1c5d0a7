//! Catalog data model: raw rows, normalized records, and the canonical table.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::normalize;

/// One row from a source catalog. Semantic fields are typed; everything else
/// (price, review counts, catalog-specific flags) rides in `extra`.
///
/// Catalogs disagree on field casing (`Brand` vs `brand`), so the semantic
/// fields accept the capitalized spellings seen in scraped exports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Brand as printed by the source catalog.
    #[serde(default, alias = "Brand", skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Product name as printed by the source catalog.
    #[serde(default, alias = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Catalog-specific category label (`Label` in some exports).
    #[serde(
        default,
        alias = "Label",
        alias = "category",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_label: Option<String>,
    /// Free-text ingredient list, separator-delimited.
    #[serde(default, alias = "Ingredients", skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<String>,
    /// Remaining catalog-specific columns, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RawRecord {
    /// Returns the value of a named column, covering both semantic fields
    /// and `extra` columns. Semantic fields come back as JSON strings.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Value> {
        match name {
            "brand" => self.brand.clone().map(Value::String),
            "name" => self.name.clone().map(Value::String),
            "category_label" => self.category_label.clone().map(Value::String),
            "ingredients" => self.ingredients.clone().map(Value::String),
            _ => self.extra.get(name).cloned(),
        }
    }

    /// True when the record carries neither a brand nor a name and therefore
    /// can never be keyed or matched.
    #[must_use]
    pub fn is_unidentifiable(&self) -> bool {
        let blank = |field: &Option<String>| {
            field
                .as_deref()
                .is_none_or(|value| value.trim().is_empty())
        };
        blank(&self.brand) && blank(&self.name)
    }
}

/// A named sequence of raw records from one source.
///
/// The name identifies the catalog in logs and seeds the column-conflict
/// suffix during merging (e.g. `price_sephora`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Source identifier, e.g. `"sephora"`.
    pub name: String,
    /// Rows in source order.
    pub records: Vec<RawRecord>,
}

impl Catalog {
    /// Creates a catalog from already-parsed records.
    #[must_use]
    pub fn new(name: impl Into<String>, records: Vec<RawRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Loads a catalog from a JSON file holding an array of records.
    ///
    /// # Errors
    /// Returns [`CatalogError`] when the file cannot be read or is not a
    /// JSON array of records.
    pub fn from_path(name: impl Into<String>, path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let records: Vec<RawRecord> =
            serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self::new(name, records))
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the catalog holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} records)", self.name, self.records.len())
    }
}

/// A raw record plus its normalization products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedRecord {
    /// The source row, unchanged.
    pub record: RawRecord,
    /// Standardized brand, when the brand normalized to something non-empty.
    pub brand_std: Option<String>,
    /// Standardized product name.
    pub name_std: Option<String>,
    /// Blocking key `brand_std + "_" + name_std`; present only when both
    /// sides normalized.
    pub match_key: Option<String>,
}

impl KeyedRecord {
    /// Best available key for this record: the full match key, or whatever
    /// standardized part exists when one side is missing.
    #[must_use]
    pub fn partial_key(&self) -> Option<String> {
        match (&self.brand_std, &self.name_std) {
            (Some(brand), Some(name)) => Some(normalize::match_key(brand, name)),
            (Some(brand), None) => Some(brand.clone()),
            (None, Some(name)) => Some(name.clone()),
            (None, None) => None,
        }
    }
}

/// The merged record: union of primary-catalog fields and the secondary
/// columns joined onto them. Rebuilt from scratch on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProduct {
    /// Stable product identifier within one run.
    pub match_key: String,
    /// Brand from the primary catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Name from the primary catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Reconciled category, filled by the category consensus pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Ingredient list from the primary catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<String>,
    /// Union of attribute columns from both catalogs.
    pub columns: BTreeMap<String, Value>,
}

/// Errors loading catalog input.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        /// Offending path.
        path: String,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// The catalog file is not a JSON array of records.
    #[error("invalid catalog file {path}: {source}")]
    Parse {
        /// Offending path.
        path: String,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_accepts_capitalized_aliases() {
        let record: RawRecord = serde_json::from_str(
            r#"{"Brand": "Acme", "Name": "Glow Serum", "Ingredients": "water, retinol", "Price": 42.0}"#,
        )
        .unwrap();
        assert_eq!(record.brand.as_deref(), Some("Acme"));
        assert_eq!(record.name.as_deref(), Some("Glow Serum"));
        assert_eq!(record.ingredients.as_deref(), Some("water, retinol"));
        assert_eq!(record.extra.get("Price"), Some(&Value::from(42.0)));
    }

    #[test]
    fn test_raw_record_column_reads_semantic_and_extra() {
        let record: RawRecord = serde_json::from_str(
            r#"{"brand": "Acme", "name": "Serum", "review_score": 4.5}"#,
        )
        .unwrap();
        assert_eq!(record.column("brand"), Some(Value::String("Acme".into())));
        assert_eq!(record.column("review_score"), Some(Value::from(4.5)));
        assert_eq!(record.column("missing"), None);
    }

    #[test]
    fn test_raw_record_unidentifiable_requires_both_missing() {
        let neither: RawRecord = serde_json::from_str(r#"{"price": 1.0}"#).unwrap();
        assert!(neither.is_unidentifiable());

        let blank: RawRecord =
            serde_json::from_str(r#"{"brand": "  ", "name": ""}"#).unwrap();
        assert!(blank.is_unidentifiable());

        let brand_only: RawRecord = serde_json::from_str(r#"{"brand": "Acme"}"#).unwrap();
        assert!(!brand_only.is_unidentifiable());
    }

    #[test]
    fn test_catalog_display_includes_name_and_count() {
        let catalog = Catalog::new("sephora", vec![RawRecord::default()]);
        assert_eq!(catalog.to_string(), "sephora (1 records)");
        assert_eq!(catalog.len(), 1);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_catalog_from_path_rejects_non_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"not": "an array"}"#).unwrap();
        let err = Catalog::from_path("bad", &path).unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn test_keyed_record_partial_key_fallbacks() {
        let keyed = KeyedRecord {
            record: RawRecord::default(),
            brand_std: Some("acme".into()),
            name_std: None,
            match_key: None,
        };
        assert_eq!(keyed.partial_key().as_deref(), Some("acme"));

        let keyed = KeyedRecord {
            record: RawRecord::default(),
            brand_std: None,
            name_std: Some("glow_serum".into()),
            match_key: None,
        };
        assert_eq!(keyed.partial_key().as_deref(), Some("glow_serum"));

        let keyed = KeyedRecord {
            record: RawRecord::default(),
            brand_std: None,
            name_std: None,
            match_key: None,
        };
        assert_eq!(keyed.partial_key(), None);
    }
}
