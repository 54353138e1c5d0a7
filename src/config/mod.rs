//! Configuration: thresholds, rule tables, merge columns, category
//! overrides. Everything validates at load time, before any record is
//! processed.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules::{AllergenGroup, InteractionRule, defaults};

/// Default name-similarity threshold.
pub const DEFAULT_NAME_THRESHOLD: f64 = 0.8;

/// Default brand-similarity threshold.
pub const DEFAULT_BRAND_THRESHOLD: f64 = 0.85;

/// Secondary columns joined onto the primary table when the caller does not
/// say otherwise. Mirrors the attribute set the source catalogs actually
/// disagree on.
pub const DEFAULT_COLUMNS_TO_MERGE: &[&str] = &[
    "clean_product",
    "n_of_reviews",
    "n_of_loves",
    "review_score",
    "size",
    "price_per_ounce",
    "return_on_reviews",
    "reviews_to_loves_ratio",
];

/// Similarity thresholds for the candidate scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Candidates above this name similarity merge; must be in [0, 1].
    pub name_threshold: f64,
    /// Candidates above this brand similarity are retained; must be in
    /// [0, 1].
    pub brand_threshold: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            name_threshold: DEFAULT_NAME_THRESHOLD,
            brand_threshold: DEFAULT_BRAND_THRESHOLD,
        }
    }
}

impl MatchConfig {
    /// Rejects thresholds outside [0, 1].
    ///
    /// # Errors
    /// Returns [`ConfigError::ThresholdOutOfRange`] naming the offender.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("name_threshold", self.name_threshold),
            ("brand_threshold", self.brand_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }
        Ok(())
    }
}

/// Rule-engine configuration: separator plus the allergen and interaction
/// tables. Immutable once the engine is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Ingredient-list separator.
    pub separator: char,
    /// Allergen keyword groups.
    pub groups: Vec<AllergenGroup>,
    /// Multi-ingredient interaction rules.
    pub interactions: Vec<InteractionRule>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            separator: crate::rules::DEFAULT_SEPARATOR,
            groups: defaults::allergen_groups(),
            interactions: defaults::interaction_rules(),
        }
    }
}

impl RuleConfig {
    /// Rejects groups without keywords and interaction rules below the
    /// two-substring minimum.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for group in &self.groups {
            if group.keywords.is_empty() {
                return Err(ConfigError::EmptyAllergenGroup {
                    id: group.id.clone(),
                });
            }
        }
        for rule in &self.interactions {
            if rule.ingredients.len() < 2 {
                return Err(ConfigError::RuleTooFewIngredients {
                    warning: rule.warning.clone(),
                    got: rule.ingredients.len(),
                });
            }
        }
        Ok(())
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Similarity thresholds.
    pub matching: MatchConfig,
    /// Rule-engine tables.
    pub rules: RuleConfig,
    /// Secondary columns to join onto the primary table; empty means the
    /// default set.
    pub columns_to_merge: Vec<String>,
    /// Category overrides keyed by match key, applied after consensus.
    pub category_overrides: BTreeMap<String, String>,
}

impl ReconcileConfig {
    /// Loads configuration from a JSON file; absent fields fall back to
    /// defaults. Validation runs before the config is returned.
    ///
    /// # Errors
    /// Returns [`ConfigError`] for unreadable files, invalid JSON, or
    /// out-of-range values.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.matching.validate()?;
        self.rules.validate()
    }

    /// The columns to join: the configured list, or the default set when
    /// none were configured.
    #[must_use]
    pub fn merge_columns(&self) -> Vec<String> {
        if self.columns_to_merge.is_empty() {
            DEFAULT_COLUMNS_TO_MERGE
                .iter()
                .map(ToString::to_string)
                .collect()
        } else {
            self.columns_to_merge.clone()
        }
    }
}

/// Fatal configuration failures, rejected before any record is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A similarity threshold is outside [0, 1].
    #[error("similarity threshold out of range: {name} = {value} (expected 0.0..=1.0)")]
    ThresholdOutOfRange {
        /// Which threshold.
        name: &'static str,
        /// The offending value.
        value: f64,
    },

    /// An interaction rule has fewer than two required substrings.
    #[error(
        "interaction rule '{warning}' has {got} required ingredients, need at least 2"
    )]
    RuleTooFewIngredients {
        /// The rule's warning text, for identification.
        warning: String,
        /// How many substrings it actually has.
        got: usize,
    },

    /// An allergen group has no keywords.
    #[error("allergen group '{id}' has no keywords")]
    EmptyAllergenGroup {
        /// The offending group id.
        id: String,
    },

    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Offending path.
        path: String,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for this schema.
    #[error("invalid config file {path}: {source}")]
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
    fn test_defaults_are_valid() {
        ReconcileConfig::default().validate().unwrap();
        let config = ReconcileConfig::default();
        assert!((config.matching.name_threshold - 0.8).abs() < f64::EPSILON);
        assert!((config.matching.brand_threshold - 0.85).abs() < f64::EPSILON);
        assert_eq!(config.rules.separator, ',');
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let config = MatchConfig {
            name_threshold: 1.2,
            brand_threshold: 0.85,
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ThresholdOutOfRange {
                name: "name_threshold",
                ..
            }
        ));

        let config = MatchConfig {
            name_threshold: 0.8,
            brand_threshold: -0.1,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_threshold_rejected() {
        let config = MatchConfig {
            name_threshold: f64::NAN,
            brand_threshold: 0.85,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_boundary_thresholds_accepted() {
        let config = MatchConfig {
            name_threshold: 0.0,
            brand_threshold: 1.0,
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_interaction_rule_below_arity_rejected() {
        let mut rules = RuleConfig::default();
        rules.interactions.push(InteractionRule {
            ingredients: vec!["retinol".into()],
            warning: "lonely rule".into(),
        });
        let err = rules.validate().unwrap_err();
        assert!(err.to_string().contains("lonely rule"));
        assert!(err.to_string().contains("at least 2"));
    }

    #[test]
    fn test_empty_allergen_group_rejected() {
        let mut rules = RuleConfig::default();
        rules.groups.push(AllergenGroup {
            id: "empty_group".into(),
            label: "Empty".into(),
            keywords: vec![],
        });
        let err = rules.validate().unwrap_err();
        assert!(err.to_string().contains("empty_group"));
    }

    #[test]
    fn test_from_path_applies_overrides_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"matching": {"name_threshold": 0.9}, "category_overrides": {"acme_glow_serum": "treatment"}}"#,
        )
        .unwrap();

        let config = ReconcileConfig::from_path(&path).unwrap();

        assert!((config.matching.name_threshold - 0.9).abs() < f64::EPSILON);
        // Unset fields keep their defaults.
        assert!((config.matching.brand_threshold - 0.85).abs() < f64::EPSILON);
        assert_eq!(config.rules.groups.len(), 17);
        assert_eq!(
            config.category_overrides.get("acme_glow_serum").map(String::as_str),
            Some("treatment")
        );
    }

    #[test]
    fn test_from_path_rejects_invalid_thresholds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"matching": {"name_threshold": 2.0}}"#).unwrap();
        let err = ReconcileConfig::from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ThresholdOutOfRange { .. }));
    }

    #[test]
    fn test_merge_columns_falls_back_to_default_set() {
        let config = ReconcileConfig::default();
        assert_eq!(config.merge_columns().len(), DEFAULT_COLUMNS_TO_MERGE.len());

        let custom = ReconcileConfig {
            columns_to_merge: vec!["price".into()],
            ..ReconcileConfig::default()
        };
        assert_eq!(custom.merge_columns(), vec!["price".to_string()]);
    }
}
