//! Keyword and rule evaluation over a product's ingredient set.

pub mod defaults;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::CanonicalProduct;
use crate::config::{ConfigError, RuleConfig};

/// Default ingredient-list separator in scraped catalogs.
pub const DEFAULT_SEPARATOR: char = ',';

/// Water/solvent carriers excluded from every token set; they carry no
/// safety signal. Matched by exact token equality.
const WATER_SYNONYMS: &[&str] = &[
    "water",
    "aqua",
    "eau",
    "water/eau",
    "purified water",
    "distilled water",
];

/// Non-printing sentinel standing in for protected separators during the
/// split. Cannot occur in INCI text, so restoration is exact.
const MASK: char = '\u{1F}';

/// Numeric compound names like `1,2-hexanediol` embed the separator; their
/// inner comma must survive the split.
#[allow(clippy::expect_used)]
static COMPOUND_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+,\d+-\w+").expect("compound-name pattern is valid"));

/// A named set of keyword substrings flagging one allergen family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllergenGroup {
    /// Stable identifier, e.g. `parabens_group`.
    pub id: String,
    /// Display label, e.g. `Parabens`.
    pub label: String,
    /// Lower-case substrings; any one found in any token fires the group.
    pub keywords: Vec<String>,
}

/// A multi-ingredient conflict: fires only when every required substring is
/// found somewhere in the product's ingredient set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRule {
    /// Required ingredient-name substrings (at least two).
    pub ingredients: Vec<String>,
    /// Operator-facing warning text.
    pub warning: String,
}

/// A structured safety warning produced by the rule engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// An allergen group fired.
    Allergen {
        /// The group's display label.
        label: String,
        /// The keyword list responsible.
        keywords: Vec<String>,
    },
    /// An interaction rule fired.
    Interaction {
        /// The rule's warning text.
        message: String,
        /// The required substrings that were all found.
        ingredients: Vec<String>,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allergen { label, .. } => {
                // Labels carry parenthesised clarifications; the short form
                // before " (" is what operators read in listings.
                let short = label.split(" (").next().unwrap_or(label);
                write!(f, "Contains: {short}")
            }
            Self::Interaction { message, .. } => write!(f, "{message}"),
        }
    }
}

/// Splits a separator-delimited ingredient string into a normalized token
/// set.
///
/// Two passes: separators inside numeric compound names are masked first,
/// then the generic split runs and the mask is restored, so
/// `1,2-hexanediol` survives a comma split intact. Tokens are trimmed and
/// lower-cased; water synonyms are dropped; duplicates collapse. Empty
/// input yields an empty set.
#[must_use]
pub fn tokenize(ingredients: &str, separator: char) -> BTreeSet<String> {
    let masked = COMPOUND_NAME.replace_all(ingredients, |caps: &regex::Captures<'_>| {
        caps[0].replace(separator, &MASK.to_string())
    });

    masked
        .split(separator)
        .map(|token| token.trim().to_lowercase().replace(MASK, &separator.to_string()))
        .filter(|token| !token.is_empty())
        .filter(|token| !WATER_SYNONYMS.contains(&token.as_str()))
        .collect()
}

/// Evaluates ingredient sets against an injected, immutable rule
/// configuration. No module-level state: tests substitute minimal fixture
/// configs.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    config: RuleConfig,
}

impl Default for RuleEngine {
    fn default() -> Self {
        // The predefined tables are valid by construction.
        Self {
            config: RuleConfig::default(),
        }
    }
}

impl RuleEngine {
    /// Creates an engine, rejecting invalid configuration up front.
    ///
    /// # Errors
    /// Returns [`ConfigError`] for interaction rules with fewer than two
    /// required substrings or allergen groups without keywords.
    pub fn new(config: RuleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Tokenizes with the configured separator.
    #[must_use]
    pub fn tokenize(&self, ingredients: &str) -> BTreeSet<String> {
        tokenize(ingredients, self.config.separator)
    }

    /// Checks the selected allergen groups against a token set.
    ///
    /// A group fires iff any token contains any of its keywords (substring
    /// containment, not token equality). An empty selection evaluates every
    /// configured group. Unknown group ids are skipped. One warning per
    /// firing group.
    #[must_use]
    pub fn check_allergens(
        &self,
        tokens: &BTreeSet<String>,
        selected: &[String],
    ) -> Vec<Warning> {
        let groups: Vec<&AllergenGroup> = if selected.is_empty() {
            self.config.groups.iter().collect()
        } else {
            selected
                .iter()
                .filter_map(|id| self.config.groups.iter().find(|group| &group.id == id))
                .collect()
        };

        groups
            .iter()
            .filter(|group| group_fires(group, tokens))
            .map(|group| Warning::Allergen {
                label: group.label.clone(),
                keywords: group.keywords.clone(),
            })
            .collect()
    }

    /// Checks every interaction rule against a token set.
    ///
    /// A rule fires iff each of its required substrings is contained
    /// (case-insensitively) in at least one token; different substrings may
    /// be satisfied by different tokens, and one token may satisfy several.
    #[must_use]
    pub fn check_interactions(&self, tokens: &BTreeSet<String>) -> Vec<Warning> {
        self.config
            .interactions
            .iter()
            .filter(|rule| {
                rule.ingredients.iter().all(|required| {
                    let required = required.to_lowercase();
                    tokens.iter().any(|token| token.contains(&required))
                })
            })
            .map(|rule| Warning::Interaction {
                message: rule.warning.clone(),
                ingredients: rule.ingredients.clone(),
            })
            .collect()
    }

    /// Evaluates a raw ingredient string: allergen warnings first, then
    /// interaction warnings. No ingredient data degrades to no warnings.
    #[must_use]
    pub fn evaluate_ingredients(&self, ingredients: &str, selected: &[String]) -> Vec<Warning> {
        let tokens = self.tokenize(ingredients);
        if tokens.is_empty() {
            return Vec::new();
        }
        let mut warnings = self.check_allergens(&tokens, selected);
        warnings.extend(self.check_interactions(&tokens));
        debug!(
            tokens = tokens.len(),
            warnings = warnings.len(),
            "ingredient evaluation complete"
        );
        warnings
    }

    /// Evaluates a canonical product's ingredient list.
    #[must_use]
    pub fn evaluate(&self, product: &CanonicalProduct, selected: &[String]) -> Vec<Warning> {
        product
            .ingredients
            .as_deref()
            .map(|ingredients| self.evaluate_ingredients(ingredients, selected))
            .unwrap_or_default()
    }
}

/// Single substring-containment predicate shared by every group; no
/// group-specific special-casing.
fn group_fires(group: &AllergenGroup, tokens: &BTreeSet<String>) -> bool {
    tokens.iter().any(|token| {
        group
            .keywords
            .iter()
            .any(|keyword| token.contains(&keyword.to_lowercase()))
    })
}
