//! Promotion Rules
//!
//! Declarative promotion records, as read from a YAML or JSON rule file, and their translation into
//! strategies through the [`PromotionFactories`] registry.
//!
//! ```yaml
//! promotions:
//!   - ruleType: K_FOR_FIXED_PRICE
//!     itemType: ORANGES
//!     params:
//!       k: "3"
//!       price: "0.75"
//!   - type: MAX_SUBTOTAL_PERCENT_OFF
//!     params: { threshold: "5.00", percent: "20", cap: "0.80" }
//! ```

use std::{fs, io, path::Path, sync::Arc};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    items::ItemType,
    promotions::{DiscountStrategy, PromotionError},
};

pub mod factories;

pub use factories::{
    ParamKind, ParamSpec, ParamValue, PromotionFactories, PromotionFactory, RuleParams,
};

/// Errors raised while loading promotion rules.
#[derive(Debug, Error)]
pub enum RuleError {
    /// No factory is registered for the rule type tag.
    #[error("No promotion factory registered for ruleType: {0}")]
    UnknownRuleType(String),

    /// A required parameter is absent.
    #[error("Missing param '{key}' for ruleType: {rule_type}")]
    MissingParam {
        /// Parameter key
        key: &'static str,

        /// Normalised rule type
        rule_type: &'static str,
    },

    /// An item-scoped rule has no `itemType`.
    #[error("Missing 'itemType' for ruleType: {rule_type}")]
    MissingItemType {
        /// Normalised rule type
        rule_type: &'static str,
    },

    /// A parameter value could not be coerced to its declared type.
    #[error("Invalid value '{value}' for param '{key}' of ruleType {rule_type}, expected {expected}")]
    InvalidValue {
        /// Parameter key
        key: &'static str,

        /// Normalised rule type
        rule_type: &'static str,

        /// Raw value
        value: String,

        /// What the value should have been
        expected: &'static str,
    },

    /// A factory asked for a parameter as a type it wasn't declared with.
    #[error("Unsupported {kind} access to param '{key}' of ruleType {rule_type}")]
    UnsupportedParamType {
        /// Parameter key
        key: &'static str,

        /// Normalised rule type
        rule_type: &'static str,

        /// Requested kind
        kind: ParamKind,
    },

    /// The strategy rejected its parameters.
    #[error(transparent)]
    Promotion(#[from] PromotionError),

    /// The rule file could not be read.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The rule file could not be parsed.
    #[error(transparent)]
    Yaml(#[from] serde_norway::Error),
}

/// A single declarative promotion rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PromotionRule {
    /// Rule type tag, matched case-insensitively after trimming
    #[serde(rename = "ruleType", alias = "type")]
    pub rule_type: String,

    /// Target item type, required by item-scoped rule types
    #[serde(rename = "itemType", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ItemType>,

    /// Named parameters; numbers and booleans are read as their text form
    #[serde(default, deserialize_with = "deserialize_params")]
    pub params: FxHashMap<String, String>,
}

impl PromotionRule {
    /// Create a rule from its parts.
    pub fn new<K, V>(
        rule_type: impl Into<String>,
        item_type: Option<ItemType>,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            rule_type: rule_type.into(),
            item_type,
            params: params
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Wrapper for a rule file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PromotionFile {
    /// Rules in file order
    #[serde(default)]
    pub promotions: Vec<PromotionRule>,
}

impl PromotionFile {
    /// Parse a YAML or JSON rule document.
    ///
    /// A blank document holds no rules.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Yaml`] if the document is malformed.
    pub fn parse(contents: &str) -> Result<Self, RuleError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_norway::from_str(contents)?)
    }

    /// Read and parse a rule file.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Io`] if the file cannot be read, or [`RuleError::Yaml`] if it is
    /// malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RuleError> {
        let contents = fs::read_to_string(path)?;

        Self::parse(&contents)
    }
}

/// Parse a rule document and build every rule in it.
///
/// # Errors
///
/// Returns the first parse or build error. No strategies are returned if any rule fails.
pub fn load_str(
    contents: &str,
    factories: &PromotionFactories,
) -> Result<Vec<Arc<dyn DiscountStrategy>>, RuleError> {
    let file = PromotionFile::parse(contents)?;

    factories.build_all(&file.promotions)
}

/// Read a rule file and build every rule in it.
///
/// # Errors
///
/// Returns the first read, parse or build error. No strategies are returned if any rule fails.
pub fn load_file(
    path: impl AsRef<Path>,
    factories: &PromotionFactories,
) -> Result<Vec<Arc<dyn DiscountStrategy>>, RuleError> {
    let path = path.as_ref();
    let file = PromotionFile::load(path)?;
    let strategies = factories.build_all(&file.promotions)?;

    info!(
        path = %path.display(),
        rules = strategies.len(),
        "loaded promotion rules"
    );

    Ok(strategies)
}

fn deserialize_params<'de, D>(deserializer: D) -> Result<FxHashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Integer(i64),
        Float(f64),
        Flag(bool),
    }

    let raw = FxHashMap::<String, Option<Scalar>>::deserialize(deserializer)?;

    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value? {
                Scalar::Text(text) => text,
                Scalar::Integer(number) => number.to_string(),
                Scalar::Float(number) => number.to_string(),
                Scalar::Flag(flag) => flag.to_string(),
            };

            Some((key, value))
        })
        .collect())
}
