//! Promotion Factories
//!
//! Each factory is keyed by a rule type tag, declares its parameters up front and builds one
//! strategy from a rule record once every declared parameter has been coerced to its type.

use std::{fmt, str::FromStr, sync::Arc};

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::{
    items::ItemType,
    money::Money,
    promotions::{
        DiscountStrategy,
        types::{
            BUY_X_GET_Y_FREE, BuyXGetYFree, ComboFixedPrice, ITEM_COMBO_FIXED_PRICE,
            K_FOR_FIXED_PRICE, KForFixedPrice, MAX_SUBTOTAL_PERCENT_OFF, MIN_QTY_FIXED_UNIT_PRICE,
            MinQtyUnitPrice, SubtotalPercentOff, parse_combo,
        },
    },
    rules::{PromotionRule, RuleError},
};

/// The primitive type a parameter is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// A whole number, e.g. `"3"`
    Integer,

    /// A decimal number, e.g. `"0.75"`
    Decimal,

    /// Free text, passed through unchanged
    Text,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParamKind::Integer => "integer",
            ParamKind::Decimal => "decimal",
            ParamKind::Text => "text",
        })
    }
}

/// A declared factory parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// Key in the rule's `params` map
    pub key: &'static str,

    /// Type the raw value is coerced to
    pub kind: ParamKind,

    /// Whether the rule fails without it
    pub required: bool,
}

impl ParamSpec {
    /// A parameter the rule must provide.
    pub const fn required(key: &'static str, kind: ParamKind) -> Self {
        Self {
            key,
            kind,
            required: true,
        }
    }

    /// A parameter the rule may omit. A blank value counts as omitted.
    pub const fn optional(key: &'static str, kind: ParamKind) -> Self {
        Self {
            key,
            kind,
            required: false,
        }
    }

    fn coerce(&self, rule_type: &'static str, raw: &str) -> Result<ParamValue, RuleError> {
        let trimmed = raw.trim();

        let invalid = || RuleError::InvalidValue {
            key: self.key,
            rule_type,
            value: raw.to_string(),
            expected: match self.kind {
                ParamKind::Integer => "an integer",
                ParamKind::Decimal => "a decimal number",
                ParamKind::Text => "text",
            },
        };

        match self.kind {
            ParamKind::Integer => trimmed
                .parse::<i64>()
                .map(ParamValue::Integer)
                .map_err(|_err| invalid()),
            ParamKind::Decimal => Decimal::from_str(trimmed)
                .map(ParamValue::Decimal)
                .map_err(|_err| invalid()),
            ParamKind::Text => Ok(ParamValue::Text(raw.to_string())),
        }
    }
}

/// A coerced parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Integer value
    Integer(i64),

    /// Decimal value
    Decimal(Decimal),

    /// Text value
    Text(String),
}

/// The typed view of a rule handed to a factory's build function.
#[derive(Debug)]
pub struct RuleParams {
    rule_type: &'static str,
    item_type: Option<ItemType>,
    values: FxHashMap<&'static str, ParamValue>,
}

impl RuleParams {
    /// Normalised rule type tag
    pub fn rule_type(&self) -> &'static str {
        self.rule_type
    }

    /// The rule's item type.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::MissingItemType`] if the rule has none.
    pub fn item_type(&self) -> Result<ItemType, RuleError> {
        self.item_type.ok_or(RuleError::MissingItemType {
            rule_type: self.rule_type,
        })
    }

    /// An optional integer parameter.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnsupportedParamType`] if `key` wasn't declared as an integer.
    pub fn integer(&self, key: &'static str) -> Result<Option<i64>, RuleError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(ParamValue::Integer(value)) => Ok(Some(*value)),
            Some(_) => Err(self.unsupported(key, ParamKind::Integer)),
        }
    }

    /// An optional decimal parameter.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnsupportedParamType`] if `key` wasn't declared as a decimal.
    pub fn decimal(&self, key: &'static str) -> Result<Option<Decimal>, RuleError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(ParamValue::Decimal(value)) => Ok(Some(*value)),
            Some(_) => Err(self.unsupported(key, ParamKind::Decimal)),
        }
    }

    /// An optional text parameter.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnsupportedParamType`] if `key` wasn't declared as text.
    pub fn text(&self, key: &'static str) -> Result<Option<&str>, RuleError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(ParamValue::Text(value)) => Ok(Some(value.as_str())),
            Some(_) => Err(self.unsupported(key, ParamKind::Text)),
        }
    }

    /// An optional quantity parameter: a non-negative integer that fits a `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidValue`] for a negative or oversized value.
    pub fn optional_count(&self, key: &'static str) -> Result<Option<u32>, RuleError> {
        self.integer(key)?
            .map(|value| {
                u32::try_from(value).map_err(|_err| RuleError::InvalidValue {
                    key,
                    rule_type: self.rule_type,
                    value: value.to_string(),
                    expected: "a non-negative integer",
                })
            })
            .transpose()
    }

    /// A required quantity parameter.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::MissingParam`] if absent, otherwise see [`Self::optional_count`].
    pub fn count(&self, key: &'static str) -> Result<u32, RuleError> {
        self.optional_count(key)?
            .ok_or_else(|| self.missing(key))
    }

    /// An optional monetary parameter, rounded to two fraction digits.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnsupportedParamType`] if `key` wasn't declared as a decimal.
    pub fn optional_money(&self, key: &'static str) -> Result<Option<Money>, RuleError> {
        Ok(self.decimal(key)?.map(Money::new))
    }

    /// A required monetary parameter.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::MissingParam`] if absent.
    pub fn money(&self, key: &'static str) -> Result<Money, RuleError> {
        self.optional_money(key)?
            .ok_or_else(|| self.missing(key))
    }

    /// A required decimal parameter.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::MissingParam`] if absent.
    pub fn required_decimal(&self, key: &'static str) -> Result<Decimal, RuleError> {
        self.decimal(key)?.ok_or_else(|| self.missing(key))
    }

    /// A required text parameter.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::MissingParam`] if absent.
    pub fn required_text(&self, key: &'static str) -> Result<&str, RuleError> {
        self.text(key)?.ok_or_else(|| self.missing(key))
    }

    fn missing(&self, key: &'static str) -> RuleError {
        RuleError::MissingParam {
            key,
            rule_type: self.rule_type,
        }
    }

    fn unsupported(&self, key: &'static str, kind: ParamKind) -> RuleError {
        RuleError::UnsupportedParamType {
            key,
            rule_type: self.rule_type,
            kind,
        }
    }
}

/// Builds a strategy from coerced rule parameters.
pub type BuildFn = fn(&RuleParams) -> Result<Arc<dyn DiscountStrategy>, RuleError>;

/// A named strategy constructor.
#[derive(Clone, Copy)]
pub struct PromotionFactory {
    rule_type: &'static str,
    item_scoped: bool,
    params: &'static [ParamSpec],
    build: BuildFn,
}

impl PromotionFactory {
    /// Create a factory.
    ///
    /// `rule_type` is expected in its normalised, upper-case form.
    pub const fn new(
        rule_type: &'static str,
        item_scoped: bool,
        params: &'static [ParamSpec],
        build: BuildFn,
    ) -> Self {
        Self {
            rule_type,
            item_scoped,
            params,
            build,
        }
    }

    /// Rule type tag
    pub fn rule_type(&self) -> &'static str {
        self.rule_type
    }

    /// Whether rules of this type need an `itemType`
    pub fn item_scoped(&self) -> bool {
        self.item_scoped
    }

    /// Declared parameters
    pub fn params(&self) -> &'static [ParamSpec] {
        self.params
    }

    /// Validate and coerce a rule's parameters, then build the strategy.
    ///
    /// # Errors
    ///
    /// Returns an error if the item type or a required parameter is missing, a value can't be
    /// coerced, or the strategy rejects its parameters.
    pub fn build(&self, rule: &PromotionRule) -> Result<Arc<dyn DiscountStrategy>, RuleError> {
        if self.item_scoped && rule.item_type.is_none() {
            return Err(RuleError::MissingItemType {
                rule_type: self.rule_type,
            });
        }

        let mut values = FxHashMap::default();

        for spec in self.params {
            let raw = rule
                .params
                .get(spec.key)
                .filter(|raw| spec.kind == ParamKind::Text || !raw.trim().is_empty());

            match raw {
                Some(raw) => {
                    values.insert(spec.key, spec.coerce(self.rule_type, raw)?);
                }
                None if spec.required => {
                    return Err(RuleError::MissingParam {
                        key: spec.key,
                        rule_type: self.rule_type,
                    });
                }
                None => {}
            }
        }

        for key in rule.params.keys() {
            if !self.params.iter().any(|spec| spec.key == key) {
                warn!(
                    rule_type = self.rule_type,
                    key = key.as_str(),
                    "ignoring undeclared promotion parameter"
                );
            }
        }

        (self.build)(&RuleParams {
            rule_type: self.rule_type,
            item_type: rule.item_type,
            values,
        })
    }
}

impl fmt::Debug for PromotionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromotionFactory")
            .field("rule_type", &self.rule_type)
            .field("item_scoped", &self.item_scoped)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

const BUY_X_GET_Y_FREE_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("x", ParamKind::Integer),
    ParamSpec::required("y", ParamKind::Integer),
];

const K_FOR_FIXED_PRICE_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("k", ParamKind::Integer),
    ParamSpec::required("price", ParamKind::Decimal),
];

const MIN_QTY_FIXED_UNIT_PRICE_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("minQty", ParamKind::Integer),
    ParamSpec::required("unitPrice", ParamKind::Decimal),
];

const ITEM_COMBO_FIXED_PRICE_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("combo", ParamKind::Text),
    ParamSpec::required("price", ParamKind::Decimal),
    ParamSpec::optional("max", ParamKind::Integer),
];

const MAX_SUBTOTAL_PERCENT_OFF_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("threshold", ParamKind::Decimal),
    ParamSpec::required("percent", ParamKind::Decimal),
    ParamSpec::optional("cap", ParamKind::Decimal),
];

fn build_buy_x_get_y_free(params: &RuleParams) -> Result<Arc<dyn DiscountStrategy>, RuleError> {
    Ok(Arc::new(BuyXGetYFree::new(
        params.item_type()?,
        params.count("x")?,
        params.count("y")?,
    )?))
}

fn build_k_for_fixed_price(params: &RuleParams) -> Result<Arc<dyn DiscountStrategy>, RuleError> {
    Ok(Arc::new(KForFixedPrice::new(
        params.item_type()?,
        params.count("k")?,
        params.money("price")?,
    )?))
}

fn build_min_qty_unit_price(params: &RuleParams) -> Result<Arc<dyn DiscountStrategy>, RuleError> {
    Ok(Arc::new(MinQtyUnitPrice::new(
        params.item_type()?,
        params.count("minQty")?,
        params.money("unitPrice")?,
    )?))
}

fn build_combo_fixed_price(params: &RuleParams) -> Result<Arc<dyn DiscountStrategy>, RuleError> {
    Ok(Arc::new(ComboFixedPrice::new(
        parse_combo(params.required_text("combo")?)?,
        params.money("price")?,
        params.optional_count("max")?,
    )?))
}

fn build_subtotal_percent_off(
    params: &RuleParams,
) -> Result<Arc<dyn DiscountStrategy>, RuleError> {
    Ok(Arc::new(SubtotalPercentOff::new(
        params.money("threshold")?,
        params.required_decimal("percent")?,
        params.optional_money("cap")?,
    )?))
}

/// Factories keyed by rule type tag.
#[derive(Debug, Clone, Default)]
pub struct PromotionFactories {
    by_tag: FxHashMap<&'static str, PromotionFactory>,
}

impl PromotionFactories {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in rule types.
    pub fn with_defaults() -> Self {
        let mut factories = Self::new();

        factories
            .register(PromotionFactory::new(
                BUY_X_GET_Y_FREE,
                true,
                BUY_X_GET_Y_FREE_PARAMS,
                build_buy_x_get_y_free,
            ))
            .register(PromotionFactory::new(
                K_FOR_FIXED_PRICE,
                true,
                K_FOR_FIXED_PRICE_PARAMS,
                build_k_for_fixed_price,
            ))
            .register(PromotionFactory::new(
                MIN_QTY_FIXED_UNIT_PRICE,
                true,
                MIN_QTY_FIXED_UNIT_PRICE_PARAMS,
                build_min_qty_unit_price,
            ))
            .register(PromotionFactory::new(
                ITEM_COMBO_FIXED_PRICE,
                false,
                ITEM_COMBO_FIXED_PRICE_PARAMS,
                build_combo_fixed_price,
            ))
            .register(PromotionFactory::new(
                MAX_SUBTOTAL_PERCENT_OFF,
                false,
                MAX_SUBTOTAL_PERCENT_OFF_PARAMS,
                build_subtotal_percent_off,
            ));

        factories
    }

    /// Register a factory, replacing any previous one for the same tag.
    pub fn register(&mut self, factory: PromotionFactory) -> &mut Self {
        self.by_tag.insert(factory.rule_type, factory);

        self
    }

    /// Look up the factory for a rule type tag, ignoring case and surrounding whitespace.
    pub fn get(&self, rule_type: &str) -> Option<&PromotionFactory> {
        self.by_tag
            .get(rule_type.trim().to_ascii_uppercase().as_str())
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    /// Whether no factory is registered.
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    /// Build one rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnknownRuleType`] if no factory matches, otherwise the factory's error.
    pub fn build(&self, rule: &PromotionRule) -> Result<Arc<dyn DiscountStrategy>, RuleError> {
        let factory = self
            .get(&rule.rule_type)
            .ok_or_else(|| RuleError::UnknownRuleType(rule.rule_type.clone()))?;

        let strategy = factory.build(rule)?;

        debug!(
            rule_type = factory.rule_type,
            strategy = %strategy.name(),
            "built promotion"
        );

        Ok(strategy)
    }

    /// Build every rule, in order.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule's error; a malformed rule is never skipped.
    pub fn build_all<'a>(
        &self,
        rules: impl IntoIterator<Item = &'a PromotionRule>,
    ) -> Result<Vec<Arc<dyn DiscountStrategy>>, RuleError> {
        let strategies = rules
            .into_iter()
            .map(|rule| self.build(rule))
            .collect::<Result<Vec<_>, _>>()?;

        info!(strategies = strategies.len(), "built configured promotions");

        Ok(strategies)
    }
}
