//! Promotions
//!
//! Discount strategies come in two levels. A [`DiscountStrategy`] prices a single item line: the
//! checkout hands it an item type, the basket quantity and the unit price, and the strategy decides
//! for itself whether it applies. A [`BasketLevelStrategy`] extends that capability set with a
//! whole-basket evaluation; its per-item methods are fixed to "never applies" so it only ever runs
//! through [`DiscountStrategy::basket_level`].

use std::fmt;

use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    basket::Basket,
    catalog::{CatalogError, PriceSource},
    items::ItemType,
    money::Money,
};

pub mod defaults;
pub mod registry;
pub mod types;

/// Priority of a strategy that doesn't declare one.
pub const DEFAULT_PRIORITY: i32 = 100;

/// Priority of basket-level strategies, after every item strategy.
pub const BASKET_LEVEL_PRIORITY: i32 = 1000;

/// Errors raised when constructing a strategy from invalid parameters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromotionError {
    /// A construction parameter was out of range.
    #[error("Invalid {promotion} parameter: {reason}")]
    InvalidParameter {
        /// Promotion kind, e.g. `BUY_X_GET_Y_FREE`
        promotion: &'static str,

        /// What was wrong
        reason: String,
    },
}

impl PromotionError {
    pub(crate) fn invalid(promotion: &'static str, reason: impl Into<String>) -> Self {
        PromotionError::InvalidParameter {
            promotion,
            reason: reason.into(),
        }
    }
}

/// The outcome of evaluating a strategy.
///
/// A zero amount means "not applicable" and never produces a receipt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountResult {
    description: String,
    amount: Money,
}

impl DiscountResult {
    /// A discount of `amount`.
    ///
    /// Amounts that aren't positive collapse to [`DiscountResult::none`].
    pub fn new(description: impl Into<String>, amount: Money) -> Self {
        if amount.is_positive() {
            Self {
                description: description.into(),
                amount,
            }
        } else {
            Self::none()
        }
    }

    /// The "not applicable" result.
    pub fn none() -> Self {
        Self {
            description: String::new(),
            amount: Money::ZERO,
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Discount amount, never negative.
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Whether this result should produce a discount line.
    pub fn is_applicable(&self) -> bool {
        self.amount.is_positive()
    }
}

/// A per-item discount rule.
///
/// Implementations are immutable after construction and shared between concurrent checkouts.
pub trait DiscountStrategy: Send + Sync + fmt::Debug {
    /// Short identifier used in logs, e.g. `bananas-b2g1`.
    fn name(&self) -> String;

    /// Whether this strategy targets `item_type`.
    fn supports(&self, item_type: ItemType) -> bool;

    /// Evaluation order among strategies for the same item; lower runs first.
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// Evaluate the strategy for one item line.
    ///
    /// `quantity` is the basket's total quantity of `item_type` and `unit_price` its catalog price.
    /// Returns [`DiscountResult::none`] when the strategy doesn't apply.
    fn apply(&self, item_type: ItemType, quantity: u32, unit_price: Money) -> DiscountResult;

    /// The basket-level capability, if this strategy has it.
    fn basket_level(&self) -> Option<&dyn BasketLevelStrategy> {
        None
    }

    /// Whether this strategy evaluates the whole basket.
    fn is_basket_level(&self) -> bool {
        self.basket_level().is_some()
    }
}

/// A whole-basket discount rule.
pub trait BasketLevelStrategy: DiscountStrategy {
    /// Evaluate the strategy against the whole basket in a single pass.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if a needed unit price is missing from `prices`.
    fn apply_basket(
        &self,
        basket: &Basket,
        prices: &dyn PriceSource,
    ) -> Result<DiscountResult, CatalogError>;

    /// Whether at most one exclusive basket strategy may apply per checkout.
    fn exclusive(&self) -> bool {
        true
    }

    /// Item types whose per-item discounts are suppressed when this strategy wins.
    ///
    /// Empty means the whole basket.
    fn affected_items(&self) -> SmallVec<[ItemType; 5]> {
        SmallVec::new()
    }
}
