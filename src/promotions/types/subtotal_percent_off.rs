//! Subtotal Percent Off
//!
//! A basket-level promotion: once the basket subtotal reaches a threshold, take a percentage off the
//! whole subtotal, optionally capped at a maximum amount.

use rust_decimal::Decimal;

use crate::{
    basket::Basket,
    catalog::{CatalogError, PriceSource},
    items::ItemType,
    money::{Money, scale},
    promotions::{
        BASKET_LEVEL_PRIORITY, BasketLevelStrategy, DiscountResult, DiscountStrategy,
        PromotionError,
    },
};

/// Rule tag for [`SubtotalPercentOff`].
pub const MAX_SUBTOTAL_PERCENT_OFF: &str = "MAX_SUBTOTAL_PERCENT_OFF";

/// A percentage off the basket subtotal above a threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtotalPercentOff {
    threshold: Money,
    percent: Decimal,
    cap: Option<Money>,
}

impl SubtotalPercentOff {
    /// Create a new subtotal percentage promotion.
    ///
    /// `percent` is rounded to two fraction digits.
    ///
    /// # Errors
    ///
    /// Returns [`PromotionError::InvalidParameter`] if `threshold` is negative, `percent` is outside
    /// `0..=100` or `cap` isn't positive.
    pub fn new(
        threshold: Money,
        percent: Decimal,
        cap: Option<Money>,
    ) -> Result<Self, PromotionError> {
        let percent = scale(percent);

        if threshold < Money::ZERO {
            return Err(PromotionError::invalid(
                MAX_SUBTOTAL_PERCENT_OFF,
                "threshold must be >= 0",
            ));
        }

        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(PromotionError::invalid(
                MAX_SUBTOTAL_PERCENT_OFF,
                "percent must be between 0 and 100",
            ));
        }

        if cap.is_some_and(|cap| !cap.is_positive()) {
            return Err(PromotionError::invalid(
                MAX_SUBTOTAL_PERCENT_OFF,
                "cap must be > 0 when provided",
            ));
        }

        Ok(Self {
            threshold,
            percent,
            cap,
        })
    }

    /// Minimum subtotal for the promotion to apply
    pub fn threshold(&self) -> Money {
        self.threshold
    }

    /// Percentage taken off the subtotal
    pub fn percent(&self) -> Decimal {
        self.percent
    }

    /// Maximum discount, if capped
    pub fn cap(&self) -> Option<Money> {
        self.cap
    }
}

impl DiscountStrategy for SubtotalPercentOff {
    fn name(&self) -> String {
        let percent = self.percent.normalize();

        match self.cap {
            Some(cap) => format!(
                "subtotal-{}-{percent}-pct-off-cap-{cap}",
                self.threshold
            ),
            None => format!("subtotal-{}-{percent}-pct-off", self.threshold),
        }
    }

    fn supports(&self, _item_type: ItemType) -> bool {
        false
    }

    fn priority(&self) -> i32 {
        BASKET_LEVEL_PRIORITY
    }

    fn apply(&self, _item_type: ItemType, _quantity: u32, _unit_price: Money) -> DiscountResult {
        DiscountResult::none()
    }

    fn basket_level(&self) -> Option<&dyn BasketLevelStrategy> {
        Some(self)
    }
}

impl BasketLevelStrategy for SubtotalPercentOff {
    fn apply_basket(
        &self,
        basket: &Basket,
        prices: &dyn PriceSource,
    ) -> Result<DiscountResult, CatalogError> {
        if basket.is_empty() {
            return Ok(DiscountResult::none());
        }

        let mut subtotal = Money::ZERO;

        for item in basket {
            subtotal = subtotal + prices.price_of(item.item_type())?.times(item.quantity());
        }

        if subtotal < self.threshold {
            return Ok(DiscountResult::none());
        }

        let raw = subtotal.percent(self.percent);
        let discount = self.cap.map_or(raw, |cap| raw.min(cap));

        let mut description = format!(
            "{}% off subtotal >= £{}",
            self.percent.normalize(),
            self.threshold
        );

        if let Some(cap) = self.cap {
            description.push_str(&format!(" (cap £{cap})"));
        }

        Ok(DiscountResult::new(description, discount))
    }
}
