//! Buy X Get Y Free
//!
//! For every complete group of `buy + free` units of one item type, `free` units cost nothing.

use crate::{
    items::ItemType,
    money::Money,
    promotions::{DiscountResult, DiscountStrategy, PromotionError},
};

/// Rule tag for [`BuyXGetYFree`].
pub const BUY_X_GET_Y_FREE: &str = "BUY_X_GET_Y_FREE";

/// Buy `buy` units of an item, get `free` more at no cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyXGetYFree {
    item_type: ItemType,
    buy: u32,
    free: u32,
}

impl BuyXGetYFree {
    /// Evaluation priority.
    pub const PRIORITY: i32 = 50;

    /// Create a new Buy X Get Y Free promotion.
    ///
    /// # Errors
    ///
    /// Returns [`PromotionError::InvalidParameter`] if `buy` or `free` is zero.
    pub fn new(item_type: ItemType, buy: u32, free: u32) -> Result<Self, PromotionError> {
        if buy == 0 {
            return Err(PromotionError::invalid(BUY_X_GET_Y_FREE, "x must be > 0"));
        }

        if free == 0 {
            return Err(PromotionError::invalid(BUY_X_GET_Y_FREE, "y must be > 0"));
        }

        Ok(Self {
            item_type,
            buy,
            free,
        })
    }

    /// Return the targeted item type
    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Units bought per group
    pub fn buy(&self) -> u32 {
        self.buy
    }

    /// Units free per group
    pub fn free(&self) -> u32 {
        self.free
    }

    fn description(&self) -> String {
        format!(
            "Buy {} Get {} Free ({})",
            self.buy,
            self.free,
            self.item_type.name()
        )
    }
}

impl DiscountStrategy for BuyXGetYFree {
    fn name(&self) -> String {
        format!(
            "{}-b{}g{}",
            self.item_type.display_name(),
            self.buy,
            self.free
        )
    }

    fn supports(&self, item_type: ItemType) -> bool {
        item_type == self.item_type
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn apply(&self, item_type: ItemType, quantity: u32, unit_price: Money) -> DiscountResult {
        if !self.supports(item_type) {
            return DiscountResult::none();
        }

        let group = self.buy.saturating_add(self.free);

        if quantity < group {
            return DiscountResult::none();
        }

        let free_units = (quantity / group).saturating_mul(self.free);

        DiscountResult::new(self.description(), unit_price.times(free_units))
    }
}
