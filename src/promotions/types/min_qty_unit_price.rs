//! Minimum Quantity Unit Price
//!
//! Once a minimum quantity of one item type is reached, every unit of it is charged a lower unit
//! price.

use crate::{
    items::ItemType,
    money::Money,
    promotions::{DiscountResult, DiscountStrategy, PromotionError},
};

/// Rule tag for [`MinQtyUnitPrice`].
pub const MIN_QTY_FIXED_UNIT_PRICE: &str = "MIN_QTY_FIXED_UNIT_PRICE";

/// A discounted unit price from a minimum quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinQtyUnitPrice {
    item_type: ItemType,
    min_qty: u32,
    unit_price: Money,
}

impl MinQtyUnitPrice {
    /// Evaluation priority.
    pub const PRIORITY: i32 = 70;

    /// Create a new minimum quantity unit price promotion.
    ///
    /// # Errors
    ///
    /// Returns [`PromotionError::InvalidParameter`] if `min_qty` is zero or `unit_price` isn't
    /// positive.
    pub fn new(item_type: ItemType, min_qty: u32, unit_price: Money) -> Result<Self, PromotionError> {
        if min_qty == 0 {
            return Err(PromotionError::invalid(
                MIN_QTY_FIXED_UNIT_PRICE,
                "minQty must be > 0",
            ));
        }

        if !unit_price.is_positive() {
            return Err(PromotionError::invalid(
                MIN_QTY_FIXED_UNIT_PRICE,
                "unitPrice must be > 0",
            ));
        }

        Ok(Self {
            item_type,
            min_qty,
            unit_price,
        })
    }

    /// Return the targeted item type
    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Quantity from which the discounted price applies
    pub fn min_qty(&self) -> u32 {
        self.min_qty
    }

    /// Discounted unit price
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }
}

impl DiscountStrategy for MinQtyUnitPrice {
    fn name(&self) -> String {
        format!(
            "{}-min-{}-unit-{}",
            self.item_type.display_name(),
            self.min_qty,
            self.unit_price
        )
    }

    fn supports(&self, item_type: ItemType) -> bool {
        item_type == self.item_type
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn apply(&self, item_type: ItemType, quantity: u32, unit_price: Money) -> DiscountResult {
        if !self.supports(item_type) || quantity < self.min_qty {
            return DiscountResult::none();
        }

        let saving = unit_price - self.unit_price;

        if !saving.is_positive() {
            return DiscountResult::none();
        }

        DiscountResult::new(
            format!(
                "{} unit £{} (min {})",
                self.item_type.name(),
                self.unit_price,
                self.min_qty
            ),
            saving.times(quantity),
        )
    }
}
