//! K For Fixed Price
//!
//! Every complete group of `k` units of one item type costs a fixed group price.

use crate::{
    items::ItemType,
    money::Money,
    promotions::{DiscountResult, DiscountStrategy, PromotionError},
};

/// Rule tag for [`KForFixedPrice`].
pub const K_FOR_FIXED_PRICE: &str = "K_FOR_FIXED_PRICE";

/// `k` units of an item for a fixed price, e.g. "3 for £0.75".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KForFixedPrice {
    item_type: ItemType,
    k: u32,
    group_price: Money,
}

impl KForFixedPrice {
    /// Evaluation priority.
    pub const PRIORITY: i32 = 60;

    /// Create a new K for fixed price promotion.
    ///
    /// # Errors
    ///
    /// Returns [`PromotionError::InvalidParameter`] if `k` is less than 2, or if `group_price`
    /// isn't positive or costs more than `k` units at [`Money::MAX_PRICE`].
    pub fn new(item_type: ItemType, k: u32, group_price: Money) -> Result<Self, PromotionError> {
        if k <= 1 {
            return Err(PromotionError::invalid(K_FOR_FIXED_PRICE, "k must be > 1"));
        }

        if !group_price.is_positive() {
            return Err(PromotionError::invalid(
                K_FOR_FIXED_PRICE,
                "groupPrice must be > 0",
            ));
        }

        if group_price > Money::MAX_PRICE.times(k) {
            return Err(PromotionError::invalid(
                K_FOR_FIXED_PRICE,
                format!("groupPrice must be <= {}", Money::MAX_PRICE.times(k)),
            ));
        }

        Ok(Self {
            item_type,
            k,
            group_price,
        })
    }

    /// Return the targeted item type
    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Group size
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Price of one complete group
    pub fn group_price(&self) -> Money {
        self.group_price
    }
}

impl DiscountStrategy for KForFixedPrice {
    fn name(&self) -> String {
        format!(
            "{}-{}-for-{}",
            self.item_type.display_name(),
            self.k,
            self.group_price
        )
    }

    fn supports(&self, item_type: ItemType) -> bool {
        item_type == self.item_type
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn apply(&self, item_type: ItemType, quantity: u32, unit_price: Money) -> DiscountResult {
        if !self.supports(item_type) || quantity < self.k {
            return DiscountResult::none();
        }

        let groups = quantity / self.k;
        let regular = unit_price.times(self.k).times(groups);
        let promotional = self.group_price.times(groups);

        // A group price above the regular price never turns into a surcharge.
        DiscountResult::new(
            format!(
                "{} {} for £{}",
                self.k,
                self.item_type.name(),
                self.group_price
            ),
            regular - promotional,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oranges_3_for_75() -> Result<KForFixedPrice, PromotionError> {
        KForFixedPrice::new(ItemType::Oranges, 3, Money::from_minor(75))
    }

    #[test]
    fn rejects_group_price_above_k_maximum_unit_prices() -> Result<(), PromotionError> {
        let result = KForFixedPrice::new(ItemType::Bananas, 2, Money::MAX_PRICE.times(1_000_000));

        assert!(matches!(
            result,
            Err(PromotionError::InvalidParameter { ref reason, .. })
                if reason == "groupPrice must be <= 2000000.00"
        ));

        let largest = KForFixedPrice::new(ItemType::Bananas, 2, Money::MAX_PRICE.times(2))?;
        let result = largest.apply(ItemType::Bananas, u32::MAX, Money::MAX_PRICE);

        assert!(!result.is_applicable());

        Ok(())
    }

    #[test]
    fn one_group_saves_difference() -> Result<(), PromotionError> {
        let result = oranges_3_for_75()?.apply(ItemType::Oranges, 3, Money::from_minor(30));

        assert_eq!(result.amount(), Money::from_minor(15));
        assert_eq!(result.description(), "3 ORANGES for £0.75");

        Ok(())
    }

    #[test]
    fn remainder_is_charged_normally() -> Result<(), PromotionError> {
        let result = oranges_3_for_75()?.apply(ItemType::Oranges, 7, Money::from_minor(30));

        assert_eq!(result.amount(), Money::from_minor(30));

        Ok(())
    }

    #[test]
    fn below_group_size_is_not_applicable() -> Result<(), PromotionError> {
        let result = oranges_3_for_75()?.apply(ItemType::Oranges, 2, Money::from_minor(30));

        assert!(!result.is_applicable());

        Ok(())
    }

    #[test]
    fn group_price_above_regular_is_not_applicable() -> Result<(), PromotionError> {
        let result = oranges_3_for_75()?.apply(ItemType::Oranges, 3, Money::from_minor(20));

        assert_eq!(result, DiscountResult::none());

        Ok(())
    }

    #[test]
    fn name_includes_group_price() -> Result<(), PromotionError> {
        let strategy = oranges_3_for_75()?;

        assert_eq!(strategy.name(), "oranges-3-for-0.75");
        assert_eq!(strategy.priority(), 60);

        Ok(())
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(matches!(
            KForFixedPrice::new(ItemType::Oranges, 1, Money::from_minor(75)),
            Err(PromotionError::InvalidParameter { .. })
        ));
        assert!(matches!(
            KForFixedPrice::new(ItemType::Oranges, 3, Money::ZERO),
            Err(PromotionError::InvalidParameter { .. })
        ));
    }
}
