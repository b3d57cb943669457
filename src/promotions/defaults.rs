//! Built-in Promotions
//!
//! The promotion set every checkout starts from, before configured rules are added.

use std::sync::Arc;

use crate::{
    items::ItemType,
    money::Money,
    promotions::{
        DiscountStrategy, PromotionError,
        types::{BuyXGetYFree, KForFixedPrice, MinQtyUnitPrice},
    },
};

/// The built-in strategies: bananas buy 2 get 1 free, oranges 3 for £0.75 and apples at £0.55
/// each from 3.
///
/// # Errors
///
/// Returns a [`PromotionError`] if a built-in definition fails validation.
pub fn defaults() -> Result<Vec<Arc<dyn DiscountStrategy>>, PromotionError> {
    Ok(vec![
        Arc::new(BuyXGetYFree::new(ItemType::Bananas, 2, 1)?),
        Arc::new(KForFixedPrice::new(
            ItemType::Oranges,
            3,
            Money::from_minor(75),
        )?),
        Arc::new(MinQtyUnitPrice::new(
            ItemType::Apples,
            3,
            Money::from_minor(55),
        )?),
    ])
}
