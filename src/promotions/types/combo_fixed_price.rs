//! Combo Fixed Price
//!
//! A basket-level promotion: a fixed multiset of items ("1 apple and 2 bananas") costs a fixed price
//! per complete set, optionally capped at a maximum number of sets.

use smallvec::SmallVec;

use crate::{
    basket::Basket,
    catalog::{CatalogError, PriceSource},
    items::ItemType,
    money::Money,
    promotions::{
        BASKET_LEVEL_PRIORITY, BasketLevelStrategy, DiscountResult, DiscountStrategy,
        PromotionError,
    },
};

/// Rule tag for [`ComboFixedPrice`].
pub const ITEM_COMBO_FIXED_PRICE: &str = "ITEM_COMBO_FIXED_PRICE";

/// Combo members as `(item type, count per set)`, in configuration order.
pub type ComboItems = SmallVec<[(ItemType, u32); 5]>;

/// Parse a combo definition such as `APPLES:1,BANANAS:2`.
///
/// Item names go through the usual alias resolution and blank segments are skipped.
///
/// # Errors
///
/// Returns [`PromotionError::InvalidParameter`] for a malformed segment, an unknown item, a count
/// that isn't a positive integer or an item listed twice.
pub fn parse_combo(csv: &str) -> Result<ComboItems, PromotionError> {
    let mut combo = ComboItems::new();

    for segment in csv.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (item, count) = segment.split_once(':').ok_or_else(|| {
            PromotionError::invalid(
                ITEM_COMBO_FIXED_PRICE,
                format!("combo entry '{segment}' must be ITEM:COUNT"),
            )
        })?;

        let item_type = ItemType::resolve(item)
            .map_err(|err| PromotionError::invalid(ITEM_COMBO_FIXED_PRICE, err.to_string()))?;

        let count = count.trim().parse::<u32>().map_err(|_err| {
            PromotionError::invalid(
                ITEM_COMBO_FIXED_PRICE,
                format!("combo count '{}' is not a positive integer", count.trim()),
            )
        })?;

        if combo.iter().any(|(existing, _)| *existing == item_type) {
            return Err(PromotionError::invalid(
                ITEM_COMBO_FIXED_PRICE,
                format!("combo lists {} more than once", item_type.name()),
            ));
        }

        combo.push((item_type, count));
    }

    Ok(combo)
}

/// A fixed price for a combination of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComboFixedPrice {
    combo: ComboItems,
    price: Money,
    max_sets: Option<u32>,
}

impl ComboFixedPrice {
    /// Create a new combo promotion.
    ///
    /// # Errors
    ///
    /// Returns [`PromotionError::InvalidParameter`] if the combo is empty, a count is zero,
    /// `price` isn't positive or `max_sets` is zero.
    pub fn new(
        combo: impl Into<ComboItems>,
        price: Money,
        max_sets: Option<u32>,
    ) -> Result<Self, PromotionError> {
        let combo = combo.into();

        if combo.is_empty() {
            return Err(PromotionError::invalid(
                ITEM_COMBO_FIXED_PRICE,
                "combo must define at least one item:qty",
            ));
        }

        if combo.iter().any(|(_, count)| *count == 0) {
            return Err(PromotionError::invalid(
                ITEM_COMBO_FIXED_PRICE,
                "combo counts must be > 0",
            ));
        }

        if !price.is_positive() {
            return Err(PromotionError::invalid(
                ITEM_COMBO_FIXED_PRICE,
                "price must be > 0",
            ));
        }

        if max_sets == Some(0) {
            return Err(PromotionError::invalid(
                ITEM_COMBO_FIXED_PRICE,
                "max must be > 0",
            ));
        }

        Ok(Self {
            combo,
            price,
            max_sets,
        })
    }

    /// Combo members
    pub fn combo(&self) -> &[(ItemType, u32)] {
        &self.combo
    }

    /// Price of one complete set
    pub fn price(&self) -> Money {
        self.price
    }

    /// Maximum number of discounted sets, if capped
    pub fn max_sets(&self) -> Option<u32> {
        self.max_sets
    }

    fn format_combo(&self) -> String {
        self.combo
            .iter()
            .map(|(item_type, count)| format!("{}:{count}", item_type.name()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl DiscountStrategy for ComboFixedPrice {
    fn name(&self) -> String {
        let members = self
            .combo
            .iter()
            .map(|(item_type, count)| format!("{}-{count}", item_type.display_name()))
            .collect::<Vec<_>>()
            .join("-");

        match self.max_sets {
            Some(max) => format!("combo-{members}-for-{}-max-{max}", self.price),
            None => format!("combo-{members}-for-{}", self.price),
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

impl BasketLevelStrategy for ComboFixedPrice {
    fn apply_basket(
        &self,
        basket: &Basket,
        prices: &dyn PriceSource,
    ) -> Result<DiscountResult, CatalogError> {
        if basket.is_empty() {
            return Ok(DiscountResult::none());
        }

        let counts = basket.quantities();

        let possible_sets = self
            .combo
            .iter()
            .map(|(item_type, count)| counts.get(item_type).copied().unwrap_or(0) / count)
            .min()
            .unwrap_or(0);

        if possible_sets == 0 {
            return Ok(DiscountResult::none());
        }

        let sets = self
            .max_sets
            .map_or(possible_sets, |max| possible_sets.min(max));

        let mut regular = Money::ZERO;

        for (item_type, count) in &self.combo {
            regular = regular + prices.price_of(*item_type)?.times(*count);
        }

        let saving_per_set = regular - self.price;

        if !saving_per_set.is_positive() {
            return Ok(DiscountResult::none());
        }

        Ok(DiscountResult::new(
            format!(
                "Combo {} for £{} (x{sets})",
                self.format_combo(),
                self.price
            ),
            saving_per_set.times(sets),
        ))
    }

    fn affected_items(&self) -> SmallVec<[ItemType; 5]> {
        self.combo.iter().map(|(item_type, _)| *item_type).collect()
    }
}
