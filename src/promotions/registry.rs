//! Strategy Registry
//!
//! Indexes per-item strategies by the item types they support, ordered by priority.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{items::ItemType, promotions::DiscountStrategy};

/// Strategies applicable to one item type, lowest priority first.
pub type StrategyList = SmallVec<[Arc<dyn DiscountStrategy>; 4]>;

/// Per-item strategies indexed by item type.
///
/// Built once and then read-only, so it can be shared between concurrent checkouts.
#[derive(Debug, Default, Clone)]
pub struct StrategyRegistry {
    by_item: FxHashMap<ItemType, StrategyList>,
}

impl StrategyRegistry {
    /// Index `strategies` by item type.
    ///
    /// Each strategy is listed under every item type it supports. Basket-level strategies are
    /// skipped. The sort by priority is stable, so strategies sharing a priority keep their
    /// registration order.
    pub fn new<'a>(strategies: impl IntoIterator<Item = &'a Arc<dyn DiscountStrategy>>) -> Self {
        let strategies: Vec<_> = strategies
            .into_iter()
            .filter(|strategy| !strategy.is_basket_level())
            .collect();

        let mut by_item = FxHashMap::default();

        for item_type in ItemType::ALL {
            let mut list: StrategyList = strategies
                .iter()
                .filter(|strategy| strategy.supports(item_type))
                .copied()
                .map(Arc::clone)
                .collect();

            if list.is_empty() {
                continue;
            }

            list.sort_by_key(|strategy| strategy.priority());

            by_item.insert(item_type, list);
        }

        Self { by_item }
    }

    /// Strategies for `item_type` in evaluation order.
    pub fn strategies_for(&self, item_type: ItemType) -> &[Arc<dyn DiscountStrategy>] {
        self.by_item
            .get(&item_type)
            .map(SmallVec::as_slice)
            .unwrap_or_default()
    }

    /// Whether no strategy is registered for any item type.
    pub fn is_empty(&self) -> bool {
        self.by_item.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        money::Money,
        promotions::{
            DiscountResult,
            types::{BuyXGetYFree, ComboFixedPrice, KForFixedPrice, parse_combo},
        },
    };

    #[derive(Debug)]
    struct Fixed {
        name: &'static str,
        item_type: ItemType,
        priority: i32,
    }

    impl DiscountStrategy for Fixed {
        fn name(&self) -> String {
            self.name.to_string()
        }

        fn supports(&self, item_type: ItemType) -> bool {
            item_type == self.item_type
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn apply(
            &self,
            _item_type: ItemType,
            _quantity: u32,
            _unit_price: Money,
        ) -> DiscountResult {
            DiscountResult::none()
        }
    }

    fn fixed(name: &'static str, item_type: ItemType, priority: i32) -> Arc<dyn DiscountStrategy> {
        Arc::new(Fixed {
            name,
            item_type,
            priority,
        })
    }

    fn names(registry: &StrategyRegistry, item_type: ItemType) -> Vec<String> {
        registry
            .strategies_for(item_type)
            .iter()
            .map(|strategy| strategy.name())
            .collect()
    }

    #[test]
    fn orders_by_priority() {
        let strategies = [
            fixed("late", ItemType::Apples, 90),
            fixed("early", ItemType::Apples, 10),
            fixed("middle", ItemType::Apples, 50),
        ];

        let registry = StrategyRegistry::new(&strategies);

        assert_eq!(names(&registry, ItemType::Apples), ["early", "middle", "late"]);
    }

    #[test]
    fn equal_priorities_keep_registration_order() {
        let strategies = [
            fixed("first", ItemType::Lemons, 100),
            fixed("second", ItemType::Lemons, 100),
            fixed("urgent", ItemType::Lemons, 1),
            fixed("third", ItemType::Lemons, 100),
        ];

        let registry = StrategyRegistry::new(&strategies);

        assert_eq!(
            names(&registry, ItemType::Lemons),
            ["urgent", "first", "second", "third"]
        );
    }

    #[test]
    fn indexes_by_supported_item_type() -> anyhow::Result<()> {
        let strategies: Vec<Arc<dyn DiscountStrategy>> = vec![
            Arc::new(KForFixedPrice::new(ItemType::Oranges, 3, Money::from_minor(75))?),
            Arc::new(BuyXGetYFree::new(ItemType::Bananas, 2, 1)?),
        ];

        let registry = StrategyRegistry::new(&strategies);

        assert_eq!(names(&registry, ItemType::Bananas), ["bananas-b2g1"]);
        assert_eq!(names(&registry, ItemType::Oranges), ["oranges-3-for-0.75"]);
        assert!(registry.strategies_for(ItemType::Peaches).is_empty());

        Ok(())
    }

    #[test]
    fn skips_basket_level_strategies() -> anyhow::Result<()> {
        let strategies: Vec<Arc<dyn DiscountStrategy>> = vec![Arc::new(ComboFixedPrice::new(
            parse_combo("APPLES:1")?,
            Money::from_minor(10),
            None,
        )?)];

        let registry = StrategyRegistry::new(&strategies);

        assert!(registry.is_empty());

        Ok(())
    }
}
