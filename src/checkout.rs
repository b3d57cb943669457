//! Checkout
//!
//! Prices a basket against a catalog and a promotion set and produces a [`Receipt`].
//!
//! Basket-level strategies are evaluated first. The exclusive candidate with the largest discount
//! wins, ties going to the first registered, and its affected items (the whole basket when it names
//! none) no longer take per-item discounts. Per-item strategies then run for every other item type
//! in the basket, in registry order.

use std::sync::Arc;

use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    basket::Basket,
    catalog::{CatalogError, PriceSnapshot, PriceSource},
    items::ItemType,
    promotions::{DiscountResult, DiscountStrategy, registry::StrategyRegistry},
    receipt::{DiscountLine, Receipt, ReceiptLine},
};

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A unit price could not be looked up.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Prices baskets.
///
/// Holds only immutable configuration, so one engine can serve concurrent checkouts.
#[derive(Debug, Clone)]
pub struct CheckoutEngine {
    prices: Arc<dyn PriceSource>,
    registry: StrategyRegistry,
    basket_strategies: Vec<Arc<dyn DiscountStrategy>>,
}

impl CheckoutEngine {
    /// Create an engine from a prepared registry and basket-level strategy list.
    ///
    /// Entries of `basket_strategies` without the basket-level capability are never evaluated.
    pub fn new(
        prices: Arc<dyn PriceSource>,
        registry: StrategyRegistry,
        basket_strategies: Vec<Arc<dyn DiscountStrategy>>,
    ) -> Self {
        Self {
            prices,
            registry,
            basket_strategies,
        }
    }

    /// Create an engine from a mixed list of strategies.
    ///
    /// Per-item strategies are indexed into a [`StrategyRegistry`]; basket-level strategies keep
    /// their registration order for arbitration.
    pub fn from_strategies(
        prices: Arc<dyn PriceSource>,
        strategies: &[Arc<dyn DiscountStrategy>],
    ) -> Self {
        let registry = StrategyRegistry::new(strategies);

        let basket_strategies = strategies
            .iter()
            .filter(|strategy| strategy.is_basket_level())
            .map(Arc::clone)
            .collect();

        Self::new(prices, registry, basket_strategies)
    }

    /// The price source
    pub fn prices(&self) -> &dyn PriceSource {
        self.prices.as_ref()
    }

    /// The per-item strategy registry
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Basket-level strategies in registration order
    pub fn basket_strategies(&self) -> &[Arc<dyn DiscountStrategy>] {
        &self.basket_strategies
    }

    /// Price `basket`.
    ///
    /// Each distinct item type is priced once and every strategy sees that same unit price.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Catalog`] if an item type in the basket has no price.
    #[tracing::instrument(skip_all, fields(lines = basket.len()))]
    pub fn checkout(&self, basket: &Basket) -> Result<Receipt, CheckoutError> {
        let item_types = basket.item_types();
        let prices = PriceSnapshot::capture(self.prices.as_ref(), item_types.iter().copied())?;

        let items = basket
            .iter()
            .map(|item| {
                let unit_price = prices.price_of(item.item_type())?;

                Ok(ReceiptLine::new(item.item_type(), item.quantity(), unit_price))
            })
            .collect::<Result<Vec<_>, CheckoutError>>()?;

        let mut discounts = Vec::new();

        let suppressed = self.apply_basket_strategies(basket, &prices, &mut discounts)?;

        debug!(suppressed = ?suppressed, "basket-level arbitration complete");

        for item_type in item_types.iter().copied() {
            if suppressed.contains(&item_type) {
                continue;
            }

            let quantity = basket.quantity_of(item_type);
            let unit_price = prices.price_of(item_type)?;

            for strategy in self.registry.strategies_for(item_type) {
                let result = strategy.apply(item_type, quantity, unit_price);

                if result.is_applicable() {
                    trace!(
                        strategy = %strategy.name(),
                        amount = %result.amount(),
                        "item discount applied"
                    );

                    discounts.push(DiscountLine::applied(&result));
                }
            }
        }

        if discounts.is_empty() {
            discounts.push(DiscountLine::none());
        }

        let receipt = Receipt::new(items, discounts);

        debug!(
            subtotal = %receipt.subtotal(),
            total_discount = %receipt.total_discount(),
            total = %receipt.total(),
            "checkout complete"
        );

        Ok(receipt)
    }

    /// Run the basket-level arbitration, pushing the winning lines onto `discounts`.
    ///
    /// Returns the item types whose per-item discounts are suppressed.
    fn apply_basket_strategies(
        &self,
        basket: &Basket,
        prices: &PriceSnapshot,
        discounts: &mut Vec<DiscountLine>,
    ) -> Result<SmallVec<[ItemType; 5]>, CheckoutError> {
        let mut winner: Option<(&Arc<dyn DiscountStrategy>, DiscountResult)> = None;
        let mut additional = Vec::new();

        for strategy in &self.basket_strategies {
            let Some(basket_level) = strategy.basket_level() else {
                continue;
            };

            let result = basket_level.apply_basket(basket, prices)?;

            if !result.is_applicable() {
                continue;
            }

            trace!(
                strategy = %strategy.name(),
                amount = %result.amount(),
                "basket discount candidate"
            );

            if !basket_level.exclusive() {
                additional.push(result);
                continue;
            }

            let beats_current = winner
                .as_ref()
                .is_none_or(|(_, current)| result.amount() > current.amount());

            if beats_current {
                winner = Some((strategy, result));
            }
        }

        let mut suppressed = SmallVec::new();

        if let Some((strategy, result)) = winner {
            debug!(strategy = %strategy.name(), amount = %result.amount(), "basket discount won");

            discounts.push(DiscountLine::applied(&result));

            let affected = strategy
                .basket_level()
                .map(|basket_level| basket_level.affected_items())
                .unwrap_or_default();

            suppressed = if affected.is_empty() {
                basket.item_types()
            } else {
                affected
            };
        }

        discounts.extend(additional.iter().map(DiscountLine::applied));

        Ok(suppressed)
    }
}
