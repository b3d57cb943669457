//! Greengrocer prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    basket::{Basket, BasketEntry, BasketError, BasketItem, BasketRequest},
    catalog::{CatalogError, ConfigurableCatalog, PriceSnapshot, PriceSource, StaticCatalog},
    checkout::{CheckoutEngine, CheckoutError},
    items::{ItemType, UnknownItem},
    money::Money,
    promotions::{
        BasketLevelStrategy, DiscountResult, DiscountStrategy, PromotionError,
        defaults::defaults,
        registry::StrategyRegistry,
        types::{
            BuyXGetYFree, ComboFixedPrice, KForFixedPrice, MinQtyUnitPrice, SubtotalPercentOff,
            parse_combo,
        },
    },
    receipt::{DiscountLine, NO_DISCOUNT, Receipt, ReceiptError, ReceiptLine},
    rules::{PromotionFactories, PromotionFactory, PromotionFile, PromotionRule, RuleError},
};
