//! Greengrocer
//!
//! Greengrocer prices a basket of fruit: unit prices from a catalog, per-item promotions, basket-level
//! promotions with exclusivity arbitration, and an itemised receipt with two-digit money arithmetic.

pub mod basket;
pub mod catalog;
pub mod checkout;
pub mod items;
pub mod money;
pub mod prelude;
pub mod promotions;
pub mod receipt;
pub mod rules;
pub mod settings;
