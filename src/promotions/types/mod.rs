//! Promotion Types

mod buy_x_get_y_free;
mod combo_fixed_price;
mod k_for_fixed_price;
mod min_qty_unit_price;
mod subtotal_percent_off;

pub use buy_x_get_y_free::*;
pub use combo_fixed_price::*;
pub use k_for_fixed_price::*;
pub use min_qty_unit_price::*;
pub use subtotal_percent_off::*;
