//! Receipt

use std::io;

use serde::Serialize;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{items::ItemType, money::Money, promotions::DiscountResult};

/// Description of the line added when no discount applies.
pub const NO_DISCOUNT: &str = "No Discount Applicable";

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// The output could not be written.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The receipt could not be serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// One line per basket entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    item_name: &'static str,
    quantity: u32,
    unit_price: Money,
    amount: Money,
}

impl ReceiptLine {
    /// Price `quantity` units of `item_type` at `unit_price`.
    pub fn new(item_type: ItemType, quantity: u32, unit_price: Money) -> Self {
        Self {
            item_name: item_type.display_name(),
            quantity,
            unit_price,
            amount: unit_price.times(quantity),
        }
    }

    /// Lower-case item name, e.g. `bananas`
    pub fn item_name(&self) -> &'static str {
        self.item_name
    }

    /// Quantity on this line
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price at checkout time
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// Unit price times quantity
    pub fn amount(&self) -> Money {
        self.amount
    }
}

/// An applied discount.
///
/// The amount is negative, except for the [`NO_DISCOUNT`] line which is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountLine {
    description: String,
    amount: Money,
}

impl DiscountLine {
    /// A line for an applicable strategy result.
    pub fn applied(result: &DiscountResult) -> Self {
        Self {
            description: result.description().to_string(),
            amount: -result.amount(),
        }
    }

    /// The "No Discount Applicable" line.
    pub fn none() -> Self {
        Self {
            description: NO_DISCOUNT.to_string(),
            amount: Money::ZERO,
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Signed amount
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Whether this is the "No Discount Applicable" line.
    pub fn is_fallback(&self) -> bool {
        self.description == NO_DISCOUNT && self.amount.is_zero()
    }
}

/// Final receipt for a checked-out basket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    items: Vec<ReceiptLine>,
    discounts: Vec<DiscountLine>,
    subtotal: Money,
    total_discount: Money,
    total: Money,
}

impl Receipt {
    /// Assemble a receipt from its lines.
    ///
    /// The subtotal, total discount and total are derived from the lines.
    pub fn new(items: Vec<ReceiptLine>, discounts: Vec<DiscountLine>) -> Self {
        let subtotal = items.iter().map(ReceiptLine::amount).sum();
        let total_discount = discounts.iter().map(DiscountLine::amount).sum();

        Self {
            items,
            discounts,
            subtotal,
            total_discount,
            total: subtotal + total_discount,
        }
    }

    /// Item lines, in basket order
    pub fn items(&self) -> &[ReceiptLine] {
        &self.items
    }

    /// Discount lines, in the order they were applied
    pub fn discounts(&self) -> &[DiscountLine] {
        &self.discounts
    }

    /// Sum of the item line amounts
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// Sum of the discount line amounts, zero or negative
    pub fn total_discount(&self) -> Money {
        self.total_discount
    }

    /// Amount payable
    pub fn total(&self) -> Money {
        self.total
    }

    /// Serialize the receipt as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ReceiptError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render the receipt as a table followed by its totals.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::Io`] if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record(["Item", "Qty", "Unit Price", "Amount"]);

        for line in &self.items {
            builder.push_record([
                line.item_name.to_string(),
                line.quantity.to_string(),
                pounds(line.unit_price),
                pounds(line.amount),
            ]);
        }

        for line in &self.discounts {
            builder.push_record([
                line.description.clone(),
                String::new(),
                String::new(),
                pounds(line.amount),
            ]);
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());
        let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(1, separator);
        theme.insert_horizontal_line(self.items.len() + 1, separator);

        table.with(theme);
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(1..4), Alignment::right());

        writeln!(out, "\n{table}")?;

        let summary = [
            (" Subtotal:", pounds(self.subtotal)),
            (" Discount:", pounds(self.total_discount)),
            (" Total:", pounds(self.total)),
        ];

        let label_width = summary
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or_default();

        let value_width = summary
            .iter()
            .map(|(_, value)| value.chars().count())
            .max()
            .unwrap_or_default();

        for (label, value) in &summary {
            writeln!(out, "{label:>label_width$}  {value:>value_width$}")?;
        }

        writeln!(out)?;

        Ok(())
    }
}

/// Format an amount in pounds, with the sign before the currency symbol.
fn pounds(amount: Money) -> String {
    if amount < Money::ZERO {
        format!("-£{}", -amount)
    } else {
        format!("£{amount}")
    }
}
