//! Money
//!
//! Fixed-point monetary amounts with exactly two fraction digits.
//!
//! Every arithmetic operation on [`Money`] rounds its result back to two digits (half-up, ties
//! away from zero) before returning, so no intermediate value ever carries more precision than a
//! receipt can show. Strategies compare and subtract already-rounded values, so all arithmetic must
//! go through these operations rather than through raw [`Decimal`] maths.

use std::{
    fmt,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub},
    str::FromStr,
};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of fraction digits carried by every [`Money`] value.
pub const SCALE: u32 = 2;

/// Round a decimal to [`SCALE`] fraction digits, half-up.
///
/// The result always carries exactly two fraction digits (`1.5` becomes `1.50`) and a zero result
/// is never negative.
pub fn scale(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);

    rounded.rescale(SCALE);

    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }

    rounded
}

/// A monetary amount with two fraction digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Largest accepted unit price, £1,000,000.00.
    ///
    /// A unit price at this bound multiplied by any `u32` quantity stays well inside the range of
    /// [`Decimal`], so line totals and discounts cannot overflow.
    pub const MAX_PRICE: Money = Money(Decimal::from_parts(100_000_000, 0, 0, false, SCALE));

    /// Create a new amount, rounding to two fraction digits.
    pub fn new(amount: Decimal) -> Self {
        Money(scale(amount))
    }

    /// Create a new amount from minor units (pence/cents).
    pub fn from_minor(minor: i64) -> Self {
        Money::new(Decimal::new(minor, SCALE))
    }

    /// Return the underlying decimal amount.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply by an item quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Money::new(self.0 * Decimal::from(quantity))
    }

    /// Take `percent` percent (0..=100) of this amount.
    #[must_use]
    pub fn percent(self, percent: Decimal) -> Self {
        Money::new(self.0 * percent / Decimal::ONE_HUNDRED)
    }

    /// Whether this amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Whether this amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money::new(amount)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Money::new)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money::new(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money::new(self.0 - rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Money;

    fn mul(self, quantity: u32) -> Money {
        self.times(quantity)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money::new(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `Money::ZERO` is built without rounding, so re-scale for display.
        write!(f, "{}", scale(self.0))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Decimal as Deserialize<'de>>::deserialize(deserializer).map(Money::new)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn scale_rounds_half_up() {
        assert_eq!(scale(dec!(0.005)), dec!(0.01));
        assert_eq!(scale(dec!(0.004)), dec!(0.00));
        assert_eq!(scale(dec!(1.235)), dec!(1.24));
        assert_eq!(scale(dec!(-1.235)), dec!(-1.24));
    }

    #[test]
    fn scale_always_has_two_digits() {
        assert_eq!(scale(dec!(1.5)).to_string(), "1.50");
        assert_eq!(scale(Decimal::ZERO).to_string(), "0.00");
    }

    #[test]
    fn negating_zero_is_not_negative_zero() {
        let zero = -Money::ZERO;

        assert_eq!(zero.to_string(), "0.00");
        assert!(zero.amount().is_sign_positive());
    }

    #[test]
    fn arithmetic_rounds_after_each_step() {
        let third = Money::new(dec!(0.333));

        assert_eq!(third.amount(), dec!(0.33));
        assert_eq!(third * 3, Money::from_minor(99));
        assert_eq!(third + third, Money::from_minor(66));
        assert_eq!(Money::from_minor(100) - third, Money::from_minor(67));
    }

    #[test]
    fn percent_rounds_to_two_digits() {
        let subtotal = Money::from_minor(333);

        assert_eq!(subtotal.percent(dec!(10)), Money::from_minor(33));
        assert_eq!(subtotal.percent(dec!(15)), Money::from_minor(50));
    }

    #[test]
    fn sum_of_lines() {
        let total: Money = [150, 90, 60].into_iter().map(Money::from_minor).sum();

        assert_eq!(total, Money::from_minor(300));
    }

    #[test]
    fn parses_from_string() -> anyhow::Result<()> {
        let money: Money = " 0.555 ".parse()?;

        assert_eq!(money, Money::from_minor(56));

        Ok(())
    }

    #[test]
    fn serializes_with_two_digits() -> anyhow::Result<()> {
        let json = serde_json::to_string(&Money::new(dec!(2.3)))?;

        assert_eq!(json, "\"2.30\"");

        Ok(())
    }

    #[test]
    fn deserializes_numbers_and_strings() -> anyhow::Result<()> {
        let from_number: Money = serde_json::from_str("0.5")?;
        let from_string: Money = serde_json::from_str("\"0.75\"")?;

        assert_eq!(from_number, Money::from_minor(50));
        assert_eq!(from_string, Money::from_minor(75));

        Ok(())
    }

    #[test]
    fn deserializes_inside_yaml_documents() -> anyhow::Result<()> {
        let prices: Vec<Money> = serde_norway::from_str("- 1.25\n- \"0.105\"\n")?;

        assert_eq!(prices, [Money::from_minor(125), Money::from_minor(11)]);

        Ok(())
    }

    #[test]
    fn max_price_times_any_quantity_is_exact() {
        assert_eq!(Money::MAX_PRICE.to_string(), "1000000.00");
        assert_eq!(
            Money::MAX_PRICE.times(u32::MAX).amount(),
            dec!(1000000) * Decimal::from(u32::MAX)
        );
    }
}
