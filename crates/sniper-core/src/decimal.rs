//! Precision-safe decimal types for trading.
//!
//! Uses `rust_decimal` for exact decimal arithmetic, avoiding
//! floating-point rounding errors in price and quantity math.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Price with exact decimal precision.
///
/// Wraps `Decimal` to provide type safety and prevent mixing
/// prices with sizes in calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Scale by `(1 + pct / 100)` and round half-to-even to `decimals` places.
    ///
    /// Used for both the buy markup over best ask and the sell profit over
    /// the acquisition price.
    #[inline]
    pub fn apply_pct(&self, pct: Decimal, decimals: u32) -> Self {
        Self((self.0 * (Decimal::ONE + pct / HUNDRED)).round_dp(decimals))
    }

    /// Wire representation: normalized, no trailing zeros.
    pub fn to_wire(&self) -> String {
        self.0.normalize().to_string()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

/// Size/quantity with exact decimal precision.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Size(pub Decimal);

impl Size {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Base quantity purchasable with `quote` at `price`, rounded half-to-even.
    ///
    /// Returns `Size::ZERO` for a non-positive price.
    pub fn for_quote(quote: Decimal, price: Price, decimals: u32) -> Self {
        if !price.is_positive() {
            return Self::ZERO;
        }
        Self((quote / price.0).round_dp(decimals))
    }

    /// Truncate toward zero so the result never exceeds the held amount.
    #[inline]
    pub fn truncate_dp(&self, decimals: u32) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(decimals, RoundingStrategy::ToZero),
        )
    }

    /// Calculate notional value: size * price.
    #[inline]
    pub fn notional(&self, price: Price) -> Decimal {
        self.0 * price.0
    }

    /// Wire representation: normalized, no trailing zeros.
    pub fn to_wire(&self) -> String {
        self.0.normalize().to_string()
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Size {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Size {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Size {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Size {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_markup_on_best_ask() {
        let ask = Price::new(dec!(100.0));
        let limit = ask.apply_pct(dec!(20), 8);
        assert_eq!(limit.inner(), dec!(120.00000000));
    }

    #[test]
    fn test_profit_tripling() {
        let buy = Price::new(dec!(120.0));
        let sell = buy.apply_pct(dec!(200), 8);
        assert_eq!(sell.inner(), dec!(360.00000000));
    }

    #[test]
    fn test_apply_pct_rounds_to_eight_places() {
        let ask = Price::new(dec!(0.000012345));
        let limit = ask.apply_pct(dec!(10), 8);
        // 0.0000135795 -> half-to-even at 8dp
        assert_eq!(limit.inner(), dec!(0.00001358));
    }

    #[test]
    fn test_quantity_for_quote() {
        let qty = Size::for_quote(dec!(50), Price::new(dec!(120)), 6);
        assert_eq!(qty.inner(), dec!(0.416667));
    }

    #[test]
    fn test_quantity_for_zero_price() {
        let qty = Size::for_quote(dec!(50), Price::ZERO, 6);
        assert!(qty.is_zero());
    }

    #[test]
    fn test_truncate_never_rounds_up() {
        let size = Size::new(dec!(0.4166669));
        assert_eq!(size.truncate_dp(6).inner(), dec!(0.416666));
    }

    #[test]
    fn test_wire_format_strips_trailing_zeros() {
        assert_eq!(Price::new(dec!(120.00000000)).to_wire(), "120");
        assert_eq!(Size::new(dec!(0.416667)).to_wire(), "0.416667");
        assert_eq!(Price::new(dec!(0.00001350)).to_wire(), "0.0000135");
    }

    #[test]
    fn test_notional_calculation() {
        let size = Size::new(dec!(0.5));
        let price = Price::new(dec!(50000));
        assert_eq!(size.notional(price), dec!(25000));
    }
}
