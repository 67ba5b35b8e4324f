//! Precision-safe decimal types and exchange rounding rules.
//!
//! Uses `rust_decimal` for exact decimal arithmetic. Every conversion from a
//! price or size to the string that ends up inside a signed action goes
//! through [`decimal_to_wire`], so the hashed bytes never depend on float
//! formatting.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Mul;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Significant figures kept by [`round_price`].
pub const PRICE_SIG_FIGS: u32 = 5;

/// Decimal places of a rounded perpetual price.
pub const PERP_PRICE_DECIMALS: u32 = 6;

/// Decimal places of a rounded spot price.
pub const SPOT_PRICE_DECIMALS: u32 = 8;

/// Maximum decimal places the wire format accepts.
pub const WIRE_MAX_DECIMALS: u32 = 8;

/// Scale applied to USD amounts carried as integers on the wire.
const USD_MICROS: i64 = 1_000_000;

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

    /// Push the price away from the mid by `slippage` (a fraction, 0.05 = 5%).
    ///
    /// Buys move up, sells move down. The adjustment is multiplicative.
    #[inline]
    pub fn with_slippage(&self, is_buy: bool, slippage: Decimal) -> Self {
        let factor = if is_buy {
            Decimal::ONE + slippage
        } else {
            Decimal::ONE - slippage
        };
        Self(self.0 * factor)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Mul<Decimal> for Price {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

/// Size/quantity with exact decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
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
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    #[inline]
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Size {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Size {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

/// Round a price the way the exchange requires for aggressive limit prices.
///
/// Two stages, always both:
/// 1. round to [`PRICE_SIG_FIGS`] significant figures
/// 2. round to 6 decimal places (perp) or 8 (spot)
///
/// The result always carries exactly that many decimal places, so
/// `1234.5678` (perp) becomes `1234.600000`.
pub fn round_price(price: Price, is_spot: bool) -> Price {
    let decimals = if is_spot {
        SPOT_PRICE_DECIMALS
    } else {
        PERP_PRICE_DECIMALS
    };

    let value = price.inner();
    let sig = value
        .round_sf_with_strategy(PRICE_SIG_FIGS, RoundingStrategy::MidpointAwayFromZero)
        .unwrap_or(value);

    let mut fixed = sig.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    fixed.rescale(decimals);
    Price::new(fixed)
}

/// Canonical wire string for a price or size.
///
/// Rounds to 8 decimal places and rejects the value if that changed it;
/// otherwise trailing zeros and a trailing point are dropped
/// (`105.000000` -> `"105"`, `0.20` -> `"0.2"`).
pub fn decimal_to_wire(value: Decimal) -> Result<String> {
    let rounded = value.round_dp(WIRE_MAX_DECIMALS);
    if rounded != value {
        return Err(CoreError::PrecisionLoss(value.to_string()));
    }
    let normalized = rounded.normalize();
    if normalized.is_zero() {
        return Ok("0".to_string());
    }
    Ok(normalized.to_string())
}

/// Convert a USD amount to integer micro-USD (x 1e6, rounded to nearest).
pub fn usd_to_micros(amount: Decimal) -> Result<i64> {
    amount
        .checked_mul(Decimal::from(USD_MICROS))
        .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven))
        .and_then(|scaled| scaled.to_i64())
        .ok_or_else(|| CoreError::AmountOverflow(amount.to_string()))
}
