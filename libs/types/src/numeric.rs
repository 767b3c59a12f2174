//! Fixed-point decimal types for prices and quantities
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! Canonical renderings are quantized to eight fractional digits with
//! round-half-to-even; that rendering is the hashing and wire contract.

use rust_decimal::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Number of fractional digits in canonical price/quantity renderings.
pub const CANONICAL_SCALE: u32 = 8;

/// Residual quantities at or below this value count as zero.
pub fn epsilon() -> Decimal {
    Decimal::new(1, CANONICAL_SCALE)
}

/// Eight-fractional-digit fixed rendering, round-half-to-even.
fn format_canonical(value: Decimal) -> String {
    let quantized =
        value.round_dp_with_strategy(CANONICAL_SCALE, RoundingStrategy::MidpointNearestEven);
    format!("{:.8}", quantized)
}

/// Price type with fixed-point decimal representation
///
/// Must always be positive. On the wire a price travels as a JSON number;
/// internally it is a `Decimal` so comparisons and sorting are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Try to create a Price, returning None if non-positive
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create from a wire float, returning None if unrepresentable or non-positive
    pub fn from_f64(value: f64) -> Option<Self> {
        Decimal::from_f64(value).and_then(Self::try_new)
    }

    /// Create from string
    pub fn from_str(s: &str) -> Option<Self> {
        Decimal::from_str(s).ok().and_then(Self::try_new)
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Render with exactly eight fractional digits, round-half-to-even.
    ///
    /// This rendering is canonical-hash input and must never change.
    pub fn to_canonical(&self) -> String {
        format_canonical(self.0)
    }
}

// On the wire a price is a JSON number (the order format predates this
// implementation), so serde goes through f64 rather than a string.
impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let value = self
            .0
            .to_f64()
            .ok_or_else(|| serde::ser::Error::custom("price out of f64 range"))?;
        serializer.serialize_f64(value)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Self::from_f64(value).ok_or_else(|| serde::de::Error::custom("price must be positive"))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quantity type with fixed-point decimal representation
///
/// Non-negative; zero only appears transiently while the matcher drains an
/// order. Serialized as string to prevent JSON number precision loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Try to create a Quantity, returning None if non-positive
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create zero quantity
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Create from string
    pub fn from_str(s: &str) -> Option<Self> {
        Decimal::from_str(s).ok().and_then(Self::try_new)
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Check if quantity is zero
    pub fn is_zero(&self) -> bool {
        self.0 == Decimal::ZERO
    }

    /// Residual at or below epsilon counts as exhausted.
    pub fn is_exhausted(&self) -> bool {
        self.0 <= epsilon()
    }

    /// Quantize to the canonical eight-fractional-digit scale.
    pub fn quantize(&self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(CANONICAL_SCALE, RoundingStrategy::MidpointNearestEven),
        )
    }

    /// Render with exactly eight fractional digits, round-half-to-even.
    pub fn to_canonical(&self) -> String {
        format_canonical(self.0)
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    /// Saturates at zero; the matcher never takes more than is available.
    fn sub(self, rhs: Self) -> Self::Output {
        if rhs.0 >= self.0 {
            Self(Decimal::ZERO)
        } else {
            Self(self.0 - rhs.0)
        }
    }
}

// Custom serialization to preserve precision
impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        // Zero is allowed here; admission separately requires positive amounts
        if decimal >= Decimal::ZERO {
            Ok(Self(decimal))
        } else {
            Err(serde::de::Error::custom("quantity cannot be negative"))
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Minimum of two quantities.
pub fn min_quantity(a: Quantity, b: Quantity) -> Quantity {
    if a.0 <= b.0 {
        a
    } else {
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_rejects_non_positive() {
        assert!(Price::try_new(Decimal::ZERO).is_none());
        assert!(Price::try_new(Decimal::from(-1)).is_none());
        assert!(Price::from_f64(0.0).is_none());
    }

    #[test]
    fn test_price_canonical_pads_to_eight_digits() {
        let price = Price::from_str("0.6").unwrap();
        assert_eq!(price.to_canonical(), "0.60000000");

        let whole = Price::from_str("2").unwrap();
        assert_eq!(whole.to_canonical(), "2.00000000");
    }

    #[test]
    fn test_price_canonical_rounds_half_to_even() {
        // Ninth digit is exactly 5 in both cases; the eighth digit decides.
        let even_stays = Price::from_str("0.123456785").unwrap();
        assert_eq!(even_stays.to_canonical(), "0.12345678");

        let odd_rounds_up = Price::from_str("0.123456775").unwrap();
        assert_eq!(odd_rounds_up.to_canonical(), "0.12345678");
    }

    #[test]
    fn test_price_wire_roundtrip_as_number() {
        let price: Price = serde_json::from_str("0.6").unwrap();
        assert_eq!(price.to_canonical(), "0.60000000");
        assert_eq!(serde_json::to_string(&price).unwrap(), "0.6");
    }

    #[test]
    fn test_price_deserialize_rejects_negative() {
        let result: Result<Price, _> = serde_json::from_str("-0.5");
        assert!(result.is_err());
    }

    #[test]
    fn test_quantity_wire_roundtrip_as_string() {
        let qty: Quantity = serde_json::from_str("\"1000.0\"").unwrap();
        assert_eq!(qty.as_decimal(), Decimal::from_str("1000.0").unwrap());
        assert_eq!(serde_json::to_string(&qty).unwrap(), "\"1000.0\"");
    }

    #[test]
    fn test_quantity_deserialize_rejects_negative() {
        let result: Result<Quantity, _> = serde_json::from_str("\"-3\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_quantity_sub_saturates() {
        let a = Quantity::from_str("1.5").unwrap();
        let b = Quantity::from_str("2.0").unwrap();
        assert!((a - b).is_zero());
        assert_eq!((b - a).as_decimal(), Decimal::from_str("0.5").unwrap());
    }

    #[test]
    fn test_quantity_exhaustion_at_epsilon() {
        let exactly_eps = Quantity::from_str("0.00000001").unwrap();
        assert!(exactly_eps.is_exhausted());

        let above = Quantity::from_str("0.00000002").unwrap();
        assert!(!above.is_exhausted());
    }

    #[test]
    fn test_min_quantity() {
        let a = Quantity::from_str("300").unwrap();
        let b = Quantity::from_str("500").unwrap();
        assert_eq!(min_quantity(a, b), a);
        assert_eq!(min_quantity(b, a), a);
    }

    #[test]
    fn test_canonical_rendering_is_deterministic() {
        let q1 = Quantity::from_str("500").unwrap();
        let q2 = Quantity::from_str("500.0").unwrap();
        assert_eq!(q1.to_canonical(), "500.00000000");
        assert_eq!(q1.to_canonical(), q2.to_canonical());
    }
}
