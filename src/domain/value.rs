//! Lossless value and multiplier types backed by rust_decimal.
//!
//! Item values and modifier multipliers never touch floats; canonical
//! string formatting avoids exponent notation in persisted rows.

use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An item value expressed in the marketplace currency.
///
/// Backed by rust_decimal to avoid floating-point drift.
/// Serializes to a JSON number by default.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Value(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Value {
    /// Create a Value from a RustDecimal.
    pub fn new(value: RustDecimal) -> Self {
        Value(value)
    }

    /// Parse a Value from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Value)
    }

    /// Format as a canonical string (no exponent notation, no trailing zeros).
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    /// Get the underlying RustDecimal.
    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Value(RustDecimal::ZERO)
    }

    /// Returns true if the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Scale this value by a multiplier.
    pub fn scaled_by(&self, multiplier: Multiplier) -> Value {
        Value(self.0 * multiplier.0)
    }
}

impl std::ops::Add for Value {
    type Output = Value;

    fn add(self, rhs: Value) -> Value {
        Value(self.0 + rhs.0)
    }
}

impl FromStr for Value {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Value::from_str_canonical(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

/// A modifier multiplier applied to a base value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Multiplier(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Multiplier {
    /// Create a Multiplier from a RustDecimal.
    pub fn new(value: RustDecimal) -> Self {
        Multiplier(value)
    }

    /// Parse a Multiplier from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Multiplier)
    }

    /// The multiplicative identity (1), used when no modifier applies.
    pub fn identity() -> Self {
        Multiplier(RustDecimal::ONE)
    }

    /// Returns true if the multiplier is > 0.
    ///
    /// Override multipliers are required to satisfy this; the catalog
    /// accessor rejects rows that do not.
    pub fn is_positive(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_positive()
    }

    /// Format as a canonical string (no exponent notation, no trailing zeros).
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    /// Get the underlying RustDecimal.
    pub fn inner(&self) -> RustDecimal {
        self.0
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Multiplier::identity()
    }
}

impl FromStr for Multiplier {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Multiplier::from_str_canonical(s)
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}
