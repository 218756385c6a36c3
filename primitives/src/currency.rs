//! Bounded, exact currency arithmetic.
//!
//! `Currency` is a non-negative integer capped at 2^256 - 1. No operation
//! wraps: every overflow, underflow, or division by zero is reported as a
//! [`CurrencyError`] and the caller decides how to surface it. The
//! transaction layer maps `Overflow` to `InvalidAmount` and `Underflow`
//! to `NotEnoughBalance`.
//!
//! Currency is serialized as a decimal string in JSON so that values above
//! 2^53 survive every JSON consumer unchanged.

use core::fmt;
use core::str::FromStr;

use primitive_types::{U256, U512};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Failure of a currency operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurrencyError {
    /// Result would exceed 2^256 - 1.
    #[error("currency overflow")]
    Overflow,
    /// Result would be negative.
    #[error("currency underflow")]
    Underflow,
    /// Division or remainder by zero.
    #[error("currency division by zero")]
    DivisionByZero,
    /// String was empty, contained a non-digit, or exceeded the bound.
    #[error("invalid currency string: {0:?}")]
    Parse(String),
}

/// Non-negative amount of the native coin or of a user-defined currency.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Currency(U256);

impl Currency {
    pub const ZERO: Currency = Currency(U256([0; 4]));
    pub const MAX: Currency = Currency(U256::MAX);

    pub fn from_u64(v: u64) -> Self {
        Self(U256::from(v))
    }

    pub fn from_u256(v: U256) -> Self {
        Self(v)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Currency) -> Result<Currency, CurrencyError> {
        self.0
            .checked_add(other.0)
            .map(Currency)
            .ok_or(CurrencyError::Overflow)
    }

    pub fn checked_sub(self, other: Currency) -> Result<Currency, CurrencyError> {
        self.0
            .checked_sub(other.0)
            .map(Currency)
            .ok_or(CurrencyError::Underflow)
    }

    pub fn checked_mul(self, other: Currency) -> Result<Currency, CurrencyError> {
        self.0
            .checked_mul(other.0)
            .map(Currency)
            .ok_or(CurrencyError::Overflow)
    }

    pub fn checked_div(self, other: Currency) -> Result<Currency, CurrencyError> {
        self.0
            .checked_div(other.0)
            .map(Currency)
            .ok_or(CurrencyError::DivisionByZero)
    }

    pub fn checked_rem(self, other: Currency) -> Result<Currency, CurrencyError> {
        self.0
            .checked_rem(other.0)
            .map(Currency)
            .ok_or(CurrencyError::DivisionByZero)
    }

    /// Subtract, flooring at zero. Used only where the data model says an
    /// amount is reduced "floored at zero" (slashing).
    pub fn saturating_sub(self, other: Currency) -> Currency {
        Currency(self.0.saturating_sub(other.0))
    }

    /// Exact `floor(self * num / den)` with a 512-bit intermediate product.
    ///
    /// The intermediate never overflows; the final quotient must fit in 256
    /// bits or `Overflow` is returned.
    pub fn mul_div_floor(self, num: Currency, den: Currency) -> Result<Currency, CurrencyError> {
        if den.is_zero() {
            return Err(CurrencyError::DivisionByZero);
        }
        let product = U512::from(self.0)
            .checked_mul(U512::from(num.0))
            .ok_or(CurrencyError::Overflow)?;
        let quotient = product / U512::from(den.0);
        U256::try_from(quotient)
            .map(Currency)
            .map_err(|_| CurrencyError::Overflow)
    }

    /// `floor(self * num / den)` for small integer ratios.
    pub fn mul_ratio(self, num: u64, den: u64) -> Result<Currency, CurrencyError> {
        self.mul_div_floor(Currency::from_u64(num), Currency::from_u64(den))
    }

    /// Clamp to `u64`, saturating at `u64::MAX`.
    pub fn saturating_to_u64(&self) -> u64 {
        if self.0 > U256::from(u64::MAX) {
            u64::MAX
        } else {
            self.0.low_u64()
        }
    }

    /// 32-byte big-endian encoding. Byte order matches numeric order, which
    /// the effective-stake ranking index relies on.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        self.0.to_big_endian(&mut out);
        out
    }

    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        Self(U256::from_big_endian(bytes))
    }
}

impl From<u64> for Currency {
    fn from(v: u64) -> Self {
        Self::from_u64(v)
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CurrencyError::Parse(s.to_string()));
        }
        U256::from_dec_str(s)
            .map(Currency)
            .map_err(|_| CurrencyError::Parse(s.to_string()))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // U256's Display is decimal
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self.0)
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
