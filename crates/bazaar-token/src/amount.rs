//! Payment currency amount representation.
//!
//! Amounts are stored as base units internally. Arithmetic is integer-only;
//! display renders the fixed six-decimal form.

use crate::{BASE_UNITS_PER_COIN, CURRENCY_TICKER};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount of the payment currency.
///
/// Internally stored as base units (1 coin = 10^6 base units).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount {
    base_units: u64,
}

impl Amount {
    /// Zero.
    pub const ZERO: Self = Self { base_units: 0 };

    /// Maximum amount (`u64::MAX` base units).
    pub const MAX: Self = Self {
        base_units: u64::MAX,
    };

    /// Create an amount from base units.
    #[must_use]
    pub const fn from_base_units(base_units: u64) -> Self {
        Self { base_units }
    }

    /// Create an amount from whole coins, saturating at [`Amount::MAX`].
    #[must_use]
    pub const fn coins(coins: u64) -> Self {
        Self {
            base_units: coins.saturating_mul(BASE_UNITS_PER_COIN),
        }
    }

    /// Get the amount in base units.
    #[must_use]
    pub const fn base_units(&self) -> u64 {
        self.base_units
    }

    /// Check if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.base_units == 0
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(&self, other: Self) -> Option<Self> {
        match self.base_units.checked_add(other.base_units) {
            Some(base_units) => Some(Self { base_units }),
            None => None,
        }
    }

    /// Checked subtraction.
    #[must_use]
    pub const fn checked_sub(&self, other: Self) -> Option<Self> {
        match self.base_units.checked_sub(other.base_units) {
            Some(base_units) => Some(Self { base_units }),
            None => None,
        }
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.base_units / BASE_UNITS_PER_COIN;
        let frac = self.base_units % BASE_UNITS_PER_COIN;
        write!(f, "{whole}.{frac:06} {CURRENCY_TICKER}")
    }
}

impl From<u64> for Amount {
    fn from(base_units: u64) -> Self {
        Self::from_base_units(base_units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_coins_to_base_units() {
        assert_eq!(Amount::coins(1).base_units(), BASE_UNITS_PER_COIN);
        assert_eq!(Amount::coins(u64::MAX), Amount::MAX);
    }

    #[test]
    fn test_zero() {
        assert!(Amount::ZERO.is_zero());
        assert_eq!(Amount::default(), Amount::ZERO);
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Amount::from_base_units(3);
        let b = Amount::from_base_units(5);
        assert_eq!(a.checked_add(b), Some(Amount::from_base_units(8)));
        assert_eq!(a.checked_sub(b), None);
        assert_eq!(b.checked_sub(a), Some(Amount::from_base_units(2)));
        assert_eq!(Amount::MAX.checked_add(a), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::from_base_units(1_500_000).to_string(), "1.500000 BZR");
        assert_eq!(Amount::from_base_units(28_100).to_string(), "0.028100 BZR");
    }

    #[test]
    fn test_ordering() {
        assert!(Amount::from_base_units(1) < Amount::from_base_units(2));
    }

    proptest! {
        #[test]
        fn prop_add_then_sub_restores(a in any::<u64>(), b in any::<u64>()) {
            let a = Amount::from_base_units(a);
            let b = Amount::from_base_units(b);
            match a.checked_add(b) {
                Some(sum) => {
                    prop_assert_eq!(sum.checked_sub(b), Some(a));
                    prop_assert_eq!(sum.checked_sub(a), Some(b));
                }
                None => prop_assert!(a.base_units().checked_add(b.base_units()).is_none()),
            }
        }

        #[test]
        fn prop_display_keeps_base_units(units in any::<u64>()) {
            let shown = Amount::from_base_units(units).to_string();
            let digits: String = shown.chars().filter(char::is_ascii_digit).collect();
            prop_assert_eq!(digits.parse::<u128>().ok(), Some(u128::from(units)));
        }
    }

    #[test]
    fn test_serialization_is_transparent() {
        let amount = Amount::from_base_units(28_100);
        let json = serde_json::to_string(&amount).expect("serialize");
        assert_eq!(json, "28100");
        let parsed: Amount = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(amount, parsed);
    }
}
