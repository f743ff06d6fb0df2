//! Coin pricing - converts listed prices in currency units into coins.

use crate::errors::{Error, Result};
use std::fmt;

/// Number of currency units one coin is worth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinRate(u32);

impl CoinRate {
    /// 1 coin = 1000 currency units.
    pub const DEFAULT: Self = Self(1000);

    /// Creates a rate, refusing zero.
    pub fn new(units_per_coin: u32) -> Result<Self> {
        if units_per_coin == 0 {
            return Err(Error::Config {
                message: "coin_rate must be greater than zero".to_string(),
            });
        }
        Ok(Self(units_per_coin))
    }

    /// Currency units per coin.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Coins required for `price` currency units, rounded up.
    ///
    /// # Errors
    /// Returns `InvalidAmount` for a negative price.
    pub fn coins_for(self, price: i64) -> Result<i64> {
        if price < 0 {
            return Err(Error::InvalidAmount { amount: price });
        }
        let rate = i64::from(self.0);
        let coins = price / rate;
        Ok(if price % rate == 0 { coins } else { coins + 1 })
    }
}

impl Default for CoinRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for CoinRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1 coin = {} units", self.0)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_coins_for_exact_and_rounded() {
        let rate = CoinRate::DEFAULT;
        assert_eq!(rate.coins_for(30_000).unwrap(), 30);
        assert_eq!(rate.coins_for(30_001).unwrap(), 31);
        assert_eq!(rate.coins_for(999).unwrap(), 1);
        assert_eq!(rate.coins_for(0).unwrap(), 0);
    }

    #[test]
    fn test_coins_for_negative_price() {
        let result = CoinRate::DEFAULT.coins_for(-1);
        assert!(matches!(result, Err(Error::InvalidAmount { amount: -1 })));
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert!(matches!(CoinRate::new(0), Err(Error::Config { .. })));
        assert_eq!(CoinRate::new(250).unwrap().coins_for(1000).unwrap(), 4);
    }
}
