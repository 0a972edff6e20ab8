use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// The fixed set of currencies a holding can be denominated in.
///
/// USD is the base currency: every conversion pivots through it and its
/// rate is 1 by definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    Usd,
    Aud,
    Btc,
}

impl Currency {
    /// The pivot currency all conversions pass through.
    pub const BASE: Currency = Currency::Usd;

    /// All supported currencies, base first.
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Aud, Currency::Btc];

    /// Three-or-fewer-letter code, uppercased (e.g., "USD").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Aud => "AUD",
            Currency::Btc => "BTC",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "AUD" => Ok(Currency::Aud),
            "BTC" => Ok(Currency::Btc),
            other => Err(CoreError::ValidationError(format!(
                "Unknown currency code '{other}' (expected one of USD, AUD, BTC)"
            ))),
        }
    }
}

/// Exchange-rate table: units of each currency per 1 USD.
///
/// The base currency's rate is always 1 and is never used as a divisor —
/// [`rate`](ExchangeRates::rate) special-cases it so a malformed table
/// can't poison base conversions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRates {
    rates: HashMap<Currency, f64>,
}

impl ExchangeRates {
    /// Build a table from (currency, units-per-USD) pairs.
    /// The base currency is pinned to 1 regardless of input.
    #[must_use]
    pub fn new(pairs: impl IntoIterator<Item = (Currency, f64)>) -> Self {
        let mut rates: HashMap<Currency, f64> = pairs.into_iter().collect();
        rates.insert(Currency::BASE, 1.0);
        Self { rates }
    }

    /// Look up the rate for a currency. Base is always `Ok(1.0)`;
    /// anything absent from the table is a `MissingRate` error.
    pub fn rate(&self, currency: Currency) -> Result<f64, CoreError> {
        if currency == Currency::BASE {
            return Ok(1.0);
        }
        self.rates
            .get(&currency)
            .copied()
            .ok_or(CoreError::MissingRate(currency))
    }

    /// Whether the table carries an entry for every supported currency.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        Currency::ALL.iter().all(|c| self.rate(*c).is_ok())
    }

    /// Overwrite the rate for a single non-base currency.
    /// Setting the base currency is a no-op (its rate is pinned).
    pub fn set(&mut self, currency: Currency, rate: f64) {
        if currency != Currency::BASE {
            self.rates.insert(currency, rate);
        }
    }
}

impl Default for ExchangeRates {
    /// Starter rates used until the first refresh from a live provider.
    fn default() -> Self {
        Self::new([(Currency::Aud, 1.55), (Currency::Btc, 0.000_024)])
    }
}
