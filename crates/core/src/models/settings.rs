use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::currency::{Currency, ExchangeRates};

/// UI color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    /// The other theme — used by the toggle operation.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// The single settings record. Seeded once at first run; there is
/// never more than one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Currency all aggregate values are presented in
    pub display_currency: Currency,

    pub theme: Theme,

    /// Units-per-USD rate table consumed by the valuation engine
    pub exchange_rates: ExchangeRates,

    /// When `exchange_rates` was last refreshed from a provider
    pub last_rate_update: Option<DateTime<Utc>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display_currency: Currency::Usd,
            theme: Theme::Dark,
            exchange_rates: ExchangeRates::default(),
            last_rate_update: None,
        }
    }
}
