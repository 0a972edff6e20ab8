use crate::errors::CoreError;
use crate::models::currency::{Currency, ExchangeRates};
use crate::providers::registry::RateProviderRegistry;

/// Assembles a fresh `ExchangeRates` table from the provider registry.
///
/// One fetch per non-base currency, with fallback across providers:
/// if the first provider for a currency fails, the next registered
/// one is tried. The base currency never triggers a fetch — its rate
/// is 1 by definition.
pub struct RateService {
    registry: RateProviderRegistry,
}

impl RateService {
    pub fn new(registry: RateProviderRegistry) -> Self {
        Self { registry }
    }

    /// Check if at least one provider can quote the given currency.
    pub fn has_provider_for(&self, currency: Currency) -> bool {
        self.registry.provider_for(currency).is_some()
    }

    /// Names of all providers that can quote the given currency.
    pub fn provider_names(&self, currency: Currency) -> Vec<String> {
        self.registry
            .providers_for(currency)
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Fetch a rate for one currency, falling back across providers.
    pub async fn fetch_rate(&self, currency: Currency) -> Result<f64, CoreError> {
        if currency == Currency::BASE {
            return Ok(1.0);
        }

        let providers = self.registry.providers_for(currency);
        if providers.is_empty() {
            return Err(CoreError::NoProvider(currency));
        }

        let mut last_err = None;
        for provider in providers {
            match provider.fetch_rate(currency).await {
                Ok(rate) => return Ok(rate),
                Err(e) => last_err = Some(e),
            }
        }
        // providers was non-empty, so at least one error was recorded
        Err(last_err.unwrap_or(CoreError::NoProvider(currency)))
    }

    /// Fetch a complete table: every supported non-base currency,
    /// base pinned to 1. Any failed fetch fails the whole refresh —
    /// a partial table would silently break conversions later.
    pub async fn fetch_all_rates(&self) -> Result<ExchangeRates, CoreError> {
        let mut pairs = Vec::new();
        for currency in Currency::ALL {
            if currency == Currency::BASE {
                continue;
            }
            let rate = self.fetch_rate(currency).await?;
            pairs.push((currency, rate));
        }
        Ok(ExchangeRates::new(pairs))
    }
}
