use crate::models::currency::Currency;

use super::coingecko::CoinGeckoProvider;
use super::frankfurter::FrankfurterProvider;
use super::traits::RateProvider;

/// Registry of all available exchange-rate providers.
///
/// Routes requests to the right provider based on currency. New
/// providers can be added without modifying existing code.
pub struct RateProviderRegistry {
    providers: Vec<Box<dyn RateProvider>>,
}

impl RateProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with all default providers pre-configured.
    pub fn new_with_defaults() -> Self {
        let mut registry = Self::new();

        // Frankfurter — fiat, no API key needed
        registry.register(Box::new(FrankfurterProvider::new()));

        // CoinGecko — crypto, no API key needed
        registry.register(Box::new(CoinGeckoProvider::new()));

        registry
    }

    /// Register a new rate provider.
    pub fn register(&mut self, provider: Box<dyn RateProvider>) {
        self.providers.push(provider);
    }

    /// Find the first provider that can quote the given currency.
    pub fn provider_for(&self, currency: Currency) -> Option<&dyn RateProvider> {
        self.providers
            .iter()
            .find(|p| p.supported_currencies().contains(&currency))
            .map(|p| p.as_ref())
    }

    /// All providers that can quote the given currency, in
    /// registration order. Used for fallback when one fails.
    pub fn providers_for(&self, currency: Currency) -> Vec<&dyn RateProvider> {
        self.providers
            .iter()
            .filter(|p| p.supported_currencies().contains(&currency))
            .map(|p| p.as_ref())
            .collect()
    }
}

impl Default for RateProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
