// ═══════════════════════════════════════════════════════════════════
// Provider Tests — registry routing, fallback across providers,
// rate service table assembly (mock providers, no network)
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;

use portfolio_tracker_core::errors::CoreError;
use portfolio_tracker_core::models::currency::Currency;
use portfolio_tracker_core::providers::registry::RateProviderRegistry;
use portfolio_tracker_core::providers::traits::RateProvider;
use portfolio_tracker_core::services::rate_service::RateService;

/// Canned provider: quotes a fixed set of currencies at a fixed rate,
/// or fails every fetch when `fail` is set.
struct MockProvider {
    name: &'static str,
    currencies: Vec<Currency>,
    rate: f64,
    fail: bool,
}

impl MockProvider {
    fn quoting(name: &'static str, currencies: Vec<Currency>, rate: f64) -> Self {
        Self {
            name,
            currencies,
            rate,
            fail: false,
        }
    }

    fn failing(name: &'static str, currencies: Vec<Currency>) -> Self {
        Self {
            name,
            currencies,
            rate: 0.0,
            fail: true,
        }
    }
}

#[async_trait]
impl RateProvider for MockProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn supported_currencies(&self) -> Vec<Currency> {
        self.currencies.clone()
    }

    async fn fetch_rate(&self, currency: Currency) -> Result<f64, CoreError> {
        if self.fail {
            return Err(CoreError::Api {
                provider: self.name.into(),
                message: format!("simulated outage quoting {currency}"),
            });
        }
        Ok(self.rate)
    }
}

// ═══════════════════════════════════════════════════════════════════
// Registry routing
// ═══════════════════════════════════════════════════════════════════

mod registry {
    use super::*;

    #[test]
    fn routes_by_supported_currency() {
        let mut registry = RateProviderRegistry::new();
        registry.register(Box::new(MockProvider::quoting(
            "fiat",
            vec![Currency::Aud],
            1.55,
        )));
        registry.register(Box::new(MockProvider::quoting(
            "crypto",
            vec![Currency::Btc],
            0.000024,
        )));

        assert_eq!(registry.provider_for(Currency::Aud).unwrap().name(), "fiat");
        assert_eq!(
            registry.provider_for(Currency::Btc).unwrap().name(),
            "crypto"
        );
    }

    #[test]
    fn unknown_currency_has_no_provider() {
        let registry = RateProviderRegistry::new();
        assert!(registry.provider_for(Currency::Aud).is_none());
    }

    #[test]
    fn providers_for_preserves_registration_order() {
        let mut registry = RateProviderRegistry::new();
        registry.register(Box::new(MockProvider::quoting(
            "primary",
            vec![Currency::Aud],
            1.5,
        )));
        registry.register(Box::new(MockProvider::quoting(
            "backup",
            vec![Currency::Aud],
            1.6,
        )));

        let names: Vec<&str> = registry
            .providers_for(Currency::Aud)
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["primary", "backup"]);
    }

    #[test]
    fn defaults_cover_every_non_base_currency() {
        let registry = RateProviderRegistry::new_with_defaults();
        for currency in Currency::ALL {
            if currency == Currency::BASE {
                continue;
            }
            assert!(
                registry.provider_for(currency).is_some(),
                "no default provider for {currency}"
            );
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Rate service
// ═══════════════════════════════════════════════════════════════════

mod rate_service {
    use super::*;

    fn service(providers: Vec<MockProvider>) -> RateService {
        let mut registry = RateProviderRegistry::new();
        for p in providers {
            registry.register(Box::new(p));
        }
        RateService::new(registry)
    }

    #[tokio::test]
    async fn base_currency_never_fetches() {
        // Empty registry: USD still resolves because it is the pivot.
        let svc = service(vec![]);
        assert_eq!(svc.fetch_rate(Currency::Usd).await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn fetches_from_the_routed_provider() {
        let svc = service(vec![MockProvider::quoting(
            "fiat",
            vec![Currency::Aud],
            1.55,
        )]);
        assert_eq!(svc.fetch_rate(Currency::Aud).await.unwrap(), 1.55);
    }

    #[tokio::test]
    async fn falls_back_when_first_provider_fails() {
        let svc = service(vec![
            MockProvider::failing("primary", vec![Currency::Aud]),
            MockProvider::quoting("backup", vec![Currency::Aud], 1.6),
        ]);
        assert_eq!(svc.fetch_rate(Currency::Aud).await.unwrap(), 1.6);
    }

    #[tokio::test]
    async fn all_providers_failing_surfaces_the_last_error() {
        let svc = service(vec![
            MockProvider::failing("primary", vec![Currency::Aud]),
            MockProvider::failing("backup", vec![Currency::Aud]),
        ]);
        let err = svc.fetch_rate(Currency::Aud).await.unwrap_err();
        assert!(matches!(err, CoreError::Api { provider, .. } if provider == "backup"));
    }

    #[tokio::test]
    async fn unquotable_currency_is_no_provider() {
        let svc = service(vec![MockProvider::quoting(
            "fiat",
            vec![Currency::Aud],
            1.55,
        )]);
        assert!(matches!(
            svc.fetch_rate(Currency::Btc).await,
            Err(CoreError::NoProvider(Currency::Btc))
        ));
    }

    #[tokio::test]
    async fn fetch_all_rates_builds_a_complete_table() {
        let svc = service(vec![
            MockProvider::quoting("fiat", vec![Currency::Aud], 1.55),
            MockProvider::quoting("crypto", vec![Currency::Btc], 0.000024),
        ]);

        let rates = svc.fetch_all_rates().await.unwrap();
        assert!(rates.is_complete());
        assert_eq!(rates.rate(Currency::Usd).unwrap(), 1.0);
        assert_eq!(rates.rate(Currency::Aud).unwrap(), 1.55);
        assert_eq!(rates.rate(Currency::Btc).unwrap(), 0.000024);
    }

    #[tokio::test]
    async fn fetch_all_rates_is_all_or_nothing() {
        // AUD resolves but BTC has no provider: the whole refresh fails
        // rather than leaving a partial table behind.
        let svc = service(vec![MockProvider::quoting(
            "fiat",
            vec![Currency::Aud],
            1.55,
        )]);
        assert!(matches!(
            svc.fetch_all_rates().await,
            Err(CoreError::NoProvider(Currency::Btc))
        ));
    }

    #[test]
    fn provider_introspection() {
        let svc = service(vec![
            MockProvider::quoting("primary", vec![Currency::Aud], 1.5),
            MockProvider::quoting("backup", vec![Currency::Aud], 1.6),
        ]);
        assert!(svc.has_provider_for(Currency::Aud));
        assert!(!svc.has_provider_for(Currency::Btc));
        assert_eq!(svc.provider_names(Currency::Aud), vec!["primary", "backup"]);
    }
}
