use std::str::FromStr;

use portfolio_tracker_core::errors::CoreError;
use portfolio_tracker_core::models::category::{Category, DEFAULT_CATEGORIES};
use portfolio_tracker_core::models::currency::{Currency, ExchangeRates};
use portfolio_tracker_core::models::holding::Holding;
use portfolio_tracker_core::models::portfolio::Portfolio;
use portfolio_tracker_core::models::settings::{Settings, Theme};

use chrono::Utc;
use uuid::Uuid;

fn holding(ticker: &str, quantity: f64, avg_cost: f64, currency: Currency) -> Holding {
    let now = Utc::now();
    Holding {
        id: Uuid::new_v4(),
        portfolio_id: Uuid::new_v4(),
        ticker: ticker.to_string(),
        quantity,
        avg_cost,
        currency,
        category_id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Currency
// ═══════════════════════════════════════════════════════════════════

mod currency {
    use super::*;

    #[test]
    fn display_codes() {
        assert_eq!(Currency::Usd.to_string(), "USD");
        assert_eq!(Currency::Aud.to_string(), "AUD");
        assert_eq!(Currency::Btc.to_string(), "BTC");
    }

    #[test]
    fn base_is_usd() {
        assert_eq!(Currency::BASE, Currency::Usd);
    }

    #[test]
    fn from_str_is_case_insensitive_and_trims() {
        assert_eq!(Currency::from_str("usd").unwrap(), Currency::Usd);
        assert_eq!(Currency::from_str("  AUD ").unwrap(), Currency::Aud);
        assert_eq!(Currency::from_str("btc").unwrap(), Currency::Btc);
    }

    #[test]
    fn from_str_rejects_unknown() {
        let err = Currency::from_str("EUR").unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn all_lists_every_currency_base_first() {
        assert_eq!(Currency::ALL.len(), 3);
        assert_eq!(Currency::ALL[0], Currency::BASE);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  ExchangeRates
// ═══════════════════════════════════════════════════════════════════

mod exchange_rates {
    use super::*;

    #[test]
    fn base_rate_is_always_one() {
        let rates = ExchangeRates::new(std::iter::empty());
        assert_eq!(rates.rate(Currency::Usd).unwrap(), 1.0);
    }

    #[test]
    fn base_rate_cannot_be_overridden() {
        let rates = ExchangeRates::new([(Currency::Usd, 42.0)]);
        assert_eq!(rates.rate(Currency::Usd).unwrap(), 1.0);

        let mut rates = ExchangeRates::default();
        rates.set(Currency::Usd, 9.0);
        assert_eq!(rates.rate(Currency::Usd).unwrap(), 1.0);
    }

    #[test]
    fn missing_rate_is_an_error() {
        let rates = ExchangeRates::new([(Currency::Aud, 1.55)]);
        let err = rates.rate(Currency::Btc).unwrap_err();
        assert!(matches!(err, CoreError::MissingRate(Currency::Btc)));
    }

    #[test]
    fn default_table_is_complete() {
        let rates = ExchangeRates::default();
        assert!(rates.is_complete());
        assert_eq!(rates.rate(Currency::Aud).unwrap(), 1.55);
        assert_eq!(rates.rate(Currency::Btc).unwrap(), 0.000_024);
    }

    #[test]
    fn set_overwrites_non_base_rate() {
        let mut rates = ExchangeRates::default();
        rates.set(Currency::Aud, 1.60);
        assert_eq!(rates.rate(Currency::Aud).unwrap(), 1.60);
    }

    #[test]
    fn incomplete_table_reports_incomplete() {
        let rates = ExchangeRates::new([(Currency::Aud, 1.55)]);
        assert!(!rates.is_complete());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Portfolio / Holding / Category
// ═══════════════════════════════════════════════════════════════════

mod records {
    use super::*;

    #[test]
    fn new_portfolio_has_matching_timestamps() {
        let p = Portfolio::new("Super");
        assert_eq!(p.name, "Super");
        assert_eq!(p.created_at, p.updated_at);
    }

    #[test]
    fn portfolio_ids_are_unique() {
        assert_ne!(Portfolio::new("A").id, Portfolio::new("B").id);
    }

    #[test]
    fn holding_total_cost() {
        let h = holding("AAPL", 10.0, 185.5, Currency::Usd);
        assert_eq!(h.total_cost(), 1855.0);
    }

    #[test]
    fn holding_total_cost_zero_avg_cost() {
        let h = holding("FREE", 3.0, 0.0, Currency::Usd);
        assert_eq!(h.total_cost(), 0.0);
    }

    #[test]
    fn category_constructor() {
        let c = Category::new("DeFi", "#AA00FF", false);
        assert_eq!(c.name, "DeFi");
        assert_eq!(c.color, "#AA00FF");
        assert!(!c.is_default);
    }

    #[test]
    fn default_seed_has_eight_entries() {
        assert_eq!(DEFAULT_CATEGORIES.len(), 8);
        assert!(DEFAULT_CATEGORIES.iter().any(|(name, _)| *name == "Crypto"));
        assert!(DEFAULT_CATEGORIES.iter().any(|(name, _)| *name == "Bond"));
    }

    #[test]
    fn seed_colors_are_hex() {
        for (_, color) in DEFAULT_CATEGORIES {
            assert!(color.starts_with('#') && color.len() == 7, "bad color {color}");
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Settings / Theme
// ═══════════════════════════════════════════════════════════════════

mod settings {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.display_currency, Currency::Usd);
        assert_eq!(s.theme, Theme::Dark);
        assert!(s.last_rate_update.is_none());
        assert!(s.exchange_rates.is_complete());
    }

    #[test]
    fn theme_toggles_both_ways() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }

    #[test]
    fn serde_round_trip() {
        let s = Settings::default();
        let json = serde_json::to_string(&s).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
