// ═══════════════════════════════════════════════════════════════════
// Record Store Tests — CRUD, indexed queries, seeding, atomic
// composite operations, referential integrity
// ═══════════════════════════════════════════════════════════════════

use chrono::Utc;
use uuid::Uuid;

use portfolio_tracker_core::errors::CoreError;
use portfolio_tracker_core::models::category::Category;
use portfolio_tracker_core::models::currency::Currency;
use portfolio_tracker_core::models::holding::{Holding, HoldingChanges};
use portfolio_tracker_core::models::portfolio::Portfolio;
use portfolio_tracker_core::store::RecordStore;

fn seeded_store() -> RecordStore {
    let store = RecordStore::new();
    store.initialize();
    store
}

fn holding_in(store: &RecordStore, portfolio_id: Uuid, ticker: &str, quantity: f64) -> Holding {
    let category = store.categories().into_iter().next().unwrap();
    let now = Utc::now();
    let h = Holding {
        id: Uuid::new_v4(),
        portfolio_id,
        ticker: ticker.to_string(),
        quantity,
        avg_cost: 100.0,
        currency: Currency::Usd,
        category_id: category.id,
        created_at: now,
        updated_at: now,
    };
    store.insert_holding(h.clone()).unwrap();
    h
}

// ═══════════════════════════════════════════════════════════════════
// Initialization
// ═══════════════════════════════════════════════════════════════════

mod initialization {
    use super::*;

    #[test]
    fn seeds_settings_and_default_categories() {
        let store = seeded_store();
        assert!(store.settings().is_ok());
        let categories = store.categories();
        assert_eq!(categories.len(), 8);
        assert!(categories.iter().all(|c| c.is_default));
    }

    #[test]
    fn initialize_is_idempotent() {
        let store = RecordStore::new();
        store.initialize();
        store.initialize();
        store.initialize();
        assert_eq!(store.categories().len(), 8);
        assert!(store.settings().is_ok());
    }

    #[test]
    fn initialize_preserves_modified_settings() {
        let store = seeded_store();
        store
            .update_settings(|s| s.display_currency = Currency::Aud)
            .unwrap();
        store.initialize();
        assert_eq!(store.settings().unwrap().display_currency, Currency::Aud);
    }

    #[test]
    fn initialize_preserves_custom_categories() {
        let store = seeded_store();
        store.insert_category(Category::new("DeFi", "#AA00FF", false));
        store.initialize();
        assert_eq!(store.categories().len(), 9);
    }

    #[test]
    fn settings_missing_before_seed() {
        let store = RecordStore::new();
        assert!(matches!(
            store.settings(),
            Err(CoreError::NotFound { .. })
        ));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Portfolio CRUD
// ═══════════════════════════════════════════════════════════════════

mod portfolios {
    use super::*;

    #[test]
    fn insert_then_get() {
        let store = seeded_store();
        let p = Portfolio::new("Super");
        store.insert_portfolio(p.clone());
        assert_eq!(store.get_portfolio(p.id).unwrap().name, "Super");
    }

    #[test]
    fn get_missing_returns_none() {
        let store = seeded_store();
        assert!(store.get_portfolio(Uuid::new_v4()).is_none());
    }

    #[test]
    fn listing_preserves_insertion_order() {
        let store = seeded_store();
        for name in ["First", "Second", "Third"] {
            store.insert_portfolio(Portfolio::new(name));
        }
        let names: Vec<String> = store.portfolios().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn rename_updates_name_and_timestamp() {
        let store = seeded_store();
        let p = Portfolio::new("Old");
        store.insert_portfolio(p.clone());
        let renamed = store.rename_portfolio(p.id, "New".into()).unwrap();
        assert_eq!(renamed.name, "New");
        assert!(renamed.updated_at >= p.updated_at);
    }

    #[test]
    fn rename_missing_is_not_found() {
        let store = seeded_store();
        let err = store.rename_portfolio(Uuid::new_v4(), "X".into()).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn delete_cascades_to_holdings() {
        let store = seeded_store();
        let p = Portfolio::new("Doomed");
        let other = Portfolio::new("Kept");
        store.insert_portfolio(p.clone());
        store.insert_portfolio(other.clone());
        holding_in(&store, p.id, "AAA", 1.0);
        holding_in(&store, p.id, "BBB", 2.0);
        let kept = holding_in(&store, other.id, "CCC", 3.0);

        store.delete_portfolio(p.id).unwrap();

        assert!(store.get_portfolio(p.id).is_none());
        assert!(store.holdings_for_portfolio(p.id).is_empty());
        assert_eq!(store.holdings(), vec![kept]);
    }

    #[test]
    fn delete_missing_is_error_not_silent() {
        let store = seeded_store();
        let err = store.delete_portfolio(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Holding CRUD & indexed queries
// ═══════════════════════════════════════════════════════════════════

mod holdings {
    use super::*;

    #[test]
    fn insert_requires_live_portfolio() {
        let store = seeded_store();
        let category = store.categories().into_iter().next().unwrap();
        let now = Utc::now();
        let err = store
            .insert_holding(Holding {
                id: Uuid::new_v4(),
                portfolio_id: Uuid::new_v4(),
                ticker: "AAPL".into(),
                quantity: 1.0,
                avg_cost: 1.0,
                currency: Currency::Usd,
                category_id: category.id,
                created_at: now,
                updated_at: now,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::DanglingReference { field: "portfolio_id", .. }
        ));
        assert!(store.holdings().is_empty());
    }

    #[test]
    fn insert_requires_live_category() {
        let store = seeded_store();
        let p = Portfolio::new("P");
        store.insert_portfolio(p.clone());
        let now = Utc::now();
        let err = store
            .insert_holding(Holding {
                id: Uuid::new_v4(),
                portfolio_id: p.id,
                ticker: "AAPL".into(),
                quantity: 1.0,
                avg_cost: 1.0,
                currency: Currency::Usd,
                category_id: Uuid::new_v4(),
                created_at: now,
                updated_at: now,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::DanglingReference { field: "category_id", .. }
        ));
        assert!(store.holdings().is_empty());
        // A rejected insert must not leave a memory entry behind
        assert!(store.ticker_memory("AAPL").is_none());
    }

    #[test]
    fn query_by_portfolio() {
        let store = seeded_store();
        let a = Portfolio::new("A");
        let b = Portfolio::new("B");
        store.insert_portfolio(a.clone());
        store.insert_portfolio(b.clone());
        holding_in(&store, a.id, "X", 1.0);
        holding_in(&store, b.id, "Y", 1.0);
        holding_in(&store, a.id, "Z", 1.0);

        let tickers: Vec<String> = store
            .holdings_for_portfolio(a.id)
            .into_iter()
            .map(|h| h.ticker)
            .collect();
        assert_eq!(tickers, vec!["X", "Z"]);
    }

    #[test]
    fn query_by_any_of_portfolios() {
        let store = seeded_store();
        let a = Portfolio::new("A");
        let b = Portfolio::new("B");
        let c = Portfolio::new("C");
        store.insert_portfolio(a.clone());
        store.insert_portfolio(b.clone());
        store.insert_portfolio(c.clone());
        holding_in(&store, a.id, "X", 1.0);
        holding_in(&store, b.id, "Y", 1.0);
        holding_in(&store, c.id, "Z", 1.0);

        let result = store.holdings_for_portfolios(&[a.id, c.id]);
        assert_eq!(result.len(), 2);
        assert!(store.holdings_for_portfolios(&[]).is_empty());
    }

    #[test]
    fn query_by_ticker_is_normalized() {
        let store = seeded_store();
        let p = Portfolio::new("P");
        store.insert_portfolio(p.clone());
        holding_in(&store, p.id, "AAPL", 1.0);
        assert_eq!(store.holdings_for_ticker(" aapl ").len(), 1);
    }

    #[test]
    fn update_applies_partial_changes() {
        let store = seeded_store();
        let p = Portfolio::new("P");
        store.insert_portfolio(p.clone());
        let h = holding_in(&store, p.id, "AAPL", 10.0);

        let updated = store
            .update_holding(
                h.id,
                HoldingChanges {
                    quantity: Some(12.0),
                    avg_cost: Some(90.0),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.quantity, 12.0);
        assert_eq!(updated.avg_cost, 90.0);
        assert_eq!(updated.ticker, "AAPL"); // untouched
        assert!(updated.updated_at >= h.updated_at);
    }

    #[test]
    fn update_category_records_ticker_memory() {
        let store = seeded_store();
        let p = Portfolio::new("P");
        store.insert_portfolio(p.clone());
        let h = holding_in(&store, p.id, "BTC", 1.0);
        let bond = store.category_by_name("Bond").unwrap();

        store
            .update_holding(
                h.id,
                HoldingChanges {
                    category_id: Some(bond.id),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(store.ticker_memory("BTC").unwrap().category_id, bond.id);
    }

    #[test]
    fn update_rejects_dead_category() {
        let store = seeded_store();
        let p = Portfolio::new("P");
        store.insert_portfolio(p.clone());
        let h = holding_in(&store, p.id, "AAPL", 1.0);

        let err = store
            .update_holding(
                h.id,
                HoldingChanges {
                    category_id: Some(Uuid::new_v4()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::DanglingReference { .. }));
        // nothing applied
        assert_eq!(store.get_holding(h.id).unwrap(), h);
    }

    #[test]
    fn update_missing_is_not_found() {
        let store = seeded_store();
        let err = store
            .update_holding(Uuid::new_v4(), HoldingChanges::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn delete_removes_only_the_target() {
        let store = seeded_store();
        let p = Portfolio::new("P");
        store.insert_portfolio(p.clone());
        let h1 = holding_in(&store, p.id, "AAA", 1.0);
        let h2 = holding_in(&store, p.id, "BBB", 1.0);

        store.delete_holding(h1.id).unwrap();
        assert!(store.get_holding(h1.id).is_none());
        assert!(store.get_holding(h2.id).is_some());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let store = seeded_store();
        let err = store.delete_holding(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Category operations & protection
// ═══════════════════════════════════════════════════════════════════

mod categories {
    use super::*;

    #[test]
    fn partition_by_is_default() {
        let store = seeded_store();
        store.insert_category(Category::new("DeFi", "#AA00FF", false));
        assert_eq!(store.categories_by_default(true).len(), 8);
        assert_eq!(store.categories_by_default(false).len(), 1);
    }

    #[test]
    fn lookup_by_name_is_case_insensitive() {
        let store = seeded_store();
        assert!(store.category_by_name("crypto").is_some());
        assert!(store.category_by_name("  CRYPTO ").is_some());
        assert!(store.category_by_name("nope").is_none());
    }

    #[test]
    fn update_renames_and_recolors() {
        let store = seeded_store();
        store.insert_category(Category::new("DeFi", "#AA00FF", false));
        let c = store.category_by_name("DeFi").unwrap();
        let updated = store
            .update_category(c.id, Some("DeFi 2".into()), Some("#00FF00".into()))
            .unwrap();
        assert_eq!(updated.name, "DeFi 2");
        assert_eq!(updated.color, "#00FF00");
    }

    #[test]
    fn deleting_default_category_is_protected() {
        let store = seeded_store();
        let crypto = store.category_by_name("Crypto").unwrap();
        let before = store.categories();

        let err = store.delete_category(crypto.id).unwrap_err();
        assert!(matches!(err, CoreError::ProtectedEntity(_)));
        assert_eq!(store.categories(), before); // state unchanged
    }

    #[test]
    fn deleting_custom_category_reassigns_holdings() {
        let store = seeded_store();
        let p = Portfolio::new("P");
        store.insert_portfolio(p.clone());
        store.insert_category(Category::new("DeFi", "#AA00FF", false));
        let defi = store.category_by_name("DeFi").unwrap();

        let h = holding_in(&store, p.id, "UNI", 5.0);
        store
            .update_holding(
                h.id,
                HoldingChanges {
                    category_id: Some(defi.id),
                    ..Default::default()
                },
            )
            .unwrap();

        let count_before = store.holdings().len();
        store.delete_category(defi.id).unwrap();

        assert!(store.get_category(defi.id).is_none());
        assert_eq!(store.holdings().len(), count_before);
        assert!(store.holdings_for_category(defi.id).is_empty());

        // Fallback is the default category with the lowest name: "Bond"
        let bond = store.category_by_name("Bond").unwrap();
        assert_eq!(store.get_holding(h.id).unwrap().category_id, bond.id);
    }

    #[test]
    fn deleting_unreferenced_custom_category_just_deletes() {
        let store = seeded_store();
        store.insert_category(Category::new("Empty", "#123456", false));
        let c = store.category_by_name("Empty").unwrap();
        store.delete_category(c.id).unwrap();
        assert!(store.get_category(c.id).is_none());
    }

    #[test]
    fn deleting_missing_category_is_not_found() {
        let store = seeded_store();
        let err = store.delete_category(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Ticker memory
// ═══════════════════════════════════════════════════════════════════

mod ticker_memory {
    use super::*;

    #[test]
    fn insert_holding_remembers_category() {
        let store = seeded_store();
        let p = Portfolio::new("P");
        store.insert_portfolio(p.clone());
        let h = holding_in(&store, p.id, "AAPL", 1.0);
        assert_eq!(
            store.ticker_memory("AAPL").unwrap().category_id,
            h.category_id
        );
    }

    #[test]
    fn lookup_is_case_insensitive_and_trimmed() {
        let store = seeded_store();
        let cat = store.category_by_name("Stock").unwrap();
        store.remember_ticker("AAPL", cat.id);
        assert!(store.ticker_memory(" aapl ").is_some());
    }

    #[test]
    fn remember_overwrites_last_write_wins() {
        let store = seeded_store();
        let stock = store.category_by_name("Stock").unwrap();
        let etf = store.category_by_name("ETF").unwrap();

        store.remember_ticker("VAS", stock.id);
        store.remember_ticker("VAS", etf.id);

        assert_eq!(store.ticker_memory("VAS").unwrap().category_id, etf.id);
        assert_eq!(store.ticker_memories().len(), 1); // one entry per ticker
    }

    #[test]
    fn forget_and_clear() {
        let store = seeded_store();
        let cat = store.category_by_name("Stock").unwrap();
        store.remember_ticker("AAPL", cat.id);
        store.remember_ticker("MSFT", cat.id);

        assert!(store.forget_ticker("aapl"));
        assert!(!store.forget_ticker("aapl")); // already gone
        assert_eq!(store.ticker_memories().len(), 1);

        store.clear_ticker_memory();
        assert!(store.ticker_memories().is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Dirty flag
// ═══════════════════════════════════════════════════════════════════

mod dirty_flag {
    use super::*;

    #[test]
    fn fresh_store_becomes_dirty_after_seed() {
        let store = RecordStore::new();
        assert!(!store.has_unsaved_changes());
        store.initialize();
        assert!(store.has_unsaved_changes());
    }

    #[test]
    fn noop_commits_stay_clean() {
        let store = seeded_store();
        store.mark_saved();
        assert!(!store.has_unsaved_changes());

        store.initialize(); // idempotent no-op
        store.forget_ticker("NOPE"); // nothing to remove
        assert!(!store.has_unsaved_changes());
    }

    #[test]
    fn mutations_mark_dirty_again_after_save() {
        let store = seeded_store();
        store.mark_saved();
        store.insert_portfolio(Portfolio::new("P"));
        assert!(store.has_unsaved_changes());
    }
}
