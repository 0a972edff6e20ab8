pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;
pub mod store;

use chrono::Utc;
use uuid::Uuid;

use errors::CoreError;
use models::{
    category::Category,
    currency::{Currency, ExchangeRates},
    holding::{CostBasis, Holding, HoldingChanges, NewHolding},
    portfolio::Portfolio,
    settings::{Settings, Theme},
    summary::{AssetGroup, CategoryGroup, CurrencyGroup, EnrichedHolding, PortfolioSummary},
    ticker_memory::TickerMemory,
};
use providers::registry::RateProviderRegistry;
use services::{rate_service::RateService, valuation_service::ValuationService};
use storage::manager::StorageManager;
use store::{LiveQuery, QueryCtx, RecordStore};

/// Maximum length of a normalized ticker symbol.
const MAX_TICKER_LEN: usize = 10;

/// Main entry point for the Portfolio Tracker core library.
///
/// Owns the record store and the services that operate on it. All
/// input validation (ticker normalization, numeric checks, trimmed
/// names) happens here, at the entry points — the store trusts what
/// it is handed and enforces only referential integrity.
#[must_use]
pub struct PortfolioTracker {
    store: RecordStore,
    valuation: ValuationService,
    rate_service: RateService,
}

impl std::fmt::Debug for PortfolioTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTracker")
            .field("store", &self.store)
            .finish()
    }
}

impl PortfolioTracker {
    /// Create a brand new tracker: empty store, seeded with default
    /// settings and the default categories.
    pub fn create_new() -> Self {
        let store = RecordStore::new();
        store.initialize();
        Self::build(store)
    }

    /// Load an existing store from encrypted bytes (password required).
    /// Use this for WASM / Tauri where the frontend handles file I/O.
    pub fn load_from_bytes(encrypted: &[u8], password: &str) -> Result<Self, CoreError> {
        let data = StorageManager::load_from_bytes(encrypted, password)?;
        let store = RecordStore::from_data(data);
        // A pre-seeding save would load without settings; seeding is
        // idempotent, so this is a no-op for any normal file.
        store.initialize();
        store.mark_saved();
        Ok(Self::build(store))
    }

    /// Save the current store to encrypted bytes. Returns raw bytes
    /// the frontend can write wherever it likes. Clears the
    /// unsaved-changes flag on success.
    pub fn save_to_bytes(&self, password: &str) -> Result<Vec<u8>, CoreError> {
        let bytes = StorageManager::save_to_bytes(&self.store.data_snapshot(), password)?;
        self.store.mark_saved();
        Ok(bytes)
    }

    /// Load from an encrypted file on disk (native only, not WASM).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: &str, password: &str) -> Result<Self, CoreError> {
        let data = StorageManager::load_from_file(path, password)?;
        let store = RecordStore::from_data(data);
        store.initialize();
        store.mark_saved();
        Ok(Self::build(store))
    }

    /// Save to an encrypted file on disk (native only, not WASM).
    /// Clears the unsaved-changes flag on success.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_file(&self, path: &str, password: &str) -> Result<(), CoreError> {
        StorageManager::save_to_file(&self.store.data_snapshot(), path, password)?;
        self.store.mark_saved();
        Ok(())
    }

    /// Re-run first-run seeding. Idempotent: a seeded store is left
    /// exactly as it is.
    pub fn initialize(&self) {
        self.store.initialize();
    }

    /// Direct access to the record store, e.g. for live queries from
    /// components that don't hold the whole tracker.
    #[must_use]
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    // ── Portfolios ──────────────────────────────────────────────────

    /// Create a portfolio. The name is trimmed and must be non-empty.
    pub fn create_portfolio(&self, name: &str) -> Result<Portfolio, CoreError> {
        let name = normalize_name(name, "Portfolio name")?;
        let portfolio = Portfolio::new(name);
        self.store.insert_portfolio(portfolio.clone());
        Ok(portfolio)
    }

    pub fn rename_portfolio(&self, id: Uuid, name: &str) -> Result<Portfolio, CoreError> {
        let name = normalize_name(name, "Portfolio name")?;
        self.store.rename_portfolio(id, name)
    }

    /// Delete a portfolio and, in the same atomic unit, every holding
    /// it owns.
    pub fn delete_portfolio(&self, id: Uuid) -> Result<(), CoreError> {
        self.store.delete_portfolio(id)
    }

    #[must_use]
    pub fn get_portfolio(&self, id: Uuid) -> Option<Portfolio> {
        self.store.get_portfolio(id)
    }

    #[must_use]
    pub fn portfolios(&self) -> Vec<Portfolio> {
        self.store.portfolios()
    }

    // ── Holdings ────────────────────────────────────────────────────

    /// Create a holding. Validates quantity > 0, avg_cost >= 0, and
    /// the ticker (trimmed, uppercased, at most 10 characters); the
    /// store then checks both references and records the
    /// ticker-category memory in the same commit.
    pub fn create_holding(&self, input: NewHolding) -> Result<Holding, CoreError> {
        let ticker = normalize_ticker(&input.ticker)?;
        validate_quantity(input.quantity)?;
        validate_avg_cost(input.avg_cost)?;

        let now = Utc::now();
        let holding = Holding {
            id: Uuid::new_v4(),
            portfolio_id: input.portfolio_id,
            ticker,
            quantity: input.quantity,
            avg_cost: input.avg_cost,
            currency: input.currency,
            category_id: input.category_id,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_holding(holding.clone())?;
        Ok(holding)
    }

    /// Create a holding from form input, where the cost figure may be
    /// per-unit or the total paid (divided by quantity on entry).
    pub fn create_holding_from_form(
        &self,
        mut input: NewHolding,
        cost_basis: CostBasis,
    ) -> Result<Holding, CoreError> {
        if cost_basis == CostBasis::Total {
            validate_quantity(input.quantity)?;
            input.avg_cost /= input.quantity;
        }
        self.create_holding(input)
    }

    /// Apply partial changes to a holding. Only provided fields are
    /// validated and written; a category change updates the
    /// ticker-category memory in the same commit.
    pub fn update_holding(
        &self,
        id: Uuid,
        mut changes: HoldingChanges,
    ) -> Result<Holding, CoreError> {
        if let Some(ticker) = changes.ticker.as_deref() {
            changes.ticker = Some(normalize_ticker(ticker)?);
        }
        if let Some(quantity) = changes.quantity {
            validate_quantity(quantity)?;
        }
        if let Some(avg_cost) = changes.avg_cost {
            validate_avg_cost(avg_cost)?;
        }
        self.store.update_holding(id, changes)
    }

    pub fn delete_holding(&self, id: Uuid) -> Result<(), CoreError> {
        self.store.delete_holding(id)
    }

    #[must_use]
    pub fn get_holding(&self, id: Uuid) -> Option<Holding> {
        self.store.get_holding(id)
    }

    #[must_use]
    pub fn holdings(&self) -> Vec<Holding> {
        self.store.holdings()
    }

    #[must_use]
    pub fn holdings_for_portfolio(&self, portfolio_id: Uuid) -> Vec<Holding> {
        self.store.holdings_for_portfolio(portfolio_id)
    }

    /// Holdings across a set of selected portfolios.
    #[must_use]
    pub fn holdings_for_portfolios(&self, portfolio_ids: &[Uuid]) -> Vec<Holding> {
        self.store.holdings_for_portfolios(portfolio_ids)
    }

    // ── Categories ──────────────────────────────────────────────────

    /// Create a custom category. Color must be a "#RRGGBB" hex string.
    pub fn create_category(&self, name: &str, color: &str) -> Result<Category, CoreError> {
        let name = normalize_name(name, "Category name")?;
        let color = validate_color(color)?;
        let category = Category::new(name, color, false);
        self.store.insert_category(category.clone());
        Ok(category)
    }

    /// Rename and/or recolor a category. Default categories can be
    /// edited too — only deletion is protected.
    pub fn update_category(
        &self,
        id: Uuid,
        name: Option<&str>,
        color: Option<&str>,
    ) -> Result<Category, CoreError> {
        let name = name.map(|n| normalize_name(n, "Category name")).transpose()?;
        let color = color.map(validate_color).transpose()?;
        self.store.update_category(id, name, color)
    }

    /// Delete a custom category. Fails with `ProtectedEntity` for a
    /// default category; otherwise reassigns affected holdings to the
    /// fallback default in the same atomic unit.
    pub fn delete_category(&self, id: Uuid) -> Result<(), CoreError> {
        self.store.delete_category(id)
    }

    #[must_use]
    pub fn get_category(&self, id: Uuid) -> Option<Category> {
        self.store.get_category(id)
    }

    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.store.categories()
    }

    #[must_use]
    pub fn default_categories(&self) -> Vec<Category> {
        self.store.categories_by_default(true)
    }

    #[must_use]
    pub fn custom_categories(&self) -> Vec<Category> {
        self.store.categories_by_default(false)
    }

    /// Case-insensitive lookup by category name.
    #[must_use]
    pub fn category_by_name(&self, name: &str) -> Option<Category> {
        self.store.category_by_name(name)
    }

    // ── Ticker-Category Memory ──────────────────────────────────────

    /// The category this ticker was last assigned, if remembered.
    /// Case-insensitive, trimmed lookup.
    #[must_use]
    pub fn suggest_category(&self, ticker: &str) -> Option<Uuid> {
        self.store.ticker_memory(ticker).map(|m| m.category_id)
    }

    /// Record a ticker → category association (last write wins).
    pub fn remember_ticker(&self, ticker: &str, category_id: Uuid) -> Result<(), CoreError> {
        let ticker = normalize_ticker(ticker)?;
        self.store.remember_ticker(&ticker, category_id);
        Ok(())
    }

    /// Drop one ticker's memory entry. Returns whether one existed.
    pub fn forget_ticker(&self, ticker: &str) -> bool {
        self.store.forget_ticker(ticker)
    }

    /// Drop all ticker memory entries.
    pub fn clear_ticker_memory(&self) {
        self.store.clear_ticker_memory();
    }

    #[must_use]
    pub fn ticker_memories(&self) -> Vec<TickerMemory> {
        self.store.ticker_memories()
    }

    // ── Settings ────────────────────────────────────────────────────

    pub fn settings(&self) -> Result<Settings, CoreError> {
        self.store.settings()
    }

    pub fn set_display_currency(&self, currency: Currency) -> Result<(), CoreError> {
        self.store
            .update_settings(|s| s.display_currency = currency)?;
        Ok(())
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), CoreError> {
        self.store.update_settings(|s| s.theme = theme)?;
        Ok(())
    }

    /// Flip between dark and light. Returns the new theme.
    pub fn toggle_theme(&self) -> Result<Theme, CoreError> {
        let settings = self.store.update_settings(|s| s.theme = s.theme.toggled())?;
        Ok(settings.theme)
    }

    /// Store an externally supplied rate table and stamp the refresh
    /// time. The core has no opinion on where the table came from.
    pub fn set_exchange_rates(&self, rates: ExchangeRates) -> Result<(), CoreError> {
        self.store.update_settings(|s| {
            s.exchange_rates = rates;
            s.last_rate_update = Some(Utc::now());
        })?;
        Ok(())
    }

    /// Fetch a fresh rate table from the configured providers and
    /// store it. Each request is time-bounded by the provider's HTTP
    /// timeout; the store itself never waits on the network — this is
    /// the only async surface, and callers may cancel it freely.
    pub async fn refresh_exchange_rates(&self) -> Result<ExchangeRates, CoreError> {
        let rates = self.rate_service.fetch_all_rates().await?;
        self.set_exchange_rates(rates.clone())?;
        Ok(rates)
    }

    // ── Live Queries ────────────────────────────────────────────────

    /// Subscribe to a live query over the store. See
    /// [`RecordStore::subscribe`].
    pub fn subscribe<T, Q, F>(&self, query: Q, on_change: F) -> (T, LiveQuery)
    where
        T: Clone + PartialEq + Send + 'static,
        Q: Fn(&QueryCtx<'_>) -> T + Send + 'static,
        F: FnMut(&T) + Send + 'static,
    {
        self.store.subscribe(query, on_change)
    }

    // ── Valuation ───────────────────────────────────────────────────

    /// Total value of a holding set in the current display currency.
    pub fn total_value(&self, holdings: &[Holding]) -> Result<f64, CoreError> {
        let settings = self.settings()?;
        self.valuation
            .total_value(holdings, settings.display_currency, &settings.exchange_rates)
    }

    /// Enrich holdings with display-ready derived values.
    pub fn enrich(&self, holdings: &[Holding]) -> Result<Vec<EnrichedHolding>, CoreError> {
        let settings = self.settings()?;
        self.valuation.enrich(
            holdings,
            &self.store.categories(),
            settings.display_currency,
            &settings.exchange_rates,
        )
    }

    pub fn group_by_category(&self, holdings: &[Holding]) -> Result<Vec<CategoryGroup>, CoreError> {
        let settings = self.settings()?;
        self.valuation.group_by_category(
            holdings,
            &self.store.categories(),
            settings.display_currency,
            &settings.exchange_rates,
        )
    }

    pub fn group_by_currency(&self, holdings: &[Holding]) -> Result<Vec<CurrencyGroup>, CoreError> {
        let settings = self.settings()?;
        self.valuation.group_by_currency(
            holdings,
            settings.display_currency,
            &settings.exchange_rates,
        )
    }

    pub fn group_by_asset(&self, holdings: &[Holding]) -> Result<Vec<AssetGroup>, CoreError> {
        let settings = self.settings()?;
        self.valuation
            .group_by_asset(holdings, settings.display_currency, &settings.exchange_rates)
    }

    /// Rollups for every portfolio in the store.
    pub fn portfolio_summaries(&self) -> Result<Vec<PortfolioSummary>, CoreError> {
        let settings = self.settings()?;
        self.valuation.portfolio_summaries(
            &self.store.portfolios(),
            &self.store.holdings(),
            &self.store.categories(),
            settings.display_currency,
            &settings.exchange_rates,
        )
    }

    /// The pure valuation engine, for callers that want to run it
    /// against their own holdings/rates.
    #[must_use]
    pub fn valuation(&self) -> &ValuationService {
        &self.valuation
    }

    /// Check if a rate provider is configured for a currency.
    #[must_use]
    pub fn has_rate_provider(&self, currency: Currency) -> bool {
        self.rate_service.has_provider_for(currency)
    }

    // ── Export / Dirty State ────────────────────────────────────────

    /// `true` if any mutation committed since the last save or load.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.store.has_unsaved_changes()
    }

    /// Export the full store as JSON (unencrypted snapshot for
    /// debugging/display).
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(&self.store.data_snapshot())
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize store: {e}")))
    }

    // ── Internal ────────────────────────────────────────────────────

    fn build(store: RecordStore) -> Self {
        Self {
            store,
            valuation: ValuationService::new(),
            rate_service: RateService::new(RateProviderRegistry::new_with_defaults()),
        }
    }
}

// ── Entry-point validation helpers ──────────────────────────────────

fn normalize_ticker(raw: &str) -> Result<String, CoreError> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(CoreError::ValidationError("Ticker must not be empty".into()));
    }
    if ticker.chars().count() > MAX_TICKER_LEN {
        return Err(CoreError::ValidationError(format!(
            "Ticker '{ticker}' exceeds {MAX_TICKER_LEN} characters"
        )));
    }
    Ok(ticker)
}

fn normalize_name(raw: &str, what: &str) -> Result<String, CoreError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CoreError::ValidationError(format!("{what} must not be empty")));
    }
    Ok(name.to_string())
}

fn validate_color(raw: &str) -> Result<String, CoreError> {
    let color = raw.trim();
    let is_hex = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !is_hex {
        return Err(CoreError::ValidationError(format!(
            "Invalid color '{color}': expected a hex string like #F7931A"
        )));
    }
    Ok(color.to_string())
}

fn validate_quantity(quantity: f64) -> Result<(), CoreError> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(CoreError::ValidationError(format!(
            "Quantity must be a positive number, got {quantity}"
        )));
    }
    Ok(())
}

fn validate_avg_cost(avg_cost: f64) -> Result<(), CoreError> {
    if !avg_cost.is_finite() || avg_cost < 0.0 {
        return Err(CoreError::ValidationError(format!(
            "Average cost must be zero or positive, got {avg_cost}"
        )));
    }
    Ok(())
}
