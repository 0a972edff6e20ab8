use serde::{Deserialize, Serialize};

use super::category::Category;
use super::currency::Currency;
use super::holding::Holding;
use super::portfolio::Portfolio;

/// A holding with its display-ready derived values attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedHolding {
    pub holding: Holding,

    /// quantity × avg_cost, converted to the display currency
    pub total_cost: f64,

    /// Current value in the display currency. Equal to `total_cost`
    /// until a live price feed exists — kept as a separate field so a
    /// future feed changes one computation, not the API.
    pub total_value: f64,

    /// This holding's share of the whole set's value, 0..=100
    pub percentage_of_portfolio: f64,

    /// Resolved category. `None` only if the reference went stale,
    /// which the store's integrity rules prevent; tolerated rather
    /// than crashed on.
    pub category: Option<Category>,
}

/// One partition of a by-category grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category: Category,
    pub holdings: Vec<Holding>,
    /// Converted total of the partition in the display currency
    pub total: f64,
    /// Partition's share of the overall total, 0..=100
    pub percentage: f64,
}

/// One partition of a by-currency grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyGroup {
    pub currency: Currency,
    pub holdings: Vec<Holding>,
    pub total: f64,
    pub percentage: f64,
}

/// One partition of a by-asset (ticker) grouping.
///
/// `total_quantity` sums raw quantity across holdings of the same
/// ticker only — units are never comparable across tickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetGroup {
    pub ticker: String,
    pub holdings: Vec<Holding>,
    pub total: f64,
    pub percentage: f64,
    pub total_quantity: f64,
}

/// Per-portfolio rollup: total value plus enriched holdings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub portfolio: Portfolio,
    pub total_value: f64,
    pub holdings_count: usize,
    pub holdings: Vec<EnrichedHolding>,
}
