use crate::errors::CoreError;
use crate::models::category::Category;
use crate::models::currency::{Currency, ExchangeRates};
use crate::models::holding::Holding;
use crate::models::portfolio::Portfolio;
use crate::models::summary::{
    AssetGroup, CategoryGroup, CurrencyGroup, EnrichedHolding, PortfolioSummary,
};

/// Turns raw holdings plus an exchange-rate table into display-ready
/// numbers: converted values, totals, percentage shares, groupings.
///
/// Pure business logic — no store access, no I/O. A holding whose
/// currency is absent from the rate table is a `MissingRate` error,
/// never a silently skipped row.
///
/// **Note on precision**: all values are `f64`. Group percentages sum
/// to 100 within floating tolerance, not exactly.
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    /// Convert an amount between currencies, pivoting through the base
    /// (USD). Identity when `from == to` — no float round-trip. The
    /// base currency's rate is 1 by definition and is never looked up
    /// as a divisor.
    pub fn convert(
        &self,
        amount: f64,
        from: Currency,
        to: Currency,
        rates: &ExchangeRates,
    ) -> Result<f64, CoreError> {
        if from == to {
            return Ok(amount);
        }

        let in_base = if from == Currency::BASE {
            amount
        } else {
            amount / rates.rate(from)?
        };

        if to == Currency::BASE {
            Ok(in_base)
        } else {
            Ok(in_base * rates.rate(to)?)
        }
    }

    /// A holding's cost basis converted into the display currency.
    pub fn holding_value(
        &self,
        holding: &Holding,
        display: Currency,
        rates: &ExchangeRates,
    ) -> Result<f64, CoreError> {
        self.convert(holding.total_cost(), holding.currency, display, rates)
    }

    /// Sum of every holding's converted value in the display currency.
    pub fn total_value(
        &self,
        holdings: &[Holding],
        display: Currency,
        rates: &ExchangeRates,
    ) -> Result<f64, CoreError> {
        let mut total = 0.0;
        for holding in holdings {
            total += self.holding_value(holding, display, rates)?;
        }
        Ok(total)
    }

    /// `value`'s share of `total` as 0..=100. Zero when the total is
    /// zero, so an empty or worthless set never divides by zero.
    #[must_use]
    pub fn percentage_of(&self, value: f64, total: f64) -> f64 {
        if total == 0.0 {
            0.0
        } else {
            value / total * 100.0
        }
    }

    /// Attach derived values to each holding: converted cost, current
    /// value (equal to cost until a live price feed exists), share of
    /// the whole set, and the resolved category. A stale category
    /// reference resolves to `None` rather than failing.
    pub fn enrich(
        &self,
        holdings: &[Holding],
        categories: &[Category],
        display: Currency,
        rates: &ExchangeRates,
    ) -> Result<Vec<EnrichedHolding>, CoreError> {
        let total = self.total_value(holdings, display, rates)?;

        holdings
            .iter()
            .map(|holding| {
                let value = self.holding_value(holding, display, rates)?;
                Ok(EnrichedHolding {
                    total_cost: value,
                    total_value: value,
                    percentage_of_portfolio: self.percentage_of(value, total),
                    category: categories
                        .iter()
                        .find(|c| c.id == holding.category_id)
                        .cloned(),
                    holding: holding.clone(),
                })
            })
            .collect()
    }

    /// Partition holdings by category, with each partition's converted
    /// total and share of the overall total. Partitions appear in the
    /// order their first holding does. Holdings whose category cannot
    /// be resolved are left out of every partition (they still count
    /// toward the overall total).
    pub fn group_by_category(
        &self,
        holdings: &[Holding],
        categories: &[Category],
        display: Currency,
        rates: &ExchangeRates,
    ) -> Result<Vec<CategoryGroup>, CoreError> {
        let total = self.total_value(holdings, display, rates)?;
        let mut groups: Vec<CategoryGroup> = Vec::new();

        for holding in holdings {
            let Some(category) = categories.iter().find(|c| c.id == holding.category_id) else {
                continue;
            };
            let value = self.holding_value(holding, display, rates)?;

            match groups.iter_mut().find(|g| g.category.id == category.id) {
                Some(group) => {
                    group.holdings.push(holding.clone());
                    group.total += value;
                }
                None => groups.push(CategoryGroup {
                    category: category.clone(),
                    holdings: vec![holding.clone()],
                    total: value,
                    percentage: 0.0,
                }),
            }
        }

        for group in &mut groups {
            group.percentage = self.percentage_of(group.total, total);
        }
        Ok(groups)
    }

    /// Partition holdings by their denomination currency.
    pub fn group_by_currency(
        &self,
        holdings: &[Holding],
        display: Currency,
        rates: &ExchangeRates,
    ) -> Result<Vec<CurrencyGroup>, CoreError> {
        let total = self.total_value(holdings, display, rates)?;
        let mut groups: Vec<CurrencyGroup> = Vec::new();

        for holding in holdings {
            let value = self.holding_value(holding, display, rates)?;

            match groups.iter_mut().find(|g| g.currency == holding.currency) {
                Some(group) => {
                    group.holdings.push(holding.clone());
                    group.total += value;
                }
                None => groups.push(CurrencyGroup {
                    currency: holding.currency,
                    holdings: vec![holding.clone()],
                    total: value,
                    percentage: 0.0,
                }),
            }
        }

        for group in &mut groups {
            group.percentage = self.percentage_of(group.total, total);
        }
        Ok(groups)
    }

    /// Partition holdings by ticker. Raw quantities sum within a
    /// partition only — units differ between tickers.
    pub fn group_by_asset(
        &self,
        holdings: &[Holding],
        display: Currency,
        rates: &ExchangeRates,
    ) -> Result<Vec<AssetGroup>, CoreError> {
        let total = self.total_value(holdings, display, rates)?;
        let mut groups: Vec<AssetGroup> = Vec::new();

        for holding in holdings {
            let value = self.holding_value(holding, display, rates)?;

            match groups.iter_mut().find(|g| g.ticker == holding.ticker) {
                Some(group) => {
                    group.holdings.push(holding.clone());
                    group.total += value;
                    group.total_quantity += holding.quantity;
                }
                None => groups.push(AssetGroup {
                    ticker: holding.ticker.clone(),
                    holdings: vec![holding.clone()],
                    total: value,
                    percentage: 0.0,
                    total_quantity: holding.quantity,
                }),
            }
        }

        for group in &mut groups {
            group.percentage = self.percentage_of(group.total, total);
        }
        Ok(groups)
    }

    /// Per-portfolio rollups: total value, holdings count, and
    /// enriched holdings (percentages relative to each portfolio).
    pub fn portfolio_summaries(
        &self,
        portfolios: &[Portfolio],
        holdings: &[Holding],
        categories: &[Category],
        display: Currency,
        rates: &ExchangeRates,
    ) -> Result<Vec<PortfolioSummary>, CoreError> {
        portfolios
            .iter()
            .map(|portfolio| {
                let owned: Vec<Holding> = holdings
                    .iter()
                    .filter(|h| h.portfolio_id == portfolio.id)
                    .cloned()
                    .collect();
                let enriched = self.enrich(&owned, categories, display, rates)?;
                Ok(PortfolioSummary {
                    portfolio: portfolio.clone(),
                    total_value: self.total_value(&owned, display, rates)?,
                    holdings_count: owned.len(),
                    holdings: enriched,
                })
            })
            .collect()
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}
