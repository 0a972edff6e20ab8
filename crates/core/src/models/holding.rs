use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::currency::Currency;

/// A single position: how much of one asset is held, and at what
/// average cost. The store models current position only — there is
/// no trade history behind a holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Unique identifier
    pub id: Uuid,

    /// Owning portfolio. Must reference a live row; deleted with it.
    pub portfolio_id: Uuid,

    /// Normalized uppercase symbol, at most 10 characters
    pub ticker: String,

    /// Units held — always > 0 (validated at the entry point)
    pub quantity: f64,

    /// Average cost per unit in `currency` — always >= 0
    pub avg_cost: f64,

    /// Currency `avg_cost` is denominated in
    pub currency: Currency,

    /// Assigned category. Must reference a live row; reassigned on
    /// category delete, never left dangling.
    pub category_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Holding {
    /// Cost basis of the whole position: quantity × avg_cost,
    /// in the holding's own currency.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.quantity * self.avg_cost
    }
}

/// Input for creating a holding. The facade normalizes the ticker and
/// validates quantity/avg_cost before the store sees it.
#[derive(Debug, Clone)]
pub struct NewHolding {
    pub portfolio_id: Uuid,
    pub ticker: String,
    pub quantity: f64,
    pub avg_cost: f64,
    pub currency: Currency,
    pub category_id: Uuid,
}

/// Fields a holding update may change. `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct HoldingChanges {
    pub ticker: Option<String>,
    pub quantity: Option<f64>,
    pub avg_cost: Option<f64>,
    pub currency: Option<Currency>,
    pub category_id: Option<Uuid>,
}

/// How the cost figure on a holding form is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostBasis {
    /// The figure is cost per unit
    PerUnit,
    /// The figure is total cost; divided by quantity on entry
    Total,
}
