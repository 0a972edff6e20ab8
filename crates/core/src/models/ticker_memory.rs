use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Remembers the last category a ticker was assigned, so new-holding
/// forms can be pre-filled. Keyed by normalized ticker, at most one
/// entry per ticker; last write wins.
///
/// Advisory only — a missing entry never blocks holding creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerMemory {
    /// Normalized uppercase ticker (unique within the collection)
    pub ticker: String,

    /// The category this ticker was last assigned to
    pub category_id: Uuid,
}
