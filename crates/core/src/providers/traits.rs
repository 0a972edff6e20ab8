use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::currency::Currency;

/// Trait abstraction for exchange-rate sources.
///
/// Each external API implements this trait. If a source stops working
/// or changes, only that one implementation is replaced — the rest of
/// the codebase is untouched. The core never calls these directly;
/// the facade's rate refresh is the only consumer, and it simply
/// stores whatever table the providers produce.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait RateProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Which currencies this provider can quote against USD.
    fn supported_currencies(&self) -> Vec<Currency>;

    /// Fetch the current rate for a currency as units per 1 USD.
    async fn fetch_rate(&self, currency: Currency) -> Result<f64, CoreError>;
}
