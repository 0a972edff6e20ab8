use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::currency::Currency;

use super::traits::RateProvider;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko coin id for each supported crypto currency.
fn coin_id(currency: Currency) -> Option<&'static str> {
    match currency {
        Currency::Btc => Some("bitcoin"),
        _ => None,
    }
}

/// CoinGecko API provider for crypto exchange rates.
///
/// - **Free**: the `/simple/price` endpoint needs no API key.
/// - **Usage here**: fetches the coin's USD price and inverts it, since
///   the rate table stores units per 1 USD.
pub struct CoinGeckoProvider {
    client: Client,
}

impl CoinGeckoProvider {
    pub fn new() -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
        }
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Response shape: `{"bitcoin": {"usd": 42000.0}}`
#[derive(Deserialize)]
struct SimplePriceResponse(HashMap<String, HashMap<String, f64>>);

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl RateProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    fn supported_currencies(&self) -> Vec<Currency> {
        vec![Currency::Btc]
    }

    async fn fetch_rate(&self, currency: Currency) -> Result<f64, CoreError> {
        if currency == Currency::BASE {
            return Ok(1.0);
        }

        let id = coin_id(currency).ok_or_else(|| CoreError::Api {
            provider: "CoinGecko".into(),
            message: format!("No CoinGecko id mapped for {currency}"),
        })?;

        let url = format!("{BASE_URL}/simple/price?ids={id}&vs_currencies=usd");

        let resp: SimplePriceResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "CoinGecko".into(),
                message: format!("Failed to parse price response for {id}: {e}"),
            })?;

        let usd_price = resp
            .0
            .get(id)
            .and_then(|prices| prices.get("usd"))
            .copied()
            .ok_or_else(|| CoreError::Api {
                provider: "CoinGecko".into(),
                message: format!("No USD price in response for {id}"),
            })?;

        if usd_price <= 0.0 {
            return Err(CoreError::Api {
                provider: "CoinGecko".into(),
                message: format!("Non-positive USD price {usd_price} for {id}"),
            });
        }

        // Rate table stores units per USD, so invert the USD price.
        Ok(1.0 / usd_price)
    }
}
