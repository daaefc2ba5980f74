//! USD price lookup with a TTL cache
//!
//! One batched request covers every tracked token. Cached prices are served
//! while younger than the TTL. When the price service is unreachable the
//! fetcher answers with static approximations so the portfolio view is never
//! blocked by a price outage; those values are not cached and go stale
//! silently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::Instant;

use crate::error::PriceError;

/// Token symbol to USD price
pub type PriceMap = HashMap<String, f64>;

/// Tracked tokens: (symbol, price service id, fallback USD price)
pub const TRACKED_TOKENS: [(&str, &str, f64); 4] = [
    ("DOT", "polkadot", 7.5),
    ("ACA", "acala", 0.08),
    ("HDX", "hydradx", 0.02),
    ("BNC", "bifrost-native-coin", 0.5),
];

pub const DEFAULT_PRICE_TTL: Duration = Duration::from_secs(5 * 60);

/// Static prices used when the price service fails
pub fn fallback_prices() -> PriceMap {
    TRACKED_TOKENS
        .iter()
        .map(|(symbol, _, price)| (symbol.to_string(), *price))
        .collect()
}

/// A batched price lookup keyed by price service id
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(&self, ids: &[String]) -> Result<HashMap<String, f64>, PriceError>;
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    usd: f64,
}

/// CoinGecko `simple/price` client
pub struct CoinGeckoSource {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    async fn fetch(&self, ids: &[String]) -> Result<HashMap<String, f64>, PriceError> {
        let url = format!("{}/simple/price", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("ids", ids.join(",")), ("vs_currencies", "usd".to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PriceError::Status(response.status().as_u16()));
        }

        let quotes: HashMap<String, UsdQuote> = response
            .json()
            .await
            .map_err(|e| PriceError::Decode(e.to_string()))?;

        Ok(quotes.into_iter().map(|(id, q)| (id, q.usd)).collect())
    }
}

struct CachedPrice {
    price: f64,
    fetched_at: Instant,
}

pub struct PriceFetcher {
    source: Arc<dyn PriceSource>,
    ttl: Duration,
    cache: Mutex<HashMap<String, CachedPrice>>,
}

impl PriceFetcher {
    pub fn new(source: Arc<dyn PriceSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Current USD price of every tracked token, keyed by symbol
    pub async fn prices(&self) -> PriceMap {
        if let Some(cached) = self.fresh_from_cache() {
            log::debug!("Price cache hit");
            return cached;
        }

        let ids: Vec<String> = TRACKED_TOKENS.iter().map(|(_, id, _)| id.to_string()).collect();
        let quotes = match self.source.fetch(&ids).await {
            Ok(quotes) => quotes,
            Err(e) => {
                log::warn!("Price fetch failed, using fallback prices: {}", e);
                return fallback_prices();
            }
        };

        let now = Instant::now();
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        let mut prices = PriceMap::new();
        for (symbol, id, fallback) in TRACKED_TOKENS {
            match quotes.get(id) {
                Some(&price) => {
                    cache.insert(id.to_string(), CachedPrice { price, fetched_at: now });
                    prices.insert(symbol.to_string(), price);
                }
                None => {
                    log::warn!("No price for {} in response, using fallback {}", id, fallback);
                    prices.insert(symbol.to_string(), fallback);
                }
            }
        }
        log::debug!("Fetched {} price(s)", quotes.len());
        prices
    }

    /// All tracked prices, only if every one is younger than the TTL
    fn fresh_from_cache(&self) -> Option<PriceMap> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        TRACKED_TOKENS
            .iter()
            .map(|(symbol, id, _)| {
                cache
                    .get(*id)
                    .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
                    .map(|entry| (symbol.to_string(), entry.price))
            })
            .collect()
    }

    /// Drop every cached price
    pub fn invalidate(&self) {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
