//! USD price oracle with a TTL cache.
//!
//! Prices feed advisory computations only (migration cost pricing, USD
//! display values), never transaction amounts, so `f64` is acceptable here.
//!
//! The cache uses a single-flight guard: the async mutex is held across the
//! upstream fetch, and waiters re-check the cache after acquiring it, so a
//! cold cache or TTL expiry triggers exactly one refetch regardless of how
//! many callers race.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Stablecoins are pinned to $1 and never fetched.
const STABLECOINS: &[&str] = &["USDC", "USDT", "USDH", "UXD", "EURC"];

/// CoinGecko ids for the tokens commonly seen in tracked pools.
fn coingecko_id(symbol: &str) -> Option<&'static str> {
    Some(match symbol {
        "SOL" => "solana",
        "JUP" => "jupiter-exchange-solana",
        "RAY" => "raydium",
        "ORCA" => "orca",
        "BONK" => "bonk",
        "WIF" => "dogwifcoin",
        "JTO" | "JITO" => "jito-governance-token",
        "PYTH" => "pyth-network",
        "RENDER" => "render-token",
        "HNT" => "helium",
        "W" => "wormhole",
        "MSOL" => "msol",
        "STSOL" => "lido-staked-sol",
        "JITOSOL" => "jito-staked-sol",
        "BSOL" => "blazestake-staked-sol",
        _ => return None,
    })
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("price API request failed: {0}")]
    Http(String),
    #[error("unparseable price API response: {0}")]
    Parse(String),
}

/// Upstream price feed. Abstracted so tests can count fetches and the
/// endpoint can be swapped without touching cache logic.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch USD prices for the given upstream ids.
    async fn fetch_prices(&self, ids: &[&str]) -> Result<HashMap<String, f64>, OracleError>;
}

/// CoinGecko `/simple/price` source.
pub struct CoinGeckoSource {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for CoinGeckoSource {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    async fn fetch_prices(&self, ids: &[&str]) -> Result<HashMap<String, f64>, OracleError> {
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url,
            ids.join(",")
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| OracleError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(OracleError::Http(format!(
                "status {}",
                response.status()
            )));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| OracleError::Parse(e.to_string()))?;

        let mut prices = HashMap::new();
        for id in ids {
            if let Some(usd) = body.get(*id).and_then(|v| v.get("usd")).and_then(Value::as_f64) {
                prices.insert((*id).to_string(), usd);
            }
        }
        Ok(prices)
    }
}

struct CachedPrice {
    price: f64,
    fetched_at: Instant,
}

/// Symbol -> USD oracle. Injected into consumers as an explicit dependency.
pub struct PriceOracle {
    source: Box<dyn PriceSource>,
    cache_ttl: Duration,
    cache: Mutex<HashMap<String, CachedPrice>>,
}

impl Default for PriceOracle {
    fn default() -> Self {
        Self::with_source(Box::new(CoinGeckoSource::default()), DEFAULT_CACHE_TTL)
    }
}

impl PriceOracle {
    pub fn new(base_url: impl Into<String>, cache_ttl: Duration) -> Self {
        Self::with_source(Box::new(CoinGeckoSource::new(base_url)), cache_ttl)
    }

    pub fn with_source(source: Box<dyn PriceSource>, cache_ttl: Duration) -> Self {
        Self {
            source,
            cache_ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// USD price for one token symbol. Unknown symbols return 0 with a
    /// warning; upstream failures fall back to the stale cached value,
    /// then 0.
    pub async fn price(&self, symbol: &str) -> f64 {
        let symbol = symbol.to_uppercase();
        if STABLECOINS.contains(&symbol.as_str()) {
            return 1.0;
        }
        let Some(id) = coingecko_id(&symbol) else {
            tracing::warn!(%symbol, "no price mapping for token, returning 0");
            return 0.0;
        };

        // Lock held across the fetch: waiters re-check freshness after
        // acquisition instead of issuing their own request.
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.get(&symbol) {
            if cached.fetched_at.elapsed() < self.cache_ttl {
                return cached.price;
            }
        }

        match self.source.fetch_prices(&[id]).await {
            Ok(prices) => {
                let price = prices.get(id).copied().unwrap_or(0.0);
                cache.insert(
                    symbol,
                    CachedPrice {
                        price,
                        fetched_at: Instant::now(),
                    },
                );
                price
            }
            Err(err) => {
                tracing::warn!(%symbol, error = %err, "price fetch failed, using stale value");
                cache.get(&symbol).map(|c| c.price).unwrap_or(0.0)
            }
        }
    }

    /// Batched lookup. Stablecoins and fresh cache entries are answered
    /// locally; the remainder goes upstream in one request.
    pub async fn prices(&self, symbols: &[&str]) -> HashMap<String, f64> {
        let mut result = HashMap::new();
        let mut to_fetch: Vec<(String, &'static str)> = Vec::new();

        let mut cache = self.cache.lock().await;
        for symbol in symbols {
            let symbol = symbol.to_uppercase();
            if STABLECOINS.contains(&symbol.as_str()) {
                result.insert(symbol, 1.0);
                continue;
            }
            if let Some(cached) = cache.get(&symbol) {
                if cached.fetched_at.elapsed() < self.cache_ttl {
                    result.insert(symbol, cached.price);
                    continue;
                }
            }
            match coingecko_id(&symbol) {
                Some(id) => to_fetch.push((symbol, id)),
                None => {
                    result.insert(symbol, 0.0);
                }
            }
        }

        if !to_fetch.is_empty() {
            let ids: Vec<&str> = to_fetch.iter().map(|(_, id)| *id).collect();
            match self.source.fetch_prices(&ids).await {
                Ok(prices) => {
                    for (symbol, id) in to_fetch {
                        let price = prices.get(id).copied().unwrap_or(0.0);
                        cache.insert(
                            symbol.clone(),
                            CachedPrice {
                                price,
                                fetched_at: Instant::now(),
                            },
                        );
                        result.insert(symbol, price);
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "batch price fetch failed");
                    for (symbol, _) in to_fetch {
                        let price = cache.get(&symbol).map(|c| c.price).unwrap_or(0.0);
                        result.insert(symbol, price);
                    }
                }
            }
        }

        result
    }

    /// USD value of `amount` tokens.
    pub async fn value_usd(&self, symbol: &str, amount: f64) -> f64 {
        self.price(symbol).await * amount
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }
}
