pub mod quote;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

pub use quote::{GoldQuote, GRAMS_PER_TROY_OUNCE};

pub const DEFAULT_FALLBACK_PRICE_PER_GRAM: f64 = 65.5;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GoldPriceError {
    #[error("gold price provider credential is not configured")]
    MissingCredential,
    #[error("gold price request failed: {0}")]
    Transport(String),
    #[error("gold price request timed out")]
    Timeout,
    #[error("gold price provider returned status {0}")]
    Status(u16),
    #[error("gold price response could not be decoded: {0}")]
    Decode(String),
    #[error("unexpected gold price response shape: {0}")]
    UnexpectedShape(String),
}

/// Upstream spot-price source. Returns the raw response body so shape
/// classification stays in one place.
#[async_trait]
pub trait GoldPriceProvider: Send + Sync {
    async fn fetch_quote(&self) -> Result<Value, GoldPriceError>;
}

#[async_trait]
impl<T: GoldPriceProvider + ?Sized> GoldPriceProvider for Arc<T> {
    async fn fetch_quote(&self) -> Result<Value, GoldPriceError> {
        (**self).fetch_quote().await
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Live,
    Fallback,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ResolvedGoldPrice {
    pub price_per_gram: f64,
    pub source: PriceSource,
}

pub struct GoldPriceResolver<P> {
    provider: P,
    fallback_price_per_gram: f64,
}

impl<P> GoldPriceResolver<P> {
    pub fn new(provider: P) -> Self {
        Self::with_fallback(provider, DEFAULT_FALLBACK_PRICE_PER_GRAM)
    }

    pub fn with_fallback(provider: P, fallback_price_per_gram: f64) -> Self {
        Self { provider, fallback_price_per_gram }
    }

    pub fn fallback_price_per_gram(&self) -> f64 {
        self.fallback_price_per_gram
    }
}

impl<P: GoldPriceProvider> GoldPriceResolver<P> {
    /// Fetches a live price, substituting the fallback on any failure.
    /// Never fails and never retries.
    pub async fn resolve(&self, correlation_id: &str) -> ResolvedGoldPrice {
        match self.live_price().await {
            Ok(price_per_gram) => {
                info!(
                    event_name = "gold_price.resolved",
                    correlation_id = %correlation_id,
                    price_per_gram,
                    "live gold price resolved"
                );
                ResolvedGoldPrice { price_per_gram, source: PriceSource::Live }
            }
            Err(error) => {
                warn!(
                    event_name = "gold_price.fallback",
                    correlation_id = %correlation_id,
                    error = %error,
                    fallback_price_per_gram = self.fallback_price_per_gram,
                    "gold price provider failed, using fallback price"
                );
                ResolvedGoldPrice {
                    price_per_gram: self.fallback_price_per_gram,
                    source: PriceSource::Fallback,
                }
            }
        }
    }

    pub async fn price_per_gram(&self, correlation_id: &str) -> f64 {
        self.resolve(correlation_id).await.price_per_gram
    }

    async fn live_price(&self) -> Result<f64, GoldPriceError> {
        let body = self.provider.fetch_quote().await?;
        GoldQuote::classify(&body).price_per_gram()
    }
}
