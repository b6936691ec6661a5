use std::time::Duration;

use async_trait::async_trait;
use goldleaf_core::config::GoldConfig;
use goldleaf_core::gold::{GoldPriceError, GoldPriceProvider};
use reqwest::{header::CONTENT_TYPE, Client};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

const ACCESS_TOKEN_HEADER: &str = "x-access-token";
const METAL_SYMBOL: &str = "XAU";

/// GoldAPI spot-price client. Each call is a single bounded request.
pub struct GoldApiProvider {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
}

impl GoldApiProvider {
    pub fn from_config(config: &GoldConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;

        Ok(Self {
            client,
            endpoint: spot_endpoint(&config.base_url, &config.currency),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GoldPriceProvider for GoldApiProvider {
    async fn fetch_quote(&self) -> Result<Value, GoldPriceError> {
        let api_key = self
            .api_key
            .as_ref()
            .map(|key| key.expose_secret())
            .filter(|key| !key.trim().is_empty())
            .ok_or(GoldPriceError::MissingCredential)?;

        let response = self
            .client
            .get(&self.endpoint)
            .header(ACCESS_TOKEN_HEADER, api_key)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(GoldPriceError::Status(response.status().as_u16()));
        }

        response.json::<Value>().await.map_err(|error| {
            if error.is_timeout() {
                GoldPriceError::Timeout
            } else {
                GoldPriceError::Decode(error.to_string())
            }
        })
    }
}

fn spot_endpoint(base_url: &str, currency: &str) -> String {
    format!("{}/{METAL_SYMBOL}/{currency}", base_url.trim_end_matches('/'))
}

fn transport_error(error: reqwest::Error) -> GoldPriceError {
    if error.is_timeout() {
        GoldPriceError::Timeout
    } else {
        GoldPriceError::Transport(error.to_string())
    }
}
