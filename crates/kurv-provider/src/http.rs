//! Reqwest implementation of [`ProductProvider`] against the live grocery
//! search API.
//!
//! Handles rate limiting (429), not-found (404), and other non-2xx responses
//! as typed errors. Transient errors (429, network failures, 5xx) are
//! automatically retried with exponential backoff up to `max_retries`
//! additional attempts.

use std::time::Duration;

use reqwest::Client;

use kurv_core::{Coordinates, Product, StoreLocation};

use crate::error::ProviderError;
use crate::provider::{ProductProvider, SearchOptions};
use crate::retry::retry_with_backoff;
use crate::types::{SearchResponse, StoresResponse, WireProduct};

pub struct HttpProductProvider {
    client: Client,
    base_url: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl HttpProductProvider {
    /// Creates a provider client with configured timeout, `User-Agent`, and
    /// retry policy. `max_retries` is the number of additional attempts after
    /// the first failure; `0` disables retries.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidBaseUrl`] if `base_url` does not parse,
    /// or [`ProviderError::Http`] if the underlying client cannot be built.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ProviderError> {
        reqwest::Url::parse(base_url).map_err(|e| ProviderError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_retries,
            backoff_base_ms,
        })
    }

    async fn get_json(&self, url: String, context: &str) -> Result<serde_json::Value, ProviderError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self.client.get(&url).send().await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(ProviderError::RateLimited { retry_after_secs });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ProviderError::NotFound { url });
                }

                if !status.is_success() {
                    return Err(ProviderError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<serde_json::Value>(&body).map_err(|e| {
                    ProviderError::Deserialize {
                        context: url,
                        source: e,
                    }
                })
            }
        })
        .await
        .map_err(|e| {
            tracing::debug!(context, error = %e, "provider request failed");
            e
        })
    }

    fn decode<T: serde::de::DeserializeOwned>(
        value: serde_json::Value,
        context: &str,
    ) -> Result<T, ProviderError> {
        serde_json::from_value(value).map_err(|e| ProviderError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

impl ProductProvider for HttpProductProvider {
    async fn search_products(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<Product>, ProviderError> {
        let mut url = reqwest::Url::parse(&format!("{}/v1/products/search", self.base_url))
            .map_err(|e| ProviderError::InvalidBaseUrl {
                base_url: self.base_url.clone(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut().append_pair("query", query);
        if let Some(chain) = &options.chain {
            url.query_pairs_mut().append_pair("chain", chain);
        }
        if let Some(limit) = options.limit {
            url.query_pairs_mut().append_pair("limit", &limit.to_string());
        }

        let value = self.get_json(url.to_string(), "product search").await?;
        let response: SearchResponse = Self::decode(value, "product search")?;
        Ok(response.products.into_iter().map(Product::from).collect())
    }

    async fn get_stores_nearby(
        &self,
        location: Coordinates,
        radius_km: f64,
    ) -> Result<Vec<StoreLocation>, ProviderError> {
        let mut url = reqwest::Url::parse(&format!("{}/v1/stores", self.base_url)).map_err(|e| {
            ProviderError::InvalidBaseUrl {
                base_url: self.base_url.clone(),
                reason: e.to_string(),
            }
        })?;
        url.query_pairs_mut()
            .append_pair("lat", &location.lat.to_string())
            .append_pair("lng", &location.lng.to_string())
            .append_pair("radius_km", &radius_km.to_string());

        let value = self.get_json(url.to_string(), "stores nearby").await?;
        let response: StoresResponse = Self::decode(value, "stores nearby")?;
        Ok(response
            .stores
            .into_iter()
            .map(|s| s.into_store_location(location))
            .collect())
    }

    async fn get_product_by_id(&self, id: &str) -> Result<Product, ProviderError> {
        let url = format!("{}/v1/products/{id}", self.base_url);
        let value = self.get_json(url, "product by id").await?;
        let wire: WireProduct = Self::decode(value, "product by id")?;
        Ok(wire.into())
    }
}
