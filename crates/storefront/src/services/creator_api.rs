//! Creator API client.
//!
//! Read-only pricing endpoints plus write-only event tracking and email
//! signup:
//!
//! ```text
//! GET  /creators/{creator}/pricing-delta   -> { "delta": "12.5" }
//! GET  /creators/{creator}/products        -> { "products": ["tee", ...] }
//! POST /events                             <- EventEnvelope
//! POST /email-signups                      <- { "email", "creator_ref" }
//! ```

use std::sync::Arc;

use creator_storefront_core::analytics::EventEnvelope;
use creator_storefront_core::pricing::PricingDelta;
use creator_storefront_core::{CreatorRef, Email};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::CreatorApiConfig;

/// Errors that can occur when calling the creator API.
#[derive(Debug, Error)]
pub enum CreatorApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configured base URL cannot take path segments.
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

/// Creator API client. Cheap to clone.
#[derive(Clone)]
pub struct CreatorApiClient {
    inner: Arc<CreatorApiClientInner>,
}

struct CreatorApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct PricingDeltaResponse {
    delta: PricingDelta,
}

#[derive(Debug, Deserialize)]
struct CreatorProductsResponse {
    products: Vec<String>,
}

impl CreatorApiClient {
    /// Create a new creator API client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &CreatorApiConfig) -> Result<Self, CreatorApiError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key.expose_secret()))
                .map_err(|e| CreatorApiError::Parse(format!("Invalid API key format: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(CreatorApiClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Build an endpoint URL from path segments (each segment is escaped).
    fn endpoint(&self, segments: &[&str]) -> Result<Url, CreatorApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CreatorApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Turn a non-success response into `CreatorApiError::Api`.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, CreatorApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(CreatorApiError::Api {
            status: status.as_u16(),
            message: message.chars().take(200).collect(),
        })
    }

    /// Fetch the creator's suggested pricing delta.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a delta.
    #[instrument(skip(self, creator), fields(creator = %creator))]
    pub async fn pricing_delta(
        &self,
        creator: &CreatorRef,
    ) -> Result<PricingDelta, CreatorApiError> {
        let url = self.endpoint(&["creators", creator.as_str(), "pricing-delta"])?;
        let response = Self::check(self.inner.client.get(url).send().await?).await?;
        let body: PricingDeltaResponse = response
            .json()
            .await
            .map_err(|e| CreatorApiError::Parse(e.to_string()))?;
        Ok(body.delta)
    }

    /// Fetch the handles of the creator's products.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a product list.
    #[instrument(skip(self, creator), fields(creator = %creator))]
    pub async fn creator_products(
        &self,
        creator: &CreatorRef,
    ) -> Result<Vec<String>, CreatorApiError> {
        let url = self.endpoint(&["creators", creator.as_str(), "products"])?;
        let response = Self::check(self.inner.client.get(url).send().await?).await?;
        let body: CreatorProductsResponse = response
            .json()
            .await
            .map_err(|e| CreatorApiError::Parse(e.to_string()))?;
        Ok(body.products)
    }

    /// Record an analytics event.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, envelope), fields(event = envelope.event.name()))]
    pub async fn track_event(&self, envelope: &EventEnvelope) -> Result<(), CreatorApiError> {
        let url = self.endpoint(&["events"])?;
        Self::check(self.inner.client.post(url).json(envelope).send().await?).await?;
        Ok(())
    }

    /// Sign an email up for the creator's list.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, email, creator), fields(creator = %creator))]
    pub async fn signup_email(
        &self,
        email: &Email,
        creator: &CreatorRef,
    ) -> Result<(), CreatorApiError> {
        let url = self.endpoint(&["email-signups"])?;
        let body = serde_json::json!({
            "email": email,
            "creator_ref": creator,
        });
        Self::check(self.inner.client.post(url).json(&body).send().await?).await?;
        Ok(())
    }
}
