//! Application state shared across handlers.

use std::sync::Arc;

use creator_storefront_core::CheckoutInitiator;

use crate::config::StorefrontConfig;
use crate::services::{CreatorApiClient, CreatorApiError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Visitor state lives in the
/// session, never here.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    creator_api: Option<CreatorApiClient>,
    checkout: CheckoutInitiator,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the creator API client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, CreatorApiError> {
        let creator_api = config
            .creator_api
            .as_ref()
            .map(CreatorApiClient::new)
            .transpose()?;
        let checkout = CheckoutInitiator::new(config.shop_url.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                creator_api,
                checkout,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the creator API client, if one is configured.
    #[must_use]
    pub fn creator_api(&self) -> Option<&CreatorApiClient> {
        self.inner.creator_api.as_ref()
    }

    /// Get the checkout initiator for the configured shop.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutInitiator {
        &self.inner.checkout
    }
}
