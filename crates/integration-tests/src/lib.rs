//! Integration tests for Creator Storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p creator-storefront-integration-tests
//! ```
//!
//! No database or network is needed: the router runs in-process over
//! `MemoryStore` sessions and the creator API is a `wiremock` server.
//!
//! # Test Categories
//!
//! - `cart_lifecycle` - Cart store, lifecycle policy and checkout together
//! - `storefront_flow` - HTTP flows through the storefront router
//! - `creator_api` - Creator API client against a mock server

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use creator_storefront::config::{CreatorApiConfig, StorefrontConfig};
use creator_storefront::middleware::SESSION_COOKIE_NAME;
use creator_storefront::state::AppState;
use creator_storefront_core::{CreatorRef, ReloadPolicy};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use url::Url;

/// Creator the test storefront sells for.
pub const TEST_CREATOR: &str = "maya";

/// Shop origin the test storefront checks out on.
pub const TEST_SHOP: &str = "https://creator-shop.myshopify.com";

/// A storefront configuration that needs no environment.
///
/// # Panics
///
/// Panics if `creator_api_url` is not a valid URL.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn test_config(reload_policy: ReloadPolicy, creator_api_url: Option<&str>) -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        shop_url: Url::parse(TEST_SHOP).unwrap(),
        creator_ref: CreatorRef::new(TEST_CREATOR),
        reload_policy,
        creator_api: creator_api_url.map(|url| CreatorApiConfig {
            base_url: Url::parse(url).unwrap(),
            api_key: Some(SecretString::from("k3y-Zq8#wP2!")),
            timeout: Duration::from_secs(2),
        }),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// The storefront router over in-memory sessions.
///
/// # Panics
///
/// Panics if the application state cannot be built.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn test_app(config: StorefrontConfig) -> Router {
    let state = AppState::new(config).unwrap();
    creator_storefront::app(state, MemoryStore::default())
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// The body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// The `Location` header of a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// Drives the router like one browser: the session cookie is carried
/// from response to request.
pub struct TestClient {
    app: Router,
    cookie: Option<String>,
}

impl TestClient {
    #[must_use]
    pub const fn new(app: Router) -> Self {
        Self { app, cookie: None }
    }

    /// Whether the storefront has issued a session cookie.
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.cookie.is_some()
    }

    /// Send a request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    #[allow(clippy::unwrap_used)]
    pub async fn send(
        &mut self,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: Body,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let prefix = format!("{SESSION_COOKIE_NAME}=");
        if let Some(cookie) = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .find(|pair| pair.starts_with(&prefix))
        {
            self.cookie = Some(cookie.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, Body::empty()).await
    }

    pub async fn post_json(&mut self, uri: &str, body: &Value) -> TestResponse {
        self.send(
            Method::POST,
            uri,
            Some("application/json"),
            Body::from(body.to_string()),
        )
        .await
    }

    pub async fn post_form(&mut self, uri: &str, body: &str) -> TestResponse {
        self.send(
            Method::POST,
            uri,
            Some("application/x-www-form-urlencoded"),
            Body::from(body.to_string()),
        )
        .await
    }
}
