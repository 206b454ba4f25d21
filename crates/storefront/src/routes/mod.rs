//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Pages (each request is one page load)
//! GET  /                       - Browse page model
//! GET  /products/{handle}      - Product page model
//! GET  /cart                   - Cart page model
//! GET  /thank-you              - Order confirmation (clears the cart)
//! GET  /orders/{id}            - Order status (clears the cart)
//!
//! # Cart API
//! GET  /api/cart               - Cart summary
//! POST /api/cart/add           - Add or increment a line
//! POST /api/cart/adjust        - Adjust a line's quantity
//! POST /api/cart/clear         - Empty the cart
//!
//! # View, pricing, analytics
//! GET  /api/view               - View state
//! POST /api/view               - Apply a view action
//! GET  /api/pricing            - Pricing snapshot
//! POST /api/pricing/quote      - Apply the creator delta to a base price
//! POST /api/events             - Queue an analytics event (202)
//! POST /api/newsletter         - Email signup
//!
//! # Checkout
//! POST /checkout               - Redirect to hosted checkout (form body optional)
//! ```

pub mod cart;
pub mod checkout;
pub mod events;
pub mod newsletter;
pub mod pages;
pub mod pricing;
pub mod view;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the page routes router.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/products/{handle}", get(pages::product))
        .route("/cart", get(pages::cart))
        .route("/thank-you", get(pages::thank_you))
        .route("/orders/{id}", get(pages::thank_you))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show))
        .route("/cart/add", post(cart::add))
        .route("/cart/adjust", post(cart::adjust))
        .route("/cart/clear", post(cart::clear))
        .route("/view", get(view::show).post(view::apply))
        .route("/pricing", get(pricing::show))
        .route("/pricing/quote", post(pricing::quote))
        .route("/events", post(events::track))
        .route("/newsletter", post(newsletter::subscribe))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(page_routes())
        .nest("/api", api_routes())
        .route("/checkout", post(checkout::start))
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
