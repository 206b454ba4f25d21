//! Read-through pricing cache.
//!
//! The delta and the creator's product list are cached in session scope. The
//! page load purges them, so the first request after each load refetches.

use creator_storefront_core::pricing::{self, PricingDelta, PricingSnapshot};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::SessionStorage;
use crate::state::AppState;

/// Pricing for this visitor, fetching whatever the session cache lacks.
///
/// A failed fetch falls back to a zero delta or an empty product list and
/// caches nothing, so the next request tries again.
///
/// # Errors
///
/// Returns an error if a fetched value cannot be written to the session
/// snapshot.
pub async fn snapshot(state: &AppState, session: &mut SessionStorage) -> Result<PricingSnapshot> {
    let creator = &state.config().creator_ref;

    let delta_percent = match pricing::cached_delta(&*session) {
        Some(delta) => delta,
        None => match state.creator_api() {
            Some(api) => match api.pricing_delta(creator).await {
                Ok(delta) => {
                    pricing::store_delta(session, delta)?;
                    debug!(delta = %delta.percent(), "Pricing delta cached");
                    delta
                }
                Err(e) => {
                    warn!(error = %e, "Pricing delta unavailable, using base prices");
                    PricingDelta::ZERO
                }
            },
            None => PricingDelta::ZERO,
        },
    };

    let products = match pricing::cached_products(&*session) {
        Some(products) => products,
        None => match state.creator_api() {
            Some(api) => match api.creator_products(creator).await {
                Ok(products) => {
                    pricing::store_products(session, &products)?;
                    debug!(count = products.len(), "Creator products cached");
                    products
                }
                Err(e) => {
                    warn!(error = %e, "Creator products unavailable");
                    Vec::new()
                }
            },
            None => Vec::new(),
        },
    };

    Ok(PricingSnapshot {
        delta_percent,
        products,
    })
}
