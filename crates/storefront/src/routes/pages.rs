//! Page load handlers.
//!
//! Every page route is one page load: the lifecycle policy runs first and
//! decides the cart's fate, then the page model is projected from the
//! resulting state. Rendering is left to the theme, so the model is JSON.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::Uri,
};
use creator_storefront_core::analytics::AnalyticsEvent;
use creator_storefront_core::pricing::{self, PricingSnapshot};
use creator_storefront_core::session::{LifecycleOutcome, PageContext, evaluate};
use creator_storefront_core::{Action, CartStore, CartSummary, ReferralId, ViewState};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::models::{CART_SCOPE, SESSION_SCOPE, SessionStorage};
use crate::services;
use crate::state::AppState;

/// Query parameters every page accepts.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Referral id from an affiliate link.
    #[serde(rename = "ref")]
    pub referral: Option<String>,
}

/// Product-specific part of the page model.
#[derive(Debug, Clone, Serialize)]
pub struct ProductModel {
    pub handle: String,
    /// Whether the creator features this product.
    pub featured: bool,
}

/// Everything the theme needs to render a page.
#[derive(Debug, Clone, Serialize)]
pub struct PageModel {
    pub path: String,
    pub lifecycle: LifecycleOutcome,
    pub view: ViewState,
    pub cart: CartSummary,
    pub pricing: PricingSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductModel>,
}

/// Browse page.
#[instrument(skip(state, session, query))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageModel>> {
    page_load(&state, &session, uri.path(), PageContext::default(), query, Action::Browse)
        .await
        .map(Json)
}

/// Product page.
#[instrument(skip(state, session, query))]
pub async fn product(
    State(state): State<AppState>,
    session: Session,
    uri: Uri,
    Path(handle): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageModel>> {
    let action = Action::SelectProduct {
        handle: handle.clone(),
    };
    let mut model =
        page_load(&state, &session, uri.path(), PageContext::default(), query, action).await?;
    model.product = Some(ProductModel {
        featured: model.pricing.features(&handle),
        handle,
    });
    Ok(Json(model))
}

/// Cart page.
#[instrument(skip(state, session, query))]
pub async fn cart(
    State(state): State<AppState>,
    session: Session,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageModel>> {
    page_load(&state, &session, uri.path(), PageContext::default(), query, Action::OpenCart)
        .await
        .map(Json)
}

/// Order confirmation pages (`/thank-you`, `/orders/{id}`).
///
/// Only these routes load as thank-you pages, so only they clear the cart
/// unconditionally.
#[instrument(skip(state, session, query))]
pub async fn thank_you(
    State(state): State<AppState>,
    session: Session,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageModel>> {
    let context = PageContext {
        is_thank_you_page: true,
    };
    page_load(&state, &session, uri.path(), context, query, Action::Browse)
        .await
        .map(Json)
}

/// Run one page load against the visitor's session.
async fn page_load(
    state: &AppState,
    session: &Session,
    path: &str,
    context: PageContext,
    query: PageQuery,
    action: Action,
) -> Result<PageModel> {
    let mut cart = CartStore::load(SessionStorage::load(session, CART_SCOPE).await?);
    let mut flags = SessionStorage::load(session, SESSION_SCOPE).await?;

    let lifecycle = evaluate(
        &mut cart,
        &mut flags,
        context,
        state.config().reload_policy,
    )?;

    if let Some(referral) = query.referral.map(ReferralId::new).filter(|r| !r.is_blank()) {
        pricing::store_referral_id(&mut flags, &referral)?;
    }

    let view = ViewState::load(&flags).apply(action);
    view.save(&mut flags)?;

    let snapshot = services::pricing::snapshot(state, &mut flags).await?;
    let referral = pricing::referral_id(&flags);
    let summary = cart.cart().summary();

    cart.into_storage().flush(session).await?;
    flags.flush(session).await?;

    services::analytics::dispatch(
        state,
        AnalyticsEvent::PageView {
            path: path.to_string(),
        },
        referral,
    );

    Ok(PageModel {
        path: path.to_string(),
        lifecycle,
        view,
        cart: summary,
        pricing: snapshot,
        product: None,
    })
}
