//! Cart API handlers.
//!
//! Each handler loads the cart from the session, applies one mutation
//! through `CartStore` and flushes the cart back before answering with the
//! cart summary.

use axum::{Json, extract::State};
use creator_storefront_core::analytics::AnalyticsEvent;
use creator_storefront_core::{
    CartItem, CartStore, CartSummary, CreatorRef, Price, ProductId, VariantId,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{self, CART_SCOPE, SessionStorage};
use crate::services;
use crate::state::AppState;

/// Add to cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub title: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Quantity for a new line; ignored when the line already exists.
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub creator_ref: Option<CreatorRef>,
}

impl AddToCartRequest {
    fn validate(&self) -> Result<()> {
        if self.variant_id.is_blank() {
            return Err(AppError::BadRequest("variantId is required".to_string()));
        }
        if self.unit_price.is_sign_negative() {
            return Err(AppError::BadRequest("unitPrice cannot be negative".to_string()));
        }
        if self.unit_price > Price::MAX_AMOUNT {
            return Err(AppError::BadRequest(format!(
                "unitPrice cannot exceed {}",
                Price::MAX_AMOUNT
            )));
        }
        Ok(())
    }

    fn into_item(self, default_creator: &CreatorRef) -> CartItem {
        CartItem {
            product_id: self.product_id,
            variant_id: self.variant_id,
            handle: self.handle,
            title: self.title,
            unit_price: self.unit_price,
            size: self.size.map(|s| s.trim().to_string()).unwrap_or_default(),
            image_url: self.image_url,
            quantity: self.quantity.unwrap_or(1),
            creator_ref: self
                .creator_ref
                .filter(|c| !c.is_blank())
                .or_else(|| Some(default_creator.clone())),
        }
    }
}

/// Adjust quantity request body.
#[derive(Debug, Deserialize)]
pub struct AdjustQuantityRequest {
    pub index: usize,
    pub delta: i64,
}

async fn load_cart(session: &Session) -> Result<CartStore<SessionStorage>> {
    Ok(CartStore::load(SessionStorage::load(session, CART_SCOPE).await?))
}

async fn save_cart(cart: CartStore<SessionStorage>, session: &Session) -> Result<CartSummary> {
    let summary = cart.cart().summary();
    cart.into_storage().flush(session).await?;
    Ok(summary)
}

/// Current cart summary.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartSummary>> {
    let cart = load_cart(&session).await?;
    Ok(Json(cart.cart().summary()))
}

/// Add a line, or bump the matching line by one.
#[instrument(skip(state, session, request), fields(variant_id = %request.variant_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartSummary>> {
    request.validate()?;
    let item = request.into_item(&state.config().creator_ref);
    let event = AnalyticsEvent::add_to_cart(&item);

    let mut cart = load_cart(&session).await?;
    let index = cart.add_or_increment(item)?;
    add_breadcrumb("cart", &format!("add line {index}"));
    info!(index, lines = cart.cart().len(), "Cart line added");

    let summary = save_cart(cart, &session).await?;
    services::analytics::dispatch(&state, event, models::referral_id(&session).await?);
    Ok(Json(summary))
}

/// Change a line's quantity by `delta`; a line reaching zero is removed.
#[instrument(skip(session))]
pub async fn adjust(
    session: Session,
    Json(request): Json<AdjustQuantityRequest>,
) -> Result<Json<CartSummary>> {
    let mut cart = load_cart(&session).await?;
    let quantity = cart.adjust_quantity(request.index, request.delta)?;
    add_breadcrumb("cart", &format!("adjust line {} by {}", request.index, request.delta));
    info!(?quantity, "Cart line adjusted");

    save_cart(cart, &session).await.map(Json)
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartSummary>> {
    let mut cart = load_cart(&session).await?;
    cart.clear()?;
    add_breadcrumb("cart", "clear");

    save_cart(cart, &session).await.map(Json)
}
