//! Pricing API.

use axum::{Json, extract::State};
use creator_storefront_core::pricing::PricingSnapshot;
use creator_storefront_core::{CurrencyCode, Price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::{SESSION_SCOPE, SessionStorage};
use crate::services;
use crate::state::AppState;

/// Quote request body.
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub base_price: Decimal,
    #[serde(default)]
    pub currency_code: Option<CurrencyCode>,
}

impl QuoteRequest {
    fn validate(&self) -> Result<()> {
        if self.base_price.is_sign_negative() {
            return Err(AppError::BadRequest("base_price cannot be negative".to_string()));
        }
        if self.base_price > Price::MAX_AMOUNT {
            return Err(AppError::BadRequest(format!(
                "base_price cannot exceed {}",
                Price::MAX_AMOUNT
            )));
        }
        Ok(())
    }
}

/// A base price with the creator's delta applied.
#[derive(Debug, Serialize)]
pub struct Quote {
    pub base_price: Decimal,
    pub price: Decimal,
    pub display: String,
    pub delta_percent: Decimal,
}

/// Fetch the visitor's pricing snapshot into the session and return it.
async fn load_snapshot(state: &AppState, session: &Session) -> Result<PricingSnapshot> {
    let mut flags = SessionStorage::load(session, SESSION_SCOPE).await?;
    let snapshot = services::pricing::snapshot(state, &mut flags).await?;
    flags.flush(session).await?;
    Ok(snapshot)
}

/// Current pricing delta and creator product list.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<PricingSnapshot>> {
    load_snapshot(&state, &session).await.map(Json)
}

/// Apply the creator's delta to a base price.
#[instrument(skip(state, session))]
pub async fn quote(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<Quote>> {
    request.validate()?;

    let snapshot = load_snapshot(&state, &session).await?;
    let base = Price::new(request.base_price, request.currency_code.unwrap_or_default());
    let adjusted = snapshot.delta_percent.apply_price(base);

    Ok(Json(Quote {
        base_price: request.base_price,
        price: adjusted.amount,
        display: adjusted.display(),
        delta_percent: snapshot.delta_percent.percent(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(json: &str) -> QuoteRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_validate_bounds() {
        request(r#"{"base_price":"20.00"}"#).validate().unwrap();
        assert!(matches!(
            request(r#"{"base_price":"-1"}"#).validate(),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            request(r#"{"base_price":"79228162514264337593543950335"}"#).validate(),
            Err(AppError::BadRequest(_))
        ));
    }
}
