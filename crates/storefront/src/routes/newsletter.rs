//! Newsletter signup.
//!
//! Signups are forwarded to the creator API. A valid address always gets a
//! success response; collaborator failures are logged and swallowed.

use axum::{Json, extract::State};
use creator_storefront_core::Email;
use creator_storefront_core::analytics::AnalyticsEvent;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::error::{AppError, Result};
use crate::models;
use crate::services;
use crate::state::AppState;

/// Newsletter signup request body.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
}

/// Subscribe an email to the creator's list.
#[instrument(skip(state, session, request))]
pub async fn subscribe(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<Value>> {
    let email = Email::parse(&request.email)
        .map_err(|e| AppError::BadRequest(format!("Please enter a valid email address: {e}")))?;

    if let Some(api) = state.creator_api() {
        match api.signup_email(&email, &state.config().creator_ref).await {
            Ok(()) => info!(domain = email.domain(), "Newsletter signup forwarded"),
            Err(e) => warn!(error = %e, "Newsletter signup failed"),
        }
    }

    let referral = models::referral_id(&session).await?;
    services::analytics::dispatch(&state, AnalyticsEvent::EmailSignup, referral);

    Ok(Json(json!({ "success": true })))
}
