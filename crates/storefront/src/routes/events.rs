//! Client-side analytics events.

use axum::{Json, extract::State, http::StatusCode};
use creator_storefront_core::analytics::AnalyticsEvent;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::models;
use crate::services;
use crate::state::AppState;

/// Accept an event for background delivery.
///
/// Always `202 Accepted`; delivery happens after the response.
#[instrument(skip(state, session, event), fields(event = event.name()))]
pub async fn track(
    State(state): State<AppState>,
    session: Session,
    Json(event): Json<AnalyticsEvent>,
) -> Result<StatusCode> {
    let referral = models::referral_id(&session).await?;
    services::analytics::dispatch(&state, event, referral);
    Ok(StatusCode::ACCEPTED)
}
