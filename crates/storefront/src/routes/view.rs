//! View state API.
//!
//! The theme posts navigation actions here; the reducer in core decides the
//! next view and the result is kept in the session.

use axum::Json;
use creator_storefront_core::{Action, ViewState};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::models::{SESSION_SCOPE, SessionStorage};

/// Current view state.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<ViewState>> {
    let flags = SessionStorage::load(&session, SESSION_SCOPE).await?;
    Ok(Json(ViewState::load(&flags)))
}

/// Apply a view action and return the next state.
#[instrument(skip(session))]
pub async fn apply(session: Session, Json(action): Json<Action>) -> Result<Json<ViewState>> {
    let mut flags = SessionStorage::load(&session, SESSION_SCOPE).await?;
    let next = ViewState::load(&flags).apply(action);
    next.save(&mut flags)?;
    flags.flush(&session).await?;
    Ok(Json(next))
}
