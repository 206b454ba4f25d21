//! Fire-and-forget analytics delivery.

use creator_storefront_core::ReferralId;
use creator_storefront_core::analytics::{AnalyticsEvent, EventEnvelope};
use tracing::{debug, warn};

use crate::state::AppState;

/// Send `event` to the creator API in the background.
///
/// Delivery never blocks or fails the request. Without a configured creator
/// API the event is dropped.
pub fn dispatch(state: &AppState, event: AnalyticsEvent, referral_id: Option<ReferralId>) {
    let Some(api) = state.creator_api().cloned() else {
        debug!(event = event.name(), "No creator API configured, dropping event");
        return;
    };

    let envelope = EventEnvelope::new(event, state.config().creator_ref.clone(), referral_id);
    tokio::spawn(async move {
        if let Err(e) = api.track_event(&envelope).await {
            warn!(error = %e, event = envelope.event.name(), "Analytics event dropped");
        }
    });
}
