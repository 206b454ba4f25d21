//! Checkout redirect.
//!
//! Builds the hosted checkout URL from the session cart, marks the session
//! as mid-checkout and redirects. An empty cart sends the visitor back to
//! `/cart` without touching the flag.
//!
//! Checkout is POST-only: a GET that prefetchers or crawlers follow must not
//! mark the session as mid-checkout.

use axum::{Form, extract::State, response::Redirect};
use creator_storefront_core::analytics::AnalyticsEvent;
use creator_storefront_core::pricing;
use creator_storefront_core::{CartStore, CustomerInfo, Email};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{debug, instrument};

use crate::error::{Result, add_breadcrumb};
use crate::models::{CART_SCOPE, SESSION_SCOPE, SessionStorage};
use crate::services;
use crate::state::AppState;

/// Checkout form. Every field is optional and blank means absent.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
}

impl From<CheckoutForm> for CustomerInfo {
    fn from(form: CheckoutForm) -> Self {
        // An invalid email is dropped rather than failing the checkout
        let email = form
            .email
            .filter(|e| !e.trim().is_empty())
            .and_then(|raw| {
                Email::parse(&raw)
                    .map_err(|e| debug!(error = %e, "Ignoring invalid checkout email"))
                    .ok()
            });

        Self {
            email,
            first_name: form.first_name,
            last_name: form.last_name,
            address1: form.address1,
            address2: form.address2,
            city: form.city,
            province: form.province,
            country: form.country,
            zip: form.zip,
            phone: form.phone,
        }
    }
}

/// Start checkout. Every form field may be omitted.
#[instrument(skip(state, session, form))]
pub async fn start(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Redirect> {
    initiate(&state, &session, form.into()).await
}

async fn initiate(state: &AppState, session: &Session, customer: CustomerInfo) -> Result<Redirect> {
    let cart = CartStore::load(SessionStorage::load(session, CART_SCOPE).await?);
    let mut flags = SessionStorage::load(session, SESSION_SCOPE).await?;

    // Attribution falls back to the creator when no referral was captured
    let referral = pricing::referral_id(&flags);
    let attribution = referral
        .as_ref()
        .map_or_else(|| state.config().creator_ref.as_str(), |r| r.as_str());

    let Some(target) = state
        .checkout()
        .initiate(cart.cart(), &mut flags, &customer, Some(attribution))?
    else {
        return Ok(Redirect::to("/cart"));
    };

    flags.flush(session).await?;
    add_breadcrumb("checkout", "redirect to hosted checkout");
    services::analytics::dispatch(state, AnalyticsEvent::begin_checkout(cart.cart()), referral);

    Ok(Redirect::to(target.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_drops_invalid_email() {
        let form = CheckoutForm {
            email: Some("not-an-email".to_string()),
            city: Some("Austin".to_string()),
            ..CheckoutForm::default()
        };
        let customer = CustomerInfo::from(form);
        assert_eq!(customer.email, None);
        assert_eq!(customer.city.as_deref(), Some("Austin"));
    }

    #[test]
    fn test_form_normalizes_email() {
        let form = CheckoutForm {
            email: Some(" Fan@Example.COM ".to_string()),
            ..CheckoutForm::default()
        };
        let customer = CustomerInfo::from(form);
        assert_eq!(
            customer.email.as_ref().map(Email::as_str),
            Some("fan@example.com")
        );
    }

    #[test]
    fn test_blank_email_is_absent() {
        let form = CheckoutForm {
            email: Some("   ".to_string()),
            ..CheckoutForm::default()
        };
        assert_eq!(CustomerInfo::from(form).email, None);
    }
}
