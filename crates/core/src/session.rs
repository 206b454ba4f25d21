//! Page-load lifecycle policy.
//!
//! Runs once per page load and decides the cart's fate from the navigation
//! context and the `checkout_initiated` flag:
//!
//! | thank-you page | checkout initiated | cart | flag |
//! |---|---|---|---|
//! | yes | any | cleared | cleared |
//! | no | yes | kept | cleared |
//! | no | no | per [`ReloadPolicy`] | untouched |
//!
//! Independently of the decision, the session-cached pricing delta, creator
//! product list and referral id are purged on every evaluation so they are
//! fetched again.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cart::CartStore;
use crate::storage::{Storage, StorageError, keys};

/// What a plain page load (no thank-you page, no pending checkout) does to
/// the cart. Chosen once per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadPolicy {
    /// A reload keeps the cart.
    #[default]
    Preserve,
    /// Every plain load starts with an empty cart.
    Clear,
}

impl ReloadPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preserve => "preserve",
            Self::Clear => "clear",
        }
    }
}

impl fmt::Display for ReloadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`ReloadPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reload policy '{0}' (expected 'preserve' or 'clear')")]
pub struct ParseReloadPolicyError(String);

impl FromStr for ReloadPolicy {
    type Err = ParseReloadPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preserve" | "keep" => Ok(Self::Preserve),
            "clear" | "fresh" => Ok(Self::Clear),
            _ => Err(ParseReloadPolicyError(s.to_string())),
        }
    }
}

/// Navigation context of the page being loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageContext {
    pub is_thank_you_page: bool,
}

impl PageContext {
    /// Derive the context from the request path.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        Self {
            is_thank_you_page: is_thank_you_path(path),
        }
    }
}

/// Order confirmation pages: a path whose last segment is `thank_you`
/// (Shopify's checkout step) or `thank-you`, and `/orders/{id}` status pages.
///
/// Segments are matched whole, so `/products/thank-you-card` is not one.
#[must_use]
pub fn is_thank_you_path(path: &str) -> bool {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [first, _, ..] if first.eq_ignore_ascii_case("orders") => true,
        [.., last] => ["thank_you", "thank-you"]
            .iter()
            .any(|marker| last.eq_ignore_ascii_case(marker)),
        [] => false,
    }
}

/// Outcome of the decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision", content = "policy")]
pub enum LifecycleDecision {
    /// Thank-you page: the order went through.
    OrderCompleted,
    /// Back from a checkout that was started but not finished.
    CheckoutAbandoned,
    /// Plain page load.
    FreshLoad(ReloadPolicy),
}

impl LifecycleDecision {
    #[must_use]
    pub const fn clears_cart(self) -> bool {
        matches!(
            self,
            Self::OrderCompleted | Self::FreshLoad(ReloadPolicy::Clear)
        )
    }

    #[must_use]
    pub const fn clears_checkout_flag(self) -> bool {
        matches!(self, Self::OrderCompleted | Self::CheckoutAbandoned)
    }
}

/// The decision table. Pure.
#[must_use]
pub const fn decide(
    context: PageContext,
    checkout_initiated: bool,
    policy: ReloadPolicy,
) -> LifecycleDecision {
    if context.is_thank_you_page {
        LifecycleDecision::OrderCompleted
    } else if checkout_initiated {
        LifecycleDecision::CheckoutAbandoned
    } else {
        LifecycleDecision::FreshLoad(policy)
    }
}

/// What an evaluation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LifecycleOutcome {
    pub decision: LifecycleDecision,
    pub cart_cleared: bool,
    pub flag_cleared: bool,
}

/// Evaluate the policy for one page load and apply it.
///
/// `session` holds the session-scoped flags and caches; `cart` is the
/// durable cart store.
///
/// # Errors
///
/// Returns an error if the purge, the flag update or the cart write fails.
pub fn evaluate<C, F>(
    cart: &mut CartStore<C>,
    session: &mut F,
    context: PageContext,
    policy: ReloadPolicy,
) -> Result<LifecycleOutcome, StorageError>
where
    C: Storage,
    F: Storage,
{
    purge_ephemeral(session)?;

    let checkout_initiated = session.flag(keys::CHECKOUT_INITIATED);
    let decision = decide(context, checkout_initiated, policy);

    if decision.clears_cart() {
        cart.clear()?;
    }
    if decision.clears_checkout_flag() {
        session.remove(keys::CHECKOUT_INITIATED)?;
    }

    let outcome = LifecycleOutcome {
        decision,
        cart_cleared: decision.clears_cart(),
        flag_cleared: decision.clears_checkout_flag(),
    };

    info!(
        ?decision,
        checkout_initiated,
        cart_cleared = outcome.cart_cleared,
        "Page load lifecycle evaluated"
    );
    Ok(outcome)
}

/// Remove the session-cached pricing delta, creator product list and
/// referral id.
///
/// # Errors
///
/// Returns an error if the storage rejects a delete.
pub fn purge_ephemeral<F: Storage>(session: &mut F) -> Result<(), StorageError> {
    for key in keys::EPHEMERAL {
        session.remove(key)?;
    }
    debug!("Ephemeral session cache purged");
    Ok(())
}
