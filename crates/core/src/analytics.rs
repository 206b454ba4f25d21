//! Analytics event payloads.
//!
//! Events are shaped here and delivered best-effort by the host; nothing in
//! the cart depends on delivery.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::{Cart, CartItem};
use crate::types::{CreatorRef, ProductId, ReferralId, VariantId};

/// A storefront interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum AnalyticsEvent {
    PageView {
        path: String,
    },
    ProductView {
        product_id: ProductId,
        handle: String,
    },
    AddToCart {
        product_id: ProductId,
        variant_id: VariantId,
        size: String,
        unit_price: Decimal,
        quantity: u32,
    },
    BeginCheckout {
        value: Decimal,
        item_count: u32,
    },
    EmailSignup,
}

impl AnalyticsEvent {
    /// The add-to-cart event for a line as it was added.
    #[must_use]
    pub fn add_to_cart(item: &CartItem) -> Self {
        Self::AddToCart {
            product_id: item.product_id.clone(),
            variant_id: item.variant_id.clone(),
            size: item.size.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity.max(1),
        }
    }

    #[must_use]
    pub fn begin_checkout(cart: &Cart) -> Self {
        Self::BeginCheckout {
            value: cart.total_price(),
            item_count: cart.total_quantity(),
        }
    }

    /// Event name as sent on the wire.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PageView { .. } => "page_view",
            Self::ProductView { .. } => "product_view",
            Self::AddToCart { .. } => "add_to_cart",
            Self::BeginCheckout { .. } => "begin_checkout",
            Self::EmailSignup => "email_signup",
        }
    }
}

/// An event plus attribution, ready to POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub creator_ref: CreatorRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_id: Option<ReferralId>,
    pub occurred_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: AnalyticsEvent,
}

impl EventEnvelope {
    #[must_use]
    pub fn new(
        event: AnalyticsEvent,
        creator_ref: CreatorRef,
        referral_id: Option<ReferralId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            creator_ref,
            referral_id,
            occurred_at: Utc::now(),
            event,
        }
    }
}
