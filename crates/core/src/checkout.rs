//! Checkout redirect construction.
//!
//! The hosted checkout is reached through a cart permalink:
//! `https://{shop}/cart/{variant}:{qty},{variant}:{qty}?checkout[email]=...`.
//! Only variant ids and quantities are sent; the hosted checkout prices the
//! order itself, so creator pricing deltas shown in the storefront are not
//! carried across this boundary.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::cart::Cart;
use crate::storage::{Storage, StorageError, keys};
use crate::types::{Email, VariantId};

/// Optional customer details prefilled into checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerInfo {
    pub email: Option<Email>,
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

impl CustomerInfo {
    /// Query parameters under Shopify's namespaced checkout keys, blank
    /// fields omitted.
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let shipping = [
            ("checkout[shipping_address][first_name]", &self.first_name),
            ("checkout[shipping_address][last_name]", &self.last_name),
            ("checkout[shipping_address][address1]", &self.address1),
            ("checkout[shipping_address][address2]", &self.address2),
            ("checkout[shipping_address][city]", &self.city),
            ("checkout[shipping_address][province]", &self.province),
            ("checkout[shipping_address][country]", &self.country),
            ("checkout[shipping_address][zip]", &self.zip),
            ("checkout[shipping_address][phone]", &self.phone),
        ];

        let email = self
            .email
            .as_ref()
            .map(|email| ("checkout[email]", email.as_str().to_string()));

        email
            .into_iter()
            .chain(shipping.into_iter().filter_map(|(key, value)| {
                let value = value.as_deref()?.trim();
                (!value.is_empty()).then(|| (key, value.to_string()))
            }))
            .collect()
    }
}

/// A checkout redirect URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CheckoutTarget(Url);

impl CheckoutTarget {
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.0
    }
}

impl std::fmt::Display for CheckoutTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Builds checkout targets for one shop.
#[derive(Debug, Clone)]
pub struct CheckoutInitiator {
    shop_url: Url,
}

impl CheckoutInitiator {
    /// `shop_url` is the hosted shop origin, e.g. `https://shop.example.com`.
    #[must_use]
    pub const fn new(shop_url: Url) -> Self {
        Self { shop_url }
    }

    /// Build the redirect target without touching session state.
    ///
    /// Returns `None` for an empty cart, or when no line yields a token.
    #[must_use]
    pub fn build(
        &self,
        cart: &Cart,
        customer: &CustomerInfo,
        referral: Option<&str>,
    ) -> Option<CheckoutTarget> {
        if cart.is_empty() {
            return None;
        }

        let tokens: Vec<String> = cart
            .items()
            .iter()
            .filter(|line| !line.variant_id.is_blank())
            .map(|line| format!("{}:{}", permalink_id(&line.variant_id), line.quantity))
            .collect();
        if tokens.is_empty() {
            return None;
        }

        let mut url = self.shop_url.clone();
        url.set_path(&format!("/cart/{}", tokens.join(",")));
        url.set_query(None);
        url.set_fragment(None);

        let mut pairs = customer.query_pairs();
        if let Some(referral) = referral.map(str::trim).filter(|r| !r.is_empty()) {
            pairs.push(("ref", referral.to_string()));
        }
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        Some(CheckoutTarget(url))
    }

    /// Build the target and mark the session as mid-checkout.
    ///
    /// Guarded: an empty cart (or empty token list) yields `Ok(None)` and the
    /// flag is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag cannot be written.
    pub fn initiate<S: Storage>(
        &self,
        cart: &Cart,
        session: &mut S,
        customer: &CustomerInfo,
        referral: Option<&str>,
    ) -> Result<Option<CheckoutTarget>, StorageError> {
        let Some(target) = self.build(cart, customer, referral) else {
            debug!("Checkout skipped: nothing to check out");
            return Ok(None);
        };

        session.set(keys::CHECKOUT_INITIATED, "true".to_string())?;
        info!(
            lines = cart.len(),
            quantity = cart.total_quantity(),
            "Checkout initiated"
        );
        Ok(Some(target))
    }
}

/// The numeric tail of a `gid://shopify/ProductVariant/123` id; plain ids
/// pass through.
fn permalink_id(id: &VariantId) -> &str {
    let raw = id.as_str().trim();
    if raw.starts_with("gid://") {
        raw.rsplit('/').next().unwrap_or(raw)
    } else {
        raw
    }
}
