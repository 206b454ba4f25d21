//! Local cart commands.
//!
//! Each command runs one core operation against a [`CartFile`]; the caller
//! saves the file afterwards.
//!
//! # Usage
//!
//! ```bash
//! csf-cli cart --file cart.json add --product-id p1 --variant-id 4242 --price 20.00 --size M
//! csf-cli cart --file cart.json adjust --index 0 --delta -1
//! csf-cli cart --file cart.json page-load --path /thank-you
//! csf-cli cart --file cart.json checkout-url --shop creator.myshopify.com --email fan@example.com
//! ```

use creator_storefront_core::session::{LifecycleOutcome, PageContext, evaluate};
use creator_storefront_core::{
    CartItem, CartStore, CartSummary, CheckoutInitiator, CheckoutTarget, CustomerInfo,
    ReloadPolicy,
};
use tracing::info;

use crate::cart_file::CartFile;
use crate::error::CliError;

/// Summary of the stored cart.
#[must_use]
pub fn show(file: &CartFile) -> CartSummary {
    CartStore::load(file.local.clone()).cart().summary()
}

/// Add a line, or bump the matching line by one.
///
/// # Errors
///
/// Returns an error if the cart cannot be written.
pub fn add(file: &mut CartFile, item: CartItem) -> Result<CartSummary, CliError> {
    let mut cart = CartStore::load(&mut file.local);
    let index = cart.add_or_increment(item)?;
    info!(index, "Line added");
    Ok(cart.cart().summary())
}

/// Change a line's quantity by `delta`.
///
/// # Errors
///
/// Returns an error if the cart cannot be written.
pub fn adjust(file: &mut CartFile, index: usize, delta: i64) -> Result<CartSummary, CliError> {
    let mut cart = CartStore::load(&mut file.local);
    match cart.adjust_quantity(index, delta)? {
        Some(0) => info!(index, "Line removed"),
        Some(quantity) => info!(index, quantity, "Line adjusted"),
        None => info!(index, "No line at index, nothing changed"),
    }
    Ok(cart.cart().summary())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be written.
pub fn clear(file: &mut CartFile) -> Result<CartSummary, CliError> {
    let mut cart = CartStore::load(&mut file.local);
    cart.clear()?;
    Ok(cart.cart().summary())
}

/// Replay a page load at `path` under `policy`.
///
/// # Errors
///
/// Returns an error if the lifecycle policy cannot update storage.
pub fn page_load(
    file: &mut CartFile,
    path: &str,
    policy: ReloadPolicy,
) -> Result<LifecycleOutcome, CliError> {
    let mut cart = CartStore::load(&mut file.local);
    let outcome = evaluate(
        &mut cart,
        &mut file.session,
        PageContext::from_path(path),
        policy,
    )?;
    Ok(outcome)
}

/// Build the checkout URL and mark the stored session as mid-checkout.
///
/// # Errors
///
/// Returns an error if the checkout flag cannot be written.
pub fn checkout_url(
    file: &mut CartFile,
    initiator: &CheckoutInitiator,
    customer: &CustomerInfo,
    referral: Option<&str>,
) -> Result<Option<CheckoutTarget>, CliError> {
    let cart = CartStore::load(file.local.clone());
    Ok(initiator.initiate(cart.cart(), &mut file.session, customer, referral)?)
}
