//! Creator Storefront Core - cart and session state machine.
//!
//! This crate holds everything a creator storefront decides on its own,
//! independent of where it runs:
//! - `storefront` - axum service hosting one controller per visitor session
//! - `cli` - operator tooling (session migrations, local cart files)
//!
//! # Architecture
//!
//! The core crate does no network I/O and has no async code. Persistence goes
//! through the [`storage::Storage`] trait so the same state machine runs
//! against memory, a JSON file, or an HTTP session.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices and emails
//! - [`storage`] - Key-value storage seam and storage keys
//! - [`cart`] - Cart items, identity/merge rules and the persisted cart store
//! - [`session`] - Page-load lifecycle policy (clear vs. preserve the cart)
//! - [`checkout`] - Checkout redirect construction
//! - [`pricing`] - Creator pricing delta and the session pricing cache
//! - [`view`] - View state reducer (browse/product/details/cart)
//! - [`analytics`] - Analytics event payloads

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod cart;
pub mod checkout;
pub mod pricing;
pub mod session;
pub mod storage;
pub mod types;
pub mod view;

pub use cart::{Cart, CartItem, CartStore, CartSummary, ItemKey};
pub use checkout::{CheckoutInitiator, CheckoutTarget, CustomerInfo};
pub use session::{LifecycleDecision, LifecycleOutcome, PageContext, ReloadPolicy};
pub use storage::{MemoryStorage, Storage, StorageError};
pub use types::*;
pub use view::{Action, View, ViewState};
