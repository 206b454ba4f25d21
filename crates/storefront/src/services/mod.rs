//! Collaborator services for the storefront.
//!
//! # Services
//!
//! - `creator_api` - HTTP client for the creator pricing/analytics/email-signup API
//! - `pricing` - Read-through session cache over the creator pricing endpoints
//! - `analytics` - Fire-and-forget event delivery
//!
//! Every call here is best-effort: failures are logged and dropped, and the
//! cart never waits on them.

pub mod analytics;
pub mod creator_api;
pub mod pricing;

pub use creator_api::{CreatorApiClient, CreatorApiError};
