//! Core types for Creator Storefront.
//!
//! Type-safe wrappers for identifiers, money and customer emails.

pub mod email;
pub mod id;
pub mod price;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
