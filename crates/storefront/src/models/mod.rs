//! Session-side models.

pub mod session;

pub use session::{CART_SCOPE, SESSION_SCOPE, SessionStorage, referral_id};
