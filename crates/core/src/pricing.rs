//! Creator pricing delta and the session pricing cache.
//!
//! Each creator can mark prices up or down by a percentage. The delta, the
//! creator's product list and the visitor's referral id are cached in session
//! scope and purged on every page load (see [`crate::session`]).

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::storage::{Storage, StorageError, keys};
use crate::types::{Price, ReferralId};

/// A percentage price adjustment (`12.5` means +12.5%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PricingDelta(Decimal);

impl PricingDelta {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[must_use]
    pub const fn from_percent(percent: Decimal) -> Self {
        Self(percent)
    }

    #[must_use]
    pub const fn percent(self) -> Decimal {
        self.0
    }

    /// `base × (1 + percent / 100)`, rounded to cents (midpoint away from
    /// zero), floored at zero and saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn apply(self, base: Decimal) -> Decimal {
        let factor = Decimal::ONE.saturating_add(self.0 / Decimal::ONE_HUNDRED);
        base.saturating_mul(factor)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .max(Decimal::ZERO)
    }

    #[must_use]
    pub fn apply_price(self, base: Price) -> Price {
        Price::new(self.apply(base.amount), base.currency_code)
    }
}

/// The pricing data a page needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSnapshot {
    pub delta_percent: PricingDelta,
    pub products: Vec<String>,
}

impl PricingSnapshot {
    /// Whether `handle` is in the creator's product list.
    #[must_use]
    pub fn features(&self, handle: &str) -> bool {
        self.products.iter().any(|p| p == handle)
    }
}

// =============================================================================
// Session Cache
// =============================================================================

/// Cached pricing delta. An unparseable value is treated as absent.
#[must_use]
pub fn cached_delta<S: Storage>(session: &S) -> Option<PricingDelta> {
    let raw = session.get(keys::PRICING_DELTA).ok().flatten()?;
    match raw.trim().parse::<Decimal>() {
        Ok(percent) => Some(PricingDelta::from_percent(percent)),
        Err(e) => {
            warn!(error = %e, value = %raw, "Ignoring malformed cached pricing delta");
            None
        }
    }
}

/// Cache the pricing delta.
///
/// # Errors
///
/// Returns an error if the storage write fails.
pub fn store_delta<S: Storage>(session: &mut S, delta: PricingDelta) -> Result<(), StorageError> {
    session.set(keys::PRICING_DELTA, delta.percent().to_string())
}

/// Cached creator product list. An unparseable value is treated as absent.
#[must_use]
pub fn cached_products<S: Storage>(session: &S) -> Option<Vec<String>> {
    let raw = session.get(keys::CREATOR_PRODUCTS).ok().flatten()?;
    serde_json::from_str(&raw)
        .map_err(|e| warn!(error = %e, "Ignoring malformed cached creator products"))
        .ok()
}

/// Cache the creator product list.
///
/// # Errors
///
/// Returns an error if serialization or the storage write fails.
pub fn store_products<S: Storage>(
    session: &mut S,
    products: &[String],
) -> Result<(), StorageError> {
    session.set(keys::CREATOR_PRODUCTS, serde_json::to_string(products)?)
}

/// Referral id captured for this session.
#[must_use]
pub fn referral_id<S: Storage>(session: &S) -> Option<ReferralId> {
    session
        .get(keys::REFERRAL_ID)
        .ok()
        .flatten()
        .map(ReferralId::new)
        .filter(|id| !id.is_blank())
}

/// Remember the referral id for this session.
///
/// # Errors
///
/// Returns an error if the storage write fails.
pub fn store_referral_id<S: Storage>(session: &mut S, id: &ReferralId) -> Result<(), StorageError> {
    session.set(keys::REFERRAL_ID, id.as_str().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn delta(s: &str) -> PricingDelta {
        PricingDelta::from_percent(s.parse().unwrap())
    }

    #[test]
    fn test_apply_markup() {
        assert_eq!(delta("12.5").apply(Decimal::new(20, 0)), Decimal::new(2250, 2));
        assert_eq!(delta("10").apply(Decimal::new(1999, 2)), Decimal::new(2199, 2));
    }

    #[test]
    fn test_apply_discount_and_floor() {
        assert_eq!(delta("-25").apply(Decimal::new(40, 0)), Decimal::new(30, 0));
        assert_eq!(delta("-150").apply(Decimal::new(40, 0)), Decimal::ZERO);
    }

    #[test]
    fn test_apply_saturates_on_overflow() {
        assert_eq!(delta("50").apply(Decimal::MAX), Decimal::MAX);
        assert_eq!(
            PricingDelta::from_percent(Decimal::MAX).apply(Decimal::new(20, 0)),
            Decimal::MAX
        );
    }

    #[test]
    fn test_zero_delta_is_identity() {
        assert_eq!(PricingDelta::ZERO.apply(Decimal::new(1234, 2)), Decimal::new(1234, 2));
    }

    #[test]
    fn test_apply_price_keeps_currency() {
        let price = delta("50").apply_price(Price::usd(Decimal::new(10, 0)));
        assert_eq!(price.display(), "$15.00");
    }

    #[test]
    fn test_cache_round_trip() {
        let mut session = MemoryStorage::new();
        assert_eq!(cached_delta(&session), None);
        assert_eq!(cached_products(&session), None);

        store_delta(&mut session, delta("7.5")).unwrap();
        store_products(&mut session, &["tee".to_string(), "cap".to_string()]).unwrap();
        store_referral_id(&mut session, &ReferralId::new("r-1")).unwrap();

        assert_eq!(cached_delta(&session), Some(delta("7.5")));
        assert_eq!(
            cached_products(&session),
            Some(vec!["tee".to_string(), "cap".to_string()])
        );
        assert_eq!(referral_id(&session), Some(ReferralId::new("r-1")));
    }

    #[test]
    fn test_malformed_cache_is_absent() {
        let mut session = MemoryStorage::new();
        session.set(keys::PRICING_DELTA, "ten".to_string()).unwrap();
        session.set(keys::CREATOR_PRODUCTS, "{".to_string()).unwrap();
        session.set(keys::REFERRAL_ID, " ".to_string()).unwrap();

        assert_eq!(cached_delta(&session), None);
        assert_eq!(cached_products(&session), None);
        assert_eq!(referral_id(&session), None);
    }

    #[test]
    fn test_snapshot_features() {
        let snapshot = PricingSnapshot {
            delta_percent: PricingDelta::ZERO,
            products: vec!["tee".to_string()],
        };
        assert!(snapshot.features("tee"));
        assert!(!snapshot.features("cap"));
    }
}
