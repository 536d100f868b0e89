//! Configuration types for the storefront broker.

use std::time::Duration;

/// What to do when `purchase` is called for a product that already has a pending purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePurchasePolicy {
    /// The new handler replaces the pending one. The displaced handler is dropped
    /// without being invoked.
    #[default]
    Replace,
    /// The new purchase is refused with [`PurchaseError::AlreadyPending`](crate::PurchaseError::AlreadyPending)
    /// and nothing is submitted to the payment queue.
    Reject,
}

/// Configuration for a [`Storefront`](crate::Storefront).
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// How a second purchase of a product with a pending purchase is handled.
    ///
    /// Default: [`DuplicatePurchasePolicy::Replace`]
    pub duplicate_purchase_policy: DuplicatePurchasePolicy,

    /// Refuse purchases while the backend reports that payments are not possible.
    ///
    /// Checking `can_make_payments` is the caller's responsibility. When this is `false`
    /// a purchase made while payments are disallowed is still submitted and only a
    /// warning is logged.
    ///
    /// Default: `false`
    pub require_payments_allowed: bool,

    /// Upper bound on how long a catalog request may take before its handler is
    /// resolved with [`CatalogError::TimedOut`](crate::CatalogError::TimedOut).
    ///
    /// Default: `None` (wait for the backend indefinitely)
    pub catalog_timeout: Option<Duration>,

    /// Number of notifications buffered for slow subscribers before they start lagging.
    ///
    /// Default: 64
    pub notification_capacity: usize,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            duplicate_purchase_policy: DuplicatePurchasePolicy::Replace,
            require_payments_allowed: false,
            catalog_timeout: None,
            notification_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = StorefrontConfig::default();
        assert_eq!(
            config.duplicate_purchase_policy,
            DuplicatePurchasePolicy::Replace
        );
        assert!(!config.require_payments_allowed);
        assert!(config.catalog_timeout.is_none());
        assert_eq!(config.notification_capacity, 64);
    }
}
