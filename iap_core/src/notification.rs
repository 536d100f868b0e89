//! Outward facing purchase events: the host delegate and broadcast notifications.

use crate::product::ProductIdentifier;
use crate::transaction::TransactionError;

/// Name of the notification broadcast when a purchase completes.
pub const PURCHASE_COMPLETED: &str = "PurchaseCompleted";
/// Name of the notification broadcast when a purchase is restored.
pub const PURCHASE_RESTORED: &str = "PurchaseRestored";
/// Name of the notification broadcast when a purchase fails.
pub const PURCHASE_FAILED: &str = "PurchaseFailed";

/// Callbacks the host application implements to hear about settled transactions.
///
/// Methods are called from whichever task delivered the transaction and must not block.
pub trait PurchaseDelegate: Send + Sync {
    /// A purchase of `identifier` went through.
    fn on_purchase_completed(&self, identifier: &ProductIdentifier);
    /// A restored transaction for `identifier` was delivered.
    fn on_purchase_restored(&self, identifier: &ProductIdentifier);
    /// A purchase failed; `description` is the platform error or `"Failed"`.
    fn on_purchase_failed(&self, description: &str);
}

/// Process wide broadcast of settled transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseNotification {
    /// A purchase completed
    Completed(ProductIdentifier),
    /// A purchase was restored; carries the identifier of the original purchase
    Restored(ProductIdentifier),
    /// A purchase failed
    Failed(Option<TransactionError>),
}

impl PurchaseNotification {
    /// The stable name observers can filter on.
    pub fn name(&self) -> &'static str {
        match self {
            PurchaseNotification::Completed(_) => PURCHASE_COMPLETED,
            PurchaseNotification::Restored(_) => PURCHASE_RESTORED,
            PurchaseNotification::Failed(_) => PURCHASE_FAILED,
        }
    }

    /// The product identifier carried by the notification, if any.
    pub fn product_identifier(&self) -> Option<&ProductIdentifier> {
        match self {
            PurchaseNotification::Completed(id) | PurchaseNotification::Restored(id) => Some(id),
            PurchaseNotification::Failed(_) => None,
        }
    }
}
