//! Purchase submission.

use super::Storefront;
use crate::config::DuplicatePurchasePolicy;
use crate::error::PurchaseError;
use crate::product::{Product, ProductIdentifier};
use crate::store::StoreBackend;
use tokio::sync::oneshot;
use uuid::Uuid;

impl<S> Storefront<S>
where
    S: StoreBackend + 'static,
{
    /// Submits a payment for `product`.
    ///
    /// `handler` is invoked with `true` when a purchased transaction for the product is
    /// delivered and with `false` when a failed one is. Purchasing and deferred updates leave
    /// it pending. There is no way to cancel a submitted purchase.
    ///
    /// The caller is expected to check [`can_make_payments`](Self::can_make_payments) first.
    /// Purchasing while payments are disallowed only logs a warning, unless
    /// [`StorefrontConfig::require_payments_allowed`](crate::StorefrontConfig::require_payments_allowed)
    /// is set.
    ///
    /// If a purchase of the same product is still pending, the configured
    /// [`DuplicatePurchasePolicy`] decides whether the new handler replaces it or the call is
    /// refused.
    ///
    /// Returns the id of the new request.
    pub async fn purchase<F>(
        &self,
        product: impl Into<ProductIdentifier>,
        handler: F,
    ) -> Result<Uuid, PurchaseError>
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let product = product.into();
        if !self.inner.store.can_make_payments() {
            if self.inner.config.require_payments_allowed {
                return Err(PurchaseError::PaymentsNotAllowed);
            }
            log::warn!("Purchasing {} while payments are not allowed", product);
        }

        let request_id = Uuid::new_v4();
        {
            let mut state = self.inner.state.lock().await;
            if let Some(pending) = state.purchases.pending_request(&product) {
                match self.inner.config.duplicate_purchase_policy {
                    DuplicatePurchasePolicy::Reject => {
                        return Err(PurchaseError::AlreadyPending {
                            product,
                            request_id: pending,
                        });
                    }
                    DuplicatePurchasePolicy::Replace => {
                        log::debug!(
                            "Purchase request {} for {} replaces {}",
                            request_id,
                            product,
                            pending
                        );
                    }
                }
            }
            state
                .purchases
                .register(product.clone(), request_id, Box::new(handler));
        }

        log::debug!("Purchasing product: {} ({})", product, request_id);
        if let Err(e) = self.inner.store.submit_payment(&product).await {
            log::warn!("Could not submit payment for {}: {}", product, e);
            let mut state = self.inner.state.lock().await;
            if state.purchases.pending_request(&product) == Some(request_id) {
                state.purchases.clear(&product);
            }
            return Err(PurchaseError::Submission(Box::new(e)));
        }
        Ok(request_id)
    }

    /// Submits a payment for a product returned by a catalog request.
    pub async fn purchase_product<F>(
        &self,
        product: &Product,
        handler: F,
    ) -> Result<Uuid, PurchaseError>
    where
        F: FnOnce(bool) + Send + 'static,
    {
        self.purchase(product.identifier.clone(), handler).await
    }

    /// Submits a payment and waits until its transaction settles.
    ///
    /// Resolves to [`PurchaseError::Superseded`] if a newer purchase of the same product
    /// replaces this one before it settles.
    pub async fn purchase_and_wait(
        &self,
        product: impl Into<ProductIdentifier>,
    ) -> Result<bool, PurchaseError> {
        let (tx, rx) = oneshot::channel();
        self.purchase(product, move |success| {
            let _ = tx.send(success);
        })
        .await?;
        rx.await.map_err(|_| PurchaseError::Superseded)
    }
}
