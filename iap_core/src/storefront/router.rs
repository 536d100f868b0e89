//! Routing of transaction updates.
//!
//! Every update delivered by the payment queue goes through [`Storefront::handle_transactions`].
//! Terminal transactions are finished on the queue exactly once per delivery; purchasing and
//! deferred ones are left alone so the queue delivers them again once they settle.

use super::{Inner, Storefront};
use crate::notification::PurchaseNotification;
use crate::product::ProductIdentifier;
use crate::store::{StoreBackend, TransactionObserver};
use crate::transaction::{Transaction, TransactionError, TransactionState};
use async_trait::async_trait;
use std::sync::Weak;

/// What the router did with a single transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A purchased transaction; `resolved` tells whether a purchase handler was waiting
    Completed {
        /// A purchase handler was invoked
        resolved: bool,
        /// The payment queue accepted the finish
        finished: bool,
    },
    /// A failed transaction; `resolved` tells whether a purchase handler was waiting
    Failed {
        /// A purchase handler was invoked
        resolved: bool,
        /// The payment queue accepted the finish
        finished: bool,
    },
    /// A restored transaction of the given original purchase
    Restored {
        /// Identifier of the original purchase
        original: ProductIdentifier,
        /// The payment queue accepted the finish
        finished: bool,
    },
    /// A restored transaction without an original purchase. Dropped unfinished.
    Dropped,
    /// A purchasing or deferred transaction. Nothing happened.
    Pending,
}

impl RouteOutcome {
    /// Returns `true` if the transaction was finished on the payment queue.
    ///
    /// `false` for a settled transaction means finishing failed and the queue will deliver
    /// it again.
    pub fn is_finalized(&self) -> bool {
        match self {
            RouteOutcome::Completed { finished, .. }
            | RouteOutcome::Failed { finished, .. }
            | RouteOutcome::Restored { finished, .. } => *finished,
            RouteOutcome::Dropped | RouteOutcome::Pending => false,
        }
    }
}

impl<S> Storefront<S>
where
    S: StoreBackend + 'static,
{
    /// Routes a batch of transaction updates in order.
    ///
    /// This is what the storefront's registered [`TransactionObserver`] calls; hosts that pump
    /// the payment queue themselves can call it directly.
    pub async fn handle_transactions(&self, transactions: Vec<Transaction>) -> Vec<RouteOutcome> {
        self.inner.route_all(transactions).await
    }
}

impl<S> Inner<S>
where
    S: StoreBackend + 'static,
{
    async fn route_all(&self, transactions: Vec<Transaction>) -> Vec<RouteOutcome> {
        let mut outcomes = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            outcomes.push(self.route(transaction).await);
        }
        outcomes
    }

    async fn route(&self, transaction: Transaction) -> RouteOutcome {
        log::debug!(
            "Transaction {} for {} is {}",
            transaction.id,
            transaction.product_identifier,
            transaction.state.name()
        );
        match &transaction.state {
            TransactionState::Purchased => self.complete_transaction(&transaction).await,
            TransactionState::Failed(error) => {
                self.fail_transaction(&transaction, error.clone()).await
            }
            TransactionState::Restored { original } => match original {
                Some(original) => {
                    self.restore_transaction(&transaction, original.clone())
                        .await
                }
                None => {
                    log::debug!(
                        "Dropping restored transaction {} without an original purchase",
                        transaction.id
                    );
                    RouteOutcome::Dropped
                }
            },
            TransactionState::Purchasing | TransactionState::Deferred => RouteOutcome::Pending,
        }
    }

    async fn complete_transaction(&self, transaction: &Transaction) -> RouteOutcome {
        let product = &transaction.product_identifier;
        let (delegate, pending) = {
            let mut state = self.state.lock().await;
            (state.delegate.clone(), state.purchases.take(product))
        };

        if let Some(delegate) = delegate {
            delegate.on_purchase_completed(product);
        }
        self.notify(PurchaseNotification::Completed(product.clone()));
        let resolved = pending.is_some();
        if let Some(pending) = pending {
            pending.resolve(true);
        }

        let finished = self.finish(transaction).await;
        RouteOutcome::Completed { resolved, finished }
    }

    async fn fail_transaction(
        &self,
        transaction: &Transaction,
        error: Option<TransactionError>,
    ) -> RouteOutcome {
        let product = &transaction.product_identifier;
        match &error {
            Some(error) if error.is_user_cancelled() => {
                log::debug!("Purchase of {} cancelled by the user", product)
            }
            Some(error) => log::warn!("Transaction Error: {}", error),
            None => {}
        }

        let (delegate, pending) = {
            let mut state = self.state.lock().await;
            (state.delegate.clone(), state.purchases.take(product))
        };

        if let Some(delegate) = delegate {
            let description = error
                .as_ref()
                .map(|e| e.description.as_str())
                .unwrap_or("Failed");
            delegate.on_purchase_failed(description);
        }
        self.notify(PurchaseNotification::Failed(error));
        let resolved = pending.is_some();
        if let Some(pending) = pending {
            pending.resolve(false);
        }

        let finished = self.finish(transaction).await;
        RouteOutcome::Failed { resolved, finished }
    }

    async fn restore_transaction(
        &self,
        transaction: &Transaction,
        original: ProductIdentifier,
    ) -> RouteOutcome {
        let (delegate, handler) = {
            let state = self.state.lock().await;
            (state.delegate.clone(), state.restore_handler.clone())
        };

        // The delegate hears about the restored transaction itself, observers and the
        // restore handler about the purchase it restores.
        if let Some(delegate) = delegate {
            delegate.on_purchase_restored(&transaction.product_identifier);
        }
        self.notify(PurchaseNotification::Restored(original.clone()));
        if let Some(handler) = handler {
            handler(original.clone());
        }

        let finished = self.finish(transaction).await;
        RouteOutcome::Restored { original, finished }
    }

    /// Finishes a terminal transaction. Purchasing and deferred ones are never finished, the
    /// queue would treat them as abandoned.
    async fn finish(&self, transaction: &Transaction) -> bool {
        if !transaction.is_terminal() {
            log::error!(
                "Refusing to finish {} transaction {}",
                transaction.state.name(),
                transaction.id
            );
            return false;
        }
        match self.store.finish_transaction(transaction).await {
            Ok(()) => true,
            Err(e) => {
                log::error!("Error finishing transaction {}: {}", transaction.id, e);
                false
            }
        }
    }
}

/// The observer a storefront registers on its backend.
///
/// Holds a weak reference so the backend keeping its observers alive does not keep the
/// storefront alive.
pub(crate) struct TransactionRouter<S: StoreBackend> {
    inner: Weak<Inner<S>>,
}

impl<S: StoreBackend> TransactionRouter<S> {
    pub(crate) fn new(inner: Weak<Inner<S>>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S> TransactionObserver for TransactionRouter<S>
where
    S: StoreBackend + 'static,
{
    async fn on_transactions_updated(&self, transactions: Vec<Transaction>) {
        match self.inner.upgrade() {
            Some(inner) => {
                inner.route_all(transactions).await;
            }
            None => log::debug!(
                "Storefront dropped, ignoring {} transactions",
                transactions.len()
            ),
        }
    }

    fn is_closed(&self) -> bool {
        self.inner.strong_count() == 0
    }
}
