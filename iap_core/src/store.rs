//! This module defines the `StoreBackend` trait, the interface to the platform store and its
//! payment queue, and the `TransactionObserver` trait through which the payment queue delivers
//! transaction updates.

use crate::product::{CatalogResult, ProductIdentifier};
use crate::transaction::Transaction;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

/// The platform store: product information service plus payment queue.
///
/// Submitting payments and restore requests is fire-and-forget: the outcome of a
/// payment arrives later as one or more [`Transaction`]s delivered to the registered
/// [`TransactionObserver`]s.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// The error when a backend operation fails
    type Error: std::error::Error + Send + Sync + 'static;

    /// Whether the device and account are currently allowed to make payments.
    fn can_make_payments(&self) -> bool;

    /// Loads product information for the given identifiers.
    ///
    /// Dropping the returned future cancels the request.
    async fn request_product_info(
        &self,
        identifiers: &BTreeSet<ProductIdentifier>,
    ) -> Result<CatalogResult, Self::Error>;

    /// Adds a payment for `product` to the payment queue.
    async fn submit_payment(&self, product: &ProductIdentifier) -> Result<(), Self::Error>;

    /// Asks the payment queue to replay completed purchases as restored transactions.
    async fn restore_completed_transactions(&self) -> Result<(), Self::Error>;

    /// Acknowledges a terminal transaction so the queue does not deliver it again.
    async fn finish_transaction(&self, transaction: &Transaction) -> Result<(), Self::Error>;

    /// Registers an observer for transaction updates.
    fn add_transaction_observer(&self, observer: Arc<dyn TransactionObserver>);
}

/// Receives transaction updates from a payment queue.
#[async_trait]
pub trait TransactionObserver: Send + Sync {
    /// Reacts to a batch of updated transactions, in delivery order.
    async fn on_transactions_updated(&self, transactions: Vec<Transaction>);

    /// Returns `true` once the observer will ignore every further update, so backends can
    /// drop it from their observer list.
    fn is_closed(&self) -> bool {
        false
    }
}
