use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::oneshot;
use uuid::Uuid;

use iap_core::prelude::*;

/// The in-memory data store.
#[derive(Debug, Default)]
struct StoreData {
    products: Vec<Product>,
    catalog_failure: Option<String>,
    hold_catalog: bool,
    held_catalog_requests: Vec<oneshot::Sender<()>>,
    catalog_requests: Vec<BTreeSet<ProductIdentifier>>,
    queue_unavailable: bool,
    finish_unavailable: bool,
    submitted_payments: Vec<ProductIdentifier>,
    restore_requests: usize,
    finished_transactions: Vec<Uuid>,
    purchase_history: Vec<ProductIdentifier>,
}

/// An in-memory store and payment queue.
///
/// Nothing settles on its own: payments submitted to the queue are only recorded, and tests or
/// development tools decide how each one ends by calling [`complete_purchase`](Self::complete_purchase),
/// [`fail_purchase`](Self::fail_purchase), [`deliver_restores`](Self::deliver_restores) or
/// [`publish`](Self::publish), which deliver transactions to the registered observers.
#[derive(Clone)]
pub struct InMemoryStore {
    data: Arc<Mutex<StoreData>>,
    can_make_payments: Arc<AtomicBool>,
    observers: Arc<RwLock<Vec<Arc<dyn TransactionObserver>>>>,
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("data", &self.data)
            .field("can_make_payments", &self.can_make_payments)
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors returned by the InMemoryStore
#[derive(Debug, thiserror::Error)]
pub enum InMemoryStoreError {
    /// Catalog requests were configured to fail
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),
    /// The payment queue was configured to refuse requests
    #[error("Payment queue unavailable")]
    QueueUnavailable,
    /// Finishing transactions was configured to fail
    #[error("Transaction {0} could not be finished")]
    FinishRejected(Uuid),
}

impl InMemoryStore {
    /// Creates an empty store that allows payments.
    pub fn new() -> Self {
        log::debug!("Creating a new InMemoryStore");
        Self {
            data: Arc::new(Mutex::new(StoreData::default())),
            can_make_payments: Arc::new(AtomicBool::new(true)),
            observers: Arc::new(RwLock::new(vec![])),
        }
    }

    fn data(&self) -> MutexGuard<'_, StoreData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a product to the catalog.
    pub fn with_product(self, product: Product) -> Self {
        self.add_product(product);
        self
    }

    /// Adds a product to the catalog, replacing one with the same identifier.
    pub fn add_product(&self, product: Product) {
        let mut data = self.data();
        data.products.retain(|p| p.identifier != product.identifier);
        data.products.push(product);
    }

    /// Sets what `can_make_payments` reports.
    pub fn set_can_make_payments(&self, allowed: bool) {
        self.can_make_payments.store(allowed, Ordering::SeqCst);
    }

    /// Makes subsequent catalog requests fail with `reason`, or succeed again with `None`.
    pub fn set_catalog_failure(&self, reason: Option<String>) {
        self.data().catalog_failure = reason;
    }

    /// Makes the payment queue refuse payments and restore requests.
    pub fn set_queue_available(&self, available: bool) {
        self.data().queue_unavailable = !available;
    }

    /// Makes the payment queue refuse to finish transactions.
    pub fn set_finish_available(&self, available: bool) {
        self.data().finish_unavailable = !available;
    }

    /// Holds catalog requests until [`release_catalog_requests`](Self::release_catalog_requests)
    /// is called.
    pub fn hold_catalog_requests(&self) {
        self.data().hold_catalog = true;
    }

    /// Answers every held catalog request and stops holding new ones.
    ///
    /// Returns how many requests were released. Requests whose caller already gave up are
    /// counted too.
    pub fn release_catalog_requests(&self) -> usize {
        let held = {
            let mut data = self.data();
            data.hold_catalog = false;
            std::mem::take(&mut data.held_catalog_requests)
        };
        let count = held.len();
        for gate in held {
            let _ = gate.send(());
        }
        log::debug!("Released {} catalog requests", count);
        count
    }

    /// Identifier sets of every catalog request received, in order.
    pub fn catalog_requests(&self) -> Vec<BTreeSet<ProductIdentifier>> {
        self.data().catalog_requests.clone()
    }

    /// Every payment added to the queue, in order.
    pub fn submitted_payments(&self) -> Vec<ProductIdentifier> {
        self.data().submitted_payments.clone()
    }

    /// Number of restore sweeps requested.
    pub fn restore_requests(&self) -> usize {
        self.data().restore_requests
    }

    /// Handles of every finished transaction, in the order they were finished.
    pub fn finished_transactions(&self) -> Vec<Uuid> {
        self.data().finished_transactions.clone()
    }

    /// How many times `transaction` was finished.
    pub fn finish_count(&self, transaction: &Transaction) -> usize {
        self.data()
            .finished_transactions
            .iter()
            .filter(|id| **id == transaction.id)
            .count()
    }

    /// Number of registered observers that have not closed yet.
    pub fn observer_count(&self) -> usize {
        self.prune_observers();
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn prune_observers(&self) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|observer| !observer.is_closed());
    }

    /// Delivers `transactions` to every registered observer, one observer at a time.
    pub async fn publish(&self, transactions: Vec<Transaction>) {
        self.prune_observers();
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        log::debug!(
            "Publishing {} transactions to {} observers",
            transactions.len(),
            observers.len()
        );
        for observer in observers {
            observer.on_transactions_updated(transactions.clone()).await;
        }
    }

    /// Publishes a transaction for `product` in the given state.
    pub async fn update_purchase(
        &self,
        product: impl Into<ProductIdentifier>,
        state: TransactionState,
    ) -> Transaction {
        let transaction = Transaction {
            id: Uuid::new_v4(),
            product_identifier: product.into(),
            state,
            created_at: Utc::now(),
        };
        self.publish(vec![transaction.clone()]).await;
        transaction
    }

    /// Publishes a purchased transaction for `product` and remembers it for later restores.
    pub async fn complete_purchase(&self, product: impl Into<ProductIdentifier>) -> Transaction {
        let product = product.into();
        self.data().purchase_history.push(product.clone());
        self.update_purchase(product, TransactionState::Purchased)
            .await
    }

    /// Publishes a failed transaction for `product`.
    pub async fn fail_purchase(
        &self,
        product: impl Into<ProductIdentifier>,
        error: Option<TransactionError>,
    ) -> Transaction {
        self.update_purchase(product, TransactionState::Failed(error))
            .await
    }

    /// Publishes one restored transaction per completed purchase, as a restore sweep does.
    pub async fn deliver_restores(&self) -> Vec<Transaction> {
        let history = self.data().purchase_history.clone();
        let transactions: Vec<Transaction> = history
            .into_iter()
            .map(|product| Transaction {
                id: Uuid::new_v4(),
                product_identifier: product.clone(),
                state: TransactionState::Restored {
                    original: Some(product),
                },
                created_at: Utc::now(),
            })
            .collect();
        self.publish(transactions.clone()).await;
        transactions
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    type Error = InMemoryStoreError;

    fn can_make_payments(&self) -> bool {
        self.can_make_payments.load(Ordering::SeqCst)
    }

    async fn request_product_info(
        &self,
        identifiers: &BTreeSet<ProductIdentifier>,
    ) -> Result<CatalogResult, Self::Error> {
        let gate = {
            let mut data = self.data();
            data.catalog_requests.push(identifiers.clone());
            if data.hold_catalog {
                let (tx, rx) = oneshot::channel();
                data.held_catalog_requests.push(tx);
                Some(rx)
            } else {
                None
            }
        };
        if let Some(gate) = gate {
            log::debug!("Holding catalog request for {} products", identifiers.len());
            let _ = gate.await;
        }

        let data = self.data();
        if let Some(reason) = &data.catalog_failure {
            return Err(InMemoryStoreError::CatalogUnavailable(reason.clone()));
        }
        let mut products = Vec::new();
        let mut invalid = Vec::new();
        for identifier in identifiers {
            match data.products.iter().find(|p| &p.identifier == identifier) {
                Some(product) => products.push(product.clone()),
                None => invalid.push(identifier.clone()),
            }
        }
        Ok(CatalogResult::new(products, invalid))
    }

    async fn submit_payment(&self, product: &ProductIdentifier) -> Result<(), Self::Error> {
        let mut data = self.data();
        if data.queue_unavailable {
            return Err(InMemoryStoreError::QueueUnavailable);
        }
        log::debug!("Payment for {} added to queue", product);
        data.submitted_payments.push(product.clone());
        Ok(())
    }

    async fn restore_completed_transactions(&self) -> Result<(), Self::Error> {
        let mut data = self.data();
        if data.queue_unavailable {
            return Err(InMemoryStoreError::QueueUnavailable);
        }
        data.restore_requests += 1;
        Ok(())
    }

    async fn finish_transaction(&self, transaction: &Transaction) -> Result<(), Self::Error> {
        let mut data = self.data();
        if data.finish_unavailable {
            return Err(InMemoryStoreError::FinishRejected(transaction.id));
        }
        log::debug!("Finishing transaction {}", transaction.id);
        data.finished_transactions.push(transaction.id);
        Ok(())
    }

    fn add_transaction_observer(&self, observer: Arc<dyn TransactionObserver>) {
        log::debug!("Adding transaction observer to InMemoryStore");
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        observers.retain(|observer| !observer.is_closed());
        observers.push(observer);
    }
}
