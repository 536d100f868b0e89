//! The storefront broker.
//!
//! [`Storefront`] is the host-owned handle through which products are requested, purchases and
//! restores are submitted, and transaction updates from the payment queue are routed back to the
//! handlers waiting on them. It is cheap to clone; clones share the same broker state.
//!
//! # Concurrency
//!
//! Transaction updates may be delivered from any task or thread. All mutable broker state lives
//! behind a single async mutex, and every continuation, delegate call and backend call is made
//! after that lock has been released, so handlers are free to call back into the storefront.

mod catalog;
mod purchase;
mod restore;
mod router;

pub use router::RouteOutcome;
use router::TransactionRouter;

use crate::config::StorefrontConfig;
use crate::correlation::CorrelationTable;
use crate::error::CatalogError;
use crate::notification::{PurchaseDelegate, PurchaseNotification};
use crate::product::{CatalogResult, Product, ProductIdentifier};
use crate::store::StoreBackend;
use futures_core::Stream;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

type RestoreHandler = Arc<dyn Fn(ProductIdentifier) + Send + Sync>;

/// The catalog request currently waiting on the backend.
struct InFlightCatalog {
    request_id: Uuid,
    /// Aborting the task drops the backend request future.
    task: JoinHandle<()>,
}

/// Everything guarded by the storefront lock.
#[derive(Default)]
struct BrokerState {
    catalog_request: Option<InFlightCatalog>,
    catalog_handlers: CorrelationTable<Uuid, Result<CatalogResult, CatalogError>>,
    purchases: CorrelationTable<ProductIdentifier, bool>,
    restore_handler: Option<RestoreHandler>,
    products: Option<Vec<Product>>,
    delegate: Option<Arc<dyn PurchaseDelegate>>,
}

pub(crate) struct Inner<S: StoreBackend> {
    store: S,
    config: StorefrontConfig,
    state: Mutex<BrokerState>,
    notifications: broadcast::Sender<PurchaseNotification>,
}

impl<S: StoreBackend> Inner<S> {
    fn notify(&self, notification: PurchaseNotification) {
        log::debug!("Broadcasting {}", notification.name());
        if self.notifications.send(notification).is_err() {
            log::trace!("No notification subscribers");
        }
    }
}

/// Broker between the host application and a [`StoreBackend`].
pub struct Storefront<S: StoreBackend> {
    inner: Arc<Inner<S>>,
}

impl<S: StoreBackend> Clone for Storefront<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: StoreBackend> std::fmt::Debug for Storefront<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl<S> Storefront<S>
where
    S: StoreBackend + 'static,
{
    /// Creates a new `Storefront` with default configuration and registers it as a
    /// transaction observer on `store`.
    pub fn new(store: S) -> Self {
        Self::with_config(store, StorefrontConfig::default())
    }

    /// Creates a new `Storefront` with custom configuration.
    pub fn with_config(store: S, config: StorefrontConfig) -> Self {
        log::debug!("Creating a new Storefront");
        let (notifications, _) = broadcast::channel(config.notification_capacity.max(1));
        let inner = Arc::new(Inner {
            store,
            config,
            state: Mutex::new(BrokerState::default()),
            notifications,
        });
        inner
            .store
            .add_transaction_observer(Arc::new(TransactionRouter::new(Arc::downgrade(&inner))));
        Self { inner }
    }

    /// Exposes the backend.
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// The configuration this storefront was created with.
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Whether the backend currently allows payments. Callers should check this before
    /// [`purchase`](Self::purchase).
    pub fn can_make_payments(&self) -> bool {
        self.inner.store.can_make_payments()
    }

    /// Sets or removes the delegate told about settled transactions.
    pub async fn set_delegate(&self, delegate: Option<Arc<dyn PurchaseDelegate>>) {
        self.inner.state.lock().await.delegate = delegate;
    }

    /// Subscribes to purchase notifications.
    pub fn notifications(&self) -> broadcast::Receiver<PurchaseNotification> {
        self.inner.notifications.subscribe()
    }

    /// Purchase notifications as a stream. Notifications missed by a lagging
    /// subscriber are skipped.
    pub fn notification_stream(
        &self,
    ) -> impl Stream<Item = PurchaseNotification> + Send + use<S> {
        BroadcastStream::new(self.notifications()).filter_map(|notification| notification.ok())
    }

    /// The products from the last successful catalog request, if any.
    pub async fn current_products(&self) -> Option<Vec<Product>> {
        self.inner.state.lock().await.products.clone()
    }

    /// Looks up a product from the last successful catalog request.
    pub async fn product(&self, identifier: &str) -> Option<Product> {
        let state = self.inner.state.lock().await;
        state
            .products
            .as_ref()?
            .iter()
            .find(|p| p.identifier.as_str() == identifier)
            .cloned()
    }

    /// Number of purchases waiting on a transaction.
    pub async fn pending_purchases(&self) -> usize {
        self.inner.state.lock().await.purchases.len()
    }

    /// Returns `true` while a catalog request is waiting on the backend.
    pub async fn has_pending_catalog_request(&self) -> bool {
        self.inner.state.lock().await.catalog_request.is_some()
    }
}
