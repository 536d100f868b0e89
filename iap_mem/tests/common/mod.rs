#![allow(dead_code)]

use iap_core::prelude::*;
use iap_mem::InMemoryStore;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn product(identifier: &str, title: &str) -> Product {
    Product::new(identifier, title, 990_000, "USD")
}

pub fn setup() -> (InMemoryStore, Storefront<InMemoryStore>) {
    setup_with_config(StorefrontConfig::default())
}

pub fn setup_with_config(config: StorefrontConfig) -> (InMemoryStore, Storefront<InMemoryStore>) {
    init_logging();
    let store = InMemoryStore::new()
        .with_product(product("coins", "Coins"))
        .with_product(product("gems", "Gems"))
        .with_product(product("remove_ads", "Remove ads"));
    let storefront = Storefront::with_config(store.clone(), config);
    (store, storefront)
}

pub fn ids(identifiers: &[&str]) -> Vec<ProductIdentifier> {
    identifiers.iter().map(|id| ProductIdentifier::from(*id)).collect()
}

/// Fails the test if `future` takes longer than a second.
pub async fn within_a_second<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(1), future)
        .await
        .expect("timed out")
}

/// Records every value a handler is called with.
pub struct Calls<T>(Arc<Mutex<Vec<T>>>);

impl<T> Clone for Calls<T> {
    fn clone(&self) -> Self {
        Calls(self.0.clone())
    }
}

impl<T: Clone + Send + 'static> Calls<T> {
    pub fn new() -> Self {
        Calls(Arc::new(Mutex::new(Vec::new())))
    }

    pub fn record(&self) -> impl Fn(T) + Send + Sync + 'static + use<T> {
        let calls = self.clone();
        move |value| calls.0.lock().unwrap().push(value)
    }

    pub fn get(&self) -> Vec<T> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelegateCall {
    Completed(String),
    Restored(String),
    Failed(String),
}

#[derive(Default)]
pub struct RecordingDelegate(Mutex<Vec<DelegateCall>>);

impl RecordingDelegate {
    pub fn calls(&self) -> Vec<DelegateCall> {
        self.0.lock().unwrap().clone()
    }
}

impl PurchaseDelegate for RecordingDelegate {
    fn on_purchase_completed(&self, identifier: &ProductIdentifier) {
        self.0
            .lock()
            .unwrap()
            .push(DelegateCall::Completed(identifier.to_string()));
    }

    fn on_purchase_restored(&self, identifier: &ProductIdentifier) {
        self.0
            .lock()
            .unwrap()
            .push(DelegateCall::Restored(identifier.to_string()));
    }

    fn on_purchase_failed(&self, description: &str) {
        self.0
            .lock()
            .unwrap()
            .push(DelegateCall::Failed(description.to_string()));
    }
}
