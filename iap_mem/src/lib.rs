//! # IAP memory store
//!
//! An in-memory implementation of [`StoreBackend`](iap_core::StoreBackend), primarily for
//! testing and development.
//!
//! ```ignore
//! use iap_core::prelude::*;
//! use iap_mem::InMemoryStore;
//!
//! let store = InMemoryStore::new().with_product(Product::new("coins", "Coins", 990_000, "USD"));
//! let storefront = Storefront::new(store.clone());
//!
//! let request_id = storefront.purchase("coins", |ok| println!("purchased: {ok}")).await?;
//! // Settle the payment the way the platform queue would
//! store.complete_purchase("coins").await;
//! ```

#![deny(missing_docs)]

mod store;

pub use store::*;
