//! # IAP core
//!
//! Building blocks for brokering in-app purchases against a platform payment
//! queue. The platform itself is abstracted behind [`StoreBackend`]; the
//! [`Storefront`] correlates the asynchronous transaction updates the backend
//! delivers with the requests that caused them.

#![deny(missing_docs)]

pub mod config;
pub mod correlation;
pub mod error;
pub mod notification;
pub mod product;
pub mod store;
pub mod storefront;
pub mod transaction;

pub use config::{DuplicatePurchasePolicy, StorefrontConfig};
pub use correlation::{Continuation, CorrelationTable, PendingOperation};
pub use error::{CatalogError, PurchaseError, RestoreError};
pub use notification::{PurchaseDelegate, PurchaseNotification};
pub use product::{CatalogResult, Product, ProductIdentifier};
pub use store::{StoreBackend, TransactionObserver};
pub use storefront::{RouteOutcome, Storefront};
pub use transaction::{
    Transaction, TransactionBuilder, TransactionBuilderError, TransactionError,
    TransactionErrorKind, TransactionState,
};

pub mod prelude {
    //! The prelude module for the `iap_core` crate.
    pub use super::{
        CatalogError, CatalogResult, DuplicatePurchasePolicy, Product, ProductIdentifier,
        PurchaseDelegate, PurchaseError, PurchaseNotification, RestoreError, RouteOutcome,
        StoreBackend, Storefront, StorefrontConfig, Transaction, TransactionBuilder,
        TransactionError, TransactionErrorKind, TransactionObserver, TransactionState,
    };
}
