//! Errors surfaced to callers of the storefront.
//!
//! Every failure is reported through the same handler that would have carried
//! the successful result.

use crate::product::ProductIdentifier;
use std::time::Duration;
use uuid::Uuid;

/// Errors reported to catalog request handlers.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The backend failed to load product information
    #[error("Failed to load list of products: {0}")]
    RequestFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The backend did not answer within the configured timeout
    #[error("Catalog request timed out after {0:?}")]
    TimedOut(Duration),
    /// A newer catalog request replaced this one before it was answered
    #[error("Catalog request superseded by a newer request")]
    Superseded,
}

/// Errors returned when submitting or awaiting a purchase.
#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    /// The backend reports that payments are disallowed on this device or account
    #[error("Payments are not allowed")]
    PaymentsNotAllowed,
    /// A purchase for the product is already waiting for its transaction
    #[error("Purchase of {product} already pending as request {request_id}")]
    AlreadyPending {
        /// The product being purchased
        product: ProductIdentifier,
        /// The request that is still pending
        request_id: Uuid,
    },
    /// The payment could not be handed to the payment queue
    #[error("Error submitting payment: {0}")]
    Submission(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// A newer purchase for the same product replaced this one
    #[error("Purchase superseded by a newer request for the same product")]
    Superseded,
}

/// Errors returned when starting a restore sweep.
#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    /// The restore request could not be handed to the payment queue
    #[error("Error requesting restore: {0}")]
    Submission(#[source] Box<dyn std::error::Error + Send + Sync>),
}
