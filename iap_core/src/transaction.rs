//! This module defines the `Transaction` struct delivered by a payment queue, its
//! `TransactionState`, the errors a failed transaction carries, and a `TransactionBuilder`
//! for constructing transactions.

use crate::product::ProductIdentifier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A platform tracked purchase attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Handle used to finish the transaction on the payment queue
    pub id: Uuid,

    /// The product this transaction pays for
    pub product_identifier: ProductIdentifier,

    /// The state of the transaction at the time it was delivered
    pub state: TransactionState,

    /// When the payment queue reported the transaction
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Creates a new `TransactionBuilder` instance.
    pub fn builder() -> TransactionBuilder {
        TransactionBuilder::new()
    }

    /// Returns `true` when the payment queue will not deliver this transaction again
    /// once it has been finished.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// State of a transaction as reported by the payment queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionState {
    /// The payment is being processed
    Purchasing,
    /// The payment waits on an external action, such as parental approval
    Deferred,
    /// The payment went through
    Purchased,
    /// The payment was declined, errored or cancelled
    Failed(Option<TransactionError>),
    /// A previous purchase replayed by a restore sweep.
    ///
    /// `original` is the product identifier of the purchase being restored, when the
    /// platform can supply it.
    Restored {
        /// Identifier of the original purchase
        original: Option<ProductIdentifier>,
    },
}

impl TransactionState {
    /// Purchased, Failed and Restored are terminal; the rest will be redelivered.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionState::Purchasing | TransactionState::Deferred)
    }

    /// Name of the state in PascalCase
    pub fn name(&self) -> &'static str {
        match self {
            TransactionState::Purchasing => "Purchasing",
            TransactionState::Deferred => "Deferred",
            TransactionState::Purchased => "Purchased",
            TransactionState::Failed(_) => "Failed",
            TransactionState::Restored { .. } => "Restored",
        }
    }
}

/// Broad classification of a transaction failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionErrorKind {
    /// The user dismissed the payment sheet
    UserCancelled,
    /// The payment parameters were not recognised
    PaymentInvalid,
    /// The account is not allowed to make the payment
    NotAllowed,
    /// Anything else the platform reported
    Unknown,
}

/// Error attached to a failed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{description}")]
pub struct TransactionError {
    /// Classification of the failure
    pub kind: TransactionErrorKind,
    /// Human readable description supplied by the platform
    pub description: String,
}

impl TransactionError {
    /// Creates a new `TransactionError`.
    pub fn new(kind: TransactionErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    /// The error a user cancellation produces.
    pub fn user_cancelled() -> Self {
        Self::new(TransactionErrorKind::UserCancelled, "Payment cancelled")
    }

    /// Returns `true` if the user cancelled the payment themselves.
    pub fn is_user_cancelled(&self) -> bool {
        self.kind == TransactionErrorKind::UserCancelled
    }
}

/// Builder for `Transaction`
#[derive(Debug, Default)]
pub struct TransactionBuilder {
    /// The transaction handle.
    pub id: Option<Uuid>,
    /// The product identifier.
    pub product_identifier: Option<ProductIdentifier>,
    /// The transaction state.
    pub state: Option<TransactionState>,
    /// The time the transaction was reported.
    pub created_at: Option<DateTime<Utc>>,
}

impl TransactionBuilder {
    /// Creates a new `TransactionBuilder` instance with all fields set to `None`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the handle for the transaction.
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the product identifier for the transaction.
    pub fn product_identifier(mut self, product_identifier: impl Into<ProductIdentifier>) -> Self {
        self.product_identifier = Some(product_identifier.into());
        self
    }

    /// Sets the state of the transaction.
    pub fn state(mut self, state: TransactionState) -> Self {
        self.state = Some(state);
        self
    }

    /// Marks the transaction as failed with the given error.
    pub fn failed(self, error: Option<TransactionError>) -> Self {
        self.state(TransactionState::Failed(error))
    }

    /// Marks the transaction as restored from the given original purchase.
    pub fn restored(self, original: Option<ProductIdentifier>) -> Self {
        self.state(TransactionState::Restored { original })
    }

    /// Sets the creation timestamp for the transaction.
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Builds the `Transaction` from the `TransactionBuilder`.
    ///
    /// # Errors
    ///
    /// Returns an error if `product_identifier` or `state` are not set.
    pub fn build(self) -> Result<Transaction, TransactionBuilderError> {
        Ok(Transaction {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            product_identifier: self
                .product_identifier
                .ok_or(TransactionBuilderError::ProductIdentifierMissing)?,
            state: self.state.ok_or(TransactionBuilderError::StateMissing)?,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}

/// Errors that can occur when building a `Transaction`.
#[derive(Debug, thiserror::Error)]
pub enum TransactionBuilderError {
    /// The product identifier is missing.
    #[error("Transaction product identifier is required")]
    ProductIdentifierMissing,
    /// The state is missing.
    #[error("Transaction state is required")]
    StateMissing,
}
