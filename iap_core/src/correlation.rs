//! Correlation of in-flight requests with the continuations waiting for them.
//!
//! A [`CorrelationTable`] associates a request key (a product identifier for
//! purchases, a request id for catalog requests) with the continuation that
//! must run when the matching response arrives. Each continuation runs at most
//! once: it is removed from the table before it is invoked, and a continuation
//! that is overwritten or cleared is dropped without running.
//!
//! The table does no locking of its own. The storefront keeps it behind its
//! single state lock and uses [`CorrelationTable::take`] so continuations are
//! invoked after that lock is released.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use uuid::Uuid;

/// A one-shot callback waiting on a result.
pub type Continuation<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// A registered continuation together with the request that created it.
pub struct PendingOperation<T> {
    request_id: Uuid,
    continuation: Continuation<T>,
}

impl<T> PendingOperation<T> {
    /// Creates a new pending operation.
    pub fn new(request_id: Uuid, continuation: Continuation<T>) -> Self {
        Self {
            request_id,
            continuation,
        }
    }

    /// The request this operation belongs to.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Consumes the operation, running its continuation.
    pub fn resolve(self, result: T) {
        (self.continuation)(result)
    }
}

impl<T> fmt::Debug for PendingOperation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingOperation")
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

/// Maps request keys to their pending continuation.
pub struct CorrelationTable<K, T> {
    pending: HashMap<K, PendingOperation<T>>,
}

impl<K, T> CorrelationTable<K, T>
where
    K: Eq + Hash,
{
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// Registers `continuation` under `key`.
    ///
    /// A continuation already registered under `key` is discarded without being
    /// invoked; its request id is returned.
    pub fn register(
        &mut self,
        key: K,
        request_id: Uuid,
        continuation: Continuation<T>,
    ) -> Option<Uuid> {
        self.pending
            .insert(key, PendingOperation::new(request_id, continuation))
            .map(|displaced| displaced.request_id)
    }

    /// Removes and returns the operation registered under `key`.
    pub fn take(&mut self, key: &K) -> Option<PendingOperation<T>> {
        self.pending.remove(key)
    }

    /// Removes the continuation under `key` and invokes it with `result`.
    ///
    /// Returns the resolved request id, or `None` if nothing was registered.
    pub fn resolve(&mut self, key: &K, result: T) -> Option<Uuid> {
        let operation = self.take(key)?;
        let request_id = operation.request_id;
        operation.resolve(result);
        Some(request_id)
    }

    /// Removes the continuation under `key` without invoking it.
    pub fn clear(&mut self, key: &K) -> Option<Uuid> {
        self.take(key).map(|operation| operation.request_id)
    }

    /// The request currently pending under `key`, if any.
    pub fn pending_request(&self, key: &K) -> Option<Uuid> {
        self.pending.get(key).map(|operation| operation.request_id)
    }

    /// Number of pending continuations.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<K, T> Default for CorrelationTable<K, T>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> fmt::Debug for CorrelationTable<K, T>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.pending.iter().map(|(k, op)| (k, op.request_id)))
            .finish()
    }
}
