//! Restoring completed purchases.

use super::{RestoreHandler, Storefront};
use crate::error::RestoreError;
use crate::product::ProductIdentifier;
use crate::store::StoreBackend;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

impl<S> Storefront<S>
where
    S: StoreBackend + 'static,
{
    /// Asks the payment queue to replay completed purchases.
    ///
    /// `handler` replaces any previous restore handler and is invoked with the original product
    /// identifier of every restored transaction delivered from now on. The sweep has no
    /// completion signal of its own; the handler simply stops being called.
    ///
    /// If the restore request cannot be submitted, the previous handler is put back and
    /// `handler` is never called.
    pub async fn restore<F>(&self, handler: F) -> Result<(), RestoreError>
    where
        F: Fn(ProductIdentifier) + Send + Sync + 'static,
    {
        let handler: RestoreHandler = Arc::new(handler);
        let previous = self
            .inner
            .state
            .lock()
            .await
            .restore_handler
            .replace(Arc::clone(&handler));

        log::debug!("Restoring purchases");
        if let Err(e) = self.inner.store.restore_completed_transactions().await {
            log::warn!("Could not request restore: {}", e);
            let mut state = self.inner.state.lock().await;
            // A restore issued meanwhile keeps its own handler.
            if state
                .restore_handler
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, &handler))
            {
                state.restore_handler = previous;
            }
            return Err(RestoreError::Submission(Box::new(e)));
        }
        Ok(())
    }

    /// Like [`restore`](Self::restore), yielding restored identifiers as a stream.
    ///
    /// The stream ends once another restore handler replaces this one.
    pub async fn restore_stream(
        &self,
    ) -> Result<UnboundedReceiverStream<ProductIdentifier>, RestoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.restore(move |identifier| {
            let _ = tx.send(identifier);
        })
        .await?;
        Ok(UnboundedReceiverStream::new(rx))
    }
}
