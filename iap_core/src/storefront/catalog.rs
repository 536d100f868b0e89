//! Product catalog requests.
//!
//! Only one catalog request is outstanding at a time. Issuing a new one aborts the previous
//! backend request and discards its handler uninvoked; a superseded caller never hears back.

use super::{InFlightCatalog, Inner, Storefront};
use crate::error::CatalogError;
use crate::product::{CatalogResult, ProductIdentifier};
use crate::store::StoreBackend;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::oneshot;
use uuid::Uuid;

impl<S> Storefront<S>
where
    S: StoreBackend + 'static,
{
    /// Requests product information for `identifiers`.
    ///
    /// `handler` is invoked once with the result, unless another catalog request is issued
    /// before this one is answered, in which case it is dropped without being invoked.
    /// A successful result also replaces the cached product list returned by
    /// [`current_products`](Self::current_products).
    ///
    /// Returns the id of the new request.
    pub async fn fetch_catalog<F>(
        &self,
        identifiers: impl IntoIterator<Item = ProductIdentifier>,
        handler: F,
    ) -> Uuid
    where
        F: FnOnce(Result<CatalogResult, CatalogError>) + Send + 'static,
    {
        let identifiers: BTreeSet<ProductIdentifier> = identifiers.into_iter().collect();
        let request_id = Uuid::new_v4();
        log::debug!(
            "Requesting {} products as request {}",
            identifiers.len(),
            request_id
        );

        let mut state = self.inner.state.lock().await;
        if let Some(previous) = state.catalog_request.take() {
            log::debug!("Cancelling catalog request {}", previous.request_id);
            previous.task.abort();
            state.catalog_handlers.clear(&previous.request_id);
        }
        state
            .catalog_handlers
            .register(request_id, request_id, Box::new(handler));

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let response = inner.load_catalog(&identifiers).await;
            inner.complete_catalog_request(request_id, response).await;
        });
        state.catalog_request = Some(InFlightCatalog { request_id, task });
        request_id
    }

    /// Requests product information and waits for the answer.
    ///
    /// Resolves to [`CatalogError::Superseded`] if a newer catalog request replaces this one.
    pub async fn request_products(
        &self,
        identifiers: impl IntoIterator<Item = ProductIdentifier>,
    ) -> Result<CatalogResult, CatalogError> {
        let (tx, rx) = oneshot::channel();
        self.fetch_catalog(identifiers, move |result| {
            let _ = tx.send(result);
        })
        .await;
        rx.await.unwrap_or(Err(CatalogError::Superseded))
    }
}

impl<S> Inner<S>
where
    S: StoreBackend + 'static,
{
    async fn load_catalog(
        &self,
        identifiers: &BTreeSet<ProductIdentifier>,
    ) -> Result<CatalogResult, CatalogError> {
        let request = async {
            self.store
                .request_product_info(identifiers)
                .await
                .map_err(|e| CatalogError::RequestFailed(Box::new(e)))
        };
        match self.config.catalog_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .unwrap_or(Err(CatalogError::TimedOut(limit))),
            None => request.await,
        }
    }

    /// Resolves the handler of `request_id` if it is still the current catalog request.
    async fn complete_catalog_request(
        &self,
        request_id: Uuid,
        response: Result<CatalogResult, CatalogError>,
    ) {
        // Backends may build results by hand; keep products unique by identifier.
        let response =
            response.map(|result| CatalogResult::new(result.products, result.invalid_identifiers));
        let pending = {
            let mut state = self.state.lock().await;
            match &state.catalog_request {
                Some(current) if current.request_id == request_id => {}
                _ => {
                    log::debug!("Ignoring answer to superseded catalog request {}", request_id);
                    return;
                }
            }
            state.catalog_request = None;

            match &response {
                Ok(result) => {
                    log::debug!("Loaded list of products");
                    for invalid in &result.invalid_identifiers {
                        log::warn!("Invalid product identifier: {}", invalid);
                    }
                    for product in &result.products {
                        log::debug!(
                            "Found product: {} {} {} {}",
                            product.identifier,
                            product.title,
                            product.price_micros,
                            product.currency_code
                        );
                    }
                    state.products = Some(result.products.clone());
                }
                Err(e) => log::warn!("Catalog request {} failed: {}", request_id, e),
            }
            state.catalog_handlers.take(&request_id)
        };

        if let Some(pending) = pending {
            pending.resolve(response);
        }
    }
}
