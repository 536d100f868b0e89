use iap::prelude::*;
use std::sync::Arc;
use tokio_stream::StreamExt;

struct PrintingDelegate;

impl PurchaseDelegate for PrintingDelegate {
    fn on_purchase_completed(&self, identifier: &ProductIdentifier) {
        println!("Thanks for buying {}", identifier);
    }

    fn on_purchase_restored(&self, identifier: &ProductIdentifier) {
        println!("Welcome back, {} is yours again", identifier);
    }

    fn on_purchase_failed(&self, description: &str) {
        println!("Purchase failed: {}", description);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let store = InMemoryStore::new()
        .with_product(Product::new("coins_100", "100 coins", 990_000, "USD"))
        .with_product(
            Product::new("remove_ads", "Remove ads", 2_990_000, "USD")
                .with_description("No more banners"),
        );
    let storefront = Storefront::new(store.clone());
    storefront
        .set_delegate(Some(Arc::new(PrintingDelegate)))
        .await;

    let catalog = storefront
        .request_products(["coins_100", "remove_ads", "gold_pass"].map(ProductIdentifier::from))
        .await?;
    for product in &catalog.products {
        println!(
            "{}: {} ({} {:.2})",
            product.identifier,
            product.title,
            product.currency_code,
            product.price_micros as f64 / 1_000_000.0
        );
    }
    for identifier in &catalog.invalid_identifiers {
        println!("{} is not for sale", identifier);
    }

    if !storefront.can_make_payments() {
        log::warn!("Payments are disabled on this device");
        return Ok(());
    }

    // The in-memory queue settles nothing on its own, so the purchase is completed from a
    // separate task once it has been submitted.
    let waiting = {
        let storefront = storefront.clone();
        tokio::spawn(async move { storefront.purchase_and_wait("remove_ads").await })
    };
    while storefront.pending_purchases().await == 0 {
        tokio::task::yield_now().await;
    }
    store.complete_purchase("remove_ads").await;
    println!("Purchased: {}", waiting.await??);

    let restored = storefront.restore_stream().await?;
    let delivered = store.deliver_restores().await;
    let mut restored = restored.take(delivered.len());
    while let Some(identifier) = restored.next().await {
        println!("Restored {}", identifier);
    }

    Ok(())
}
