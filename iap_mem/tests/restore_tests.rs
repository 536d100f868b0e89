mod common;

use common::*;
use iap_core::prelude::*;
use std::sync::Arc;
use tokio_stream::StreamExt;

fn restored(product: &str, original: Option<&str>) -> Transaction {
    Transaction::builder()
        .product_identifier(product)
        .restored(original.map(ProductIdentifier::from))
        .build()
        .unwrap()
}

#[tokio::test]
async fn restored_transactions_reach_the_handler_in_order() {
    let (store, storefront) = setup();
    let restored_ids = Calls::<ProductIdentifier>::new();
    storefront.restore(restored_ids.record()).await.unwrap();
    assert_eq!(store.restore_requests(), 1);

    let transactions = vec![
        restored("coins", Some("coins")),
        restored("gems", Some("gems")),
        restored("coins", Some("coins")),
    ];
    store.publish(transactions.clone()).await;

    assert_eq!(restored_ids.get(), ids(&["coins", "gems", "coins"]));
    for transaction in &transactions {
        assert_eq!(store.finish_count(transaction), 1);
    }
}

#[tokio::test]
async fn restore_without_original_is_dropped_unfinished() {
    let (store, storefront) = setup();
    let restored_ids = Calls::<ProductIdentifier>::new();
    storefront.restore(restored_ids.record()).await.unwrap();

    let orphan = restored("coins", None);
    let outcomes = storefront.handle_transactions(vec![orphan.clone()]).await;

    assert_eq!(outcomes, vec![RouteOutcome::Dropped]);
    assert_eq!(restored_ids.len(), 0);
    assert_eq!(store.finish_count(&orphan), 0);
}

#[tokio::test]
async fn delegate_hears_the_restored_transaction_itself() {
    let (_store, storefront) = setup();
    let delegate = Arc::new(RecordingDelegate::default());
    storefront.set_delegate(Some(delegate.clone())).await;
    let mut notifications = storefront.notifications();
    let restored_ids = Calls::<ProductIdentifier>::new();
    storefront.restore(restored_ids.record()).await.unwrap();

    let outcomes = storefront
        .handle_transactions(vec![restored("coins_v2", Some("coins"))])
        .await;

    assert_eq!(
        outcomes,
        vec![RouteOutcome::Restored {
            original: "coins".into(),
            finished: true
        }]
    );
    assert_eq!(
        delegate.calls(),
        vec![DelegateCall::Restored("coins_v2".to_string())]
    );
    assert_eq!(
        notifications.recv().await.unwrap(),
        PurchaseNotification::Restored("coins".into())
    );
    assert_eq!(restored_ids.get(), ids(&["coins"]));
}

#[tokio::test]
async fn restores_without_handler_are_still_finished() {
    let (store, storefront) = setup();
    let transaction = restored("gems", Some("gems"));

    storefront.handle_transactions(vec![transaction.clone()]).await;

    assert_eq!(store.finish_count(&transaction), 1);
}

#[tokio::test]
async fn restore_stream_yields_purchase_history() {
    let (store, storefront) = setup();
    store.complete_purchase("coins").await;
    store.complete_purchase("remove_ads").await;

    let stream = storefront.restore_stream().await.unwrap();
    let delivered = store.deliver_restores().await;
    assert_eq!(delivered.len(), 2);

    let restored_ids: Vec<ProductIdentifier> =
        within_a_second(stream.take(2).collect()).await;
    assert_eq!(restored_ids, ids(&["coins", "remove_ads"]));
}

#[tokio::test]
async fn second_restore_replaces_the_handler() {
    let (store, storefront) = setup();
    let first = Calls::<ProductIdentifier>::new();
    let second = Calls::<ProductIdentifier>::new();

    let mut stream = storefront.restore_stream().await.unwrap();
    storefront.restore(first.record()).await.unwrap();
    storefront.restore(second.record()).await.unwrap();
    assert_eq!(store.restore_requests(), 3);

    store.complete_purchase("gems").await;
    store.deliver_restores().await;

    assert_eq!(first.len(), 0);
    assert_eq!(second.get(), ids(&["gems"]));
    assert!(within_a_second(stream.next()).await.is_none());
}

#[tokio::test]
async fn failed_restore_keeps_the_previous_handler() {
    let (store, storefront) = setup();
    let working = Calls::<ProductIdentifier>::new();
    let refused = Calls::<ProductIdentifier>::new();
    storefront.restore(working.record()).await.unwrap();

    store.set_queue_available(false);
    assert!(storefront.restore(refused.record()).await.is_err());
    assert!(storefront.restore_stream().await.is_err());
    store.set_queue_available(true);

    store.complete_purchase("gems").await;
    store.deliver_restores().await;

    assert_eq!(working.get(), ids(&["gems"]));
    assert_eq!(refused.len(), 0);
    assert_eq!(store.restore_requests(), 1);
}

#[tokio::test]
async fn restore_fails_when_queue_unavailable() {
    let (store, storefront) = setup();
    store.set_queue_available(false);

    let result = storefront.restore(|_| {}).await;

    assert!(matches!(result, Err(RestoreError::Submission(_))));
    assert_eq!(store.restore_requests(), 0);
}
