//! Guest and account cart behaviour against the fake backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::Method;
use secrecy::SecretString;

use vivahart_core::{ProductId, Quantity};
use vivahart_integration_tests::{EMAIL, FakeBackend, PASSWORD};
use vivahart_storefront::storage::{FileStorage, MemoryStorage};
use vivahart_storefront::{ErrorKind, Storefront};

async fn logged_in(backend: &FakeBackend) -> Storefront {
    let mut storefront = backend.storefront(Arc::new(MemoryStorage::new()));
    storefront
        .login(EMAIL, &SecretString::from(PASSWORD.to_string()))
        .await
        .unwrap();
    backend.clear_requests();
    storefront
}

#[tokio::test]
async fn test_guest_cart_round_trips_through_file() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    {
        let mut storefront = backend.storefront(Arc::new(FileStorage::new(&path)));
        storefront
            .add_product(&ProductId::new("p1"), Quantity::clamped(3))
            .await
            .unwrap();
        storefront
            .add_product(&ProductId::new("p2"), Quantity::ONE)
            .await
            .unwrap();
    }

    let storefront = backend.storefront(Arc::new(FileStorage::new(&path)));
    let items = storefront.cart().items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].product_id.as_str(), "p1");
    assert_eq!(items[0].quantity.get(), 3);
    assert_eq!(items[1].name, "Kundan Rakhi");
    assert_eq!(storefront.cart().total().to_minor_units(), Some(159_650));
}

#[tokio::test]
async fn test_adding_same_product_merges_lines() {
    let backend = FakeBackend::start().await;
    let mut storefront = backend.storefront(Arc::new(MemoryStorage::new()));
    let p1 = ProductId::new("p1");

    storefront.add_product(&p1, Quantity::clamped(3)).await.unwrap();
    let resulting = storefront.add_product(&p1, Quantity::ONE).await.unwrap();

    assert_eq!(resulting.get(), 4);
    assert_eq!(storefront.cart().items().len(), 1);
    assert_eq!(storefront.cart().total().to_minor_units(), Some(159_600));
}

#[tokio::test]
async fn test_out_of_stock_product_is_not_added() {
    let backend = FakeBackend::start().await;
    let mut storefront = backend.storefront(Arc::new(MemoryStorage::new()));

    let err = storefront
        .add_product(&ProductId::new("p3"), Quantity::ONE)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(storefront.cart().is_empty());
}

#[tokio::test]
async fn test_account_add_sends_absolute_quantity() {
    let backend = FakeBackend::start().await;
    backend.set_cart(&[("p1", 3)]);
    let mut storefront = logged_in(&backend).await;

    storefront
        .add_product(&ProductId::new("p1"), Quantity::ONE)
        .await
        .unwrap();

    let adds = backend.requests_to(&Method::POST, "users/cart/add");
    assert_eq!(adds.len(), 1);
    assert_eq!(adds[0].body["productId"], "p1");
    assert_eq!(adds[0].body["quantity"], 4);
    assert_eq!(backend.cart(), [("p1".to_string(), 4)]);
}

#[tokio::test]
async fn test_quantity_stays_in_bounds() {
    let backend = FakeBackend::start().await;
    backend.set_cart(&[("p1", 9)]);
    let mut storefront = logged_in(&backend).await;
    let p1 = ProductId::new("p1");

    let quantity = storefront.update_quantity(&p1, 5).await.unwrap();
    assert_eq!(quantity.map(Quantity::get), Some(10));

    let quantity = storefront.set_quantity(&p1, 0).await.unwrap();
    assert_eq!(quantity, None);
    assert!(storefront.cart().is_empty());

    let removes = backend.requests_to(&Method::POST, "users/cart/remove");
    assert_eq!(removes.len(), 1);
    assert!(backend.cart().is_empty());
}

#[tokio::test]
async fn test_account_remove_is_one_call_even_when_it_fails() {
    let backend = FakeBackend::start().await;
    backend.set_cart(&[("p1", 3), ("p2", 1)]);
    let mut storefront = logged_in(&backend).await;
    backend.fail_cart_remove(true);

    let err = storefront
        .remove_from_cart(&ProductId::new("p1"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    let removes = backend.requests_to(&Method::POST, "users/cart/remove");
    assert_eq!(removes.len(), 1);
    assert_eq!(removes[0].body["productId"], "p1");
    assert_eq!(removes[0].authorization.as_deref(), Some("Bearer T"));
    assert!(storefront.cart().get(&ProductId::new("p1")).is_none());
    assert_eq!(storefront.cart().items().len(), 1);

    let messages: Vec<_> = storefront
        .drain_notifications()
        .into_iter()
        .map(|n| n.message)
        .collect();
    assert_eq!(messages, ["Error removing item"]);
}

#[tokio::test]
async fn test_clear_removes_every_line() {
    let backend = FakeBackend::start().await;
    backend.set_cart(&[("p1", 3), ("p2", 1)]);
    let mut storefront = logged_in(&backend).await;

    storefront.clear_cart().await.unwrap();

    assert!(storefront.cart().is_empty());
    assert_eq!(backend.requests_to(&Method::POST, "users/cart/remove").len(), 2);
    assert!(backend.cart().is_empty());
}
