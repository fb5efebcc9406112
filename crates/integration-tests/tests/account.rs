//! Wishlist, profile and order history against the fake backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::Method;
use secrecy::SecretString;

use vivahart_core::{OrderId, ProductId};
use vivahart_integration_tests::{EMAIL, FakeBackend, PASSWORD};
use vivahart_storefront::storage::MemoryStorage;
use vivahart_storefront::wishlist::WishlistChange;
use vivahart_storefront::{ErrorKind, PaymentEvent, Storefront};

async fn logged_in(backend: &FakeBackend) -> Storefront {
    let mut storefront = backend.storefront(Arc::new(MemoryStorage::new()));
    storefront
        .login(EMAIL, &SecretString::from(PASSWORD.to_string()))
        .await
        .unwrap();
    storefront.drain_notifications();
    backend.clear_requests();
    storefront
}

#[tokio::test]
async fn test_wishlist_toggle_adds_then_removes() {
    let backend = FakeBackend::start().await;
    let mut storefront = logged_in(&backend).await;
    let p1 = ProductId::new("p1");

    let change = storefront.toggle_wishlist(&p1).await.unwrap();
    assert_eq!(change, WishlistChange::Added);
    assert!(storefront.wishlist().contains(&p1));
    assert_eq!(backend.wishlist(), ["p1"]);

    let change = storefront.toggle_wishlist(&p1).await.unwrap();
    assert_eq!(change, WishlistChange::Removed);
    assert!(storefront.wishlist().is_empty());
    assert!(backend.wishlist().is_empty());

    assert_eq!(backend.requests_to(&Method::POST, "users/wishlist/add").len(), 1);
    assert_eq!(backend.requests_to(&Method::DELETE, "users/wishlist/remove").len(), 1);

    let messages: Vec<_> = storefront
        .drain_notifications()
        .into_iter()
        .map(|n| n.message)
        .collect();
    assert_eq!(messages, ["Added to wishlist", "Removed from wishlist"]);
}

#[tokio::test]
async fn test_wishlist_requires_login() {
    let backend = FakeBackend::start().await;
    let mut storefront = backend.storefront(Arc::new(MemoryStorage::new()));

    let err = storefront
        .toggle_wishlist(&ProductId::new("p1"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(backend.requests().is_empty());
    let messages: Vec<_> = storefront
        .drain_notifications()
        .into_iter()
        .map(|n| n.message)
        .collect();
    assert_eq!(messages, ["Please log in to manage your wishlist"]);
}

#[tokio::test]
async fn test_profile_seeds_wishlist() {
    let backend = FakeBackend::start().await;
    let mut storefront = logged_in(&backend).await;
    storefront.toggle_wishlist(&ProductId::new("p2")).await.unwrap();

    let mut fresh = logged_in(&backend).await;
    assert!(fresh.wishlist().is_empty());

    let profile = fresh.load_profile().await.unwrap();

    assert_eq!(profile.first_name, "Asha");
    assert!(fresh.wishlist().contains(&ProductId::new("p2")));
}

#[tokio::test]
async fn test_orders_after_checkout() {
    let backend = FakeBackend::start().await;
    backend.set_default_address();
    backend.set_cart(&[("p1", 1)]);
    let mut storefront = logged_in(&backend).await;

    let request = storefront.checkout().await.unwrap();
    storefront
        .handle_payment(PaymentEvent::Succeeded {
            attempt: request.attempt,
            payment_id: None,
        })
        .await;

    let orders = storefront.orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id.as_str(), "o1");

    let order = storefront.order(&OrderId::new("o1")).await.unwrap();
    assert_eq!(order.items[0].quantity, 1);

    let err = storefront.order(&OrderId::new("missing")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn test_orders_require_login() {
    let backend = FakeBackend::start().await;
    let mut storefront = backend.storefront(Arc::new(MemoryStorage::new()));

    let err = storefront.orders().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(backend.requests().is_empty());
}
