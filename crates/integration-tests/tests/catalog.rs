//! Category browser and best sellers against the fake backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::Method;
use secrecy::SecretString;

use vivahart_core::{CategoryId, ProductId, Quantity};
use vivahart_integration_tests::{EMAIL, FakeBackend, PASSWORD};
use vivahart_storefront::catalog::ALL_TAB_NAME;
use vivahart_storefront::storage::MemoryStorage;
use vivahart_storefront::{PaymentEvent, PaymentOutcome};

#[tokio::test]
async fn test_tabs_and_subcategory_filter() {
    let backend = FakeBackend::start().await;
    let mut storefront = backend.storefront(Arc::new(MemoryStorage::new()));

    storefront.load_categories().await.unwrap();

    let names: Vec<_> = storefront
        .browser()
        .tabs()
        .iter()
        .map(|tab| tab.name.as_str())
        .collect();
    assert_eq!(names, [ALL_TAB_NAME, "Designer", "Kids"]);
    assert_eq!(storefront.browser().products().len(), 3);

    storefront
        .select_category(CategoryId::new("s2"))
        .await
        .unwrap();

    let products = storefront.browser().products();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].product.id.as_str(), "p2");

    let listing = backend.requests_to(&Method::GET, "inventory/products");
    let query = listing.last().unwrap().query.clone().unwrap();
    assert!(query.contains("subcategory=s2"));
    assert!(query.contains("sort=-createdAt"));
}

#[tokio::test]
async fn test_catalog_responses_are_cached() {
    let backend = FakeBackend::start().await;
    let mut storefront = backend.storefront(Arc::new(MemoryStorage::new()));

    storefront.load_categories().await.unwrap();
    storefront.refresh_products().await.unwrap();
    storefront.load_categories().await.unwrap();

    assert_eq!(backend.requests_to(&Method::GET, "inventory/products").len(), 1);
    let subcategory_requests = backend
        .requests()
        .into_iter()
        .filter(|r| r.path.ends_with("/subcategories"))
        .count();
    assert_eq!(subcategory_requests, 1);
}

#[tokio::test]
async fn test_paid_order_refreshes_catalog() {
    let backend = FakeBackend::start().await;
    backend.set_default_address();
    let mut storefront = backend.storefront(Arc::new(MemoryStorage::new()));
    storefront
        .login(EMAIL, &SecretString::from(PASSWORD.to_string()))
        .await
        .unwrap();
    storefront.load_categories().await.unwrap();
    storefront
        .add_product(&ProductId::new("p1"), Quantity::ONE)
        .await
        .unwrap();

    let request = storefront.checkout().await.unwrap();
    let outcome = storefront
        .handle_payment(PaymentEvent::Succeeded {
            attempt: request.attempt,
            payment_id: None,
        })
        .await;
    assert!(matches!(outcome, PaymentOutcome::Confirmed(_)));

    storefront.refresh_products().await.unwrap();

    assert_eq!(backend.requests_to(&Method::GET, "inventory/products").len(), 2);
}

#[tokio::test]
async fn test_best_sellers_add_uses_picker_quantity() {
    let backend = FakeBackend::start().await;
    let mut storefront = backend.storefront(Arc::new(MemoryStorage::new()));
    let p1 = ProductId::new("p1");

    storefront.load_best_sellers().await.unwrap();
    assert_eq!(storefront.best_sellers().cards().len(), 3);

    let picked = storefront.adjust_best_seller_quantity(&p1, 2).unwrap();
    assert_eq!(picked.get(), 3);

    let quantity = storefront.add_best_seller(&p1).await.unwrap();

    assert_eq!(quantity.get(), 3);
    assert_eq!(storefront.cart().item_count(), 3);
    assert_eq!(storefront.best_sellers().card(&p1).unwrap().quantity.get(), 1);
}

#[tokio::test]
async fn test_out_of_stock_best_seller_cannot_be_added() {
    let backend = FakeBackend::start().await;
    let mut storefront = backend.storefront(Arc::new(MemoryStorage::new()));
    let p3 = ProductId::new("p3");

    storefront.load_best_sellers().await.unwrap();
    assert!(!storefront.best_sellers().card(&p3).unwrap().can_add());

    storefront.add_best_seller(&p3).await.unwrap_err();

    assert!(storefront.cart().is_empty());
}
