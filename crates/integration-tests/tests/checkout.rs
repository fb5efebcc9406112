//! Checkout state machine end to end against the fake backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::Method;
use secrecy::SecretString;

use vivahart_integration_tests::{EMAIL, FakeBackend, PASSWORD};
use vivahart_storefront::checkout::AttemptId;
use vivahart_storefront::storage::MemoryStorage;
use vivahart_storefront::{
    CheckoutPhase, ErrorKind, PaymentEvent, PaymentOutcome, Storefront,
};

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

fn messages(storefront: &mut Storefront) -> Vec<String> {
    storefront
        .drain_notifications()
        .into_iter()
        .map(|n| n.message)
        .collect()
}

#[tokio::test]
async fn test_checkout_blocked_without_default_address() {
    let backend = FakeBackend::start().await;
    backend.set_cart(&[("p1", 1)]);
    let mut storefront = logged_in(&backend).await;

    let err = storefront.checkout().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(storefront.checkout_flow().phase(), CheckoutPhase::Idle);
    assert!(backend.requests_to(&Method::POST, "orders/").is_empty());
    assert_eq!(messages(&mut storefront), ["Please add a shipping address"]);
}

#[tokio::test]
async fn test_checkout_blocked_with_empty_cart() {
    let backend = FakeBackend::start().await;
    backend.set_default_address();
    let mut storefront = logged_in(&backend).await;

    let err = storefront.checkout().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(backend.requests_to(&Method::POST, "orders/").is_empty());
    assert_eq!(messages(&mut storefront), ["Your cart is empty"]);
}

#[tokio::test]
async fn test_rejected_order_returns_to_idle() {
    let backend = FakeBackend::start().await;
    backend.set_cart(&[("p1", 1)]);
    backend.set_default_address();
    backend.reject_orders(true);
    let mut storefront = logged_in(&backend).await;

    let err = storefront.checkout().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(storefront.checkout_flow().phase(), CheckoutPhase::Idle);
    assert_eq!(messages(&mut storefront), ["Failed to create order"]);

    // A fresh attempt is allowed afterwards.
    backend.reject_orders(false);
    storefront.checkout().await.unwrap();
    assert_eq!(storefront.checkout_flow().phase(), CheckoutPhase::AwaitingPayment);
}

#[tokio::test]
async fn test_successful_payment_clears_cart_and_confirms() {
    let backend = FakeBackend::start().await;
    backend.set_cart(&[("p2", 1)]);
    backend.set_default_address();
    let mut storefront = logged_in(&backend).await;

    let request = storefront.checkout().await.unwrap();

    assert_eq!(request.amount, 39_950);
    assert_eq!(request.currency, "INR");
    assert_eq!(request.order_id.as_str(), "order_Gw1");
    assert_eq!(request.description, "Order Payment #o1");
    assert_eq!(request.prefill.name, "Asha Rao");
    assert_eq!(request.prefill.email, EMAIL);
    assert_eq!(request.prefill.contact, "");
    assert_eq!(request.theme.color, "#800080");

    let orders = backend.requests_to(&Method::POST, "orders/");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].body["paymentMethod"], "Razorpay");
    assert_eq!(orders[0].body["shippingAddress"]["postalCode"], "560001");

    // Re-entry while the widget is open is refused.
    let err = storefront.checkout().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(backend.requests_to(&Method::POST, "orders/").len(), 1);

    let outcome = storefront
        .handle_payment(PaymentEvent::Succeeded {
            attempt: request.attempt,
            payment_id: Some("pay_1".to_string()),
        })
        .await;

    let PaymentOutcome::Confirmed(confirmation) = outcome else {
        panic!("expected a confirmation, got {outcome:?}");
    };
    assert_eq!(confirmation.order_id.as_str(), "o1");
    assert_eq!(confirmation.transaction_id.unwrap().as_str(), "txn_1");
    assert!(storefront.cart().is_empty());
    assert!(backend.cart().is_empty());
    assert_eq!(storefront.checkout_flow().phase(), CheckoutPhase::Redirected);
    assert_eq!(
        storefront.checkout_flow().trail(),
        [
            CheckoutPhase::Idle,
            CheckoutPhase::OrderCreating,
            CheckoutPhase::AwaitingPayment,
            CheckoutPhase::PaymentSucceeded,
            CheckoutPhase::CartCleared,
            CheckoutPhase::Redirected,
        ]
    );

    let order = storefront.confirmed_order().await.unwrap();
    assert_eq!(order.id.as_str(), "o1");
    assert_eq!(order.items.len(), 1);
    assert_eq!(backend.requests_to(&Method::GET, "orders/o1").len(), 1);
}

#[tokio::test]
async fn test_failed_payment_keeps_cart() {
    let backend = FakeBackend::start().await;
    backend.set_cart(&[("p1", 2)]);
    backend.set_default_address();
    let mut storefront = logged_in(&backend).await;

    let request = storefront.checkout().await.unwrap();
    let outcome = storefront
        .handle_payment(PaymentEvent::Failed {
            attempt: request.attempt,
            code: Some("BAD_REQUEST_ERROR".to_string()),
            description: Some("Card declined".to_string()),
        })
        .await;

    assert_eq!(
        outcome,
        PaymentOutcome::Failed {
            description: "Card declined".to_string()
        }
    );
    assert_eq!(storefront.checkout_flow().phase(), CheckoutPhase::Idle);
    assert_eq!(storefront.cart().item_count(), 2);
    assert!(backend.requests_to(&Method::POST, "users/cart/remove").is_empty());
    assert_eq!(backend.cart(), [("p1".to_string(), 2)]);
    assert!(messages(&mut storefront).contains(&"Payment failed: Card declined".to_string()));
}

#[tokio::test]
async fn test_stale_and_duplicate_payment_events_are_ignored() {
    let backend = FakeBackend::start().await;
    backend.set_cart(&[("p1", 1)]);
    backend.set_default_address();
    let mut storefront = logged_in(&backend).await;

    let request = storefront.checkout().await.unwrap();

    let stale = storefront
        .handle_payment(PaymentEvent::Succeeded {
            attempt: AttemptId::new(),
            payment_id: None,
        })
        .await;
    assert_eq!(stale, PaymentOutcome::Ignored);
    assert_eq!(storefront.checkout_flow().phase(), CheckoutPhase::AwaitingPayment);
    assert_eq!(storefront.cart().item_count(), 1);

    let success = PaymentEvent::Succeeded {
        attempt: request.attempt,
        payment_id: None,
    };
    assert!(matches!(
        storefront.handle_payment(success.clone()).await,
        PaymentOutcome::Confirmed(_)
    ));
    assert_eq!(storefront.handle_payment(success).await, PaymentOutcome::Ignored);

    let late_failure = storefront
        .handle_payment(PaymentEvent::Failed {
            attempt: request.attempt,
            code: None,
            description: None,
        })
        .await;
    assert_eq!(late_failure, PaymentOutcome::Ignored);
    assert_eq!(storefront.checkout_flow().phase(), CheckoutPhase::Redirected);
    assert_eq!(backend.requests_to(&Method::POST, "users/cart/remove").len(), 1);
}

#[tokio::test]
async fn test_confirmation_lost_after_restart() {
    let backend = FakeBackend::start().await;
    let mut storefront = logged_in(&backend).await;

    storefront.confirmed_order().await.unwrap_err();

    assert_eq!(messages(&mut storefront), ["Order ID not provided"]);
    assert!(backend.requests().is_empty());
}
