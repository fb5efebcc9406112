//! Integration tests for the Vivah Art Studio storefront client.
//!
//! The tests run the real [`Storefront`] against [`FakeBackend`], an
//! in-process `axum` server on an ephemeral port that speaks the backend's
//! REST dialect and records every request it receives.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p vivahart-integration-tests
//! ```
//!
//! # Fixtures
//!
//! - Login: `asha@example.com` / `secret`, token [`TOKEN`]
//! - Products: `p1` (399.00, stock 5), `p2` (399.50, stock 3), `p3` (out of stock)
//! - Subcategories: `s1` "Designer", `s2` "Kids"

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{Value, json};

use vivahart_storefront::storage::DurableStorage;
use vivahart_storefront::{Storefront, StorefrontConfig};

/// Bearer token the fake hands out.
pub const TOKEN: &str = "T";
pub const EMAIL: &str = "asha@example.com";
pub const PASSWORD: &str = "secret";

const ORDER_CREATED: &str = "Order created, proceed to payment";

/// One request as the fake saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Path below the API base, e.g. `users/cart/add`.
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

impl RecordedRequest {
    #[must_use]
    pub fn is(&self, method: &Method, path: &str) -> bool {
        &self.method == method && self.path == path
    }
}

/// Mutable backend state.
#[derive(Debug, Default)]
struct BackendData {
    requests: Vec<RecordedRequest>,
    products: Vec<Value>,
    subcategories: Vec<Value>,
    /// (product id, quantity) in insertion order.
    cart: Vec<(String, i64)>,
    addresses: Vec<Value>,
    wishlist: Vec<String>,
    orders: Vec<Value>,
    fail_cart_remove: bool,
    fail_cart_fetch: bool,
    reject_orders: bool,
}

#[derive(Clone, Default)]
struct FakeState {
    data: Arc<Mutex<BackendData>>,
}

impl FakeState {
    fn lock(&self) -> MutexGuard<'_, BackendData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-process fake of the storefront backend.
pub struct FakeBackend {
    addr: SocketAddr,
    state: FakeState,
}

impl FakeBackend {
    /// Start the fake on `127.0.0.1` with the default fixtures.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    #[allow(clippy::unwrap_used)]
    pub async fn start() -> Self {
        let state = FakeState::default();
        {
            let mut data = state.lock();
            data.products = vec![
                product("p1", "Peacock Rakhi", json!(399), 5, "Designer"),
                product("p2", "Kundan Rakhi", json!("399.50"), 3, "Kids"),
                product("p3", "Silver Rakhi", json!(1299), 0, "Designer"),
            ];
            data.subcategories = vec![
                json!({"_id": "s1", "name": "Designer", "backgroundImage": {"url": "/s1.png"}}),
                json!({"_id": "s2", "name": "Kids"}),
            ];
        }

        let router = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self { addr, state }
    }

    /// Base URL to configure the client with.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api/", self.addr)
    }

    /// Configuration pointing at this fake.
    ///
    /// # Panics
    ///
    /// Panics if the base URL does not parse.
    #[allow(clippy::unwrap_used)]
    #[must_use]
    pub fn config(&self, storage_path: &Path) -> StorefrontConfig {
        StorefrontConfig::new(&self.base_url(), storage_path).unwrap()
    }

    /// A storefront over `storage`, talking to this fake.
    ///
    /// # Panics
    ///
    /// Panics if the storefront cannot be built.
    #[allow(clippy::unwrap_used)]
    #[must_use]
    pub fn storefront(&self, storage: Arc<dyn DurableStorage>) -> Storefront {
        Storefront::with_storage(self.config(Path::new("unused.json")), storage).unwrap()
    }

    /// Every request so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Requests matching `method` and `path`.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.is(method, path))
            .collect()
    }

    pub fn clear_requests(&self) {
        self.state.lock().requests.clear();
    }

    /// Replace the account cart.
    pub fn set_cart(&self, lines: &[(&str, i64)]) {
        self.state.lock().cart = lines
            .iter()
            .map(|(id, quantity)| ((*id).to_string(), *quantity))
            .collect();
    }

    /// Account cart as (product id, quantity).
    #[must_use]
    pub fn cart(&self) -> Vec<(String, i64)> {
        self.state.lock().cart.clone()
    }

    /// Store a default address with the account.
    pub fn set_default_address(&self) {
        self.state.lock().addresses = vec![json!({
            "_id": "a1",
            "street": "12 MG Road",
            "city": "Bengaluru",
            "state": "Karnataka",
            "postalCode": "560001",
            "country": "India",
            "isDefault": true
        })];
    }

    #[must_use]
    pub fn wishlist(&self) -> Vec<String> {
        self.state.lock().wishlist.clone()
    }

    /// Make `users/cart/remove` answer 500.
    pub fn fail_cart_remove(&self, fail: bool) {
        self.state.lock().fail_cart_remove = fail;
    }

    /// Make `users/cart-users` answer 500.
    pub fn fail_cart_fetch(&self, fail: bool) {
        self.state.lock().fail_cart_fetch = fail;
    }

    /// Make `POST orders/` answer without the order-created message.
    pub fn reject_orders(&self, reject: bool) {
        self.state.lock().reject_orders = reject;
    }
}

fn product(id: &str, name: &str, price: Value, stock: i64, subcategory: &str) -> Value {
    json!({
        "_id": id,
        "name": name,
        "sellingPrice": price,
        "totalStock": stock,
        "images": [{"url": format!("/{id}.jpg"), "key": id}],
        "category": {"name": "Rakhi"},
        "subcategory": {"name": subcategory},
        "isActive": true
    })
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn unauthorized() -> Response {
    reply(
        StatusCode::UNAUTHORIZED,
        json!({"status": "fail", "message": "Not authorized, token failed"}),
    )
}

async fn handle(
    State(state): State<FakeState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix("/api/")
        .unwrap_or_else(|| uri.path())
        .to_string();
    let authorization = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(String::from);
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let mut data = state.lock();
    data.requests.push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(String::from),
        authorization: authorization.clone(),
        body: body.clone(),
    });

    if method == Method::POST && path == "users/login" {
        return login(&body);
    }
    if method == Method::GET && path == "inventory/products" {
        return reply(StatusCode::OK, json!({"status": "success", "data": data.products}));
    }
    if method == Method::GET
        && path.starts_with("inventory/categories/")
        && path.ends_with("/subcategories")
    {
        return reply(StatusCode::OK, Value::Array(data.subcategories.clone()));
    }

    if authorization.as_deref() != Some(&format!("Bearer {TOKEN}")) {
        return unauthorized();
    }

    let product_id = body
        .get("productId")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match (method, path.as_str()) {
        (Method::GET, "users/cart-users") if data.fail_cart_fetch => reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"status": "error", "message": "Database unavailable"}),
        ),
        (Method::GET, "users/cart-users") => {
            let cart: Vec<Value> = data
                .cart
                .iter()
                .map(|(id, quantity)| {
                    let product = data.products.iter().find(|p| p["_id"] == id.as_str());
                    json!({"product": product, "quantity": quantity})
                })
                .collect();
            reply(
                StatusCode::OK,
                json!({"status": "success", "data": [{"cart": cart, "addresses": data.addresses}]}),
            )
        }
        (Method::POST, "users/cart/add") => {
            let quantity = body.get("quantity").and_then(Value::as_i64).unwrap_or(1);
            match data.cart.iter_mut().find(|(id, _)| *id == product_id) {
                Some(line) => line.1 = quantity,
                None => data.cart.push((product_id, quantity)),
            }
            reply(StatusCode::OK, json!({"status": "success", "message": "Cart updated"}))
        }
        (Method::POST, "users/cart/remove") => {
            if data.fail_cart_remove {
                return reply(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"status": "error", "message": "Database unavailable"}),
                );
            }
            data.cart.retain(|(id, _)| *id != product_id);
            reply(StatusCode::OK, json!({"status": "success"}))
        }
        (Method::POST, "users/wishlist/add") => {
            if !data.wishlist.contains(&product_id) {
                data.wishlist.push(product_id);
            }
            reply(StatusCode::OK, json!({"status": "success"}))
        }
        (Method::DELETE, "users/wishlist/remove") => {
            data.wishlist.retain(|id| *id != product_id);
            reply(StatusCode::OK, json!({"status": "success"}))
        }
        (Method::POST, "orders/") => create_order(&mut data, &body),
        (Method::GET, "orders/") => reply(StatusCode::OK, Value::Array(data.orders.clone())),
        (Method::GET, "users/profile") => reply(
            StatusCode::OK,
            json!({"user": {
                "_id": "u1",
                "email": EMAIL,
                "firstName": "Asha",
                "lastName": "Rao",
                "isEmailVerified": true,
                "role": "user",
                "wishlist": data.wishlist,
                "addresses": data.addresses
            }}),
        ),
        (Method::GET, order_path) if order_path.starts_with("orders/") => {
            let id = order_path.trim_start_matches("orders/");
            match data.orders.iter().find(|order| order["_id"] == id) {
                Some(order) => reply(StatusCode::OK, json!({"order": order})),
                None => reply(
                    StatusCode::NOT_FOUND,
                    json!({"status": "fail", "message": "Order not found"}),
                ),
            }
        }
        _ => reply(StatusCode::NOT_FOUND, json!({"message": "No such route"})),
    }
}

fn login(body: &Value) -> Response {
    if body["email"] == EMAIL && body["password"] == PASSWORD {
        reply(
            StatusCode::OK,
            json!({
                "token": TOKEN,
                "user": {"_id": "u1", "email": EMAIL, "firstName": "Asha", "lastName": "Rao"}
            }),
        )
    } else {
        reply(
            StatusCode::UNAUTHORIZED,
            json!({"status": "fail", "message": "Invalid email or password"}),
        )
    }
}

#[allow(clippy::cast_precision_loss)]
fn create_order(data: &mut BackendData, body: &Value) -> Response {
    if data.reject_orders || data.cart.is_empty() {
        return reply(StatusCode::OK, json!({"message": "Unable to create order"}));
    }

    let number = data.orders.len() + 1;
    let mut total = 0.0_f64;
    let items: Vec<Value> = data
        .cart
        .iter()
        .filter_map(|(id, quantity)| {
            let product = data.products.iter().find(|p| p["_id"] == id.as_str())?;
            let price = match &product["sellingPrice"] {
                Value::String(s) => s.parse::<f64>().unwrap_or_default(),
                other => other.as_f64().unwrap_or_default(),
            };
            total += price * (*quantity as f64);
            Some(json!({
                "product": {"_id": id, "name": product["name"]},
                "quantity": quantity,
                "price": price
            }))
        })
        .collect();

    let order = json!({
        "_id": format!("o{number}"),
        "items": items,
        "totalAmount": total,
        "paymentMethod": body["paymentMethod"],
        "paymentStatus": "pending",
        "status": "pending",
        "deliveryStatus": "pending",
        "razorpayOrderId": format!("order_Gw{number}"),
        "shippingAddress": body["shippingAddress"],
        "createdAt": "2026-08-09T10:00:00Z"
    });
    data.orders.push(order.clone());

    reply(
        StatusCode::CREATED,
        json!({
            "message": ORDER_CREATED,
            "razorpayOrderId": format!("order_Gw{number}"),
            "order": order,
            "transactionId": format!("txn_{number}")
        }),
    )
}
