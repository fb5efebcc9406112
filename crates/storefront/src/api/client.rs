//! `reqwest` client for the backend REST API.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use vivahart_core::{
    CategoryId, CurrencyCode, Email, GatewayOrderId, OrderId, ProductId, Quantity, TransactionId,
};

use super::ApiError;
use super::cache::CacheValue;
use super::conversions::{
    convert_cart_line, convert_order, convert_product, convert_profile, convert_subcategory,
};
use super::types::{
    CartMutationRequest, CartUserDto, CreateOrderRequest, CreateOrderResponse, DataEnvelope,
    ListResponse, LoginRequest, LoginResponse, ORDER_CREATED_MESSAGE, OrderDto, OrderResponse,
    PAYMENT_METHOD, ProductDto, ProductQuery, ProfileResponse, STATUS_SUCCESS,
    ShippingAddressRequest, StatusEnvelope, SubcategoryDto, WishlistRequest,
};
use crate::config::StorefrontConfig;
use crate::models::{Address, CartItem, Order, Product, Subcategory, User, UserProfile};

const CACHE_TTL: Duration = Duration::from_secs(300);
const CACHE_CAPACITY: u64 = 1000;

/// A successful login.
#[derive(Debug)]
pub struct LoginResult {
    pub token: SecretString,
    pub user: User,
}

/// The account cart plus the saved addresses that come with it.
#[derive(Debug, Clone, Default)]
pub struct AccountCart {
    pub items: Vec<CartItem>,
    pub addresses: Vec<Address>,
}

/// A backend order waiting for payment.
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    /// Handle the payment widget is opened with.
    pub gateway_order_id: GatewayOrderId,
    pub order: Order,
    pub transaction_id: Option<TransactionId>,
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the storefront backend.
///
/// Cheap to clone; clones share the HTTP connection pool and the catalog
/// cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    currency: CurrencyCode,
    cache: Cache<String, CacheValue>,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl BackendClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("vivahart-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.api_base_url.clone(),
                currency: config.payment.currency,
                cache,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    fn request(&self, method: Method, url: Url, token: Option<&SecretString>) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and decode the JSON body.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Backend returned non-success status for {what}"
            );
            let message = error_message(&response_text);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
                StatusCode::NOT_FOUND => ApiError::NotFound(what.to_string()),
                _ => ApiError::Status {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse backend response for {what}"
            );
            ApiError::Parse(format!("{what}: {e}"))
        })
    }

    /// Send a mutation and check the `{status}` acknowledgement.
    async fn execute_ack(&self, request: RequestBuilder, what: &str) -> Result<(), ApiError> {
        let ack: StatusEnvelope = self.execute(request, what).await?;
        match ack.status.as_deref() {
            None | Some(STATUS_SUCCESS) => Ok(()),
            Some(_) => Err(ApiError::Rejected(
                ack.message.unwrap_or_else(|| format!("{what} failed")),
            )),
        }
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` or `ApiError::Status` when the backend
    /// rejects the credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<LoginResult, ApiError> {
        let url = self.endpoint("users/login")?;
        let body = LoginRequest {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        let response: LoginResponse = self
            .execute(self.request(Method::POST, url, None).json(&body), "login")
            .await?;

        if response.token.trim().is_empty() {
            return Err(ApiError::Parse("login response carried an empty token".to_string()));
        }

        Ok(LoginResult {
            token: SecretString::from(response.token),
            user: response.user,
        })
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List products matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend reports failure.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let cache_key = query.cache_key();

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for {cache_key}");
            return Ok(products);
        }

        let mut url = self.endpoint("inventory/products")?;
        let pairs = query.pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        let envelope: DataEnvelope<Vec<ProductDto>> = self
            .execute(self.request(Method::GET, url, None), "products")
            .await?;

        if envelope.status.as_deref() != Some(STATUS_SUCCESS) {
            return Err(ApiError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "Failed to fetch products".to_string()),
            ));
        }

        let currency = self.inner.currency;
        let products: Vec<Product> = envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|dto| convert_product(dto, currency))
            .collect();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// List the subcategories of `category`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(category = %category))]
    pub async fn list_subcategories(
        &self,
        category: &CategoryId,
    ) -> Result<Vec<Subcategory>, ApiError> {
        let cache_key = format!("subcategories:{category}");

        if let Some(CacheValue::Subcategories(subcategories)) =
            self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for {cache_key}");
            return Ok(subcategories);
        }

        let url = self.endpoint(&format!("inventory/categories/{category}/subcategories"))?;
        let response: ListResponse<SubcategoryDto> = self
            .execute(self.request(Method::GET, url, None), "subcategories")
            .await?;

        let subcategories: Vec<Subcategory> = response
            .into_vec()
            .into_iter()
            .map(convert_subcategory)
            .collect();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Subcategories(subcategories.clone()))
            .await;

        Ok(subcategories)
    }

    /// Drop every cached catalog response.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Account cart
    // =========================================================================

    /// Fetch the account cart and saved addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn fetch_cart(&self, token: &SecretString) -> Result<AccountCart, ApiError> {
        let url = self.endpoint("users/cart-users")?;
        let envelope: DataEnvelope<Vec<CartUserDto>> = self
            .execute(self.request(Method::GET, url, Some(token)), "cart")
            .await?;

        if let Some(status) = envelope.status.as_deref()
            && status != STATUS_SUCCESS
        {
            return Err(ApiError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "Failed to fetch cart".to_string()),
            ));
        }

        let Some(account) = envelope.data.unwrap_or_default().into_iter().next() else {
            return Ok(AccountCart::default());
        };

        let currency = self.inner.currency;
        Ok(AccountCart {
            items: account
                .cart
                .into_iter()
                .filter_map(|line| convert_cart_line(line, currency))
                .collect(),
            addresses: account.addresses,
        })
    }

    /// Set the quantity of `product_id` in the account cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend refuses it.
    #[instrument(skip(self, token), fields(product_id = %product_id, quantity = quantity.get()))]
    pub async fn upsert_cart_item(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> Result<(), ApiError> {
        let url = self.endpoint("users/cart/add")?;
        let body = CartMutationRequest {
            product_id,
            quantity: quantity.get(),
        };
        self.execute_ack(
            self.request(Method::POST, url, Some(token)).json(&body),
            "cart add",
        )
        .await
    }

    /// Remove `product_id` from the account cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend refuses it.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn remove_cart_item(
        &self,
        token: &SecretString,
        product_id: &ProductId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint("users/cart/remove")?;
        let body = CartMutationRequest {
            product_id,
            quantity: 0,
        };
        self.execute_ack(
            self.request(Method::POST, url, Some(token)).json(&body),
            "cart remove",
        )
        .await
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Add `product_id` to the account wishlist.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` unless the backend answers `success`.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_to_wishlist(
        &self,
        token: &SecretString,
        product_id: &ProductId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint("users/wishlist/add")?;
        self.wishlist_call(Method::POST, url, token, product_id, "wishlist add")
            .await
    }

    /// Remove `product_id` from the account wishlist.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` unless the backend answers `success`.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn remove_from_wishlist(
        &self,
        token: &SecretString,
        product_id: &ProductId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint("users/wishlist/remove")?;
        self.wishlist_call(Method::DELETE, url, token, product_id, "wishlist remove")
            .await
    }

    async fn wishlist_call(
        &self,
        method: Method,
        url: Url,
        token: &SecretString,
        product_id: &ProductId,
        what: &str,
    ) -> Result<(), ApiError> {
        let body = WishlistRequest { product_id };
        let ack: StatusEnvelope = self
            .execute(self.request(method, url, Some(token)).json(&body), what)
            .await?;
        // Unlike the cart endpoints, a missing status is not a success here.
        if ack.status.as_deref() == Some(STATUS_SUCCESS) {
            Ok(())
        } else {
            Err(ApiError::Rejected(
                ack.message.unwrap_or_else(|| format!("{what} failed")),
            ))
        }
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Create an order for the account cart, shipped to `address`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` if the backend does not confirm the order
    /// is ready for payment.
    #[instrument(skip(self, token, address))]
    pub async fn create_order(
        &self,
        token: &SecretString,
        address: &Address,
    ) -> Result<CreatedOrder, ApiError> {
        let url = self.endpoint("orders/")?;
        let body = CreateOrderRequest {
            shipping_address: ShippingAddressRequest::from(address),
            payment_method: PAYMENT_METHOD,
        };
        let response: CreateOrderResponse = self
            .execute(
                self.request(Method::POST, url, Some(token)).json(&body),
                "create order",
            )
            .await?;

        if response.message.as_deref() != Some(ORDER_CREATED_MESSAGE) {
            return Err(ApiError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "Order was not created".to_string()),
            ));
        }

        let (Some(gateway_order_id), Some(order)) = (response.razorpay_order_id, response.order)
        else {
            return Err(ApiError::Parse(
                "order response is missing the gateway order id or the order".to_string(),
            ));
        };

        debug!(order_id = %order.id, "Order created");

        Ok(CreatedOrder {
            gateway_order_id: GatewayOrderId::new(gateway_order_id),
            order: convert_order(order, self.inner.currency),
            transaction_id: response.transaction_id.map(TransactionId::new),
        })
    }

    /// List the account's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn list_orders(&self, token: &SecretString) -> Result<Vec<Order>, ApiError> {
        let url = self.endpoint("orders/")?;
        let response: ListResponse<OrderDto> = self
            .execute(self.request(Method::GET, url, Some(token)), "orders")
            .await?;
        let currency = self.inner.currency;
        Ok(response
            .into_vec()
            .into_iter()
            .map(|dto| convert_order(dto, currency))
            .collect())
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order does not exist.
    #[instrument(skip(self, token), fields(order_id = %order_id))]
    pub async fn get_order(
        &self,
        token: &SecretString,
        order_id: &OrderId,
    ) -> Result<Order, ApiError> {
        let url = self.endpoint(&format!("orders/{order_id}"))?;
        let response: OrderResponse = self
            .execute(
                self.request(Method::GET, url, Some(token)),
                &format!("order {order_id}"),
            )
            .await?;
        Ok(convert_order(response.into_order(), self.inner.currency))
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Fetch the account profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Parse` if the response has no `user`.
    #[instrument(skip(self, token))]
    pub async fn get_profile(&self, token: &SecretString) -> Result<UserProfile, ApiError> {
        let url = self.endpoint("users/profile")?;
        let response: ProfileResponse = self
            .execute(self.request(Method::GET, url, Some(token)), "profile")
            .await?;
        let user = response
            .user
            .ok_or_else(|| ApiError::Parse("profile response has no user".to_string()))?;
        convert_profile(user, self.inner.currency)
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<StatusEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| body.chars().take(200).collect())
}
