//! Wire types for the backend REST API.
//!
//! These mirror the JSON the backend actually sends (Mongo-style `_id`
//! fields, camelCase keys, amounts that are sometimes numbers and sometimes
//! strings) and are converted into [`crate::models`] types before leaving the
//! `api` module.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use vivahart_core::{CategoryId, DeliveryStatus, OrderStatus, PaymentStatus, ProductId};

use crate::models::{Address, User};

/// Value of `status` on successful envelope responses.
pub const STATUS_SUCCESS: &str = "success";

/// Message the backend sends when an order is ready for payment.
pub const ORDER_CREATED_MESSAGE: &str = "Order created, proceed to payment";

/// Payment method sent with every order.
pub const PAYMENT_METHOD: &str = "Razorpay";

// =============================================================================
// Queries
// =============================================================================

/// Filters and paging for the product listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Sort expression, e.g. `-createdAt` for newest first.
    pub sort: Option<String>,
    pub category: Option<CategoryId>,
    pub subcategory: Option<CategoryId>,
}

impl ProductQuery {
    /// Unfiltered listing (what the best-seller grid asks for).
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// First page of 100 newest products in `category`.
    #[must_use]
    pub fn for_category(category: CategoryId) -> Self {
        Self {
            page: Some(1),
            limit: Some(100),
            sort: Some("-createdAt".to_string()),
            category: Some(category),
            subcategory: None,
        }
    }

    /// Narrow to one subcategory.
    #[must_use]
    pub fn with_subcategory(mut self, subcategory: Option<CategoryId>) -> Self {
        self.subcategory = subcategory;
        self
    }

    /// Query-string pairs in the order the backend documents them.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.to_string()));
        }
        if let Some(subcategory) = &self.subcategory {
            pairs.push(("subcategory", subcategory.to_string()));
        }
        pairs
    }

    /// Stable cache key for this query.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let body = self
            .pairs()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("products:{body}")
    }
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartMutationRequest<'a> {
    pub product_id: &'a ProductId,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WishlistRequest<'a> {
    pub product_id: &'a ProductId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ShippingAddressRequest<'a> {
    pub street: &'a str,
    pub city: &'a str,
    pub state: &'a str,
    pub postal_code: &'a str,
    pub country: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateOrderRequest<'a> {
    pub shipping_address: ShippingAddressRequest<'a>,
    pub payment_method: &'static str,
}

impl<'a> From<&'a Address> for ShippingAddressRequest<'a> {
    fn from(address: &'a Address) -> Self {
        Self {
            street: &address.street,
            city: &address.city,
            state: &address.state,
            postal_code: &address.postal_code,
            country: &address.country,
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// `{status, message}` acknowledgement of a mutation.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `{status, data}` wrapper around listings.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

/// A listing sent either as a bare array or wrapped in `{data: [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListResponse<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListResponse<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { data: items } => items,
        }
    }
}

/// A single order, bare or wrapped in `{order: {...}}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OrderResponse {
    Wrapped { order: OrderDto },
    Bare(OrderDto),
}

impl OrderResponse {
    pub fn into_order(self) -> OrderDto {
        match self {
            Self::Wrapped { order } | Self::Bare(order) => order,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ImageDto {
    Object {
        url: String,
        #[serde(default)]
        key: Option<String>,
    },
    Url(String),
}

/// A category reference: either a bare id or a populated document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RefDto {
    Named { name: String },
    Id(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductDto {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub images: Vec<ImageDto>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(deserialize_with = "de_amount")]
    pub selling_price: Decimal,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub category: Option<RefDto>,
    #[serde(default)]
    pub subcategory: Option<RefDto>,
    #[serde(default)]
    pub total_stock: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubcategoryDto {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub background_image: Option<ImageDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CartLineDto {
    /// Null when the product was deleted after being added.
    #[serde(default)]
    pub product: Option<ProductDto>,
    #[serde(default)]
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CartUserDto {
    #[serde(default)]
    pub cart: Vec<CartLineDto>,
    #[serde(default)]
    pub addresses: Vec<Address>,
}

/// Product inside an order line: populated document or bare id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OrderProductDto {
    Populated {
        #[serde(rename = "_id")]
        id: ProductId,
        #[serde(default)]
        name: String,
        #[serde(default)]
        images: Vec<ImageDto>,
    },
    Id(ProductId),
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderItemDto {
    #[serde(default)]
    pub product: Option<OrderProductDto>,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderDto {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub items: Vec<OrderItemDto>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub total_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub shipping_charges: Option<Decimal>,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub delivery_status: DeliveryStatus,
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateOrderResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
    #[serde(default)]
    pub order: Option<OrderDto>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Wishlist entry: populated product or bare id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WishlistEntryDto {
    Product(Box<ProductDto>),
    Id(ProductId),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileDto {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub is_email_verified: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub wishlist: Vec<WishlistEntryDto>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileResponse {
    #[serde(default)]
    pub user: Option<ProfileDto>,
}

// =============================================================================
// Helpers
// =============================================================================

const fn default_true() -> bool {
    true
}

/// Parse an amount sent as a JSON number or a numeric string.
fn parse_amount(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => n.to_string().parse::<Decimal>().ok().or_else(|| {
            n.as_f64()
                .and_then(|f| Decimal::from_f64_retain(f).map(|d| d.normalize()))
        }),
        serde_json::Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

fn de_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    parse_amount(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid amount: {value}")))
}

fn de_opt_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Decimal>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_amount))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_query_pairs() {
        let query = ProductQuery::for_category(CategoryId::new("cat1"))
            .with_subcategory(Some(CategoryId::new("sub1")));
        assert_eq!(
            query.pairs(),
            vec![
                ("page", "1".to_string()),
                ("limit", "100".to_string()),
                ("sort", "-createdAt".to_string()),
                ("category", "cat1".to_string()),
                ("subcategory", "sub1".to_string()),
            ]
        );
        assert_eq!(
            query.cache_key(),
            "products:page=1&limit=100&sort=-createdAt&category=cat1&subcategory=sub1"
        );
        assert!(ProductQuery::all().pairs().is_empty());
    }

    #[test]
    fn test_product_dto_flexible_fields() {
        let dto: ProductDto = serde_json::from_str(
            r#"{
                "_id": "p1",
                "name": "Peacock Rakhi",
                "images": [{"url": "https://cdn/p1.jpg", "key": "p1", "_id": "i1"}],
                "sellingPrice": "399",
                "originalPrice": 499,
                "category": {"_id": "c1", "name": "Rakhi"},
                "subcategory": "s1",
                "totalStock": 12
            }"#,
        )
        .unwrap();
        assert_eq!(dto.selling_price, Decimal::from(399));
        assert_eq!(dto.original_price, Some(Decimal::from(499)));
        assert!(matches!(dto.category, Some(RefDto::Named { .. })));
        assert!(matches!(dto.subcategory, Some(RefDto::Id(_))));
        assert!(dto.is_active);
    }

    #[test]
    fn test_order_dto_amounts_and_unknown_status() {
        let dto: OrderDto = serde_json::from_str(
            r#"{
                "_id": "o1",
                "items": [{"product": "p1", "quantity": 2, "price": "199.50"}],
                "totalAmount": "399",
                "shippingCharges": null,
                "paymentStatus": "authorised",
                "deliveryStatus": "pending",
                "createdAt": "2025-07-10T12:00:00.000Z"
            }"#,
        )
        .unwrap();
        assert_eq!(dto.total_amount, Some(Decimal::from(399)));
        assert_eq!(dto.shipping_charges, None);
        assert_eq!(dto.payment_status, PaymentStatus::Unknown);
        assert_eq!(dto.items[0].price, Some(Decimal::new(19950, 2)));
        assert!(dto.created_at.is_some());
    }

    #[test]
    fn test_list_and_order_responses_accept_both_shapes() {
        let bare: ListResponse<SubcategoryDto> =
            serde_json::from_str(r#"[{"_id":"s1","name":"Kids"}]"#).unwrap();
        assert_eq!(bare.into_vec().len(), 1);

        let wrapped: ListResponse<SubcategoryDto> =
            serde_json::from_str(r#"{"data":[{"_id":"s1","name":"Kids"}]}"#).unwrap();
        assert_eq!(wrapped.into_vec().len(), 1);

        let order: OrderResponse = serde_json::from_str(r#"{"order":{"_id":"o1"}}"#).unwrap();
        assert_eq!(order.into_order().id, "o1");
        let order: OrderResponse = serde_json::from_str(r#"{"_id":"o2"}"#).unwrap();
        assert_eq!(order.into_order().id, "o2");
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(&serde_json::json!("abc")), None);
        assert_eq!(parse_amount(&serde_json::json!(true)), None);
        assert_eq!(
            parse_amount(&serde_json::json!(12.5)),
            Some(Decimal::new(125, 1))
        );
    }

    #[test]
    fn test_create_order_request_shape() {
        let address = Address {
            street: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            postal_code: "560001".to_string(),
            country: "India".to_string(),
            is_default: true,
            id: None,
        };
        let body = CreateOrderRequest {
            shipping_address: ShippingAddressRequest::from(&address),
            payment_method: PAYMENT_METHOD,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["shippingAddress"]["postalCode"], "560001");
        assert_eq!(json["paymentMethod"], "Razorpay");
        assert!(json["shippingAddress"].get("isDefault").is_none());
    }
}
