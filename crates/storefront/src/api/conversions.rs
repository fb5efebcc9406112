//! Conversions from wire types into domain models.

use vivahart_core::{CurrencyCode, Email, GatewayOrderId, OrderId, Price, Quantity, UserId};

use super::ApiError;
use super::types::{
    CartLineDto, ImageDto, OrderDto, OrderItemDto, OrderProductDto, ProductDto, ProfileDto, RefDto,
    SubcategoryDto, WishlistEntryDto,
};
use crate::models::{
    CartItem, Order, OrderItem, Product, ProductImage, Subcategory, UserProfile,
};

impl ImageDto {
    fn into_image(self) -> ProductImage {
        match self {
            Self::Object { url, key } => ProductImage { url, key },
            Self::Url(url) => ProductImage { url, key: None },
        }
    }

    fn url(&self) -> &str {
        match self {
            Self::Object { url, .. } | Self::Url(url) => url,
        }
    }
}

impl RefDto {
    /// Display name, only known when the backend populated the reference.
    fn into_name(self) -> Option<String> {
        match self {
            Self::Named { name } => Some(name),
            Self::Id(_) => None,
        }
    }
}

pub(crate) fn convert_product(dto: ProductDto, currency: CurrencyCode) -> Product {
    Product {
        id: dto.id,
        name: dto.name,
        description: dto.description,
        short_description: dto.short_description,
        price: Price::new(dto.selling_price, currency),
        original_price: dto.original_price.map(|amount| Price::new(amount, currency)),
        images: dto
            .images
            .into_iter()
            .map(ImageDto::into_image)
            .filter(|image| !image.url.is_empty())
            .collect(),
        category: dto.category.and_then(RefDto::into_name),
        subcategory: dto.subcategory.and_then(RefDto::into_name),
        total_stock: u32::try_from(dto.total_stock.max(0)).unwrap_or(u32::MAX),
        is_active: dto.is_active,
    }
}

pub(crate) fn convert_subcategory(dto: SubcategoryDto) -> Subcategory {
    Subcategory {
        id: dto.id,
        name: dto.name,
        image: dto
            .background_image
            .map(|image| image.url().to_string())
            .filter(|url| !url.is_empty()),
    }
}

/// Convert a server cart line. Lines whose product has been deleted are
/// dropped, and quantities are clamped into the valid range.
pub(crate) fn convert_cart_line(dto: CartLineDto, currency: CurrencyCode) -> Option<CartItem> {
    let product = convert_product(dto.product?, currency);
    Some(CartItem::from_product(
        &product,
        Quantity::clamped(dto.quantity),
    ))
}

fn convert_order_item(dto: OrderItemDto, currency: CurrencyCode) -> OrderItem {
    let (product_id, name, image) = match dto.product {
        Some(OrderProductDto::Populated { id, name, images }) => {
            let image = images.into_iter().next().map(|i| i.url().to_string());
            (Some(id), name, image)
        }
        Some(OrderProductDto::Id(id)) => (Some(id), String::new(), None),
        None => (None, String::new(), None),
    };
    OrderItem {
        product_id,
        name,
        image,
        quantity: dto.quantity,
        price: dto.price.map(|amount| Price::new(amount, currency)),
    }
}

pub(crate) fn convert_order(dto: OrderDto, currency: CurrencyCode) -> Order {
    Order {
        id: OrderId::new(dto.id),
        items: dto
            .items
            .into_iter()
            .map(|item| convert_order_item(item, currency))
            .collect(),
        total_amount: dto.total_amount.map(|amount| Price::new(amount, currency)),
        shipping_charges: dto
            .shipping_charges
            .map(|amount| Price::new(amount, currency)),
        payment_method: dto.payment_method,
        payment_status: dto.payment_status,
        status: dto.status,
        delivery_status: dto.delivery_status,
        gateway_order_id: dto.razorpay_order_id.map(GatewayOrderId::new),
        shipping_address: dto.shipping_address,
        created_at: dto.created_at,
        updated_at: dto.updated_at,
    }
}

pub(crate) fn convert_profile(
    dto: ProfileDto,
    currency: CurrencyCode,
) -> Result<UserProfile, ApiError> {
    let email = Email::parse(&dto.email)
        .map_err(|e| ApiError::Parse(format!("profile email {:?}: {e}", dto.email)))?;

    let mut wishlist_ids = Vec::with_capacity(dto.wishlist.len());
    let mut wishlist = Vec::new();
    for entry in dto.wishlist {
        match entry {
            WishlistEntryDto::Product(product) => {
                wishlist_ids.push(product.id.clone());
                wishlist.push(convert_product(*product, currency));
            }
            WishlistEntryDto::Id(id) => wishlist_ids.push(id),
        }
    }

    Ok(UserProfile {
        id: UserId::new(dto.id),
        first_name: dto.first_name,
        last_name: dto.last_name,
        email,
        phone_number: dto.phone_number.filter(|p| !p.trim().is_empty()),
        email_verified: dto.is_email_verified,
        active: dto.is_active,
        role: dto.role.unwrap_or_else(|| "user".to_string()),
        wishlist_ids,
        wishlist,
        addresses: dto.addresses,
        last_login: dto.last_login,
        created_at: dto.created_at,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::PLACEHOLDER_IMAGE;

    fn product_dto(json: &str) -> ProductDto {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_convert_product() {
        let dto = product_dto(
            r#"{"_id":"p1","name":"Zari Rakhi","sellingPrice":"249.50",
                "images":[{"url":""},{"url":"https://cdn/z.jpg","key":"z"}],
                "category":{"name":"Rakhi"},"totalStock":-3}"#,
        );
        let product = convert_product(dto, CurrencyCode::INR);
        assert_eq!(product.price.amount, Decimal::new(24950, 2));
        assert_eq!(product.primary_image(), "https://cdn/z.jpg");
        assert_eq!(product.category.as_deref(), Some("Rakhi"));
        assert_eq!(product.total_stock, 0);
    }

    #[test]
    fn test_convert_cart_line_clamps_and_drops_deleted() {
        let line: CartLineDto = serde_json::from_str(
            r#"{"product":{"_id":"p1","name":"Rakhi","sellingPrice":399},"quantity":25}"#,
        )
        .unwrap();
        let item = convert_cart_line(line, CurrencyCode::INR).unwrap();
        assert_eq!(item.quantity.get(), 10);
        assert_eq!(item.image, PLACEHOLDER_IMAGE);

        let deleted: CartLineDto = serde_json::from_str(r#"{"product":null,"quantity":1}"#).unwrap();
        assert!(convert_cart_line(deleted, CurrencyCode::INR).is_none());
    }

    #[test]
    fn test_convert_profile_mixed_wishlist() {
        let dto: ProfileDto = serde_json::from_str(
            r#"{"_id":"u1","email":"asha@example.com","firstName":"Asha",
                "wishlist":["p9",{"_id":"p1","name":"Rakhi","sellingPrice":"399"}],
                "addresses":[{"street":"1 Main","city":"Pune","state":"MH","postalCode":"411001","country":"India","isDefault":true}]}"#,
        )
        .unwrap();
        let profile = convert_profile(dto, CurrencyCode::INR).unwrap();
        assert_eq!(profile.wishlist_ids.len(), 2);
        assert_eq!(profile.wishlist.len(), 1);
        assert_eq!(profile.role, "user");
        assert!(profile.default_address().is_some());
    }

    #[test]
    fn test_convert_profile_bad_email() {
        let dto: ProfileDto = serde_json::from_str(r#"{"_id":"u1","email":"nope"}"#).unwrap();
        assert!(matches!(
            convert_profile(dto, CurrencyCode::INR),
            Err(ApiError::Parse(_))
        ));
    }
}
