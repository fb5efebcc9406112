//! Catalog domain types.

use rust_decimal::Decimal;
use vivahart_core::{CategoryId, Price, ProductId};

use super::PLACEHOLDER_IMAGE;

/// A product as listed in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub short_description: String,
    /// Current selling price.
    pub price: Price,
    /// Pre-discount price, when the backend sends one.
    pub original_price: Option<Price>,
    pub images: Vec<ProductImage>,
    /// Category display name, if the backend populated it.
    pub category: Option<String>,
    /// Subcategory display name, if the backend populated it.
    pub subcategory: Option<String>,
    pub total_stock: u32,
    pub is_active: bool,
}

/// A product image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductImage {
    pub url: String,
    /// Storage key at the image host.
    pub key: Option<String>,
}

/// A subcategory of the browsed category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subcategory {
    pub id: CategoryId,
    pub name: String,
    pub image: Option<String>,
}

impl Product {
    /// URL of the first image, or the placeholder.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.images
            .first()
            .map_or(PLACEHOLDER_IMAGE, |image| image.url.as_str())
    }

    /// Whether any stock is left.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.total_stock > 0
    }

    /// Percentage off the backend-supplied original price, rounded.
    ///
    /// `None` when there is no original price or it isn't above the
    /// selling price.
    #[must_use]
    pub fn sale_percentage(&self) -> Option<u32> {
        let original = self.original_price?;
        discount_percent(original.amount, self.price.amount)
    }
}

/// Rounded percentage saved going from `original` to `price`.
#[must_use]
pub fn discount_percent(original: Decimal, price: Decimal) -> Option<u32> {
    if original <= Decimal::ZERO || original <= price {
        return None;
    }
    let percent = original
        .checked_sub(price)?
        .checked_div(original)?
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round();
    u32::try_from(percent).ok()
}

#[cfg(test)]
mod tests {
    use vivahart_core::CurrencyCode;

    use super::*;

    fn product(price: i64, original: Option<i64>) -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Peacock Rakhi".to_string(),
            description: String::new(),
            short_description: String::new(),
            price: Price::new(Decimal::from(price), CurrencyCode::INR),
            original_price: original.map(|o| Price::new(Decimal::from(o), CurrencyCode::INR)),
            images: vec![],
            category: None,
            subcategory: None,
            total_stock: 0,
            is_active: true,
        }
    }

    #[test]
    fn test_primary_image_placeholder() {
        assert_eq!(product(399, None).primary_image(), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_sale_percentage() {
        assert_eq!(product(300, Some(400)).sale_percentage(), Some(25));
        assert_eq!(product(399, None).sale_percentage(), None);
        assert_eq!(product(500, Some(400)).sale_percentage(), None);
    }

    #[test]
    fn test_discount_percent_out_of_range() {
        assert_eq!(discount_percent(Decimal::ONE, Decimal::MIN), None);
        assert_eq!(discount_percent(Decimal::MAX, Decimal::MIN), None);
        assert_eq!(discount_percent(Decimal::MAX, Decimal::ZERO), Some(100));
    }

    #[test]
    fn test_in_stock() {
        assert!(!product(399, None).in_stock());
    }
}
