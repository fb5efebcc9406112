//! Catalog views: the category browser and the best-seller grid.
//!
//! Both fetch through [`BackendClient`](crate::api::BackendClient), whose
//! catalog cache keeps repeat visits off the network, and turn products into
//! view models with display prices worked out.

mod best_sellers;
mod categories;

pub use best_sellers::{BEST_SELLER_BADGES, BEST_SELLER_COUNT, BestSellerCard, BestSellers};
pub use categories::{
    ALL_TAB_ID, ALL_TAB_NAME, CategoryBrowser, CategoryProduct, CategoryTab, INITIAL_ROWS,
    PRODUCTS_PER_ROW,
};

use rust_decimal::Decimal;
use vivahart_core::Price;

/// `price` scaled by `factor`, rounded to paise. Saturates at the decimal range.
fn marked_up(price: Price, factor: Decimal) -> Price {
    Price::new(
        price.amount.saturating_mul(factor).round_dp(2),
        price.currency_code,
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use rust_decimal::Decimal;
    use vivahart_core::{CurrencyCode, Price, ProductId};

    use crate::models::Product;

    pub fn product(id: &str, price: i64, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Rakhi {id}"),
            description: String::new(),
            short_description: String::new(),
            price: Price::new(Decimal::from(price), CurrencyCode::INR),
            original_price: None,
            images: vec![],
            category: None,
            subcategory: None,
            total_stock: stock,
            is_active: true,
        }
    }
}
