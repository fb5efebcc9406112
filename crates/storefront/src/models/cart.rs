//! Cart line type.

use vivahart_core::{Price, ProductId, Quantity};

use super::Product;

/// One line of a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: Quantity,
    /// Image URL shown in the cart drawer.
    pub image: String,
}

impl CartItem {
    /// A fresh line for `product`.
    #[must_use]
    pub fn from_product(product: &Product, quantity: Quantity) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
            image: product.primary_image().to_string(),
        }
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity.get())
    }
}
