//! In-memory cart lines shared by both cart kinds.

use vivahart_core::{CurrencyCode, Price, ProductId, Quantity};

use crate::models::CartItem;

/// Ordered list of cart lines, at most one per product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartLines {
    items: Vec<CartItem>,
}

impl CartLines {
    #[must_use]
    pub const fn new(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    /// Add `item`, merging into an existing line for the same product.
    ///
    /// Returns the line's resulting quantity, capped at `Quantity::MAX`.
    pub fn add(&mut self, item: CartItem) -> Quantity {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|line| line.product_id == item.product_id)
        {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            return existing.quantity;
        }
        let quantity = item.quantity;
        self.items.push(item);
        quantity
    }

    /// Set the quantity of an existing line. Returns false if absent.
    pub fn set(&mut self, product_id: &ProductId, quantity: Quantity) -> bool {
        match self
            .items
            .iter_mut()
            .find(|line| &line.product_id == product_id)
        {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove a line. Returns false if absent.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|line| &line.product_id != product_id);
        self.items.len() != before
    }

    /// Remove every line, returning them.
    pub fn take(&mut self) -> Vec<CartItem> {
        std::mem::take(&mut self.items)
    }

    pub fn replace(&mut self, items: Vec<CartItem>) {
        self.items = items;
    }

    /// Sum of unit price times quantity.
    #[must_use]
    pub fn total(&self, currency: CurrencyCode) -> Price {
        self.items
            .iter()
            .fold(Price::zero(currency), |acc, item| acc.plus(&item.line_total()))
    }

    /// Sum of quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity.get()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::PLACEHOLDER_IMAGE;

    fn item(id: &str, price: i64, quantity: i64) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Rakhi {id}"),
            unit_price: Price::new(Decimal::from(price), CurrencyCode::INR),
            quantity: Quantity::clamped(quantity),
            image: PLACEHOLDER_IMAGE.to_string(),
        }
    }

    #[test]
    fn test_add_merges_same_product() {
        let mut lines = CartLines::new(vec![item("p1", 399, 3)]);
        let quantity = lines.add(item("p1", 399, 1));
        assert_eq!(quantity.get(), 4);
        assert_eq!(lines.items().len(), 1);
        assert_eq!(lines.total(CurrencyCode::INR).amount, Decimal::from(1596));
    }

    #[test]
    fn test_add_caps_at_max() {
        let mut lines = CartLines::new(vec![item("p1", 100, 9)]);
        assert_eq!(lines.add(item("p1", 100, 5)).get(), Quantity::MAX);
    }

    #[test]
    fn test_set_and_remove() {
        let mut lines = CartLines::new(vec![item("p1", 100, 1), item("p2", 50, 2)]);
        assert!(lines.set(&ProductId::new("p2"), Quantity::clamped(5)));
        assert!(!lines.set(&ProductId::new("p9"), Quantity::ONE));
        assert_eq!(lines.item_count(), 6);

        assert!(lines.remove(&ProductId::new("p1")));
        assert!(!lines.remove(&ProductId::new("p1")));
        assert_eq!(lines.items().len(), 1);
    }

    #[test]
    fn test_empty_total_is_zero() {
        let lines = CartLines::default();
        assert!(lines.is_empty());
        assert_eq!(lines.total(CurrencyCode::INR), Price::zero(CurrencyCode::INR));
    }
}
