//! Order snapshots, read-only on this side.

use chrono::{DateTime, Utc};

use vivahart_core::{
    DeliveryStatus, GatewayOrderId, OrderId, OrderStatus, PaymentStatus, Price, ProductId,
};

use super::Address;

/// An order as returned by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<OrderItem>,
    pub total_amount: Option<Price>,
    pub shipping_charges: Option<Price>,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub delivery_status: DeliveryStatus,
    pub gateway_order_id: Option<GatewayOrderId>,
    pub shipping_address: Option<Address>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    /// Absent when the product has since been deleted.
    pub product_id: Option<ProductId>,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub price: Option<Price>,
}

impl Order {
    /// Sum of item quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Order total, falling back to the sum of priced lines plus shipping
    /// when the backend left the total out.
    #[must_use]
    pub fn effective_total(&self) -> Option<Price> {
        if let Some(total) = self.total_amount {
            return Some(total);
        }
        let mut lines = self
            .items
            .iter()
            .filter_map(|item| item.price.map(|p| p.times(item.quantity)));
        let first = lines.next()?;
        let subtotal = lines.fold(first, |acc, line| acc.plus(&line));
        Some(
            self.shipping_charges
                .map_or(subtotal, |shipping| subtotal.plus(&shipping)),
        )
    }
}
