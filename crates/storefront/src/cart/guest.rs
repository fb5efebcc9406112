//! Guest cart kept in durable storage under `cartItems`.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use vivahart_core::{CurrencyCode, Price, ProductId, Quantity};

use crate::models::{CartItem, PLACEHOLDER_IMAGE};
use crate::storage::{DurableStorage, StorageError, keys};

/// Stored shape of one guest cart line.
#[derive(Debug, Serialize, Deserialize)]
struct StoredLine {
    id: ProductId,
    #[serde(default)]
    name: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    #[serde(default)]
    quantity: Quantity,
    #[serde(default)]
    image: Option<String>,
}

impl StoredLine {
    fn into_item(self, currency: CurrencyCode) -> CartItem {
        CartItem {
            product_id: self.id,
            name: self.name,
            unit_price: Price::new(self.price, currency),
            quantity: self.quantity,
            image: self
                .image
                .filter(|image| !image.is_empty())
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        }
    }

    fn from_item(item: &CartItem) -> Self {
        Self {
            id: item.product_id.clone(),
            name: item.name.clone(),
            price: item.unit_price.amount,
            quantity: item.quantity,
            image: Some(item.image.clone()),
        }
    }
}

/// Reads and writes the guest cart list.
#[derive(Clone)]
pub struct GuestCart {
    storage: Arc<dyn DurableStorage>,
    currency: CurrencyCode,
}

impl std::fmt::Debug for GuestCart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestCart")
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

impl GuestCart {
    #[must_use]
    pub fn new(storage: Arc<dyn DurableStorage>, currency: CurrencyCode) -> Self {
        Self { storage, currency }
    }

    /// Read the stored list. A list that fails to parse reads as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn read(&self) -> Result<Vec<CartItem>, StorageError> {
        let Some(raw) = self.storage.get(keys::CART_ITEMS)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<StoredLine>>(&raw) {
            Ok(lines) => Ok(lines
                .into_iter()
                .map(|line| line.into_item(self.currency))
                .collect()),
            Err(e) => {
                warn!(error = %e, "Stored guest cart is unreadable, starting empty");
                Ok(Vec::new())
            }
        }
    }

    /// Replace the stored list.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn write(&self, items: &[CartItem]) -> Result<(), StorageError> {
        let lines: Vec<StoredLine> = items.iter().map(StoredLine::from_item).collect();
        // A Vec of plain structs always serializes.
        let body = serde_json::to_string(&lines).unwrap_or_else(|_| "[]".to_string());
        self.storage.set(keys::CART_ITEMS, &body)
    }

    /// Drop the stored list.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(keys::CART_ITEMS)
    }
}
