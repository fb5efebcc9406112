//! Cart reconciler.
//!
//! A [`Cart`] is backed either by durable storage (guest) or by the backend
//! account cart (logged in). Which one is decided when the cart is built from
//! the session; callers use the same operations either way.
//!
//! Mutations update the in-memory lines first and then touch the store. A
//! failed store write or backend call is returned as an error but the
//! in-memory lines are not rolled back.

mod guest;
mod lines;
mod remote;

pub use guest::GuestCart;
pub use lines::CartLines;
pub use remote::RemoteCart;

use std::sync::Arc;

use secrecy::SecretString;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use vivahart_core::{CurrencyCode, Price, ProductId, Quantity, QuantityChange};

use crate::api::{ApiError, BackendClient};
use crate::error::{AppError, ValidationError};
use crate::models::{Address, CartItem, Product};
use crate::session::Session;
use crate::storage::{DurableStorage, StorageError};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("cart request failed: {0}")]
    Api(#[from] ApiError),

    #[error("cart storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::Api(e) => Self::Network(e),
            CartError::Storage(e) => Self::Storage(e),
            CartError::NotInCart(id) => {
                Self::Validation(ValidationError::NotInCart(id.into_inner()))
            }
        }
    }
}

/// Where the cart lines live.
#[derive(Debug, Clone)]
pub enum CartStore {
    Guest(GuestCart),
    Remote(RemoteCart),
}

/// The active cart.
#[derive(Debug, Clone)]
pub struct Cart {
    store: CartStore,
    lines: CartLines,
    currency: CurrencyCode,
}

impl Cart {
    /// Guest cart, read from storage right away.
    pub fn guest(storage: Arc<dyn DurableStorage>, currency: CurrencyCode) -> Self {
        let store = GuestCart::new(storage, currency);
        let items = store.read().unwrap_or_else(|e| {
            warn!(error = %e, "Could not read guest cart, starting empty");
            Vec::new()
        });
        Self {
            store: CartStore::Guest(store),
            lines: CartLines::new(items),
            currency,
        }
    }

    /// Account cart. Empty until [`Cart::load`] is called.
    #[must_use]
    pub fn remote(api: BackendClient, token: SecretString, currency: CurrencyCode) -> Self {
        Self {
            store: CartStore::Remote(RemoteCart::new(api, token)),
            lines: CartLines::default(),
            currency,
        }
    }

    /// The cart matching `session`: remote when a token is present.
    pub fn for_session(
        session: &Session,
        api: &BackendClient,
        storage: Arc<dyn DurableStorage>,
        currency: CurrencyCode,
    ) -> Self {
        match session.token() {
            Some(token) => Self::remote(api.clone(), token.clone(), currency),
            None => Self::guest(storage, currency),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &CartStore {
        &self.store
    }

    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self.store, CartStore::Remote(_))
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.lines.items()
    }

    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.lines.get(product_id)
    }

    /// Sum of unit price times quantity.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.total(self.currency)
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.item_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Refresh the lines from the store.
    ///
    /// Returns the saved addresses that come with the account cart (always
    /// empty for a guest cart).
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    #[instrument(skip(self), fields(remote = self.is_remote()))]
    pub async fn load(&mut self) -> Result<Vec<Address>, CartError> {
        match &self.store {
            CartStore::Guest(store) => {
                self.lines.replace(store.read()?);
                Ok(Vec::new())
            }
            CartStore::Remote(store) => {
                let account = store.fetch().await?;
                self.lines.replace(account.items);
                Ok(account.addresses)
            }
        }
    }

    /// Add `quantity` of `product`, merging with an existing line.
    ///
    /// Returns the line's resulting quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write or backend call fails; the
    /// in-memory line is updated regardless.
    #[instrument(skip(self, product), fields(product_id = %product.id, quantity = quantity.get()))]
    pub async fn add_item(
        &mut self,
        product: &Product,
        quantity: Quantity,
    ) -> Result<Quantity, CartError> {
        let item = CartItem::from_product(product, quantity);
        match &self.store {
            CartStore::Guest(store) => {
                self.lines.replace(store.read()?);
                let resulting = self.lines.add(item);
                store.write(self.lines.items())?;
                Ok(resulting)
            }
            CartStore::Remote(store) => {
                let resulting = self.lines.add(item);
                store.upsert(&product.id, resulting).await?;
                Ok(resulting)
            }
        }
    }

    /// Change a line's quantity by `delta`.
    ///
    /// A result of zero or below removes the line; anything else is clamped
    /// to `1..=10`. Returns the new quantity, or `None` if the line was
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotInCart` if there is no such line, or a store
    /// error.
    pub async fn update_quantity(
        &mut self,
        product_id: &ProductId,
        delta: i64,
    ) -> Result<Option<Quantity>, CartError> {
        self.sync_guest()?;
        let current = self
            .lines
            .get(product_id)
            .map(|item| item.quantity)
            .ok_or_else(|| CartError::NotInCart(product_id.clone()))?;
        self.apply(product_id, current.apply_delta(delta)).await
    }

    /// Set a line's quantity outright. Zero or below removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotInCart` if there is no such line, or a store
    /// error.
    pub async fn set_quantity(
        &mut self,
        product_id: &ProductId,
        requested: i64,
    ) -> Result<Option<Quantity>, CartError> {
        self.sync_guest()?;
        if self.lines.get(product_id).is_none() {
            return Err(CartError::NotInCart(product_id.clone()));
        }
        self.apply(product_id, Quantity::request(requested)).await
    }

    async fn apply(
        &mut self,
        product_id: &ProductId,
        change: QuantityChange,
    ) -> Result<Option<Quantity>, CartError> {
        match change {
            QuantityChange::Remove => {
                self.remove_item(product_id).await?;
                Ok(None)
            }
            QuantityChange::Set(quantity) => {
                self.lines.set(product_id, quantity);
                match &self.store {
                    CartStore::Guest(store) => store.write(self.lines.items())?,
                    CartStore::Remote(store) => store.upsert(product_id, quantity).await?,
                }
                Ok(Some(quantity))
            }
        }
    }

    /// Remove a line.
    ///
    /// The account cart always gets exactly one remove call, even if the
    /// line wasn't known locally.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write or backend call fails; the line
    /// is gone from memory regardless.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&mut self, product_id: &ProductId) -> Result<(), CartError> {
        match &self.store {
            CartStore::Guest(store) => {
                self.lines.replace(store.read()?);
                if self.lines.remove(product_id) {
                    store.write(self.lines.items())?;
                }
                Ok(())
            }
            CartStore::Remote(store) => {
                self.lines.remove(product_id);
                store.remove(product_id).await?;
                Ok(())
            }
        }
    }

    /// Empty the cart and its store.
    ///
    /// The account cart gets one remove call per line; every call is tried
    /// and the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns the first store or backend error.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) -> Result<(), CartError> {
        let removed = self.lines.take();
        match &self.store {
            CartStore::Guest(store) => {
                store.clear()?;
                Ok(())
            }
            CartStore::Remote(store) => {
                let mut first_error = None;
                for item in &removed {
                    if let Err(e) = store.remove(&item.product_id).await {
                        warn!(product_id = %item.product_id, error = %e, "Could not remove cart line");
                        first_error.get_or_insert(e);
                    }
                }
                debug!(lines = removed.len(), "Cleared account cart");
                first_error.map_or(Ok(()), |e| Err(e.into()))
            }
        }
    }

    /// Re-read a guest cart so edits apply to what storage holds.
    fn sync_guest(&mut self) -> Result<(), CartError> {
        if let CartStore::Guest(store) = &self.store {
            self.lines.replace(store.read()?);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::storage::{MemoryStorage, keys};

    fn product(id: &str, price: i64) -> Product {
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
            total_stock: 5,
            is_active: true,
        }
    }

    fn guest() -> (Arc<MemoryStorage>, Cart) {
        let storage = Arc::new(MemoryStorage::new());
        let cart = Cart::guest(storage.clone(), CurrencyCode::INR);
        (storage, cart)
    }

    #[tokio::test]
    async fn test_guest_add_merges_and_persists() {
        let (storage, mut cart) = guest();
        let p1 = product("p1", 399);

        cart.add_item(&p1, Quantity::clamped(3)).await.unwrap();
        let quantity = cart.add_item(&p1, Quantity::ONE).await.unwrap();

        assert_eq!(quantity.get(), 4);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total().amount, Decimal::from(1596));

        let reopened = Cart::guest(storage, CurrencyCode::INR);
        assert_eq!(reopened.items(), cart.items());
    }

    #[tokio::test]
    async fn test_guest_update_quantity_clamps_and_removes() {
        let (_, mut cart) = guest();
        let id = ProductId::new("p1");
        cart.add_item(&product("p1", 100), Quantity::clamped(2)).await.unwrap();

        assert_eq!(cart.update_quantity(&id, 50).await.unwrap().unwrap().get(), 10);
        assert_eq!(cart.update_quantity(&id, -9).await.unwrap().unwrap().get(), 1);
        assert_eq!(cart.update_quantity(&id, -1).await.unwrap(), None);
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_set_quantity_zero_removes() {
        let (storage, mut cart) = guest();
        let id = ProductId::new("p1");
        cart.add_item(&product("p1", 100), Quantity::ONE).await.unwrap();

        assert_eq!(cart.set_quantity(&id, 0).await.unwrap(), None);
        assert_eq!(storage.get(keys::CART_ITEMS).unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_update_missing_line() {
        let (_, mut cart) = guest();
        let err = cart
            .update_quantity(&ProductId::new("nope"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::NotInCart(_)));
    }

    #[tokio::test]
    async fn test_guest_clear_removes_key() {
        let (storage, mut cart) = guest();
        cart.add_item(&product("p1", 100), Quantity::ONE).await.unwrap();
        cart.clear().await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(storage.get(keys::CART_ITEMS).unwrap(), None);
    }

    #[tokio::test]
    async fn test_guest_edits_follow_storage() {
        let (storage, mut cart) = guest();
        cart.add_item(&product("p1", 100), Quantity::ONE).await.unwrap();

        // Another writer replaced the stored list.
        storage
            .set(keys::CART_ITEMS, r#"[{"id":"p2","name":"Other","price":50,"quantity":2}]"#)
            .unwrap();
        cart.add_item(&product("p1", 100), Quantity::ONE).await.unwrap();

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.item_count(), 3);
    }
}
