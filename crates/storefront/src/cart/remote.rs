//! Account cart held by the backend.

use secrecy::SecretString;

use vivahart_core::{ProductId, Quantity};

use crate::api::{AccountCart, ApiError, BackendClient};

/// Handle on the account cart of one logged-in user.
#[derive(Debug, Clone)]
pub struct RemoteCart {
    api: BackendClient,
    token: SecretString,
}

impl RemoteCart {
    #[must_use]
    pub const fn new(api: BackendClient, token: SecretString) -> Self {
        Self { api, token }
    }

    /// Fetch the cart and saved addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn fetch(&self) -> Result<AccountCart, ApiError> {
        self.api.fetch_cart(&self.token).await
    }

    /// Set the line for `product_id` to `quantity`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn upsert(&self, product_id: &ProductId, quantity: Quantity) -> Result<(), ApiError> {
        self.api
            .upsert_cart_item(&self.token, product_id, quantity)
            .await
    }

    /// Remove the line for `product_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn remove(&self, product_id: &ProductId) -> Result<(), ApiError> {
        self.api.remove_cart_item(&self.token, product_id).await
    }
}
