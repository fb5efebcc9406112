//! Account wishlist.

use std::collections::BTreeSet;

use tracing::{debug, instrument};

use vivahart_core::ProductId;

use crate::api::BackendClient;
use crate::error::AppError;
use crate::models::UserProfile;
use crate::session::{AuthError, Session};

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistChange {
    Added,
    Removed,
}

/// Product ids on the account wishlist, as far as this client knows.
#[derive(Debug, Clone, Default)]
pub struct Wishlist {
    ids: BTreeSet<ProductId>,
}

impl Wishlist {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a fetched profile.
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            ids: profile.wishlist_ids.iter().cloned().collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.ids.contains(product_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ProductId> {
        self.ids.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Add or remove `product_id`, depending on whether it is listed.
    ///
    /// The local set only changes once the backend confirms.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` for an anonymous session, or the
    /// backend error.
    #[instrument(skip(self, api, session), fields(product_id = %product_id))]
    pub async fn toggle(
        &mut self,
        api: &BackendClient,
        session: &Session,
        product_id: &ProductId,
    ) -> Result<WishlistChange, AppError> {
        let token = session.token().ok_or(AuthError::NotLoggedIn)?;

        if self.contains(product_id) {
            api.remove_from_wishlist(token, product_id).await?;
            self.ids.remove(product_id);
            debug!("Removed from wishlist");
            Ok(WishlistChange::Removed)
        } else {
            api.add_to_wishlist(token, product_id).await?;
            self.ids.insert(product_id.clone());
            debug!("Added to wishlist");
            Ok(WishlistChange::Added)
        }
    }
}
