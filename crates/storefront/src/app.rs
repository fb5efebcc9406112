//! The storefront context.
//!
//! [`Storefront`] is the single owner of everything a front end works with:
//! session, cart, default address, wishlist, checkout and the catalog views.
//! Every operation returns its error to the caller and also queues a
//! customer-facing [`Notification`], so a front end can either branch on the
//! result or just show what [`Storefront::drain_notifications`] hands back.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{debug, info, instrument, warn};

use vivahart_core::{CategoryId, ProductId, Quantity};

use crate::address::{AddressBook, AddressField};
use crate::api::{ApiError, BackendClient, ProductQuery};
use crate::cart::Cart;
use crate::catalog::{BestSellers, CategoryBrowser};
use crate::checkout::{CheckoutFlow, Confirmation, PaymentEvent, PaymentOutcome, PaymentRequest};
use crate::config::StorefrontConfig;
use crate::error::{AppError, ValidationError, add_breadcrumb};
use crate::models::{Address, Order, Product, User, UserProfile};
use crate::notify::{Notification, Notifications};
use crate::profile;
use crate::session::{AuthError, Session, SessionStore};
use crate::storage::{DurableStorage, FileStorage, keys};
use crate::wishlist::{Wishlist, WishlistChange};

/// One storefront: configuration, backend client and all client state.
pub struct Storefront {
    config: StorefrontConfig,
    api: BackendClient,
    storage: Arc<dyn DurableStorage>,
    session: SessionStore,
    cart: Cart,
    addresses: AddressBook,
    wishlist: Wishlist,
    checkout: CheckoutFlow,
    browser: CategoryBrowser,
    best_sellers: BestSellers,
    notifications: Notifications,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("api", &self.api)
            .field("session", &self.session)
            .field("cart_lines", &self.cart.items().len())
            .field("checkout", &self.checkout.phase())
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Open the storefront with file storage at the configured path.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, AppError> {
        let storage = Arc::new(FileStorage::new(config.storage_path.clone()));
        Self::with_storage(config, storage)
    }

    /// Open the storefront over an existing storage backend.
    ///
    /// The session is restored from storage; an authenticated session gets
    /// the account cart (empty until [`Storefront::refresh_cart`]), otherwise
    /// the guest cart is read right away.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_storage(
        config: StorefrontConfig,
        storage: Arc<dyn DurableStorage>,
    ) -> Result<Self, AppError> {
        let api = BackendClient::new(&config)?;
        let session = SessionStore::load(storage.clone());
        let cart = Cart::for_session(
            session.session(),
            &api,
            storage.clone(),
            config.payment.currency,
        );

        Ok(Self {
            checkout: CheckoutFlow::new(config.payment.clone()),
            browser: CategoryBrowser::new(config.category_id.clone()),
            config,
            api,
            storage,
            session,
            cart,
            addresses: AddressBook::new(),
            wishlist: Wishlist::new(),
            best_sellers: BestSellers::default(),
            notifications: Notifications::default(),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub const fn session(&self) -> &Session {
        self.session.session()
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub const fn addresses(&self) -> &AddressBook {
        &self.addresses
    }

    #[must_use]
    pub const fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    #[must_use]
    pub const fn checkout_flow(&self) -> &CheckoutFlow {
        &self.checkout
    }

    #[must_use]
    pub const fn browser(&self) -> &CategoryBrowser {
        &self.browser
    }

    #[must_use]
    pub const fn best_sellers(&self) -> &BestSellers {
        &self.best_sellers
    }

    /// Navigation state of the last paid order.
    #[must_use]
    pub const fn confirmation(&self) -> Option<&Confirmation> {
        self.checkout.confirmation()
    }

    /// Take every queued notification, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    /// Report `err`, queue its customer message and hand it back.
    fn fail(&mut self, err: impl Into<AppError>, context: &str) -> AppError {
        let err = err.into();
        err.report(context);
        self.notify(Notification::error(err.user_message(context)));
        err
    }

    /// Like [`Self::fail`], but a missing login is reported as `login_prompt`.
    fn fail_needing_login(
        &mut self,
        err: impl Into<AppError>,
        context: &str,
        login_prompt: &str,
    ) -> AppError {
        let err = err.into();
        if matches!(err, AppError::Auth(AuthError::NotLoggedIn)) {
            err.report(context);
            self.notify(Notification::error(login_prompt));
            return err;
        }
        self.fail(err, context)
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Log in and switch to the account cart.
    ///
    /// The guest cart is discarded, not merged. A failure to load the
    /// account cart afterwards is notified but does not fail the login.
    ///
    /// # Errors
    ///
    /// Returns the `AuthError` from the session store; the previous session
    /// and cart are kept in that case.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, email: &str, password: &SecretString) -> Result<User, AppError> {
        let user = match self.session.login(&self.api, email, password).await {
            Ok(user) => user,
            Err(e) => return Err(self.fail(e, "Login failed")),
        };

        if let Err(e) = self.storage.remove(keys::CART_ITEMS) {
            warn!(error = %e, "Could not remove guest cart after login");
        } else {
            debug!("Discarded guest cart");
        }
        self.cart = Cart::for_session(
            self.session.session(),
            &self.api,
            self.storage.clone(),
            self.config.payment.currency,
        );
        self.addresses.clear();
        self.wishlist.clear();
        self.checkout.reset();

        self.notify(Notification::success(format!("Welcome back, {}", user.first_name)));
        if let Err(e) = self.refresh_cart().await {
            debug!(error = %e, "Logged in without an account cart");
        }
        Ok(user)
    }

    /// Log out, wipe storage and fall back to an empty guest cart.
    ///
    /// Never fails and never touches the network.
    pub fn logout(&mut self) {
        let was_authenticated = self.session.is_authenticated();
        self.session.logout();
        self.cart = Cart::guest(self.storage.clone(), self.config.payment.currency);
        self.addresses.clear();
        self.wishlist.clear();
        self.checkout.reset();
        if was_authenticated {
            self.notify(Notification::info("Logged out"));
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Reload the cart from its store and adopt the saved default address.
    ///
    /// # Errors
    ///
    /// Returns the store or backend error.
    pub async fn refresh_cart(&mut self) -> Result<(), AppError> {
        match self.cart.load().await {
            Ok(saved) => {
                self.addresses.adopt_saved(&saved);
                Ok(())
            }
            Err(e) => Err(self.fail(e, "Failed to load cart")),
        }
    }

    /// Add `quantity` of `product` to the cart.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::OutOfStock` before touching the cart if the
    /// product has no stock, otherwise the store or backend error.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_cart(
        &mut self,
        product: &Product,
        quantity: Quantity,
    ) -> Result<Quantity, AppError> {
        if !product.in_stock() {
            let err = ValidationError::OutOfStock(product.name.clone());
            return Err(self.fail(err, "Error adding product to cart"));
        }
        match self.cart.add_item(product, quantity).await {
            Ok(resulting) => {
                add_breadcrumb("cart", "Added item", Some(&[("product_id", product.id.as_str())]));
                self.notify(Notification::success(format!("{} added to cart", product.name)));
                Ok(resulting)
            }
            Err(e) => Err(self.fail(e, "Error adding product to cart")),
        }
    }

    /// Add a product by id, looking it up in the loaded views or the full
    /// catalog.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownProduct` if no such product exists,
    /// or whatever [`Storefront::add_to_cart`] returns.
    pub async fn add_product(
        &mut self,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> Result<Quantity, AppError> {
        let product = self.find_product(product_id).await?;
        self.add_to_cart(&product, quantity).await
    }

    /// Add a best-seller card with its picked quantity, then reset the picker.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownProduct` if the card is not shown, or
    /// whatever [`Storefront::add_to_cart`] returns.
    pub async fn add_best_seller(&mut self, product_id: &ProductId) -> Result<Quantity, AppError> {
        let Some(card) = self.best_sellers.card(product_id).cloned() else {
            let err = ValidationError::UnknownProduct(product_id.to_string());
            return Err(self.fail(err, "Error adding product to cart"));
        };
        let resulting = self.add_to_cart(&card.product, card.quantity).await?;
        self.best_sellers.reset_quantity(product_id);
        Ok(resulting)
    }

    async fn find_product(&mut self, product_id: &ProductId) -> Result<Product, AppError> {
        if let Some(product) = self
            .browser
            .product(product_id)
            .or_else(|| self.best_sellers.card(product_id).map(|card| &card.product))
        {
            return Ok(product.clone());
        }

        match self.api.list_products(&ProductQuery::all()).await {
            Ok(products) => match products.into_iter().find(|p| &p.id == product_id) {
                Some(product) => Ok(product),
                None => {
                    let err = ValidationError::UnknownProduct(product_id.to_string());
                    Err(self.fail(err, "Error adding product to cart"))
                }
            },
            Err(e) => Err(self.fail(e, "Failed to fetch products")),
        }
    }

    /// Change a line's quantity by `delta`; zero or below removes it.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NotInCart` or the store/backend error.
    pub async fn update_quantity(
        &mut self,
        product_id: &ProductId,
        delta: i64,
    ) -> Result<Option<Quantity>, AppError> {
        let result = self.cart.update_quantity(product_id, delta).await;
        self.after_quantity_change(result)
    }

    /// Set a line's quantity; zero or below removes it.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NotInCart` or the store/backend error.
    pub async fn set_quantity(
        &mut self,
        product_id: &ProductId,
        requested: i64,
    ) -> Result<Option<Quantity>, AppError> {
        let result = self.cart.set_quantity(product_id, requested).await;
        self.after_quantity_change(result)
    }

    fn after_quantity_change(
        &mut self,
        result: Result<Option<Quantity>, crate::cart::CartError>,
    ) -> Result<Option<Quantity>, AppError> {
        match result {
            Ok(Some(quantity)) => {
                self.notify(Notification::success("Cart updated"));
                Ok(Some(quantity))
            }
            Ok(None) => {
                self.notify(Notification::success("Item removed from cart"));
                Ok(None)
            }
            Err(e) => Err(self.fail(e, "Error updating cart")),
        }
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns the store or backend error; the line is gone locally either way.
    pub async fn remove_from_cart(&mut self, product_id: &ProductId) -> Result<(), AppError> {
        match self.cart.remove_item(product_id).await {
            Ok(()) => {
                self.notify(Notification::success("Item removed from cart"));
                Ok(())
            }
            Err(e) => Err(self.fail(e, "Error removing item")),
        }
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns the first store or backend error.
    pub async fn clear_cart(&mut self) -> Result<(), AppError> {
        match self.cart.clear().await {
            Ok(()) => {
                self.notify(Notification::success("Cart cleared"));
                Ok(())
            }
            Err(e) => Err(self.fail(e, "Error clearing cart")),
        }
    }

    // =========================================================================
    // Address
    // =========================================================================

    /// Start editing the default address.
    pub fn open_address_form(&mut self) {
        self.addresses.open_form();
    }

    pub fn set_address_field(&mut self, field: AddressField, value: impl Into<String>) {
        self.addresses.set_field(field, value);
    }

    /// Save the form as the default address.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingAddressFields` if any field is blank.
    pub fn save_address(&mut self) -> Result<Address, AppError> {
        match self.addresses.save() {
            Ok(saved) => {
                let saved = saved.clone();
                self.notify(Notification::success("Address saved successfully"));
                Ok(saved)
            }
            Err(e) => Err(self.fail(e, "Please fill in all address fields")),
        }
    }

    pub fn cancel_address(&mut self) {
        self.addresses.cancel();
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Create the order and return the request to open the payment widget
    /// with.
    ///
    /// # Errors
    ///
    /// Returns the auth, validation or network error that stopped the
    /// checkout; no order exists in that case.
    pub async fn checkout(&mut self) -> Result<PaymentRequest, AppError> {
        let result = self
            .checkout
            .begin(&self.api, self.session.session(), &self.cart, &self.addresses)
            .await;
        match result {
            Ok(request) => Ok(request),
            Err(e) => {
                let context = match &e {
                    AppError::Network(ApiError::Rejected(_)) => "Failed to create order",
                    _ => "Error during checkout",
                };
                Err(self.fail_needing_login(e, context, "Please log in to proceed with checkout"))
            }
        }
    }

    /// Feed the payment widget's callback into the checkout.
    pub async fn handle_payment(&mut self, event: PaymentEvent) -> PaymentOutcome {
        let outcome = self.checkout.handle_event(event, &mut self.cart).await;
        match &outcome {
            PaymentOutcome::Confirmed(confirmation) => {
                add_breadcrumb(
                    "checkout",
                    "Payment confirmed",
                    Some(&[("order_id", confirmation.order_id.as_str())]),
                );
                // Stock levels changed.
                self.api.invalidate_catalog();
                self.notify(Notification::success("Payment successful! Order placed."));
            }
            PaymentOutcome::Failed { description } => {
                let err = AppError::Payment(description.clone());
                self.fail(err, "Payment failed");
            }
            PaymentOutcome::Ignored => {}
        }
        outcome
    }

    /// Give up on the awaited payment.
    pub fn abandon_checkout(&mut self) -> bool {
        self.checkout.abandon()
    }

    /// Load the order the confirmation view points at.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingOrderId` when there is no
    /// confirmation, otherwise the auth or network error.
    pub async fn confirmed_order(&mut self) -> Result<Order, AppError> {
        let result = profile::fetch_confirmed_order(
            &self.api,
            self.session.session(),
            self.checkout.confirmation(),
        )
        .await;
        result.map_err(|e| self.fail(e, "Failed to load order details"))
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Fetch the profile and resync the wishlist from it.
    ///
    /// # Errors
    ///
    /// Returns the auth or network error.
    pub async fn load_profile(&mut self) -> Result<UserProfile, AppError> {
        match profile::fetch_profile(&self.api, self.session.session()).await {
            Ok(profile) => {
                self.wishlist = Wishlist::from_profile(&profile);
                Ok(profile)
            }
            Err(e) => Err(self.fail(e, "Failed to fetch user profile")),
        }
    }

    /// Order history, newest first.
    ///
    /// # Errors
    ///
    /// Returns the auth or network error.
    pub async fn orders(&mut self) -> Result<Vec<Order>, AppError> {
        let result = profile::fetch_orders(&self.api, self.session.session()).await;
        result.map_err(|e| self.fail(e, "Failed to fetch orders"))
    }

    /// One order by id.
    ///
    /// # Errors
    ///
    /// Returns the auth or network error.
    pub async fn order(&mut self, order_id: &vivahart_core::OrderId) -> Result<Order, AppError> {
        let result = profile::fetch_order(&self.api, self.session.session(), order_id).await;
        result.map_err(|e| self.fail(e, "Failed to load order details"))
    }

    /// Add or remove a product on the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` for guests, or the backend error.
    pub async fn toggle_wishlist(&mut self, product_id: &ProductId) -> Result<WishlistChange, AppError> {
        let result = self
            .wishlist
            .toggle(&self.api, self.session.session(), product_id)
            .await;
        match result {
            Ok(change) => {
                let message = match change {
                    WishlistChange::Added => "Added to wishlist",
                    WishlistChange::Removed => "Removed from wishlist",
                };
                self.notify(Notification::success(message));
                Ok(change)
            }
            Err(e) => Err(self.fail_needing_login(
                e,
                "Error updating wishlist",
                "Please log in to manage your wishlist",
            )),
        }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Load the subcategory tabs and the products of the selected tab.
    ///
    /// # Errors
    ///
    /// Returns the network error of whichever request failed.
    pub async fn load_categories(&mut self) -> Result<(), AppError> {
        if let Err(e) = self.browser.load_tabs(&self.api).await {
            return Err(self.fail(e, "Failed to fetch subcategories"));
        }
        self.refresh_products().await
    }

    /// Switch the category browser to another tab.
    ///
    /// # Errors
    ///
    /// Returns the network error.
    pub async fn select_category(&mut self, tab: CategoryId) -> Result<(), AppError> {
        let result = self.browser.select(&self.api, tab).await;
        result.map_err(|e| self.fail(e, "Failed to fetch products"))
    }

    /// Refetch the selected tab's products.
    ///
    /// # Errors
    ///
    /// Returns the network error.
    pub async fn refresh_products(&mut self) -> Result<(), AppError> {
        let result = self.browser.refresh(&self.api).await;
        result.map_err(|e| self.fail(e, "Failed to fetch products"))
    }

    /// Reveal more rows of the category grid, `presses` batches at once.
    pub fn show_more_by(&mut self, presses: usize) {
        self.browser.show_more_by(presses);
    }

    /// Pick a fresh set of best sellers.
    ///
    /// # Errors
    ///
    /// Returns the network error.
    pub async fn load_best_sellers(&mut self) -> Result<(), AppError> {
        match BestSellers::fetch(&self.api).await {
            Ok(best_sellers) => {
                info!(count = best_sellers.cards().len(), "Loaded best sellers");
                self.best_sellers = best_sellers;
                Ok(())
            }
            Err(e) => Err(self.fail(e, "Failed to load best sellers")),
        }
    }

    /// Move a best-seller card's quantity picker.
    pub fn adjust_best_seller_quantity(&mut self, product_id: &ProductId, delta: i64) -> Option<Quantity> {
        self.best_sellers.adjust_quantity(product_id, delta)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::test_support::product;
    use crate::checkout::CheckoutPhase;
    use crate::error::ErrorKind;
    use crate::notify::NotificationLevel;
    use crate::storage::MemoryStorage;

    fn storefront() -> (Storefront, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let config = StorefrontConfig::new("http://127.0.0.1:9/api", "/tmp/unused.json").unwrap();
        (Storefront::with_storage(config, storage.clone()).unwrap(), storage)
    }

    fn messages(storefront: &mut Storefront) -> Vec<String> {
        storefront
            .drain_notifications()
            .into_iter()
            .map(|n| n.message)
            .collect()
    }

    #[tokio::test]
    async fn test_guest_cart_flow_notifies() {
        let (mut storefront, storage) = storefront();
        let rakhi = product("p1", 399, 5);

        storefront.add_to_cart(&rakhi, Quantity::clamped(3)).await.unwrap();
        storefront.update_quantity(&rakhi.id, 1).await.unwrap();
        assert_eq!(storefront.cart().get(&rakhi.id).unwrap().quantity.get(), 4);
        assert!(storage.get(keys::CART_ITEMS).unwrap().is_some());

        storefront.set_quantity(&rakhi.id, 0).await.unwrap();
        assert!(storefront.cart().is_empty());

        assert_eq!(
            messages(&mut storefront),
            ["Rakhi p1 added to cart", "Cart updated", "Item removed from cart"]
        );
    }

    #[tokio::test]
    async fn test_out_of_stock_is_refused() {
        let (mut storefront, _) = storefront();
        let err = storefront
            .add_to_cart(&product("p1", 399, 0), Quantity::ONE)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(storefront.cart().is_empty());
    }

    #[tokio::test]
    async fn test_guest_checkout_asks_for_login() {
        let (mut storefront, _) = storefront();
        storefront
            .add_to_cart(&product("p1", 399, 5), Quantity::ONE)
            .await
            .unwrap();
        storefront.drain_notifications();

        let err = storefront.checkout().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(storefront.checkout_flow().phase(), CheckoutPhase::Idle);

        let notifications = storefront.drain_notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].level, NotificationLevel::Error);
        assert_eq!(notifications[0].message, "Please log in to proceed with checkout");
    }

    #[tokio::test]
    async fn test_wishlist_asks_for_login() {
        let (mut storefront, _) = storefront();
        storefront.toggle_wishlist(&ProductId::new("p1")).await.unwrap_err();
        assert_eq!(messages(&mut storefront), ["Please log in to manage your wishlist"]);
    }

    #[test]
    fn test_address_save_notifies() {
        let (mut storefront, _) = storefront();
        storefront.set_address_field(AddressField::Street, "12 MG Road");
        storefront.save_address().unwrap_err();
        assert_eq!(messages(&mut storefront), ["Please fill in all address fields"]);

        for (field, value) in [
            (AddressField::City, "Bengaluru"),
            (AddressField::State, "Karnataka"),
            (AddressField::PostalCode, "560001"),
            (AddressField::Country, "India"),
        ] {
            storefront.set_address_field(field, value);
        }
        storefront.save_address().unwrap();
        assert_eq!(messages(&mut storefront), ["Address saved successfully"]);
        assert!(storefront.addresses().default_address().is_some());
    }

    #[test]
    fn test_logout_resets_everything() {
        let (mut storefront, storage) = storefront();
        storage.set(keys::TOKEN, "T").unwrap();
        storage.set(keys::CART_ITEMS, "[]").unwrap();

        storefront.logout();
        storefront.logout();
        assert!(!storefront.session().is_authenticated());
        assert!(!storefront.cart().is_remote());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_confirmation_without_order() {
        let (mut storefront, _) = storefront();
        storefront.confirmed_order().await.unwrap_err();
        assert_eq!(messages(&mut storefront), ["Order ID not provided"]);
    }
}
