//! Unified error handling with Sentry integration.
//!
//! Every layer has its own `thiserror` enum; they meet in [`AppError`],
//! which the [`Storefront`](crate::Storefront) context turns into
//! notifications. Network and storage failures are captured to Sentry on the
//! way.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::session::AuthError;
use crate::storage::StorageError;

/// Input or state problems that block an operation before any request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Address form has blank fields (names in form order).
    #[error("Please fill in all address fields")]
    MissingAddressFields(Vec<&'static str>),

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Please add a shipping address")]
    NoDefaultAddress,

    #[error("Checkout is already in progress")]
    CheckoutInProgress,

    #[error("{0} is out of stock")]
    OutOfStock(String),

    #[error("Product {0} is not in the cart")]
    NotInCart(String),

    #[error("Product {0} is not available")]
    UnknownProduct(String),

    /// The confirmation view was opened without navigation state.
    #[error("Order ID not provided")]
    MissingOrderId,
}

/// Coarse classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Auth,
    Validation,
    Payment,
    Storage,
    Config,
}

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend request failed.
    #[error("Network error: {0}")]
    Network(#[from] ApiError),

    /// Authentication failed or is required.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Operation blocked by invalid input or state.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The payment gateway reported a failure.
    #[error("Payment failed: {0}")]
    Payment(String),

    /// Durable storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Classify the error.
    ///
    /// A backend refusing our token counts as an auth problem, not a
    /// network one.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(err) if err.is_unauthorized() => ErrorKind::Auth,
            Self::Network(_) => ErrorKind::Network,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Payment(_) => ErrorKind::Payment,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Message fit for a toast. `context` describes the failed action and
    /// is used for errors whose own text is not meant for customers.
    #[must_use]
    pub fn user_message(&self, context: &str) -> String {
        match self {
            Self::Network(err) if err.is_unauthorized() => {
                "Your session has expired, please log in again".to_string()
            }
            Self::Network(_) | Self::Storage(_) | Self::Config(_) => context.to_string(),
            Self::Auth(err) => err.user_message(),
            Self::Validation(err) => err.to_string(),
            Self::Payment(description) => format!("Payment failed: {description}"),
        }
    }

    /// Send network and storage failures to Sentry and log the error.
    pub fn report(&self, context: &str) {
        if matches!(self.kind(), ErrorKind::Network | ErrorKind::Storage) {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "{context}"
            );
        } else {
            tracing::warn!(error = %self, "{context}");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for customer actions.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "p1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
