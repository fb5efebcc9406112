//! Backend REST API client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`; bearer token on account calls
//! - The backend is the source of truth for accounts, carts and orders
//! - Catalog reads (products, subcategories) cached in memory via `moka`
//!   (5 minute TTL); nothing account-specific is ever cached
//!
//! # Example
//!
//! ```rust,ignore
//! use vivahart_storefront::api::{BackendClient, ProductQuery};
//!
//! let client = BackendClient::new(&config)?;
//! let products = client
//!     .list_products(&ProductQuery::for_category(config.category_id.clone()))
//!     .await?;
//! ```

mod cache;
mod client;
mod conversions;
pub mod types;

pub use client::{AccountCart, BackendClient, CreatedOrder, LoginResult};
pub use types::ProductQuery;

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never got a response (connect failure, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected our credentials or token (401/403).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// The backend answered 2xx but flagged the operation as failed.
    #[error("Rejected by backend: {0}")]
    Rejected(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the backend refused the credentials or token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Status {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 502 - bad gateway");

        let err = ApiError::NotFound("order o1".to_string());
        assert_eq!(err.to_string(), "Not found: order o1");
    }

    #[test]
    fn test_api_error_classification() {
        assert!(ApiError::Unauthorized("expired".to_string()).is_unauthorized());
        assert!(!ApiError::Rejected("no".to_string()).is_unauthorized());
    }
}
