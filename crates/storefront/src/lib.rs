//! Vivah Art Studio storefront library.
//!
//! A headless client for the storefront backend: session, dual-mode cart,
//! default address, wishlist, catalog views and the payment checkout flow.
//! Front ends (the `vh` CLI, tests) drive it through [`Storefront`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod api;
pub mod app;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod profile;
pub mod session;
pub mod storage;
pub mod wishlist;

pub use app::Storefront;
pub use checkout::{CheckoutPhase, PaymentEvent, PaymentOutcome, PaymentRequest};
pub use config::StorefrontConfig;
pub use error::{AppError, ErrorKind, Result};
pub use notify::{Notification, NotificationLevel};
