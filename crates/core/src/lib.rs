//! Vivah Art Studio Core - Shared types library.
//!
//! This crate provides the domain types used across the storefront workspace:
//! - `storefront` - Headless storefront client (session, cart, checkout)
//! - `cli` - Terminal front end driving the storefront
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, quantities, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
