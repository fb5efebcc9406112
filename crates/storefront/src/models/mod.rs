//! Domain models for the storefront.
//!
//! These are the validated shapes the rest of the crate works with. Raw
//! backend payloads live in [`crate::api::types`] and are converted into
//! these types at the client boundary.

pub mod address;
pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use address::Address;
pub use cart::CartItem;
pub use order::{Order, OrderItem};
pub use product::{Product, ProductImage, Subcategory};
pub use user::{User, UserProfile};

/// Image shown when a product or cart line has no image of its own.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg?height=100&width=100";
