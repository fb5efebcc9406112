//! Cache types for catalog responses.

use crate::models::{Product, Subcategory};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Vec<Product>),
    Subcategories(Vec<Subcategory>),
}
