//! Best-seller grid.

use rand::Rng;
use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use tracing::instrument;

use vivahart_core::{Price, ProductId, Quantity};

use super::marked_up;
use crate::api::{ApiError, BackendClient, ProductQuery};
use crate::models::{Product, product::discount_percent};

/// Cards in the grid (two rows of four).
pub const BEST_SELLER_COUNT: usize = 8;
/// Leading cards carrying the "best seller" badge.
pub const BEST_SELLER_BADGES: usize = 4;

/// One card of the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct BestSellerCard {
    pub product: Product,
    /// Price marked up by 25%, shown struck through.
    pub original_price: Price,
    pub discount_percent: u32,
    pub best_seller: bool,
    /// Quantity picker value, `1..=10`.
    pub quantity: Quantity,
}

impl BestSellerCard {
    fn new(product: Product, best_seller: bool) -> Self {
        let original_price = marked_up(product.price, Decimal::new(125, 2));
        let discount_percent =
            discount_percent(original_price.amount, product.price.amount).unwrap_or(0);
        Self {
            product,
            original_price,
            discount_percent,
            best_seller,
            quantity: Quantity::ONE,
        }
    }

    #[must_use]
    pub const fn can_add(&self) -> bool {
        self.product.in_stock()
    }
}

/// A random pick of products shown as best sellers.
#[derive(Debug, Clone, Default)]
pub struct BestSellers {
    cards: Vec<BestSellerCard>,
}

impl BestSellers {
    /// Fetch every product and pick eight at random.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(api))]
    pub async fn fetch(api: &BackendClient) -> Result<Self, ApiError> {
        let products = api.list_products(&ProductQuery::all()).await?;
        Ok(Self::pick(products, &mut rand::rng()))
    }

    /// Shuffle `products` with `rng` and keep the first eight.
    pub fn pick<R: Rng + ?Sized>(mut products: Vec<Product>, rng: &mut R) -> Self {
        products.shuffle(rng);
        products.truncate(BEST_SELLER_COUNT);
        let cards = products
            .into_iter()
            .enumerate()
            .map(|(i, product)| BestSellerCard::new(product, i < BEST_SELLER_BADGES))
            .collect();
        Self { cards }
    }

    #[must_use]
    pub fn cards(&self) -> &[BestSellerCard] {
        &self.cards
    }

    #[must_use]
    pub fn card(&self, product_id: &ProductId) -> Option<&BestSellerCard> {
        self.cards.iter().find(|card| &card.product.id == product_id)
    }

    /// Move a card's quantity picker by `delta`, staying within `1..=10`.
    pub fn adjust_quantity(&mut self, product_id: &ProductId, delta: i64) -> Option<Quantity> {
        let card = self
            .cards
            .iter_mut()
            .find(|card| &card.product.id == product_id)?;
        card.quantity = Quantity::clamped(i64::from(card.quantity.get()).saturating_add(delta));
        Some(card.quantity)
    }

    /// Put a card's picker back to one (after a successful add).
    pub fn reset_quantity(&mut self, product_id: &ProductId) {
        if let Some(card) = self
            .cards
            .iter_mut()
            .find(|card| &card.product.id == product_id)
        {
            card.quantity = Quantity::ONE;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::catalog::test_support::product;

    fn catalog(n: usize) -> Vec<Product> {
        (0..n).map(|i| product(&format!("p{i}"), 400, 3)).collect()
    }

    #[test]
    fn test_pick_keeps_eight_and_badges_four() {
        let grid = BestSellers::pick(catalog(20), &mut StdRng::seed_from_u64(7));
        assert_eq!(grid.cards().len(), BEST_SELLER_COUNT);
        assert_eq!(grid.cards().iter().filter(|c| c.best_seller).count(), 4);
        assert!(grid.cards()[..4].iter().all(|c| c.best_seller));
    }

    #[test]
    fn test_pick_small_catalog() {
        let grid = BestSellers::pick(catalog(3), &mut StdRng::seed_from_u64(1));
        assert_eq!(grid.cards().len(), 3);
        assert!(grid.cards().iter().all(|c| c.best_seller));
    }

    #[test]
    fn test_markup_and_discount() {
        let grid = BestSellers::pick(catalog(1), &mut StdRng::seed_from_u64(1));
        let card = &grid.cards()[0];
        assert_eq!(card.original_price.amount, Decimal::from(500));
        assert_eq!(card.discount_percent, 20);
    }

    #[test]
    fn test_quantity_picker_clamps_and_resets() {
        let mut grid = BestSellers::pick(catalog(1), &mut StdRng::seed_from_u64(1));
        let id = grid.cards()[0].product.id.clone();

        assert_eq!(grid.adjust_quantity(&id, 20).unwrap().get(), 10);
        assert_eq!(grid.adjust_quantity(&id, -50).unwrap().get(), 1);
        grid.adjust_quantity(&id, 2);
        grid.reset_quantity(&id);
        assert_eq!(grid.card(&id).unwrap().quantity, Quantity::ONE);
        assert!(grid.adjust_quantity(&ProductId::new("missing"), 1).is_none());
    }

    #[test]
    fn test_out_of_stock_cannot_add() {
        let grid = BestSellers::pick(vec![product("p1", 100, 0)], &mut StdRng::seed_from_u64(1));
        assert!(!grid.cards()[0].can_add());
    }
}
