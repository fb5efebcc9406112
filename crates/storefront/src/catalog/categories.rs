//! Category browser.

use rust_decimal::Decimal;
use tracing::instrument;

use vivahart_core::{CategoryId, Price, ProductId};

use super::marked_up;
use crate::api::{ApiError, BackendClient, ProductQuery};
use crate::models::{Product, product::discount_percent};

/// Id of the synthetic tab listing the whole category.
pub const ALL_TAB_ID: &str = "all";
/// Label of the synthetic tab.
pub const ALL_TAB_NAME: &str = "ALL RAKHIS";
/// Products per grid row.
pub const PRODUCTS_PER_ROW: usize = 4;
/// Rows shown before "show more"; also how many rows each press adds.
pub const INITIAL_ROWS: usize = 3;

const TAB_PLACEHOLDER_IMAGE: &str = "/placeholder.svg?height=80&width=80";
const DEFAULT_CATEGORY_LABEL: &str = "Rakhi";

/// One subcategory tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTab {
    pub id: CategoryId,
    pub name: String,
    pub image: String,
}

impl CategoryTab {
    fn all() -> Self {
        Self {
            id: CategoryId::new(ALL_TAB_ID),
            name: ALL_TAB_NAME.to_string(),
            image: TAB_PLACEHOLDER_IMAGE.to_string(),
        }
    }

    #[must_use]
    pub fn is_all(&self) -> bool {
        self.id.as_str() == ALL_TAB_ID
    }
}

/// A product card in the category grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryProduct {
    pub product: Product,
    /// Backend original price, or the price marked up by 20%.
    pub original_price: Price,
    /// Only set when the backend sent an original price.
    pub sale_percentage: Option<u32>,
    pub category_label: String,
}

impl CategoryProduct {
    #[must_use]
    pub fn from_product(product: Product) -> Self {
        let original_price = product
            .original_price
            .unwrap_or_else(|| marked_up(product.price, Decimal::new(12, 1)));
        let sale_percentage = product
            .original_price
            .and_then(|original| discount_percent(original.amount, product.price.amount));
        let category_label = product
            .category
            .clone()
            .unwrap_or_else(|| DEFAULT_CATEGORY_LABEL.to_string());
        Self {
            product,
            original_price,
            sale_percentage,
            category_label,
        }
    }
}

/// State of the category browser.
#[derive(Debug, Clone)]
pub struct CategoryBrowser {
    category: CategoryId,
    tabs: Vec<CategoryTab>,
    selected: CategoryId,
    products: Vec<CategoryProduct>,
    visible_rows: usize,
}

impl CategoryBrowser {
    /// Browser over `category`, with only the "all" tab until loaded.
    #[must_use]
    pub fn new(category: CategoryId) -> Self {
        Self {
            category,
            tabs: vec![CategoryTab::all()],
            selected: CategoryId::new(ALL_TAB_ID),
            products: Vec::new(),
            visible_rows: INITIAL_ROWS,
        }
    }

    #[must_use]
    pub const fn category(&self) -> &CategoryId {
        &self.category
    }

    #[must_use]
    pub fn tabs(&self) -> &[CategoryTab] {
        &self.tabs
    }

    #[must_use]
    pub const fn selected(&self) -> &CategoryId {
        &self.selected
    }

    /// Fetch the subcategory tabs.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; the tabs are left unchanged.
    #[instrument(skip(self, api), fields(category = %self.category))]
    pub async fn load_tabs(&mut self, api: &BackendClient) -> Result<(), ApiError> {
        let subcategories = api.list_subcategories(&self.category).await?;
        self.tabs = std::iter::once(CategoryTab::all())
            .chain(subcategories.into_iter().map(|sub| CategoryTab {
                id: sub.id,
                name: sub.name,
                image: sub
                    .image
                    .unwrap_or_else(|| TAB_PLACEHOLDER_IMAGE.to_string()),
            }))
            .collect();
        Ok(())
    }

    /// Switch to a tab and fetch its products. Resets "show more".
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, api), fields(tab = %tab))]
    pub async fn select(&mut self, api: &BackendClient, tab: CategoryId) -> Result<(), ApiError> {
        self.selected = tab;
        self.visible_rows = INITIAL_ROWS;
        self.refresh(api).await
    }

    /// Re-fetch the products of the selected tab.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn refresh(&mut self, api: &BackendClient) -> Result<(), ApiError> {
        let subcategory = (self.selected.as_str() != ALL_TAB_ID).then(|| self.selected.clone());
        let query = ProductQuery::for_category(self.category.clone()).with_subcategory(subcategory);
        let products = api.list_products(&query).await?;
        self.products = self.filter_to_selected(products);
        Ok(())
    }

    /// Keep products whose subcategory matches the selected tab's name.
    /// Products without a populated subcategory are kept.
    fn filter_to_selected(&self, products: Vec<Product>) -> Vec<CategoryProduct> {
        let selected_name = self
            .tabs
            .iter()
            .find(|tab| tab.id == self.selected && !tab.is_all())
            .map(|tab| tab.name.as_str());

        products
            .into_iter()
            .filter(|product| match (selected_name, product.subcategory.as_deref()) {
                (Some(wanted), Some(actual)) => wanted == actual,
                _ => true,
            })
            .map(CategoryProduct::from_product)
            .collect()
    }

    /// Every product of the selected tab.
    #[must_use]
    pub fn products(&self) -> &[CategoryProduct] {
        &self.products
    }

    /// The products currently revealed.
    #[must_use]
    pub fn visible(&self) -> &[CategoryProduct] {
        let shown = self
            .visible_rows
            .saturating_mul(PRODUCTS_PER_ROW)
            .min(self.products.len());
        self.products.get(..shown).unwrap_or_default()
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        self.products.len() > self.visible().len()
    }

    /// Reveal three more rows per press of "show more".
    pub fn show_more_by(&mut self, presses: usize) {
        self.visible_rows = self
            .visible_rows
            .saturating_add(presses.saturating_mul(INITIAL_ROWS));
    }

    /// Find a product of the selected tab.
    #[must_use]
    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products
            .iter()
            .map(|card| &card.product)
            .find(|product| &product.id == id)
    }

    #[cfg(test)]
    pub(crate) fn set_products(&mut self, products: Vec<Product>) {
        self.products = self.filter_to_selected(products);
    }
}
