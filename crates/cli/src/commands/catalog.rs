//! `categories` and `best-sellers`.

use vivahart_core::CategoryId;
use vivahart_storefront::Storefront;

use super::{CommandError, out};

/// List the category tabs and the products of one tab.
///
/// # Errors
///
/// Returns an error if the tabs or products cannot be fetched.
pub async fn categories(
    storefront: &mut Storefront,
    tab: Option<String>,
    more: usize,
) -> Result<(), CommandError> {
    storefront.load_categories().await?;
    if let Some(tab) = tab {
        storefront.select_category(CategoryId::new(tab)).await?;
    }
    storefront.show_more_by(more);

    let browser = storefront.browser();
    for tab in browser.tabs() {
        let marker = if &tab.id == browser.selected() { '*' } else { ' ' };
        out(format_args!("{marker} {:<26} {}", tab.id, tab.name));
    }
    out("");

    for card in browser.visible() {
        let sale = card
            .sale_percentage
            .map(|percent| format!(" ({percent}% off)"))
            .unwrap_or_default();
        let stock = if card.product.in_stock() { "" } else { " [out of stock]" };
        out(format_args!(
            "{:<26} {:<32} {:>10} was {}{sale}{stock}",
            card.product.id, card.product.name, card.product.price, card.original_price
        ));
    }
    if browser.has_more() {
        out(format_args!(
            "... {} more, use --more to reveal",
            browser.products().len() - browser.visible().len()
        ));
    }
    Ok(())
}

/// Show eight random best sellers.
///
/// # Errors
///
/// Returns an error if the products cannot be fetched.
pub async fn best_sellers(storefront: &mut Storefront) -> Result<(), CommandError> {
    storefront.load_best_sellers().await?;
    for card in storefront.best_sellers().cards() {
        let badge = if card.best_seller { "[best seller] " } else { "" };
        let stock = if card.can_add() { "in stock" } else { "out of stock" };
        out(format_args!(
            "{badge}{:<26} {:<32} {:>10} was {} ({}% off), {stock}",
            card.product.id,
            card.product.name,
            card.product.price,
            card.original_price,
            card.discount_percent
        ));
    }
    Ok(())
}
