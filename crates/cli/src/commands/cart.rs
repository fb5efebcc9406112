//! `cart` subcommands.
//!
//! The account cart starts empty in every process, so each command loads it
//! from the backend first. A guest cart is read from storage on startup.

use vivahart_core::{ProductId, Quantity};
use vivahart_storefront::Storefront;

use super::{CommandError, out};

async fn load(storefront: &mut Storefront) -> Result<(), CommandError> {
    if storefront.cart().is_remote() {
        storefront.refresh_cart().await?;
    }
    Ok(())
}

/// Print the cart lines and the total.
///
/// # Errors
///
/// Returns an error if the account cart cannot be loaded.
pub async fn show(storefront: &mut Storefront) -> Result<(), CommandError> {
    load(storefront).await?;
    print_cart(storefront);
    Ok(())
}

pub(crate) fn print_cart(storefront: &Storefront) {
    let cart = storefront.cart();
    if cart.is_empty() {
        out("Your cart is empty");
        return;
    }
    for item in cart.items() {
        out(format_args!(
            "{:<26} {:<32} x{:<3} {:>12}",
            item.product_id,
            item.name,
            item.quantity,
            item.line_total()
        ));
    }
    out(format_args!("{} item(s), total {}", cart.item_count(), cart.total()));
}

/// Add a product by id.
///
/// # Errors
///
/// Returns an error if the product is unknown or the cart cannot be updated.
pub async fn add(storefront: &mut Storefront, id: &str, quantity: i64) -> Result<(), CommandError> {
    if quantity < 1 {
        return Err(CommandError::Input("quantity must be at least 1".to_string()));
    }
    load(storefront).await?;
    let resulting = storefront
        .add_product(&ProductId::new(id), Quantity::clamped(quantity))
        .await?;
    out(format_args!("{id}: quantity now {resulting}"));
    Ok(())
}

/// Change a line's quantity by `delta`.
///
/// # Errors
///
/// Returns an error if the line is missing or the cart cannot be updated.
pub async fn update(storefront: &mut Storefront, id: &str, delta: i64) -> Result<(), CommandError> {
    load(storefront).await?;
    report(id, storefront.update_quantity(&ProductId::new(id), delta).await?);
    Ok(())
}

/// Set a line's quantity.
///
/// # Errors
///
/// Returns an error if the line is missing or the cart cannot be updated.
pub async fn set(storefront: &mut Storefront, id: &str, quantity: i64) -> Result<(), CommandError> {
    load(storefront).await?;
    report(id, storefront.set_quantity(&ProductId::new(id), quantity).await?);
    Ok(())
}

fn report(id: &str, quantity: Option<Quantity>) {
    match quantity {
        Some(quantity) => out(format_args!("{id}: quantity now {quantity}")),
        None => out(format_args!("{id}: removed")),
    }
}

/// Remove a line.
///
/// # Errors
///
/// Returns an error if the cart cannot be updated.
pub async fn remove(storefront: &mut Storefront, id: &str) -> Result<(), CommandError> {
    load(storefront).await?;
    storefront.remove_from_cart(&ProductId::new(id)).await?;
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if any line could not be removed.
pub async fn clear(storefront: &mut Storefront) -> Result<(), CommandError> {
    load(storefront).await?;
    storefront.clear_cart().await?;
    Ok(())
}
