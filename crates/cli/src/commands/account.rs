//! Account commands: profile, orders, wishlist, address.

use vivahart_core::{OrderId, ProductId};
use vivahart_storefront::Storefront;
use vivahart_storefront::models::Order;
use vivahart_storefront::profile::{OrderSummary, format_order_date, short_reference};
use vivahart_storefront::wishlist::WishlistChange;

use super::{CommandError, out};

/// Print the profile.
///
/// # Errors
///
/// Returns an error if the profile cannot be fetched.
pub async fn profile(storefront: &mut Storefront) -> Result<(), CommandError> {
    let profile = storefront.load_profile().await?;
    out(format_args!("{} {}", profile.first_name, profile.last_name));
    out(format_args!("Email:    {}", profile.email));
    if let Some(phone) = &profile.phone_number {
        out(format_args!("Phone:    {phone}"));
    }
    out(format_args!("Role:     {}", profile.role));
    out(format_args!(
        "Status:   {}{}",
        if profile.active { "active" } else { "inactive" },
        if profile.email_verified { ", email verified" } else { "" }
    ));
    if let Some(created) = &profile.created_at {
        out(format_args!("Member since {}", format_order_date(created)));
    }
    out(format_args!("Wishlist: {} item(s)", profile.wishlist_ids.len()));
    out(format_args!("Addresses: {}", profile.addresses.len()));
    Ok(())
}

/// List past orders.
///
/// # Errors
///
/// Returns an error if the orders cannot be fetched.
pub async fn orders(storefront: &mut Storefront) -> Result<(), CommandError> {
    let orders = storefront.orders().await?;
    if orders.is_empty() {
        out("You haven't placed any orders yet.");
        return Ok(());
    }
    for order in &orders {
        let summary = OrderSummary::from_order(order);
        out(format_args!(
            "#{}  {:<18} {:>3} item(s) {:>12}  {} / payment {} / delivery {}",
            summary.reference,
            summary.placed_on.as_deref().unwrap_or("-"),
            summary.item_count,
            summary.total.as_deref().unwrap_or("-"),
            summary.status,
            summary.payment_status,
            summary.delivery_status
        ));
    }
    Ok(())
}

/// Show one order.
///
/// # Errors
///
/// Returns an error if the order cannot be fetched.
pub async fn order(storefront: &mut Storefront, id: &str) -> Result<(), CommandError> {
    let order = storefront.order(&OrderId::new(id)).await?;
    print_order(&order);
    Ok(())
}

pub(crate) fn print_order(order: &Order) {
    let summary = OrderSummary::from_order(order);
    out(format_args!("Order #{}", short_reference(order.id.as_str())));
    if let Some(placed_on) = &summary.placed_on {
        out(format_args!("Placed:   {placed_on}"));
    }
    out(format_args!("Status:   {}", summary.status));
    out(format_args!("Payment:  {} ({})", summary.payment_status, order.payment_method));
    out(format_args!("Delivery: {}", summary.delivery_status));
    for item in &order.items {
        let price = item.price.map(|p| p.display()).unwrap_or_default();
        out(format_args!("  {:<32} x{:<3} {price:>12}", item.name, item.quantity));
    }
    if let Some(total) = &summary.total {
        out(format_args!("Total:    {total}"));
    }
    if let Some(address) = &order.shipping_address {
        out(format_args!("Ship to:  {}", address.one_line()));
    }
}

/// List the wishlist, as the profile reports it.
///
/// # Errors
///
/// Returns an error if the profile cannot be fetched.
pub async fn wishlist(storefront: &mut Storefront) -> Result<(), CommandError> {
    let profile = storefront.load_profile().await?;
    if profile.wishlist_ids.is_empty() {
        out("Your wishlist is empty");
        return Ok(());
    }
    for id in &profile.wishlist_ids {
        match profile.wishlist.iter().find(|product| &product.id == id) {
            Some(product) => out(format_args!("{id:<26} {:<32} {:>10}", product.name, product.price)),
            None => out(id),
        }
    }
    Ok(())
}

/// Add or remove a wishlist entry.
///
/// # Errors
///
/// Returns an error for guests or if the backend refuses.
pub async fn toggle_wishlist(storefront: &mut Storefront, id: &str) -> Result<(), CommandError> {
    let product_id = ProductId::new(id);
    if storefront.session().is_authenticated() {
        // Seed the local set so the toggle goes the right way.
        storefront.load_profile().await?;
    }
    match storefront.toggle_wishlist(&product_id).await? {
        WishlistChange::Added => out(format_args!("{id}: added")),
        WishlistChange::Removed => out(format_args!("{id}: removed")),
    }
    Ok(())
}

/// Show the default shipping address saved with the account cart.
///
/// # Errors
///
/// Returns an error if the account cart cannot be loaded.
pub async fn address(storefront: &mut Storefront) -> Result<(), CommandError> {
    if storefront.cart().is_remote() {
        storefront.refresh_cart().await?;
    }
    match storefront.addresses().default_address() {
        Some(address) => out(address.one_line()),
        None => out("No default address saved"),
    }
    Ok(())
}
