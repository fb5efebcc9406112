//! Account profile, order history and order confirmation lookups.

use chrono::{DateTime, Utc};
use tracing::instrument;

use vivahart_core::{OrderId, StatusTone};

use crate::api::BackendClient;
use crate::checkout::Confirmation;
use crate::error::{AppError, ValidationError};
use crate::models::{Order, UserProfile};
use crate::session::{AuthError, Session};

const SHORT_REFERENCE_LEN: usize = 8;

/// Fetch the logged-in user's profile, wishlist included.
///
/// # Errors
///
/// Returns `AuthError::NotLoggedIn` for an anonymous session, or the backend
/// error.
#[instrument(skip_all)]
pub async fn fetch_profile(api: &BackendClient, session: &Session) -> Result<UserProfile, AppError> {
    let token = session.token().ok_or(AuthError::NotLoggedIn)?;
    Ok(api.get_profile(token).await?)
}

/// Fetch the order history, newest first.
///
/// # Errors
///
/// Returns `AuthError::NotLoggedIn` for an anonymous session, or the backend
/// error.
#[instrument(skip_all)]
pub async fn fetch_orders(api: &BackendClient, session: &Session) -> Result<Vec<Order>, AppError> {
    let token = session.token().ok_or(AuthError::NotLoggedIn)?;
    let mut orders = api.list_orders(token).await?;
    sort_newest_first(&mut orders);
    Ok(orders)
}

/// Look up the order a confirmation points at.
///
/// The confirmation only exists right after a payment; without it (say after
/// a restart) there is nothing to look up.
///
/// # Errors
///
/// Returns `ValidationError::MissingOrderId` without a confirmation,
/// `AuthError::NotLoggedIn` for an anonymous session, or the backend error.
#[instrument(skip_all)]
pub async fn fetch_confirmed_order(
    api: &BackendClient,
    session: &Session,
    confirmation: Option<&Confirmation>,
) -> Result<Order, AppError> {
    let confirmation = confirmation.ok_or(ValidationError::MissingOrderId)?;
    fetch_order(api, session, &confirmation.order_id).await
}

/// Fetch one order by id.
///
/// # Errors
///
/// Returns `AuthError::NotLoggedIn` for an anonymous session, or the backend
/// error.
#[instrument(skip(api, session))]
pub async fn fetch_order(
    api: &BackendClient,
    session: &Session,
    order_id: &OrderId,
) -> Result<Order, AppError> {
    let token = session.token().ok_or(AuthError::NotLoggedIn)?;
    Ok(api.get_order(token, order_id).await?)
}

/// Orders without a creation date go last.
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Last eight characters of an id, as shown to customers ("#1a2b3c4d").
#[must_use]
pub fn short_reference(id: &str) -> &str {
    let start = id
        .char_indices()
        .rev()
        .nth(SHORT_REFERENCE_LEN - 1)
        .map_or(0, |(i, _)| i);
    &id[start..]
}

/// Date as printed on order cards, e.g. "16 October 2026".
#[must_use]
pub fn format_order_date(at: &DateTime<Utc>) -> String {
    at.format("%-d %B %Y").to_string()
}

/// One row of the order history.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    pub reference: String,
    pub placed_on: Option<String>,
    pub item_count: u32,
    pub total: Option<String>,
    pub status: &'static str,
    pub status_tone: StatusTone,
    pub payment_status: &'static str,
    pub payment_tone: StatusTone,
    pub delivery_status: &'static str,
}

impl OrderSummary {
    #[must_use]
    pub fn from_order(order: &Order) -> Self {
        Self {
            reference: short_reference(order.id.as_str()).to_string(),
            placed_on: order.created_at.as_ref().map(format_order_date),
            item_count: order.item_count(),
            total: order.effective_total().map(|total| total.display()),
            status: order.status.as_str(),
            status_tone: order.status.tone(),
            payment_status: order.payment_status.as_str(),
            payment_tone: order.payment_status.tone(),
            delivery_status: order.delivery_status.as_str(),
        }
    }
}
