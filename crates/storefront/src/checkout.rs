//! Checkout state machine.
//!
//! ```text
//! Idle -> OrderCreating -> AwaitingPayment -> PaymentSucceeded -> CartCleared -> Redirected
//!              |                  |
//!              v                  v
//!             Idle          PaymentFailed -> Idle
//! ```
//!
//! [`CheckoutFlow::begin`] creates the backend order and hands back the
//! [`PaymentRequest`] to open the payment widget with. The widget answers
//! later with a [`PaymentEvent`] carrying the attempt id it was opened for;
//! events for any other attempt, or arriving when no payment is awaited, are
//! dropped.

use std::fmt;

use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use vivahart_core::{GatewayOrderId, OrderId, TransactionId};

use crate::address::AddressBook;
use crate::api::{BackendClient, CreatedOrder};
use crate::cart::Cart;
use crate::config::PaymentConfig;
use crate::error::{AppError, ValidationError, add_breadcrumb};
use crate::session::{AuthError, Session};

const DEFAULT_FAILURE_DESCRIPTION: &str = "Please try again.";

/// Client-side id of one checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(Uuid);

impl AttemptId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Options the payment widget is opened with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    #[serde(skip)]
    pub attempt: AttemptId,
    pub key: String,
    /// Order total in minor units (paise).
    pub amount: i64,
    pub currency: String,
    pub name: String,
    pub description: String,
    pub order_id: GatewayOrderId,
    pub prefill: PaymentPrefill,
    pub theme: PaymentTheme,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentPrefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentTheme {
    pub color: String,
}

/// Callback from the payment widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    Succeeded {
        attempt: AttemptId,
        payment_id: Option<String>,
    },
    Failed {
        attempt: AttemptId,
        code: Option<String>,
        description: Option<String>,
    },
}

impl PaymentEvent {
    #[must_use]
    pub const fn attempt(&self) -> AttemptId {
        match self {
            Self::Succeeded { attempt, .. } | Self::Failed { attempt, .. } => *attempt,
        }
    }
}

/// Navigation state handed to the confirmation view. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub order_id: OrderId,
    pub transaction_id: Option<TransactionId>,
}

/// What handling a payment event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Paid; the cart was cleared and the flow sits on the confirmation.
    Confirmed(Confirmation),
    /// The gateway reported a failure; the flow is back to idle.
    Failed { description: String },
    /// The event did not belong to the awaited attempt.
    Ignored,
}

/// Checkout states.
#[derive(Debug, Clone)]
pub enum CheckoutState {
    Idle,
    OrderCreating { attempt: AttemptId },
    AwaitingPayment { attempt: AttemptId, order: Box<CreatedOrder> },
    PaymentSucceeded { attempt: AttemptId, confirmation: Confirmation },
    PaymentFailed { attempt: AttemptId },
    CartCleared { attempt: AttemptId, confirmation: Confirmation },
    Redirected(Confirmation),
}

/// State names, for the transition trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutPhase {
    Idle,
    OrderCreating,
    AwaitingPayment,
    PaymentSucceeded,
    PaymentFailed,
    CartCleared,
    Redirected,
}

impl CheckoutState {
    #[must_use]
    pub const fn phase(&self) -> CheckoutPhase {
        match self {
            Self::Idle => CheckoutPhase::Idle,
            Self::OrderCreating { .. } => CheckoutPhase::OrderCreating,
            Self::AwaitingPayment { .. } => CheckoutPhase::AwaitingPayment,
            Self::PaymentSucceeded { .. } => CheckoutPhase::PaymentSucceeded,
            Self::PaymentFailed { .. } => CheckoutPhase::PaymentFailed,
            Self::CartCleared { .. } => CheckoutPhase::CartCleared,
            Self::Redirected(_) => CheckoutPhase::Redirected,
        }
    }

    /// Whether an attempt is between order creation and its payment event.
    #[must_use]
    pub const fn in_flight(&self) -> bool {
        matches!(self, Self::OrderCreating { .. } | Self::AwaitingPayment { .. })
    }
}

/// The checkout flow of one storefront.
#[derive(Debug)]
pub struct CheckoutFlow {
    state: CheckoutState,
    trail: Vec<CheckoutPhase>,
    payment: PaymentConfig,
}

impl CheckoutFlow {
    #[must_use]
    pub fn new(payment: PaymentConfig) -> Self {
        Self {
            state: CheckoutState::Idle,
            trail: vec![CheckoutPhase::Idle],
            payment,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    #[must_use]
    pub const fn phase(&self) -> CheckoutPhase {
        self.state.phase()
    }

    /// Phases visited by the current attempt, oldest first.
    #[must_use]
    pub fn trail(&self) -> &[CheckoutPhase] {
        &self.trail
    }

    /// Attempt currently waiting for its payment event.
    #[must_use]
    pub const fn awaiting(&self) -> Option<AttemptId> {
        match &self.state {
            CheckoutState::AwaitingPayment { attempt, .. } => Some(*attempt),
            _ => None,
        }
    }

    /// Confirmation of the last paid order, if the flow ended there.
    #[must_use]
    pub const fn confirmation(&self) -> Option<&Confirmation> {
        match &self.state {
            CheckoutState::Redirected(confirmation) => Some(confirmation),
            _ => None,
        }
    }

    fn transition(&mut self, state: CheckoutState) {
        let phase = state.phase();
        tracing::debug!(from = ?self.state.phase(), to = ?phase, "Checkout transition");
        self.state = state;
        self.trail.push(phase);
    }

    /// Start a checkout attempt and create the backend order.
    ///
    /// Checks run in order: logged in, default address, non-empty cart. A
    /// failed check leaves the flow where it was and sends no request.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn`, a `ValidationError`, or the network
    /// error from order creation (after which the flow is idle again).
    #[instrument(skip_all)]
    pub async fn begin(
        &mut self,
        api: &BackendClient,
        session: &Session,
        cart: &Cart,
        addresses: &AddressBook,
    ) -> Result<PaymentRequest, AppError> {
        if self.state.in_flight() {
            return Err(ValidationError::CheckoutInProgress.into());
        }
        let token = session.token().ok_or(AuthError::NotLoggedIn)?;
        let address = addresses
            .default_address()
            .ok_or(ValidationError::NoDefaultAddress)?;
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }

        let attempt = AttemptId::new();
        self.trail.clear();
        self.trail.push(CheckoutPhase::Idle);
        self.transition(CheckoutState::OrderCreating { attempt });
        add_breadcrumb("checkout", "Creating order", Some(&[("attempt", &attempt.to_string())]));

        let created = match api.create_order(token, address).await {
            Ok(created) => created,
            Err(e) => {
                self.transition(CheckoutState::Idle);
                return Err(e.into());
            }
        };

        let total = created.order.effective_total().unwrap_or_else(|| cart.total());
        let Some(amount) = total.to_minor_units() else {
            self.transition(CheckoutState::Idle);
            return Err(AppError::Payment(format!("order total {total} is out of range")));
        };

        let (prefill_name, prefill_email) = session.user().map_or_else(
            || (String::new(), String::new()),
            |user| {
                (
                    format!("{} {}", user.first_name, user.last_name),
                    user.email.to_string(),
                )
            },
        );

        let request = PaymentRequest {
            attempt,
            key: self.payment.key_id.clone(),
            amount,
            currency: self.payment.currency.code().to_string(),
            name: self.payment.store_name.clone(),
            description: format!("Order Payment #{}", created.order.id),
            order_id: created.gateway_order_id.clone(),
            prefill: PaymentPrefill {
                name: prefill_name,
                email: prefill_email,
                contact: String::new(),
            },
            theme: PaymentTheme {
                color: self.payment.theme_color.clone(),
            },
        };

        info!(
            attempt = %attempt,
            order_id = %created.order.id,
            amount,
            "Order created, awaiting payment"
        );
        self.transition(CheckoutState::AwaitingPayment {
            attempt,
            order: Box::new(created),
        });
        Ok(request)
    }

    /// Feed a payment widget callback into the flow.
    ///
    /// On success the cart is cleared (failures are logged, not retried) and
    /// the flow ends on the confirmation. On failure the flow goes back to
    /// idle and the cart is left alone.
    #[instrument(skip_all, fields(attempt = %event.attempt()))]
    pub async fn handle_event(&mut self, event: PaymentEvent, cart: &mut Cart) -> PaymentOutcome {
        let (attempt, created) = match &self.state {
            CheckoutState::AwaitingPayment { attempt, order } if *attempt == event.attempt() => {
                (*attempt, order.as_ref().clone())
            }
            other => {
                warn!(
                    phase = ?other.phase(),
                    awaiting = ?self.awaiting().map(|a| a.to_string()),
                    "Ignoring payment event"
                );
                return PaymentOutcome::Ignored;
            }
        };

        match event {
            PaymentEvent::Succeeded { payment_id, .. } => {
                let confirmation = Confirmation {
                    order_id: created.order.id.clone(),
                    transaction_id: created.transaction_id.clone(),
                };
                info!(order_id = %confirmation.order_id, payment_id = ?payment_id, "Payment succeeded");
                self.transition(CheckoutState::PaymentSucceeded {
                    attempt,
                    confirmation: confirmation.clone(),
                });

                if let Err(e) = cart.clear().await {
                    warn!(error = %e, "Could not fully clear cart after payment");
                }
                self.transition(CheckoutState::CartCleared {
                    attempt,
                    confirmation: confirmation.clone(),
                });

                self.transition(CheckoutState::Redirected(confirmation.clone()));
                PaymentOutcome::Confirmed(confirmation)
            }
            PaymentEvent::Failed {
                code, description, ..
            } => {
                let description = description
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_FAILURE_DESCRIPTION.to_string());
                warn!(code = ?code, description = %description, "Payment failed");
                self.transition(CheckoutState::PaymentFailed { attempt });
                self.transition(CheckoutState::Idle);
                PaymentOutcome::Failed { description }
            }
        }
    }

    /// Give up on the awaited payment (widget closed without paying).
    ///
    /// Returns false if no payment was awaited.
    pub fn abandon(&mut self) -> bool {
        if let CheckoutState::AwaitingPayment { attempt, .. } = &self.state {
            info!(attempt = %attempt, "Checkout abandoned");
            self.transition(CheckoutState::Idle);
            true
        } else {
            false
        }
    }

    /// Drop all state (used on logout).
    pub fn reset(&mut self) {
        self.state = CheckoutState::Idle;
        self.trail = vec![CheckoutPhase::Idle];
    }

    #[cfg(test)]
    pub(crate) fn await_payment(&mut self, order: CreatedOrder) -> AttemptId {
        let attempt = AttemptId::new();
        self.transition(CheckoutState::OrderCreating { attempt });
        self.transition(CheckoutState::AwaitingPayment {
            attempt,
            order: Box::new(order),
        });
        attempt
    }
}
