//! `checkout`: create the order, print the payment request, then feed the
//! payment outcome back in.
//!
//! The payment widget lives outside this process. Its answer comes from
//! `--outcome` or, when that is absent, from a prompt on stdin:
//!
//! ```text
//! success [payment_id]
//! failure [description]
//! cancel
//! ```

use clap::{Args, ValueEnum};

use vivahart_storefront::address::AddressField;
use vivahart_storefront::{PaymentEvent, PaymentOutcome, PaymentRequest, Storefront};

use super::{CommandError, account, cart, out, prompt_line};

/// Outcome reported by the payment widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Outcome {
    Success,
    Failure,
    Cancel,
}

#[derive(Args, Debug)]
pub struct CheckoutArgs {
    /// Street for a new default address (all address fields go together)
    #[arg(long, requires_all = ["city", "state", "postal_code", "country"])]
    street: Option<String>,

    #[arg(long)]
    city: Option<String>,

    #[arg(long)]
    state: Option<String>,

    #[arg(long)]
    postal_code: Option<String>,

    #[arg(long)]
    country: Option<String>,

    /// Payment outcome; prompted for on stdin when absent
    #[arg(long, value_enum)]
    outcome: Option<Outcome>,

    /// Gateway payment id reported with a successful outcome
    #[arg(long)]
    payment_id: Option<String>,

    /// Failure description reported with a failed outcome
    #[arg(long)]
    description: Option<String>,
}

impl CheckoutArgs {
    fn address_fields(&self) -> Option<[(AddressField, &str); 5]> {
        Some([
            (AddressField::Street, self.street.as_deref()?),
            (AddressField::City, self.city.as_deref()?),
            (AddressField::State, self.state.as_deref()?),
            (AddressField::PostalCode, self.postal_code.as_deref()?),
            (AddressField::Country, self.country.as_deref()?),
        ])
    }
}

/// Run one checkout attempt to its end.
///
/// # Errors
///
/// Returns an error if the checkout cannot start, the prompt cannot be read,
/// or the payment fails.
pub async fn run(storefront: &mut Storefront, args: CheckoutArgs) -> Result<(), CommandError> {
    if storefront.cart().is_remote() {
        storefront.refresh_cart().await?;
    }
    if let Some(fields) = args.address_fields() {
        storefront.open_address_form();
        for (field, value) in fields {
            storefront.set_address_field(field, value);
        }
        storefront.save_address()?;
    }

    cart::print_cart(storefront);
    if let Some(address) = storefront.addresses().default_address() {
        out(format_args!("Ship to: {}", address.one_line()));
    }

    let request = storefront.checkout().await?;
    out("");
    out("Payment request:");
    out(serde_json::to_string_pretty(&request)?);

    let event = match args.outcome {
        Some(outcome) => event_for(&request, outcome, args.payment_id, args.description),
        None => {
            let answer = prompt_line("Payment outcome (success [id] | failure [reason] | cancel): ")?;
            parse_answer(&request, &answer)?
        }
    };

    let Some(event) = event else {
        storefront.abandon_checkout();
        out("Checkout cancelled, your cart is unchanged");
        return Ok(());
    };

    match storefront.handle_payment(event).await {
        PaymentOutcome::Confirmed(confirmation) => {
            out(format_args!("Order {} placed", confirmation.order_id));
            if let Some(transaction_id) = &confirmation.transaction_id {
                out(format_args!("Transaction {transaction_id}"));
            }
            let order = storefront.confirmed_order().await?;
            account::print_order(&order);
            Ok(())
        }
        PaymentOutcome::Failed { description } => Err(CommandError::Storefront(
            vivahart_storefront::AppError::Payment(description),
        )),
        PaymentOutcome::Ignored => Err(CommandError::Input(
            "payment event did not match the checkout attempt".to_string(),
        )),
    }
}

fn event_for(
    request: &PaymentRequest,
    outcome: Outcome,
    payment_id: Option<String>,
    description: Option<String>,
) -> Option<PaymentEvent> {
    match outcome {
        Outcome::Success => Some(PaymentEvent::Succeeded {
            attempt: request.attempt,
            payment_id,
        }),
        Outcome::Failure => Some(PaymentEvent::Failed {
            attempt: request.attempt,
            code: None,
            description,
        }),
        Outcome::Cancel => None,
    }
}

fn parse_answer(request: &PaymentRequest, answer: &str) -> Result<Option<PaymentEvent>, CommandError> {
    let (word, rest) = answer
        .split_once(char::is_whitespace)
        .map_or((answer, ""), |(word, rest)| (word, rest.trim()));
    let detail = (!rest.is_empty()).then(|| rest.to_string());
    let outcome = Outcome::from_str(word, true).map_err(CommandError::Input)?;
    Ok(match outcome {
        Outcome::Success => event_for(request, outcome, detail, None),
        Outcome::Failure => event_for(request, outcome, None, detail),
        Outcome::Cancel => None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vivahart_core::GatewayOrderId;
    use vivahart_storefront::checkout::{AttemptId, PaymentPrefill, PaymentTheme};

    use super::*;

    fn request() -> PaymentRequest {
        PaymentRequest {
            attempt: AttemptId::new(),
            key: "rzp_test_local".to_string(),
            amount: 39900,
            currency: "INR".to_string(),
            name: "Vivah Art Studio".to_string(),
            description: "Order Payment #o1".to_string(),
            order_id: GatewayOrderId::new("order_Gw1"),
            prefill: PaymentPrefill {
                name: "Asha Rao".to_string(),
                email: "asha@example.com".to_string(),
                contact: String::new(),
            },
            theme: PaymentTheme {
                color: "#800080".to_string(),
            },
        }
    }

    #[test]
    fn test_parse_answer() {
        let request = request();

        let event = parse_answer(&request, "success pay_1").unwrap().unwrap();
        assert_eq!(
            event,
            PaymentEvent::Succeeded {
                attempt: request.attempt,
                payment_id: Some("pay_1".to_string()),
            }
        );

        let event = parse_answer(&request, "FAILURE card declined by bank").unwrap().unwrap();
        assert_eq!(
            event,
            PaymentEvent::Failed {
                attempt: request.attempt,
                code: None,
                description: Some("card declined by bank".to_string()),
            }
        );

        assert!(parse_answer(&request, "cancel").unwrap().is_none());
        assert!(parse_answer(&request, "maybe").is_err());
    }
}
