//! Status enums for orders.
//!
//! The backend sends lowercase status strings and has grown new values over
//! time, so every enum keeps an `Unknown` catch-all instead of failing the
//! whole order payload on an unexpected value.

use serde::{Deserialize, Serialize};

/// Visual tone used when rendering a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTone {
    Warning,
    Info,
    Success,
    Danger,
    Neutral,
}

macro_rules! define_status {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $wire:literal : $tone:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            /// A value this client does not know about.
            #[default]
            Unknown,
        }

        impl $name {
            /// Wire value as sent by the backend.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Unknown => "unknown",
                }
            }

            /// Badge tone for display.
            #[must_use]
            pub const fn tone(&self) -> StatusTone {
                match self {
                    $(Self::$variant => StatusTone::$tone,)+
                    Self::Unknown => StatusTone::Neutral,
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.to_ascii_lowercase().as_str() {
                    $($wire => Self::$variant,)+
                    _ => Self::Unknown,
                }
            }
        }

        impl From<$name> for String {
            fn from(status: $name) -> Self {
                status.as_str().to_owned()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_status! {
    /// Overall order status.
    OrderStatus {
        Pending => "pending": Warning,
        Confirmed => "confirmed": Info,
        Processing => "processing": Info,
        Shipped => "shipped": Info,
        Delivered => "delivered": Success,
        Cancelled => "cancelled": Danger,
    }
}

define_status! {
    /// Payment status of an order.
    PaymentStatus {
        Pending => "pending": Warning,
        Paid => "paid": Success,
        Completed => "completed": Success,
        Failed => "failed": Danger,
        Refunded => "refunded": Neutral,
    }
}

define_status! {
    /// Delivery status of an order.
    DeliveryStatus {
        Pending => "pending": Warning,
        Processing => "processing": Info,
        Shipped => "shipped": Info,
        InTransit => "in-transit": Info,
        Delivered => "delivered": Success,
        Cancelled => "cancelled": Danger,
    }
}
