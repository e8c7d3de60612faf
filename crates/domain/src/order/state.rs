//! Order and payment status machines.

use serde::{Deserialize, Serialize};

/// Fulfilment status of an order.
///
/// State transitions:
/// ```text
/// Processing ──► Confirmed ──► Shipped ──► Delivered
///     │              │            │
///     └──────────────┴────────────┴──► Cancelled
/// ```
///
/// Forward moves may skip steps (an admin can mark a processing order as
/// shipped). `Delivered` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order placed, not yet reviewed.
    #[default]
    Processing,

    /// Order accepted for fulfilment.
    Confirmed,

    /// Order handed to the carrier.
    Shipped,

    /// Order received by the customer (terminal state).
    Delivered,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Processing,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Returns true if the status may move to `next`.
    ///
    /// Staying in the same status is always allowed.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        if *self == next {
            return true;
        }
        match (self, next) {
            (Processing, Confirmed | Shipped | Delivered) => true,
            (Confirmed, Shipped | Delivered) => true,
            (Shipped, Delivered) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "Processing",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = crate::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| crate::DomainError::validation(format!("Invalid order status: {s}")))
    }
}

/// Payment status of an order.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Completed ──► Refunded
///           └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Every status.
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    /// Returns true if the status may move to `next`.
    ///
    /// Staying in the same status is always allowed.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;

        *self == next
            || matches!(
                (self, next),
                (Pending, Completed | Failed) | (Completed, Refunded)
            )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Completed => "Completed",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Refunded => "Refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = crate::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| crate::DomainError::validation(format!("Invalid payment status: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(OrderStatus::default(), OrderStatus::Processing);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
    }

    #[test]
    fn test_forward_order_transitions() {
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
    }

    #[test]
    fn test_backward_order_transitions_rejected() {
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Processing));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Processing));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Shipped));
    }

    #[test]
    fn test_can_cancel_from_non_terminal_states() {
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Processing));
    }

    #[test]
    fn test_same_status_is_allowed() {
        for status in OrderStatus::ALL {
            assert!(status.can_transition_to(status));
        }
        for status in PaymentStatus::ALL {
            assert!(status.can_transition_to(status));
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(!OrderStatus::Confirmed.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_payment_transitions() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Completed));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Failed));
        assert!(PaymentStatus::Completed.can_transition_to(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Refunded.can_transition_to(PaymentStatus::Completed));
        assert!(!PaymentStatus::Failed.can_transition_to(PaymentStatus::Completed));
    }

    #[test]
    fn test_parse_and_display() {
        for status in OrderStatus::ALL {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
        for status in PaymentStatus::ALL {
            assert_eq!(status.to_string().parse::<PaymentStatus>().unwrap(), status);
        }
        assert!("Lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"Shipped\"");
        let back: PaymentStatus = serde_json::from_str("\"Refunded\"").unwrap();
        assert_eq!(back, PaymentStatus::Refunded);
    }
}
