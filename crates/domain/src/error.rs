//! Domain error types.

use common::ProductId;
use thiserror::Error;

/// Errors raised by the pure domain rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// The cart has no line for the given product.
    #[error("Item not found in cart")]
    CartItemNotFound { product_id: ProductId },

    /// An order was requested from a cart with no items.
    #[error("Cart is empty")]
    EmptyCart,

    /// A status field was asked to move along a transition the table forbids.
    #[error("Invalid {field} transition: cannot move from {from} to {to}")]
    InvalidTransition {
        field: &'static str,
        from: &'static str,
        to: &'static str,
    },
}

impl DomainError {
    /// Shorthand for building a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }
}
