//! Service error types.

use common::ProductId;
use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur in storefront workflows.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A domain rule rejected the request.
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// The backing store failed.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// The requested record does not exist.
    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: String },

    /// The caller may not access the record.
    #[error("{0}")]
    Forbidden(&'static str),

    /// A cart add asked for more units than are in stock.
    #[error("Insufficient stock")]
    StockUnavailable {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Checkout could not reserve the units for a line.
    #[error("Insufficient stock for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        requested: u32,
        available: u32,
    },

    /// Order placement exceeded its deadline; applied stock changes were undone.
    #[error("Order placement timed out, please retry")]
    Timeout,

    /// A spawned store call panicked or was aborted.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServiceError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns true if the same request may succeed when retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Timeout)
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;
