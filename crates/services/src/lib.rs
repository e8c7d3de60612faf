//! Application services for the storefront.
//!
//! Each service wraps a `store::Storefront` backend:
//! - `CatalogService`: product listing and admin management
//! - `CartService`: per-user cart mutations
//! - `OrderService`: the checkout workflow with stock compensation and a
//!   deadline, order reads with owner-or-admin access, and status updates

pub mod caller;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod order;

pub use caller::{Caller, Role};
pub use cart::{CartLine, CartService, CartView};
pub use catalog::{CatalogService, FEATURED_LIMIT};
pub use error::{Result, ServiceError};
pub use order::{DEFAULT_ORDER_TIMEOUT, OrderService, PlaceOrder};
