//! Domain layer for the storefront.
//!
//! This crate holds the pure business rules, free of I/O:
//! - `Money` in integer cents
//! - catalog `Product` records and their validation
//! - the per-user `Cart` and its mutation rules
//! - the pricing calculator (shipping threshold, tax, totals)
//! - the `Order` aggregate with its order/payment status machines

pub mod cart;
pub mod error;
pub mod money;
pub mod order;
pub mod pricing;
pub mod product;

pub use cart::{Cart, CartItem};
pub use error::DomainError;
pub use money::Money;
pub use order::{
    Order, OrderLineItem, OrderStatus, PaymentMethod, PaymentStatus, ShippingAddress,
    StatusUpdate,
};
pub use pricing::PriceBreakdown;
pub use product::{Category, NewProduct, Product, ProductPatch};
