//! Orders: line-item snapshots, pricing at placement, and the
//! order/payment status machines.

mod aggregate;
mod state;
mod value_objects;

pub use aggregate::{Order, StatusUpdate};
pub use state::{OrderStatus, PaymentStatus};
pub use value_objects::{OrderLineItem, PaymentMethod, ShippingAddress};
