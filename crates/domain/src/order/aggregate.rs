//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;
use crate::pricing::{self, PriceBreakdown};

use super::{OrderLineItem, OrderStatus, PaymentMethod, PaymentStatus, ShippingAddress};

/// A placed order.
///
/// Line items, address, payment method and prices are fixed at placement;
/// only the two status fields and their timestamps change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderLineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub items_price: Money,
    pub shipping_price: Money,
    pub tax_price: Money,
    pub total_price: Money,
    pub paid_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin request to change an order's status fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusUpdate {
    pub order_status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

impl Order {
    /// Prices the given line snapshots and builds a new order in
    /// `Processing` / `Pending`.
    pub fn place(
        user_id: UserId,
        items: Vec<OrderLineItem>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::EmptyCart);
        }
        shipping_address.validate()?;

        let PriceBreakdown {
            items_price,
            shipping_price,
            tax_price,
            total_price,
        } = pricing::calculate(items.iter().map(|item| (item.price, item.quantity)))?;

        Ok(Self {
            id: OrderId::new(),
            user_id,
            items,
            shipping_address,
            payment_method,
            payment_status: PaymentStatus::default(),
            order_status: OrderStatus::default(),
            items_price,
            shipping_price,
            tax_price,
            total_price,
            paid_at: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns true if the order belongs to the given user.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Applies an admin status update.
    ///
    /// Both transitions are checked before either is applied. `paidAt` and
    /// `deliveredAt` are stamped the first time the order reaches
    /// `Completed` / `Delivered` and never overwritten. Returns whether
    /// anything changed.
    pub fn apply_status_update(
        &mut self,
        update: StatusUpdate,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        if update.order_status.is_none() && update.payment_status.is_none() {
            return Err(DomainError::validation(
                "Provide orderStatus or paymentStatus",
            ));
        }

        if let Some(next) = update.order_status
            && !self.order_status.can_transition_to(next)
        {
            return Err(DomainError::InvalidTransition {
                field: "orderStatus",
                from: self.order_status.as_str(),
                to: next.as_str(),
            });
        }
        if let Some(next) = update.payment_status
            && !self.payment_status.can_transition_to(next)
        {
            return Err(DomainError::InvalidTransition {
                field: "paymentStatus",
                from: self.payment_status.as_str(),
                to: next.as_str(),
            });
        }

        let mut changed = false;

        if let Some(next) = update.order_status {
            changed |= self.order_status != next;
            self.order_status = next;
            if next == OrderStatus::Delivered && self.delivered_at.is_none() {
                self.delivered_at = Some(now);
                changed = true;
            }
        }
        if let Some(next) = update.payment_status {
            changed |= self.payment_status != next;
            self.payment_status = next;
            if next == PaymentStatus::Completed && self.paid_at.is_none() {
                self.paid_at = Some(now);
                changed = true;
            }
        }

        if changed {
            self.updated_at = now;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use common::ProductId;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Grace Hopper".to_string(),
            street: "1 Compiler Rd".to_string(),
            city: "Arlington".to_string(),
            state: "VA".to_string(),
            zip_code: "22201".to_string(),
            country: "US".to_string(),
            phone: "555-0100".to_string(),
        }
    }

    fn line(price_cents: i64, quantity: u32) -> OrderLineItem {
        OrderLineItem {
            product_id: ProductId::new(),
            name: "Widget".to_string(),
            image: "widget.jpg".to_string(),
            price: Money::from_cents(price_cents),
            quantity,
        }
    }

    fn placed() -> Order {
        Order::place(
            UserId::new(),
            vec![line(2_500, 2)],
            address(),
            PaymentMethod::PayPal,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_place_prices_order_and_sets_defaults() {
        let order = placed();
        assert_eq!(order.items_price, Money::from_dollars(50));
        assert_eq!(order.shipping_price, Money::from_dollars(10));
        assert_eq!(order.tax_price, Money::from_dollars(9));
        assert_eq!(order.total_price, Money::from_dollars(69));
        assert_eq!(order.order_status, OrderStatus::Processing);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert!(order.paid_at.is_none());
        assert!(order.delivered_at.is_none());
    }

    #[test]
    fn test_place_rejects_empty_items() {
        let err = Order::place(
            UserId::new(),
            vec![],
            address(),
            PaymentMethod::PayPal,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::EmptyCart);
    }

    #[test]
    fn test_place_rejects_incomplete_address() {
        let mut addr = address();
        addr.phone.clear();
        let err = Order::place(
            UserId::new(),
            vec![line(100, 1)],
            addr,
            PaymentMethod::PayPal,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_payment_completed_sets_paid_at_once() {
        let mut order = placed();
        let first = Utc::now();
        let update = StatusUpdate {
            payment_status: Some(PaymentStatus::Completed),
            ..Default::default()
        };

        assert!(order.apply_status_update(update, first).unwrap());
        assert_eq!(order.paid_at, Some(first));

        let later = first + Duration::minutes(5);
        assert!(!order.apply_status_update(update, later).unwrap());
        assert_eq!(order.paid_at, Some(first));
    }

    #[test]
    fn test_delivered_sets_delivered_at_once() {
        let mut order = placed();
        let first = Utc::now();
        let update = StatusUpdate {
            order_status: Some(OrderStatus::Delivered),
            ..Default::default()
        };

        order.apply_status_update(update, first).unwrap();
        order
            .apply_status_update(update, first + Duration::hours(1))
            .unwrap();

        assert_eq!(order.order_status, OrderStatus::Delivered);
        assert_eq!(order.delivered_at, Some(first));
    }

    #[test]
    fn test_invalid_transition_changes_nothing() {
        let mut order = placed();
        order
            .apply_status_update(
                StatusUpdate {
                    order_status: Some(OrderStatus::Shipped),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap();
        let before = order.clone();

        let err = order
            .apply_status_update(
                StatusUpdate {
                    order_status: Some(OrderStatus::Processing),
                    payment_status: Some(PaymentStatus::Completed),
                },
                Utc::now(),
            )
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::InvalidTransition {
                field: "orderStatus",
                from: "Shipped",
                to: "Processing",
            }
        );
        assert_eq!(order, before);
    }

    #[test]
    fn test_empty_update_is_rejected() {
        let mut order = placed();
        let err = order
            .apply_status_update(StatusUpdate::default(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_cancel_then_refund() {
        let mut order = placed();
        let now = Utc::now();
        order
            .apply_status_update(
                StatusUpdate {
                    payment_status: Some(PaymentStatus::Completed),
                    ..Default::default()
                },
                now,
            )
            .unwrap();
        order
            .apply_status_update(
                StatusUpdate {
                    order_status: Some(OrderStatus::Cancelled),
                    payment_status: Some(PaymentStatus::Refunded),
                },
                now,
            )
            .unwrap();

        assert_eq!(order.order_status, OrderStatus::Cancelled);
        assert_eq!(order.payment_status, PaymentStatus::Refunded);
        assert_eq!(order.paid_at, Some(now));
    }

    #[test]
    fn test_totals_add_up() {
        let order = Order::place(
            UserId::new(),
            vec![line(14_999, 1), line(333, 3)],
            address(),
            PaymentMethod::CreditCard,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(
            order.total_price,
            order.items_price + order.shipping_price + order.tax_price
        );
    }
}
