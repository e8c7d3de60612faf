//! Order pricing: items subtotal, flat shipping with a free-shipping
//! threshold, and sales tax.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;

/// Orders whose items subtotal is strictly above this ship for free.
pub const FREE_SHIPPING_THRESHOLD: Money = Money::from_dollars(100);

/// Shipping charged at or below the free-shipping threshold.
pub const FLAT_SHIPPING: Money = Money::from_dollars(10);

/// Tax rate, in percent of the items subtotal.
pub const TAX_RATE_PERCENT: i64 = 18;

/// The four price components stored on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub items_price: Money,
    pub shipping_price: Money,
    pub tax_price: Money,
    pub total_price: Money,
}

/// Computes the price breakdown for `(unit price, quantity)` lines.
///
/// Every amount is an exact number of cents: tax is rounded half-up once,
/// and the total is the exact sum of the three components.
pub fn calculate<I>(lines: I) -> Result<PriceBreakdown, DomainError>
where
    I: IntoIterator<Item = (Money, u32)>,
{
    let mut items_price = Money::zero();

    for (unit_price, quantity) in lines {
        if unit_price.is_negative() {
            return Err(DomainError::validation(format!(
                "Price cannot be negative: {unit_price}"
            )));
        }
        if quantity == 0 {
            return Err(DomainError::validation("Quantity must be at least 1"));
        }
        items_price = unit_price
            .checked_multiply(quantity)
            .and_then(|line| items_price.checked_add(line))
            .ok_or_else(|| DomainError::validation("Order total is too large"))?;
    }

    let shipping_price = shipping_for(items_price);
    let tax_price = items_price.percent_half_up(TAX_RATE_PERCENT);
    let total_price = items_price
        .checked_add(shipping_price)
        .and_then(|sum| sum.checked_add(tax_price))
        .ok_or_else(|| DomainError::validation("Order total is too large"))?;

    Ok(PriceBreakdown {
        items_price,
        shipping_price,
        tax_price,
        total_price,
    })
}

/// Shipping charged for a given items subtotal.
pub fn shipping_for(items_price: Money) -> Money {
    if items_price > FREE_SHIPPING_THRESHOLD {
        Money::zero()
    } else {
        FLAT_SHIPPING
    }
}
