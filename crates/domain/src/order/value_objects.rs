//! Value objects for the order domain.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;

/// How the customer intends to pay. A label only; no gateway is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "Debit Card")]
    DebitCard,
    PayPal,
    #[serde(rename = "Cash on Delivery")]
    CashOnDelivery,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::PayPal,
        PaymentMethod::CashOnDelivery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "Credit Card",
            PaymentMethod::DebitCard => "Debit Card",
            PaymentMethod::PayPal => "PayPal",
            PaymentMethod::CashOnDelivery => "Cash on Delivery",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("Invalid payment method: {s}")))
    }
}

/// Where the order ships. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone: String,
}

impl ShippingAddress {
    /// Checks that no field is blank.
    pub fn validate(&self) -> Result<(), DomainError> {
        let fields = [
            ("fullName", &self.full_name),
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zipCode", &self.zip_code),
            ("country", &self.country),
            ("phone", &self.phone),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(DomainError::validation(format!(
                "Shipping address {name} is required"
            ))),
            None => Ok(()),
        }
    }
}

/// Snapshot of a product line captured when the order is placed.
///
/// Later edits to the product never change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub price: Money,
    pub quantity: u32,
}
