//! Per-user shopping cart.

use chrono::{DateTime, Utc};
use common::{CartId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// One product line in a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A user's cart: unique-by-product lines kept in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart for a user.
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: CartId::new(),
            user_id,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a cart from persisted parts.
    pub fn from_parts(
        id: CartId,
        user_id: UserId,
        items: Vec<CartItem>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            items,
            created_at,
            updated_at,
        }
    }

    /// Returns the lines in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds `quantity` units of a product, merging with an existing line.
    pub fn add_item(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::validation("Quantity must be at least 1"));
        }

        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(quantity)
                    .ok_or_else(|| DomainError::validation("Quantity is too large"))?;
            }
            None => self.items.push(CartItem {
                product_id,
                quantity,
            }),
        }
        self.updated_at = now;
        Ok(())
    }

    /// Sets the quantity of an existing line; a quantity of zero or less
    /// removes the line.
    pub fn update_item(
        &mut self,
        product_id: ProductId,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let index = self
            .items
            .iter()
            .position(|i| i.product_id == product_id)
            .ok_or(DomainError::CartItemNotFound { product_id })?;

        if quantity <= 0 {
            self.items.remove(index);
        } else {
            let quantity = u32::try_from(quantity)
                .map_err(|_| DomainError::validation("Quantity is too large"))?;
            if let Some(item) = self.items.get_mut(index) {
                item.quantity = quantity;
            }
        }
        self.updated_at = now;
        Ok(())
    }

    /// Removes a product's line. Returns false if there was none.
    pub fn remove_item(&mut self, product_id: ProductId, now: DateTime<Utc>) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        let removed = self.items.len() != before;
        if removed {
            self.updated_at = now;
        }
        removed
    }

    /// Empties the cart.
    pub fn clear(&mut self, now: DateTime<Utc>) {
        self.items.clear();
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart() -> Cart {
        Cart::new(UserId::new(), Utc::now())
    }

    #[test]
    fn new_cart_is_empty() {
        let cart = cart();
        assert!(cart.is_empty());
        assert!(cart.items().is_empty());
    }

    #[test]
    fn adding_same_product_twice_merges_lines() {
        let mut cart = cart();
        let product = ProductId::new();

        cart.add_item(product, 1, Utc::now()).unwrap();
        cart.add_item(product, 1, Utc::now()).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn lines_keep_insertion_order() {
        let mut cart = cart();
        let a = ProductId::new();
        let b = ProductId::new();
        let c = ProductId::new();

        cart.add_item(b, 1, Utc::now()).unwrap();
        cart.add_item(a, 2, Utc::now()).unwrap();
        cart.add_item(c, 3, Utc::now()).unwrap();
        cart.add_item(a, 1, Utc::now()).unwrap();

        let order: Vec<_> = cart.items().iter().map(|i| i.product_id).collect();
        assert_eq!(order, vec![b, a, c]);
    }

    #[test]
    fn add_rejects_zero_quantity() {
        let mut cart = cart();
        let err = cart.add_item(ProductId::new(), 0, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(cart.is_empty());
    }

    #[test]
    fn update_sets_quantity() {
        let mut cart = cart();
        let product = ProductId::new();
        cart.add_item(product, 1, Utc::now()).unwrap();

        cart.update_item(product, 5, Utc::now()).unwrap();

        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn update_to_zero_or_less_removes_line() {
        let mut cart = cart();
        let a = ProductId::new();
        let b = ProductId::new();
        cart.add_item(a, 1, Utc::now()).unwrap();
        cart.add_item(b, 1, Utc::now()).unwrap();

        cart.update_item(a, 0, Utc::now()).unwrap();
        cart.update_item(b, -3, Utc::now()).unwrap();

        assert!(cart.is_empty());
    }

    #[test]
    fn update_missing_line_fails() {
        let mut cart = cart();
        let product = ProductId::new();
        let err = cart.update_item(product, 2, Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::CartItemNotFound { product_id: product });
    }

    #[test]
    fn remove_is_noop_when_absent() {
        let mut cart = cart();
        let product = ProductId::new();
        cart.add_item(product, 1, Utc::now()).unwrap();

        assert!(!cart.remove_item(ProductId::new(), Utc::now()));
        assert!(cart.remove_item(product, Utc::now()));
        assert!(cart.is_empty());
    }

    #[test]
    fn clear_empties_all_lines() {
        let mut cart = cart();
        cart.add_item(ProductId::new(), 1, Utc::now()).unwrap();
        cart.add_item(ProductId::new(), 4, Utc::now()).unwrap();

        cart.clear(Utc::now());

        assert!(cart.is_empty());
    }
}
