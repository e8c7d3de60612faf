use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};
use domain::{Cart, Order, Product};

use crate::{OrderStats, ProductPage, ProductQuery, Result};

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    /// Stock was reduced; `remaining` is the new level.
    Applied { remaining: u32 },
    /// Stock was below the requested quantity and was left unchanged.
    Insufficient { available: u32 },
    /// No such product.
    NotFound,
}

/// Persistence for catalog products.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Inserts a new product.
    async fn insert_product(&self, product: &Product) -> Result<()>;

    /// Retrieves a product by ID.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Writes every field of a stored product except `stock`, which keeps
    /// its current stored value.
    ///
    /// Returns the product as stored, or `None` if it does not exist.
    async fn update_product(&self, product: &Product) -> Result<Option<Product>>;

    /// Sets the stock level outright. Returns false if the product does not exist.
    async fn set_stock(&self, id: ProductId, stock: u32) -> Result<bool>;

    /// Deletes a product. Returns false if it did not exist.
    async fn delete_product(&self, id: ProductId) -> Result<bool>;

    /// Runs a filtered, sorted and paginated catalog query.
    async fn query_products(&self, query: &ProductQuery) -> Result<ProductPage>;

    /// Retrieves up to `limit` featured products.
    async fn featured_products(&self, limit: usize) -> Result<Vec<Product>>;

    /// Atomically subtracts `quantity` from stock if and only if at least
    /// `quantity` units are available.
    ///
    /// Concurrent callers never observe or produce negative stock.
    async fn decrement_stock(&self, id: ProductId, quantity: u32) -> Result<StockDecrement>;

    /// Adds `quantity` units back to stock. Used to undo a decrement.
    async fn restore_stock(&self, id: ProductId, quantity: u32) -> Result<()>;
}

/// Persistence for per-user carts.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Retrieves the cart owned by a user.
    async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>>;

    /// Inserts or replaces the user's cart.
    async fn save_cart(&self, cart: &Cart) -> Result<()>;
}

/// Persistence for placed orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts a new order.
    async fn insert_order(&self, order: &Order) -> Result<()>;

    /// Retrieves an order by ID.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Replaces a stored order. Returns false if it does not exist.
    async fn update_order(&self, order: &Order) -> Result<bool>;

    /// Deletes an order. Returns false if it did not exist.
    async fn delete_order(&self, id: OrderId) -> Result<bool>;

    /// Retrieves a user's orders, newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Retrieves every order, newest first.
    async fn all_orders(&self) -> Result<Vec<Order>>;

    /// Computes order counts and completed-payment revenue.
    async fn order_stats(&self) -> Result<OrderStats>;
}

/// A backend providing every repository.
///
/// Blanket-implemented for any cloneable type that implements all three.
pub trait Storefront:
    ProductRepository + CartRepository + OrderRepository + Clone + 'static
{
}

impl<T> Storefront for T where
    T: ProductRepository + CartRepository + OrderRepository + Clone + 'static
{
}
