use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};
use domain::{Cart, Money, Order, OrderStatus, PaymentStatus, Product};
use tokio::sync::RwLock;

use crate::{
    CartRepository, OrderRepository, OrderStats, ProductPage, ProductQuery, ProductRepository,
    ProductSort, Result, StatusCount, StockDecrement, StoreError,
};

#[derive(Debug, Default)]
struct Faults {
    fail_order_inserts: bool,
    fail_cart_saves: bool,
    order_insert_delay: Option<Duration>,
    decrement_delay: Option<Duration>,
    product_update_delay: Option<Duration>,
}

/// In-memory store implementation for tests and database-less runs.
///
/// This implementation keeps every collection in memory and provides
/// the same interface as the PostgreSQL implementation. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    carts: Arc<RwLock<HashMap<UserId, Cart>>>,
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    faults: Arc<RwLock<Faults>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored products.
    pub async fn product_count(&self) -> usize {
        self.products.read().await.len()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Makes subsequent `insert_order` calls fail.
    pub async fn set_fail_order_inserts(&self, fail: bool) {
        self.faults.write().await.fail_order_inserts = fail;
    }

    /// Makes subsequent `save_cart` calls fail.
    pub async fn set_fail_cart_saves(&self, fail: bool) {
        self.faults.write().await.fail_cart_saves = fail;
    }

    /// Delays every `insert_order` call by `delay`.
    pub async fn set_order_insert_delay(&self, delay: Option<Duration>) {
        self.faults.write().await.order_insert_delay = delay;
    }

    /// Delays every `decrement_stock` call by `delay` before it takes the lock.
    pub async fn set_decrement_delay(&self, delay: Option<Duration>) {
        self.faults.write().await.decrement_delay = delay;
    }

    /// Delays every `update_product` call by `delay` before it takes the lock.
    pub async fn set_product_update_delay(&self, delay: Option<Duration>) {
        self.faults.write().await.product_update_delay = delay;
    }

    async fn pause(&self, pick: impl Fn(&Faults) -> Option<Duration>) {
        let delay = pick(&*self.faults.read().await);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    /// Clears all collections.
    pub async fn clear(&self) {
        self.products.write().await.clear();
        self.carts.write().await.clear();
        self.orders.write().await.clear();
    }
}

fn compare_products(sort: ProductSort, a: &Product, b: &Product) -> Ordering {
    let primary = match sort {
        ProductSort::PriceLow => a.price.cmp(&b.price),
        ProductSort::PriceHigh => b.price.cmp(&a.price),
        ProductSort::Rating => b.rating.total_cmp(&a.rating),
        ProductSort::Newest => Ordering::Equal,
    };
    primary
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        self.products
            .write()
            .await
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn update_product(&self, product: &Product) -> Result<Option<Product>> {
        self.pause(|f| f.product_update_delay).await;

        let mut products = self.products.write().await;
        let Some(existing) = products.get_mut(&product.id) else {
            return Ok(None);
        };
        let stock = existing.stock;
        *existing = product.clone();
        existing.stock = stock;
        Ok(Some(existing.clone()))
    }

    async fn set_stock(&self, id: ProductId, stock: u32) -> Result<bool> {
        match self.products.write().await.get_mut(&id) {
            Some(product) => {
                product.stock = stock;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        Ok(self.products.write().await.remove(&id).is_some())
    }

    async fn query_products(&self, query: &ProductQuery) -> Result<ProductPage> {
        let products = self.products.read().await;
        let mut matching: Vec<&Product> = products.values().filter(|p| query.matches(p)).collect();
        matching.sort_by(|a, b| compare_products(query.sort, a, b));

        let total = matching.len() as u64;
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let page = matching
            .into_iter()
            .skip(offset)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(ProductPage::new(page, query, total))
    }

    async fn featured_products(&self, limit: usize) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut featured: Vec<&Product> = products.values().filter(|p| p.featured).collect();
        featured.sort_by(|a, b| compare_products(ProductSort::Newest, a, b));
        Ok(featured.into_iter().take(limit).cloned().collect())
    }

    async fn decrement_stock(&self, id: ProductId, quantity: u32) -> Result<StockDecrement> {
        self.pause(|f| f.decrement_delay).await;

        // Check and write under one write guard.
        let mut products = self.products.write().await;
        let Some(product) = products.get_mut(&id) else {
            return Ok(StockDecrement::NotFound);
        };
        if !product.has_stock(quantity) {
            return Ok(StockDecrement::Insufficient {
                available: product.stock,
            });
        }
        product.stock -= quantity;
        Ok(StockDecrement::Applied {
            remaining: product.stock,
        })
    }

    async fn restore_stock(&self, id: ProductId, quantity: u32) -> Result<()> {
        if let Some(product) = self.products.write().await.get_mut(&id) {
            product.stock = product.stock.saturating_add(quantity);
        }
        Ok(())
    }
}

#[async_trait]
impl CartRepository for InMemoryStore {
    async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>> {
        Ok(self.carts.read().await.get(&user_id).cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        if self.faults.read().await.fail_cart_saves {
            return Err(StoreError::Unavailable("cart save rejected".to_string()));
        }
        self.carts.write().await.insert(cart.user_id, cart.clone());
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        let (fail, delay) = {
            let faults = self.faults.read().await;
            (faults.fail_order_inserts, faults.order_insert_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(StoreError::Unavailable("order insert rejected".to_string()));
        }
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn update_order(&self, order: &Order) -> Result<bool> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool> {
        Ok(self.orders.write().await.remove(&id).is_some())
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut orders);
        Ok(orders)
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self.orders.read().await.values().cloned().collect();
        newest_first(&mut orders);
        Ok(orders)
    }

    async fn order_stats(&self) -> Result<OrderStats> {
        let orders = self.orders.read().await;

        let total_revenue = orders
            .values()
            .filter(|o| o.payment_status == PaymentStatus::Completed)
            .map(|o| o.total_price)
            .sum::<Money>();

        let orders_by_status = OrderStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: orders.values().filter(|o| o.order_status == status).count() as u64,
            })
            .filter(|c| c.count > 0)
            .collect();

        Ok(OrderStats {
            total_orders: orders.len() as u64,
            total_revenue,
            orders_by_status,
        })
    }
}
