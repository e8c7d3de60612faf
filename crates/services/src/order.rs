//! Order placement workflow and order queries.

use std::time::Duration;

use chrono::Utc;
use common::{OrderId, ProductId, UserId};
use domain::{
    Cart, DomainError, Order, OrderLineItem, PaymentMethod, ShippingAddress, StatusUpdate,
};
use futures_util::future::try_join_all;
use store::{OrderStats, ProductRepository, StockDecrement, Storefront};
use tokio::time::{Instant, timeout_at};

use crate::caller::Caller;
use crate::error::{Result, ServiceError};

/// Default deadline for placing an order.
pub const DEFAULT_ORDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Checkout request.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

/// Turns carts into orders and serves order reads and admin updates.
///
/// Placement runs these steps against the caller's cart:
/// 1. Validate the request
/// 2. Resolve cart lines to current products and snapshot them
/// 3. Price the order
/// 4. Reserve stock line by line with a conditional decrement
/// 5. Persist the order
/// 6. Empty the cart
///
/// If step 4 or 5 fails, every decrement already applied is restored.
/// The deadline bounds steps 2 to 5. Store writes still in flight when it
/// passes are not cancelled; they finish and are undone in the background.
#[derive(Clone)]
pub struct OrderService<S> {
    store: S,
    timeout: Duration,
}

impl<S: Storefront> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self::with_timeout(store, DEFAULT_ORDER_TIMEOUT)
    }

    pub fn with_timeout(store: S, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Places an order from the user's cart.
    #[tracing::instrument(skip(self, request))]
    pub async fn place_order(&self, user_id: UserId, request: PlaceOrder) -> Result<Order> {
        let started = std::time::Instant::now();
        let deadline = Instant::now() + self.timeout;

        let result = self.place(user_id, request, deadline).await;

        metrics::histogram!("order_placement_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        match &result {
            Ok(order) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(
                    order_id = %order.id,
                    total = %order.total_price,
                    lines = order.items.len(),
                    "order placed"
                );
            }
            Err(e) => {
                metrics::counter!("orders_failed_total", "reason" => failure_reason(e))
                    .increment(1);
                tracing::warn!(error = %e, "order placement failed");
            }
        }
        result
    }

    async fn place(&self, user_id: UserId, request: PlaceOrder, deadline: Instant) -> Result<Order> {
        request.shipping_address.validate()?;

        // Reads are safe to abandon at the deadline.
        let (mut cart, order) = match timeout_at(deadline, self.build_order(user_id, request)).await
        {
            Ok(built) => built?,
            Err(_) => {
                tracing::warn!("deadline passed while loading cart and products");
                return Err(ServiceError::Timeout);
            }
        };

        let reserved = self.reserve_stock(&order, deadline).await?;
        self.persist(&order, reserved, deadline).await?;

        cart.clear(Utc::now());
        if let Err(e) = self.store.save_cart(&cart).await {
            tracing::error!(order_id = %order.id, error = %e, "failed to empty cart after checkout");
        }

        Ok(order)
    }

    /// Loads the cart, resolves its lines and prices the order.
    async fn build_order(&self, user_id: UserId, request: PlaceOrder) -> Result<(Cart, Order)> {
        let cart = match self.store.get_cart(user_id).await? {
            Some(cart) if !cart.is_empty() => cart,
            _ => return Err(DomainError::EmptyCart.into()),
        };

        let products = try_join_all(
            cart.items()
                .iter()
                .map(|item| self.store.get_product(item.product_id)),
        )
        .await?;

        let mut lines = Vec::with_capacity(products.len());
        for (item, product) in cart.items().iter().zip(products) {
            let product =
                product.ok_or_else(|| ServiceError::not_found("Product", item.product_id))?;
            lines.push(OrderLineItem {
                product_id: product.id,
                name: product.name,
                image: product.image,
                price: product.price,
                quantity: item.quantity,
            });
        }

        let order = Order::place(
            user_id,
            lines,
            request.shipping_address,
            request.payment_method,
            Utc::now(),
        )?;
        Ok((cart, order))
    }

    /// Decrements stock for every line, undoing earlier lines on failure.
    ///
    /// Each decrement runs as its own task. At the deadline the caller stops
    /// waiting and the task's outcome is undone in the background.
    async fn reserve_stock(
        &self,
        order: &Order,
        deadline: Instant,
    ) -> Result<Vec<(ProductId, u32)>> {
        let mut reserved = Vec::with_capacity(order.items.len());

        for line in &order.items {
            if Instant::now() >= deadline {
                tracing::warn!(order_id = %order.id, "deadline passed while reserving stock");
                compensate(&self.store, &reserved).await;
                return Err(ServiceError::Timeout);
            }

            let (product_id, quantity) = (line.product_id, line.quantity);
            let store = self.store.clone();
            let mut task =
                tokio::spawn(async move { store.decrement_stock(product_id, quantity).await });

            let outcome = match timeout_at(deadline, &mut task).await {
                Ok(Ok(result)) => result.map_err(ServiceError::from),
                Ok(Err(e)) => Err(e.into()),
                Err(_) => {
                    tracing::warn!(order_id = %order.id, %product_id, "deadline passed while reserving stock");
                    compensate(&self.store, &reserved).await;
                    let store = self.store.clone();
                    tokio::spawn(async move {
                        if let Ok(Ok(StockDecrement::Applied { .. })) = task.await {
                            compensate(&store, &[(product_id, quantity)]).await;
                        }
                    });
                    return Err(ServiceError::Timeout);
                }
            };

            match outcome {
                Ok(StockDecrement::Applied { remaining }) => {
                    tracing::debug!(%product_id, remaining, "stock reserved");
                    reserved.push((product_id, quantity));
                }
                Ok(StockDecrement::Insufficient { available }) => {
                    compensate(&self.store, &reserved).await;
                    return Err(ServiceError::InsufficientStock {
                        product_id,
                        name: line.name.clone(),
                        requested: quantity,
                        available,
                    });
                }
                Ok(StockDecrement::NotFound) => {
                    compensate(&self.store, &reserved).await;
                    return Err(ServiceError::not_found("Product", product_id));
                }
                Err(e) => {
                    compensate(&self.store, &reserved).await;
                    return Err(e);
                }
            }
        }

        Ok(reserved)
    }

    /// Inserts the order, restoring `reserved` stock if it is not persisted.
    ///
    /// The insert is never dropped mid-flight. Past the deadline it keeps
    /// running in the background, and an order that lands anyway is deleted
    /// before its stock is restored.
    async fn persist(
        &self,
        order: &Order,
        reserved: Vec<(ProductId, u32)>,
        deadline: Instant,
    ) -> Result<()> {
        if Instant::now() >= deadline {
            tracing::warn!(order_id = %order.id, "deadline passed before persisting order");
            compensate(&self.store, &reserved).await;
            return Err(ServiceError::Timeout);
        }

        let store = self.store.clone();
        let pending = order.clone();
        let mut task = tokio::spawn(async move { store.insert_order(&pending).await });

        match timeout_at(deadline, &mut task).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => {
                compensate(&self.store, &reserved).await;
                Err(e.into())
            }
            Ok(Err(e)) => {
                compensate(&self.store, &reserved).await;
                Err(e.into())
            }
            Err(_) => {
                tracing::warn!(order_id = %order.id, "deadline passed while persisting order");
                let store = self.store.clone();
                let order_id = order.id;
                tokio::spawn(async move {
                    if let Ok(Ok(())) = task.await {
                        if let Err(e) = store.delete_order(order_id).await {
                            // The order stands, so its stock stays reserved.
                            tracing::error!(%order_id, error = %e, "failed to withdraw late order");
                            return;
                        }
                        tracing::info!(%order_id, "late order withdrawn");
                    }
                    compensate(&store, &reserved).await;
                });
                Err(ServiceError::Timeout)
            }
        }
    }

    /// The caller's orders, newest first.
    pub async fn my_orders(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.store.orders_for_user(user_id).await?)
    }

    /// Fetches an order visible to its owner or an admin.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId, caller: Caller) -> Result<Order> {
        let order = self.load(id).await?;
        if !caller.is_admin() && !order.is_owned_by(caller.user_id) {
            return Err(ServiceError::Forbidden("Not authorized to view this order"));
        }
        Ok(order)
    }

    /// Every order, newest first.
    pub async fn all_orders(&self) -> Result<Vec<Order>> {
        Ok(self.store.all_orders().await?)
    }

    /// Applies an admin status change.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, update: StatusUpdate) -> Result<Order> {
        let mut order = self.load(id).await?;
        if order.apply_status_update(update, Utc::now())? {
            if !self.store.update_order(&order).await? {
                return Err(ServiceError::not_found("Order", id));
            }
            tracing::info!(
                order_id = %id,
                order_status = %order.order_status,
                payment_status = %order.payment_status,
                "order status updated"
            );
        }
        Ok(order)
    }

    pub async fn stats(&self) -> Result<OrderStats> {
        Ok(self.store.order_stats().await?)
    }

    async fn load(&self, id: OrderId) -> Result<Order> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", id))
    }
}

/// Restores stock in reverse order. Failures are logged and skipped.
async fn compensate<S: ProductRepository>(store: &S, reserved: &[(ProductId, u32)]) {
    for &(product_id, quantity) in reserved.iter().rev() {
        match store.restore_stock(product_id, quantity).await {
            Ok(()) => {
                metrics::counter!("stock_compensations_total").increment(1);
                tracing::info!(%product_id, quantity, "stock restored");
            }
            Err(e) => {
                tracing::error!(%product_id, quantity, error = %e, "stock restore failed");
            }
        }
    }
}

fn failure_reason(err: &ServiceError) -> &'static str {
    match err {
        ServiceError::Domain(DomainError::EmptyCart) => "empty_cart",
        ServiceError::Domain(_) => "validation",
        ServiceError::InsufficientStock { .. } => "insufficient_stock",
        ServiceError::NotFound { .. } => "not_found",
        ServiceError::Timeout => "timeout",
        _ => "internal",
    }
}
