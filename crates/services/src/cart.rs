//! Per-user cart operations.

use chrono::Utc;
use common::{ProductId, UserId};
use domain::{Cart, Product};
use futures_util::future::try_join_all;
use store::{CartRepository, ProductRepository};

use crate::error::{Result, ServiceError};

/// A cart line joined with the current product record.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

/// A cart with its lines resolved against the catalog.
///
/// Lines whose product has since been deleted are omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct CartView {
    pub cart: Cart,
    pub lines: Vec<CartLine>,
}

/// Cart mutations scoped to one user at a time.
#[derive(Clone)]
pub struct CartService<S> {
    store: S,
}

impl<S> CartService<S>
where
    S: CartRepository + ProductRepository,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the user's cart, creating and saving an empty one if needed.
    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, user_id: UserId) -> Result<CartView> {
        let cart = self.fetch_or_create(user_id).await?;
        self.view(cart).await
    }

    /// Adds units of a product, merging with an existing line.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartView> {
        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

        if !product.has_stock(quantity) {
            return Err(ServiceError::StockUnavailable {
                product_id,
                requested: quantity,
                available: product.stock,
            });
        }

        let mut cart = self.fetch_or_create(user_id).await?;
        cart.add_item(product_id, quantity, Utc::now())?;
        self.store.save_cart(&cart).await?;

        metrics::counter!("cart_mutations_total", "op" => "add").increment(1);
        self.view(cart).await
    }

    /// Sets a line's quantity; zero or less removes the line.
    #[tracing::instrument(skip(self))]
    pub async fn update_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartView> {
        let mut cart = self.existing(user_id).await?;
        cart.update_item(product_id, quantity, Utc::now())?;
        self.store.save_cart(&cart).await?;

        metrics::counter!("cart_mutations_total", "op" => "update").increment(1);
        self.view(cart).await
    }

    /// Removes a product's line. Absent lines are ignored.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, user_id: UserId, product_id: ProductId) -> Result<CartView> {
        let mut cart = self.existing(user_id).await?;
        if cart.remove_item(product_id, Utc::now()) {
            self.store.save_cart(&cart).await?;
            metrics::counter!("cart_mutations_total", "op" => "remove").increment(1);
        }
        self.view(cart).await
    }

    /// Empties the user's cart. A user without a cart is left as is.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<()> {
        if let Some(mut cart) = self.store.get_cart(user_id).await? {
            cart.clear(Utc::now());
            self.store.save_cart(&cart).await?;
            metrics::counter!("cart_mutations_total", "op" => "clear").increment(1);
        }
        Ok(())
    }

    async fn fetch_or_create(&self, user_id: UserId) -> Result<Cart> {
        if let Some(cart) = self.store.get_cart(user_id).await? {
            return Ok(cart);
        }
        let cart = Cart::new(user_id, Utc::now());
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    async fn existing(&self, user_id: UserId) -> Result<Cart> {
        self.store
            .get_cart(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Cart", user_id))
    }

    async fn view(&self, cart: Cart) -> Result<CartView> {
        let products = try_join_all(
            cart.items()
                .iter()
                .map(|item| self.store.get_product(item.product_id)),
        )
        .await?;

        let lines = cart
            .items()
            .iter()
            .zip(products)
            .filter_map(|(item, product)| {
                product.map(|product| CartLine {
                    product,
                    quantity: item.quantity,
                })
            })
            .collect();

        Ok(CartView { cart, lines })
    }
}
