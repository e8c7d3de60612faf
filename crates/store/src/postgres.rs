use async_trait::async_trait;
use common::{CartId, OrderId, ProductId, UserId};
use domain::{
    Cart, CartItem, Category, Money, Order, OrderLineItem, OrderStatus, PaymentMethod,
    PaymentStatus, Product, ShippingAddress,
};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    CartRepository, OrderRepository, OrderStats, ProductPage, ProductQuery, ProductRepository,
    ProductSort, Result, StatusCount, StockDecrement, StoreError,
};

const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, original_price_cents, image, \
     images, category, stock, rating, num_reviews, featured, brand, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, user_id, items, shipping_address, payment_method, \
     payment_status, order_status, items_price_cents, shipping_price_cents, tax_price_cents, \
     total_price_cents, paid_at, delivered_at, created_at, updated_at";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        let images: serde_json::Value = row.try_get("images")?;
        let category: String = row.try_get("category")?;

        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            original_price: row
                .try_get::<Option<i64>, _>("original_price_cents")?
                .map(Money::from_cents),
            image: row.try_get("image")?,
            images: serde_json::from_value(images)?,
            category: category
                .parse::<Category>()
                .map_err(|e| corrupt("products", e))?,
            stock: to_u32("products", row.try_get("stock")?)?,
            rating: row.try_get("rating")?,
            num_reviews: to_u32("products", row.try_get("num_reviews")?)?,
            featured: row.try_get("featured")?,
            brand: row.try_get("brand")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_cart(row: PgRow) -> Result<Cart> {
        let items: serde_json::Value = row.try_get("items")?;
        let items: Vec<CartItem> = serde_json::from_value(items)?;

        Ok(Cart::from_parts(
            CartId::from_uuid(row.try_get::<Uuid, _>("id")?),
            UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            items,
            row.try_get("created_at")?,
            row.try_get("updated_at")?,
        ))
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let items: serde_json::Value = row.try_get("items")?;
        let items: Vec<OrderLineItem> = serde_json::from_value(items)?;
        let address: serde_json::Value = row.try_get("shipping_address")?;
        let address: ShippingAddress = serde_json::from_value(address)?;

        let payment_method: String = row.try_get("payment_method")?;
        let payment_status: String = row.try_get("payment_status")?;
        let order_status: String = row.try_get("order_status")?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            items,
            shipping_address: address,
            payment_method: payment_method
                .parse::<PaymentMethod>()
                .map_err(|e| corrupt("orders", e))?,
            payment_status: payment_status
                .parse::<PaymentStatus>()
                .map_err(|e| corrupt("orders", e))?,
            order_status: order_status
                .parse::<OrderStatus>()
                .map_err(|e| corrupt("orders", e))?,
            items_price: Money::from_cents(row.try_get("items_price_cents")?),
            shipping_price: Money::from_cents(row.try_get("shipping_price_cents")?),
            tax_price: Money::from_cents(row.try_get("tax_price_cents")?),
            total_price: Money::from_cents(row.try_get("total_price_cents")?),
            paid_at: row.try_get("paid_at")?,
            delivered_at: row.try_get("delivered_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn corrupt(table: &'static str, reason: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt {
        table,
        reason: reason.to_string(),
    }
}

fn to_u32(table: &'static str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| corrupt(table, format!("value {value} out of range")))
}

/// Escapes LIKE wildcards so the term matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_product_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    builder.push(" WHERE TRUE");
    if let Some(category) = query.category {
        builder.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(ref term) = query.search {
        let pattern = like_pattern(term);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn order_by(sort: ProductSort) -> &'static str {
    match sort {
        ProductSort::PriceLow => " ORDER BY price_cents ASC, created_at DESC, id ASC",
        ProductSort::PriceHigh => " ORDER BY price_cents DESC, created_at DESC, id ASC",
        ProductSort::Rating => " ORDER BY rating DESC, created_at DESC, id ASC",
        ProductSort::Newest => " ORDER BY created_at DESC, id ASC",
    }
}

#[async_trait]
impl ProductRepository for PostgresStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, original_price_cents, image,
                images, category, stock, rating, num_reviews, featured, brand, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.original_price.map(|p| p.cents()))
        .bind(&product.image)
        .bind(serde_json::to_value(&product.images)?)
        .bind(product.category.as_str())
        .bind(i64::from(product.stock))
        .bind(product.rating)
        .bind(i64::from(product.num_reviews))
        .bind(product.featured)
        .bind(&product.brand)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn update_product(&self, product: &Product) -> Result<Option<Product>> {
        // Stock is owned by the conditional decrement and `set_stock`.
        let row = sqlx::query(&format!(
            r#"
            UPDATE products SET
                name = $2, description = $3, price_cents = $4, original_price_cents = $5,
                image = $6, images = $7, category = $8, rating = $9,
                num_reviews = $10, featured = $11, brand = $12, updated_at = $13
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.original_price.map(|p| p.cents()))
        .bind(&product.image)
        .bind(serde_json::to_value(&product.images)?)
        .bind(product.category.as_str())
        .bind(product.rating)
        .bind(i64::from(product.num_reviews))
        .bind(product.featured)
        .bind(&product.brand)
        .bind(product.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn set_stock(&self, id: ProductId, stock: u32) -> Result<bool> {
        let result = sqlx::query("UPDATE products SET stock = $2, updated_at = NOW() WHERE id = $1")
            .bind(id.as_uuid())
            .bind(i64::from(stock))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query_products(&self, query: &ProductQuery) -> Result<ProductPage> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        push_product_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        push_product_filters(&mut select, query);
        select
            .push(order_by(query.sort))
            .push(" LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));

        let rows = select.build().fetch_all(&self.pool).await?;
        let products = rows
            .into_iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>>>()?;

        Ok(ProductPage::new(
            products,
            query,
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    async fn featured_products(&self, limit: usize) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE featured ORDER BY created_at DESC, id ASC LIMIT $1"
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    #[tracing::instrument(skip(self), fields(product_id = %id))]
    async fn decrement_stock(&self, id: ProductId, quantity: u32) -> Result<StockDecrement> {
        // The WHERE guard makes check-and-subtract a single atomic statement.
        let remaining: Option<i64> = sqlx::query_scalar(
            "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2 RETURNING stock",
        )
        .bind(id.as_uuid())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(remaining) = remaining {
            return Ok(StockDecrement::Applied {
                remaining: to_u32("products", remaining)?,
            });
        }

        let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match available {
            Some(available) => Ok(StockDecrement::Insufficient {
                available: to_u32("products", available)?,
            }),
            None => Ok(StockDecrement::NotFound),
        }
    }

    async fn restore_stock(&self, id: ProductId, quantity: u32) -> Result<()> {
        let result = sqlx::query("UPDATE products SET stock = stock + $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(i64::from(quantity))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(product_id = %id, quantity, "stock restore skipped, product no longer exists");
        }
        Ok(())
    }
}

#[async_trait]
impl CartRepository for PostgresStore {
    async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>> {
        let row = sqlx::query(
            "SELECT id, user_id, items, created_at, updated_at FROM carts WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart).transpose()
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, items, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                items = EXCLUDED.items,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(cart.id.as_uuid())
        .bind(cart.user_id.as_uuid())
        .bind(serde_json::to_value(cart.items())?)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, items, shipping_address, payment_method,
                payment_status, order_status, items_price_cents, shipping_price_cents,
                tax_price_cents, total_price_cents, paid_at, delivered_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(serde_json::to_value(&order.items)?)
        .bind(serde_json::to_value(&order.shipping_address)?)
        .bind(order.payment_method.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.order_status.as_str())
        .bind(order.items_price.cents())
        .bind(order.shipping_price.cents())
        .bind(order.tax_price.cents())
        .bind(order.total_price.cents())
        .bind(order.paid_at)
        .bind(order.delivered_at)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn update_order(&self, order: &Order) -> Result<bool> {
        // Only the status fields change after placement.
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                payment_status = $2, order_status = $3, paid_at = $4,
                delivered_at = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.payment_status.as_str())
        .bind(order.order_status.as_str())
        .bind(order.paid_at)
        .bind(order.delivered_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id ASC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn order_stats(&self) -> Result<OrderStats> {
        let total_orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        let revenue: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_price_cents), 0)::BIGINT FROM orders WHERE payment_status = $1",
        )
        .bind(PaymentStatus::Completed.as_str())
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query("SELECT order_status, COUNT(*) AS count FROM orders GROUP BY order_status")
            .fetch_all(&self.pool)
            .await?;

        let mut orders_by_status = rows
            .into_iter()
            .map(|row| {
                let status: String = row.try_get("order_status")?;
                let count: i64 = row.try_get("count")?;
                Ok(StatusCount {
                    status: status
                        .parse::<OrderStatus>()
                        .map_err(|e| corrupt("orders", e))?,
                    count: u64::try_from(count).unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        orders_by_status.sort_by_key(|c| OrderStatus::ALL.iter().position(|s| *s == c.status));

        Ok(OrderStats {
            total_orders: u64::try_from(total_orders).unwrap_or_default(),
            total_revenue: Money::from_cents(revenue),
            orders_by_status,
        })
    }
}
