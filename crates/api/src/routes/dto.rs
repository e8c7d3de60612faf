//! JSON wire types.
//!
//! Records carry their ID as `_id`, fields are camelCase and money is a
//! decimal number of major units.

use chrono::{DateTime, Utc};
use common::{CartId, OrderId, ProductId, UserId};
use domain::{Money, Order, OrderLineItem, Product, ShippingAddress};
use serde::{Deserialize, Serialize};
use services::{CartLine, CartView};
use store::{OrderStats, ProductPage};

use crate::error::ApiError;

/// Converts a client decimal amount into `Money`.
pub fn money_from_json(field: &str, amount: f64) -> Result<Money, ApiError> {
    Money::from_major(amount).ok_or_else(|| ApiError::BadRequest(format!("Invalid {field}")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    pub image: String,
    pub images: Vec<String>,
    pub category: &'static str,
    pub stock: u32,
    pub rating: f64,
    pub num_reviews: u32,
    pub featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price.to_major(),
            original_price: p.original_price.map(|m| m.to_major()),
            image: p.image,
            images: p.images,
            category: p.category.as_str(),
            stock: p.stock,
            rating: p.rating,
            num_reviews: p.num_reviews,
            featured: p.featured,
            brand: p.brand,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductPageResponse {
    pub products: Vec<ProductResponse>,
    pub page: u32,
    pub pages: u64,
    pub total: u64,
}

impl From<ProductPage> for ProductPageResponse {
    fn from(page: ProductPage) -> Self {
        Self {
            products: page.products.into_iter().map(Into::into).collect(),
            page: page.page,
            pages: page.pages,
            total: page.total,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartLineResponse {
    pub product: ProductResponse,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    #[serde(rename = "_id")]
    pub id: CartId,
    pub user: UserId,
    pub items: Vec<CartLineResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CartView> for CartResponse {
    fn from(view: CartView) -> Self {
        Self {
            id: view.cart.id,
            user: view.cart.user_id,
            items: view
                .lines
                .into_iter()
                .map(|CartLine { product, quantity }| CartLineResponse {
                    product: product.into(),
                    quantity,
                })
                .collect(),
            created_at: view.cart.created_at,
            updated_at: view.cart.updated_at,
        }
    }
}

/// Shipping address as sent and received by clients.
///
/// Missing fields deserialize as empty and are rejected by validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressBody {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone: String,
}

impl From<AddressBody> for ShippingAddress {
    fn from(a: AddressBody) -> Self {
        Self {
            full_name: a.full_name,
            street: a.street,
            city: a.city,
            state: a.state,
            zip_code: a.zip_code,
            country: a.country,
            phone: a.phone,
        }
    }
}

impl From<ShippingAddress> for AddressBody {
    fn from(a: ShippingAddress) -> Self {
        Self {
            full_name: a.full_name,
            street: a.street,
            city: a.city,
            state: a.state,
            zip_code: a.zip_code,
            country: a.country,
            phone: a.phone,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub product: ProductId,
    pub name: String,
    pub image: String,
    pub price: f64,
    pub quantity: u32,
}

impl From<OrderLineItem> for OrderItemResponse {
    fn from(item: OrderLineItem) -> Self {
        Self {
            product: item.product_id,
            name: item.name,
            image: item.image,
            price: item.price.to_major(),
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub user: UserId,
    pub items: Vec<OrderItemResponse>,
    pub shipping_address: AddressBody,
    pub payment_method: &'static str,
    pub payment_status: &'static str,
    pub order_status: &'static str,
    pub items_price: f64,
    pub shipping_price: f64,
    pub tax_price: f64,
    pub total_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            user: o.user_id,
            items: o.items.into_iter().map(Into::into).collect(),
            shipping_address: o.shipping_address.into(),
            payment_method: o.payment_method.as_str(),
            payment_status: o.payment_status.as_str(),
            order_status: o.order_status.as_str(),
            items_price: o.items_price.to_major(),
            shipping_price: o.shipping_price.to_major(),
            tax_price: o.tax_price.to_major(),
            total_price: o.total_price.to_major(),
            paid_at: o.paid_at,
            delivered_at: o.delivered_at,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusCountResponse {
    #[serde(rename = "_id")]
    pub status: &'static str,
    pub count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatsResponse {
    pub total_orders: u64,
    pub total_revenue: f64,
    pub orders_by_status: Vec<StatusCountResponse>,
}

impl From<OrderStats> for OrderStatsResponse {
    fn from(stats: OrderStats) -> Self {
        Self {
            total_orders: stats.total_orders,
            total_revenue: stats.total_revenue.to_major(),
            orders_by_status: stats
                .orders_by_status
                .into_iter()
                .map(|c| StatusCountResponse {
                    status: c.status.as_str(),
                    count: c.count,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
