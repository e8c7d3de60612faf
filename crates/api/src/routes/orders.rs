//! Checkout, order history and back-office order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::OrderId;
use domain::{OrderStatus, PaymentMethod, PaymentStatus, StatusUpdate};
use serde::Deserialize;
use services::PlaceOrder;
use store::Storefront;

use crate::AppState;
use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, parse_id};
use crate::routes::dto::{AddressBody, OrderResponse, OrderStatsResponse};

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub shipping_address: AddressBody,
    #[serde(default)]
    pub payment_method: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub order_status: Option<String>,
    pub payment_status: Option<String>,
}

impl UpdateStatusRequest {
    fn into_update(self) -> Result<StatusUpdate, ApiError> {
        Ok(StatusUpdate {
            order_status: self
                .order_status
                .map(|s| s.parse::<OrderStatus>())
                .transpose()?,
            payment_status: self
                .payment_status
                .map(|s| s.parse::<PaymentStatus>())
                .transpose()?,
        })
    }
}

fn to_responses(orders: Vec<domain::Order>) -> Json<Vec<OrderResponse>> {
    Json(orders.into_iter().map(Into::into).collect())
}

// -- Handlers --

/// POST /api/orders: place an order from the caller's cart.
#[tracing::instrument(skip(state, caller, req), fields(user = %caller.user_id))]
pub async fn create<S: Storefront>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(caller): AuthUser,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let request = PlaceOrder {
        shipping_address: req.shipping_address.into(),
        payment_method: req.payment_method.parse::<PaymentMethod>()?,
    };
    let order = state.orders.place_order(caller.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /api/orders/myorders
#[tracing::instrument(skip(state, caller), fields(user = %caller.user_id))]
pub async fn mine<S: Storefront>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    Ok(to_responses(state.orders.my_orders(caller.user_id).await?))
}

/// GET /api/orders/{id}: owner or admin.
#[tracing::instrument(skip(state, caller), fields(user = %caller.user_id))]
pub async fn get<S: Storefront>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .get_order(parse_id::<OrderId>(&id)?, caller)
        .await?;
    Ok(Json(order.into()))
}

/// GET /api/orders: admin only.
pub async fn list<S: Storefront>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    Ok(to_responses(state.orders.all_orders().await?))
}

/// PUT /api/orders/{id}/status: admin only.
#[tracing::instrument(skip(state, admin, req), fields(admin = %admin.user_id))]
pub async fn update_status<S: Storefront>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .update_status(parse_id::<OrderId>(&id)?, req.into_update()?)
        .await?;
    Ok(Json(order.into()))
}

/// GET /api/orders/stats/summary: admin only.
pub async fn stats<S: Storefront>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<OrderStatsResponse>, ApiError> {
    Ok(Json(state.orders.stats().await?.into()))
}
