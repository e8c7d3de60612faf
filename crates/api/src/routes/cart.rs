//! Cart endpoints, scoped to the authenticated caller.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::ProductId;
use serde::Deserialize;
use store::Storefront;

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, parse_id};
use crate::routes::dto::{CartResponse, MessageResponse};

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// GET /api/cart
#[tracing::instrument(skip(state, caller), fields(user = %caller.user_id))]
pub async fn get<S: Storefront>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(caller): AuthUser,
) -> Result<Json<CartResponse>, ApiError> {
    let view = state.carts.get_cart(caller.user_id).await?;
    Ok(Json(view.into()))
}

/// POST /api/cart/add
#[tracing::instrument(skip(state, caller), fields(user = %caller.user_id))]
pub async fn add<S: Storefront>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(caller): AuthUser,
    ApiJson(req): ApiJson<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let product_id = parse_id::<ProductId>(&req.product_id)?;
    let quantity = u32::try_from(req.quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| ApiError::BadRequest("Quantity must be at least 1".to_string()))?;

    let view = state
        .carts
        .add_item(caller.user_id, product_id, quantity)
        .await?;
    Ok(Json(view.into()))
}

/// PUT /api/cart/update
#[tracing::instrument(skip(state, caller), fields(user = %caller.user_id))]
pub async fn update<S: Storefront>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(caller): AuthUser,
    ApiJson(req): ApiJson<UpdateItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let product_id = parse_id::<ProductId>(&req.product_id)?;
    let view = state
        .carts
        .update_item(caller.user_id, product_id, req.quantity)
        .await?;
    Ok(Json(view.into()))
}

/// DELETE /api/cart/remove/{product_id}
#[tracing::instrument(skip(state, caller), fields(user = %caller.user_id))]
pub async fn remove<S: Storefront>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(caller): AuthUser,
    ApiPath(product_id): ApiPath<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let product_id = parse_id::<ProductId>(&product_id)?;
    let view = state.carts.remove_item(caller.user_id, product_id).await?;
    Ok(Json(view.into()))
}

/// DELETE /api/cart/clear
#[tracing::instrument(skip(state, caller), fields(user = %caller.user_id))]
pub async fn clear<S: Storefront>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(caller): AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    state.carts.clear(caller.user_id).await?;
    Ok(Json(MessageResponse {
        message: "Cart cleared",
    }))
}
