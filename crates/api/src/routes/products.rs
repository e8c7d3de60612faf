//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::ProductId;
use domain::{Category, NewProduct, ProductPatch};
use serde::Deserialize;
use store::{ProductQuery, ProductSort, Storefront};

use crate::AppState;
use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, parse_id};
use crate::routes::dto::{MessageResponse, ProductPageResponse, ProductResponse, money_from_json};

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListParams {
    fn into_query(self) -> Result<ProductQuery, ApiError> {
        let mut query = ProductQuery::new().sort(ProductSort::parse(self.sort.as_deref()));

        match self.category.as_deref().map(str::trim) {
            None | Some("") | Some("All") => {}
            Some(name) => query = query.category(name.parse::<Category>()?),
        }
        if let Some(search) = self.search {
            query = query.search(search);
        }
        if let Some(page) = self.page {
            query = query.page(page);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        Ok(query)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub original_price: Option<f64>,
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: String,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub num_reviews: u32,
    #[serde(default)]
    pub featured: bool,
    pub brand: Option<String>,
}

impl CreateProductRequest {
    fn into_new_product(self) -> Result<NewProduct, ApiError> {
        Ok(NewProduct {
            name: self.name,
            description: self.description,
            price: money_from_json("price", self.price)?,
            original_price: self
                .original_price
                .map(|p| money_from_json("originalPrice", p))
                .transpose()?,
            image: self.image,
            images: self.images,
            category: self.category.parse::<Category>()?,
            stock: self.stock,
            rating: self.rating,
            num_reviews: self.num_reviews,
            featured: self.featured,
            brand: self.brand,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    pub category: Option<String>,
    pub stock: Option<u32>,
    pub featured: Option<bool>,
    pub brand: Option<String>,
}

impl UpdateProductRequest {
    fn into_patch(self) -> Result<ProductPatch, ApiError> {
        Ok(ProductPatch {
            name: self.name,
            description: self.description,
            price: self.price.map(|p| money_from_json("price", p)).transpose()?,
            original_price: self
                .original_price
                .map(|p| money_from_json("originalPrice", p))
                .transpose()?,
            image: self.image,
            images: self.images,
            category: self.category.map(|c| c.parse::<Category>()).transpose()?,
            stock: self.stock,
            featured: self.featured,
            brand: self.brand,
        })
    }
}

// -- Handlers --

/// GET /api/products: filtered, sorted, paginated listing.
#[tracing::instrument(skip(state))]
pub async fn list<S: Storefront>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<ProductPageResponse>, ApiError> {
    let page = state.catalog.list(&params.into_query()?).await?;
    Ok(Json(page.into()))
}

/// GET /api/products/featured
pub async fn featured<S: Storefront>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.catalog.featured().await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /api/products/categories
pub async fn categories<S: Storefront>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<Vec<&'static str>> {
    Json(state.catalog.categories().iter().map(|c| c.as_str()).collect())
}

/// GET /api/products/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Storefront>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.catalog.get(parse_id::<ProductId>(&id)?).await?;
    Ok(Json(product.into()))
}

/// POST /api/products: admin only.
#[tracing::instrument(skip(state, admin, req), fields(admin = %admin.user_id))]
pub async fn create<S: Storefront>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(admin): AdminUser,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = state.catalog.create(req.into_new_product()?).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PUT /api/products/{id}: admin only, partial update.
#[tracing::instrument(skip(state, admin, req), fields(admin = %admin.user_id))]
pub async fn update<S: Storefront>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .catalog
        .update(parse_id::<ProductId>(&id)?, req.into_patch()?)
        .await?;
    Ok(Json(product.into()))
}

/// DELETE /api/products/{id}: admin only.
#[tracing::instrument(skip(state, admin), fields(admin = %admin.user_id))]
pub async fn delete<S: Storefront>(
    State(state): State<Arc<AppState<S>>>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.catalog.delete(parse_id::<ProductId>(&id)?).await?;
    Ok(Json(MessageResponse {
        message: "Product removed",
    }))
}
