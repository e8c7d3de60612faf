//! Catalog browsing and back-office product management.

use chrono::Utc;
use common::ProductId;
use domain::{Category, NewProduct, Product, ProductPatch};
use store::{ProductPage, ProductQuery, ProductRepository};

use crate::error::{Result, ServiceError};

/// Maximum number of products on the featured shelf.
pub const FEATURED_LIMIT: usize = 8;

/// Product listing and administration.
#[derive(Clone)]
pub struct CatalogService<S> {
    store: S,
}

impl<S: ProductRepository> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Runs a filtered, sorted and paginated listing.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, query: &ProductQuery) -> Result<ProductPage> {
        Ok(self.store.query_products(query).await?)
    }

    /// Returns up to eight featured products.
    pub async fn featured(&self) -> Result<Vec<Product>> {
        Ok(self.store.featured_products(FEATURED_LIMIT).await?)
    }

    pub async fn get(&self, id: ProductId) -> Result<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    #[tracing::instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewProduct) -> Result<Product> {
        let product = Product::create(input, Utc::now())?;
        self.store.insert_product(&product).await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Applies a partial update. Only supplied fields change.
    ///
    /// Stock is written only when the patch sets it, so checkouts that
    /// decrement it during the edit are never overwritten.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product> {
        let stock = patch.stock;
        let mut product = self.get(id).await?;
        product.apply_patch(patch, Utc::now())?;

        let mut stored = self
            .store
            .update_product(&product)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))?;

        if let Some(stock) = stock {
            if !self.store.set_stock(id, stock).await? {
                return Err(ServiceError::not_found("Product", id));
            }
            stored.stock = stock;
        }
        Ok(stored)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<()> {
        if !self.store.delete_product(id).await? {
            return Err(ServiceError::not_found("Product", id));
        }
        tracing::info!(product_id = %id, "product removed");
        Ok(())
    }

    /// The fixed category list, in display order.
    pub fn categories(&self) -> &'static [Category] {
        &Category::ALL
    }
}
