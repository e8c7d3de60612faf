//! Catalog products.

use chrono::{DateTime, Utc};
use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 2000;
const MAX_RATING: f64 = 5.0;

/// The fixed set of catalog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Electronics,
    Clothing,
    #[serde(rename = "Home & Garden")]
    HomeAndGarden,
    Sports,
    Books,
    Toys,
    Beauty,
    Automotive,
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 9] = [
        Category::Electronics,
        Category::Clothing,
        Category::HomeAndGarden,
        Category::Sports,
        Category::Books,
        Category::Toys,
        Category::Beauty,
        Category::Automotive,
        Category::Other,
    ];

    /// Returns the category name as shown to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Clothing => "Clothing",
            Category::HomeAndGarden => "Home & Garden",
            Category::Sports => "Sports",
            Category::Books => "Books",
            Category::Toys => "Toys",
            Category::Beauty => "Beauty",
            Category::Automotive => "Automotive",
            Category::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("Invalid category: {s}")))
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub original_price: Option<Money>,
    pub image: String,
    pub images: Vec<String>,
    pub category: Category,
    pub stock: u32,
    pub rating: f64,
    pub num_reviews: u32,
    pub featured: bool,
    pub brand: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub original_price: Option<Money>,
    pub image: String,
    pub images: Vec<String>,
    pub category: Category,
    pub stock: u32,
    pub rating: f64,
    pub num_reviews: u32,
    pub featured: bool,
    pub brand: Option<String>,
}

/// Partial update for a product; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub original_price: Option<Money>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    pub category: Option<Category>,
    pub stock: Option<u32>,
    pub featured: Option<bool>,
    pub brand: Option<String>,
}

impl Product {
    /// Builds a validated product from creation input.
    pub fn create(input: NewProduct, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let product = Self {
            id: ProductId::new(),
            name: input.name.trim().to_string(),
            description: input.description,
            price: input.price,
            original_price: input.original_price,
            image: input.image,
            images: input.images,
            category: input.category,
            stock: input.stock,
            rating: input.rating,
            num_reviews: input.num_reviews,
            featured: input.featured,
            brand: normalize_brand(input.brand),
            created_at: now,
            updated_at: now,
        };
        product.validate()?;
        Ok(product)
    }

    /// Applies a partial update and re-validates the merged record.
    ///
    /// On error the product is left untouched.
    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) -> Result<(), DomainError> {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            next.description = description;
        }
        if let Some(price) = patch.price {
            next.price = price;
        }
        if let Some(original_price) = patch.original_price {
            next.original_price = Some(original_price);
        }
        if let Some(image) = patch.image {
            next.image = image;
        }
        if let Some(images) = patch.images {
            next.images = images;
        }
        if let Some(category) = patch.category {
            next.category = category;
        }
        if let Some(stock) = patch.stock {
            next.stock = stock;
        }
        if let Some(featured) = patch.featured {
            next.featured = featured;
        }
        if patch.brand.is_some() {
            next.brand = normalize_brand(patch.brand);
        }
        next.validate()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    /// Returns true if at least `quantity` units are in stock.
    pub fn has_stock(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.name.is_empty() {
            return Err(DomainError::validation("Please provide a product name"));
        }
        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::validation("Name cannot exceed 100 characters"));
        }
        if self.description.trim().is_empty() {
            return Err(DomainError::validation("Please provide a description"));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(DomainError::validation(
                "Description cannot exceed 2000 characters",
            ));
        }
        if self.price.is_negative() {
            return Err(DomainError::validation("Price cannot be negative"));
        }
        if self.original_price.is_some_and(|p| p.is_negative()) {
            return Err(DomainError::validation("Original price cannot be negative"));
        }
        if self.image.trim().is_empty() {
            return Err(DomainError::validation("Please provide an image URL"));
        }
        if !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(DomainError::validation("Rating must be between 0 and 5"));
        }
        Ok(())
    }
}

fn normalize_brand(brand: Option<String>) -> Option<String> {
    brand
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
}
