//! Demo catalog for local development.

use domain::{Category, Money, NewProduct};
use services::{CatalogService, Result};
use store::{ProductQuery, ProductRepository};

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price: i64,
    original_price: i64,
    image: &'static str,
    category: Category,
    stock: u32,
    rating: f64,
    num_reviews: u32,
    featured: bool,
    brand: &'static str,
}

const CATALOG: &[SeedProduct] = &[
    SeedProduct {
        name: "Wireless Bluetooth Headphones",
        description: "Premium noise-canceling wireless headphones with 30-hour battery life, comfortable over-ear design, and crystal-clear audio quality.",
        price: 14_999,
        original_price: 19_999,
        image: "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=500",
        category: Category::Electronics,
        stock: 50,
        rating: 4.5,
        num_reviews: 128,
        featured: true,
        brand: "AudioMax",
    },
    SeedProduct {
        name: "Smart Watch Pro",
        description: "Advanced smartwatch with health monitoring, GPS tracking, water resistance, and an AMOLED display.",
        price: 29_999,
        original_price: 34_999,
        image: "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=500",
        category: Category::Electronics,
        stock: 35,
        rating: 4.7,
        num_reviews: 89,
        featured: true,
        brand: "TechWear",
    },
    SeedProduct {
        name: "Premium Leather Jacket",
        description: "Genuine leather motorcycle jacket with quilted lining, multiple pockets, and timeless design.",
        price: 24_999,
        original_price: 29_999,
        image: "https://images.unsplash.com/photo-1551028719-00167b16eac5?w=500",
        category: Category::Clothing,
        stock: 20,
        rating: 4.8,
        num_reviews: 56,
        featured: true,
        brand: "UrbanStyle",
    },
    SeedProduct {
        name: "Running Shoes Elite",
        description: "Lightweight performance running shoes with responsive cushioning, breathable mesh upper, and superior traction.",
        price: 12_999,
        original_price: 15_999,
        image: "https://images.unsplash.com/photo-1542291026-7eec264c27ff?w=500",
        category: Category::Sports,
        stock: 45,
        rating: 4.6,
        num_reviews: 234,
        featured: true,
        brand: "SprintMax",
    },
    SeedProduct {
        name: "Organic Skincare Set",
        description: "Complete skincare routine with natural ingredients. Includes cleanser, toner, serum, and moisturizer.",
        price: 8_999,
        original_price: 11_999,
        image: "https://images.unsplash.com/photo-1556228720-195a672e8a03?w=500",
        category: Category::Beauty,
        stock: 60,
        rating: 4.4,
        num_reviews: 167,
        featured: true,
        brand: "NaturalGlow",
    },
    SeedProduct {
        name: "Mechanical Gaming Keyboard",
        description: "RGB backlit mechanical keyboard with Cherry MX switches, programmable macros, and an aluminum frame.",
        price: 15_999,
        original_price: 18_999,
        image: "https://images.unsplash.com/photo-1511467687858-23d96c32e4ae?w=500",
        category: Category::Electronics,
        stock: 40,
        rating: 4.9,
        num_reviews: 312,
        featured: true,
        brand: "GameTech",
    },
    SeedProduct {
        name: "Vintage Denim Jacket",
        description: "Classic denim jacket with distressed wash, brass buttons, and comfortable fit.",
        price: 7_999,
        original_price: 9_999,
        image: "https://images.unsplash.com/photo-1576995853123-5a10305d93c0?w=500",
        category: Category::Clothing,
        stock: 30,
        rating: 4.3,
        num_reviews: 78,
        featured: false,
        brand: "DenimCo",
    },
    SeedProduct {
        name: "Yoga Mat Premium",
        description: "Extra-thick eco-friendly yoga mat with non-slip surface, alignment guides, and carrying strap.",
        price: 4_999,
        original_price: 6_999,
        image: "https://images.unsplash.com/photo-1601925260368-ae2f83cf8b7f?w=500",
        category: Category::Sports,
        stock: 80,
        rating: 4.5,
        num_reviews: 145,
        featured: false,
        brand: "ZenFit",
    },
    SeedProduct {
        name: "Bestselling Novel Collection",
        description: "Curated collection of 5 bestselling fiction novels from acclaimed authors.",
        price: 5_999,
        original_price: 7_999,
        image: "https://images.unsplash.com/photo-1512820790803-83ca734da794?w=500",
        category: Category::Books,
        stock: 100,
        rating: 4.7,
        num_reviews: 203,
        featured: false,
        brand: "BookHaven",
    },
    SeedProduct {
        name: "Smart Home Speaker",
        description: "Voice-controlled smart speaker with premium sound and smart home integration.",
        price: 9_999,
        original_price: 12_999,
        image: "https://images.unsplash.com/photo-1543512214-318c7553f230?w=500",
        category: Category::Electronics,
        stock: 55,
        rating: 4.4,
        num_reviews: 189,
        featured: true,
        brand: "SmartLife",
    },
    SeedProduct {
        name: "Designer Sunglasses",
        description: "Polarized UV-protection sunglasses with titanium frame and scratch-resistant lenses.",
        price: 18_999,
        original_price: 24_999,
        image: "https://images.unsplash.com/photo-1572635196237-14b3f281503f?w=500",
        category: Category::Other,
        stock: 25,
        rating: 4.6,
        num_reviews: 67,
        featured: false,
        brand: "VisionElite",
    },
    SeedProduct {
        name: "Electric Coffee Maker",
        description: "Programmable coffee maker with built-in grinder, thermal carafe, and customizable brew strength.",
        price: 12_999,
        original_price: 16_999,
        image: "https://images.unsplash.com/photo-1517668808822-9ebb02f2a0e6?w=500",
        category: Category::HomeAndGarden,
        stock: 40,
        rating: 4.5,
        num_reviews: 156,
        featured: false,
        brand: "BrewMaster",
    },
];

impl SeedProduct {
    fn to_new_product(&self) -> NewProduct {
        NewProduct {
            name: self.name.to_string(),
            description: self.description.to_string(),
            price: Money::from_cents(self.price),
            original_price: Some(Money::from_cents(self.original_price)),
            image: self.image.to_string(),
            images: vec![self.image.to_string()],
            category: self.category,
            stock: self.stock,
            rating: self.rating,
            num_reviews: self.num_reviews,
            featured: self.featured,
            brand: Some(self.brand.to_string()),
        }
    }
}

/// Loads the demo catalog if the store has no products yet.
///
/// Returns the number of products inserted.
pub async fn seed_catalog<S: ProductRepository>(catalog: &CatalogService<S>) -> Result<usize> {
    let existing = catalog.list(&ProductQuery::new().limit(1)).await?;
    if existing.total > 0 {
        tracing::info!(existing = existing.total, "catalog not empty, skipping seed");
        return Ok(0);
    }

    for seed in CATALOG {
        catalog.create(seed.to_new_product()).await?;
    }

    tracing::info!(count = CATALOG.len(), "seeded demo catalog");
    Ok(CATALOG.len())
}
