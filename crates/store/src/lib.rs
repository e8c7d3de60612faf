//! Persistence for the storefront.
//!
//! One repository trait per collection (`ProductRepository`,
//! `CartRepository`, `OrderRepository`), with an in-memory implementation for
//! tests and database-less runs and a PostgreSQL implementation built on sqlx.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod repository;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::{OrderStats, ProductPage, ProductQuery, ProductSort, StatusCount};
pub use repository::{
    CartRepository, OrderRepository, ProductRepository, StockDecrement, Storefront,
};
