//! Database operations for the admin binary.
//!
//! The admin operates on the same database as the storefront: the same
//! `orders`, `order_items`, `products`, and `stock_entries` tables. The
//! repositories here cover the operator's side of those tables: sales
//! history, claim decisions, and inventory management.
//!
//! # Migrations
//!
//! The schema is owned by the storefront migrations and run via:
//! ```bash
//! cargo run -p eagcart-cli -- migrate
//! ```

pub mod inventory;
pub mod sales;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use inventory::InventoryRepository;
pub use sales::SalesRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate inbound code).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
