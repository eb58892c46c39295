//! Seed the database with demo catalog data for local development.
//!
//! Idempotent: every insert uses ON CONFLICT DO NOTHING, so re-running the
//! command against an already seeded database is safe.

use chrono::{Duration, Utc};
use sqlx::PgPool;

/// Errors that can occur while seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

const PRODUCTS: &[(&str, &str, i64, i32, i32)] = &[
    ("P001", "Mechanical Keyboard", 89_000, 40, 50),
    ("P002", "Wireless Mouse", 35_000, 60, 60),
    ("P003", "USB-C Hub", 42_000, 25, 40),
    ("P004", "27-inch Monitor", 320_000, 12, 20),
    ("P005", "Laptop Stand", 28_000, 30, 30),
];

/// Seed the database.
///
/// # Errors
///
/// Returns `SeedError` if the database URL is missing or a query fails.
pub async fn run() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| SeedError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    seed_users(&pool).await?;
    seed_products(&pool).await?;
    seed_discounts(&pool).await?;
    seed_coupons(&pool).await?;

    tracing::info!("Seed complete!");
    Ok(())
}

async fn seed_users(pool: &PgPool) -> Result<(), SeedError> {
    sqlx::query(
        r"
        INSERT INTO users (user_code, email, name)
        VALUES ('U001', 'demo@example.com', 'Demo Customer')
        ON CONFLICT (user_code) DO NOTHING
        ",
    )
    .execute(pool)
    .await?;

    tracing::info!("Seeded demo user");
    Ok(())
}

async fn seed_products(pool: &PgPool) -> Result<(), SeedError> {
    for (code, name, price, stock, optimal) in PRODUCTS {
        sqlx::query(
            r"
            INSERT INTO products (product_code, name, price, current_stock, optimal_stock)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (product_code) DO NOTHING
            ",
        )
        .bind(code)
        .bind(name)
        .bind(price)
        .bind(stock)
        .bind(optimal)
        .execute(pool)
        .await?;
    }

    tracing::info!(count = PRODUCTS.len(), "Seeded products");
    Ok(())
}

async fn seed_discounts(pool: &PgPool) -> Result<(), SeedError> {
    let now = Utc::now();

    // 20% off the keyboard for two weeks
    sqlx::query(
        r"
        INSERT INTO discounts (product_code, discount_rate, start_date, end_date)
        SELECT 'P001', 20, $1, $2
        WHERE NOT EXISTS (SELECT 1 FROM discounts WHERE product_code = 'P001')
        ",
    )
    .bind(now - Duration::days(1))
    .bind(now + Duration::days(13))
    .execute(pool)
    .await?;

    // Fixed sale price on the monitor
    sqlx::query(
        r"
        INSERT INTO discounts (product_code, discount_price, start_date, end_date)
        SELECT 'P004', 289000, $1, $2
        WHERE NOT EXISTS (SELECT 1 FROM discounts WHERE product_code = 'P004')
        ",
    )
    .bind(now - Duration::days(1))
    .bind(now + Duration::days(6))
    .execute(pool)
    .await?;

    tracing::info!("Seeded discounts");
    Ok(())
}

async fn seed_coupons(pool: &PgPool) -> Result<(), SeedError> {
    let now = Utc::now();

    sqlx::query(
        r"
        INSERT INTO coupons (coupon_code, name, discount_amount)
        VALUES ('WELCOME5K', 'Welcome 5,000 off', 5000)
        ON CONFLICT (coupon_code) DO NOTHING
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        INSERT INTO user_coupons (user_code, coupon_code, start_date, end_date)
        SELECT 'U001', 'WELCOME5K', $1, $2
        WHERE NOT EXISTS (
            SELECT 1 FROM user_coupons
            WHERE user_code = 'U001' AND coupon_code = 'WELCOME5K'
        )
        ",
    )
    .bind(now - Duration::days(1))
    .bind(now + Duration::days(29))
    .execute(pool)
    .await?;

    tracing::info!("Seeded coupons");
    Ok(())
}
