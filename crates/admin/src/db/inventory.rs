//! Inventory repository: stock overview, inbound receipts, target levels.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use eagcart_core::{InboundCode, ProductCode};

use super::RepositoryError;

/// How many fresh inbound codes to try before giving up on a collision.
const INBOUND_CODE_ATTEMPTS: u32 = 3;

/// A catalog product as the operator sees it.
#[derive(Debug, Clone)]
pub struct InventoryItem {
    pub code: ProductCode,
    pub name: String,
    pub price: i64,
    pub current_stock: i32,
    pub optimal_stock: i32,
    /// Whether stock sits below the reorder threshold (60% of optimal).
    pub below_threshold: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct InventoryRow {
    product_code: String,
    name: String,
    price: i64,
    current_stock: i32,
    optimal_stock: i32,
}

impl From<InventoryRow> for InventoryItem {
    fn from(row: InventoryRow) -> Self {
        let below_threshold = row.current_stock < (row.optimal_stock * 6) / 10;
        Self {
            code: ProductCode::from(row.product_code),
            name: row.name,
            price: row.price,
            current_stock: row.current_stock,
            optimal_stock: row.optimal_stock,
            below_threshold,
        }
    }
}

/// An inbound stock receipt.
#[derive(Debug, Clone)]
pub struct InboundEntry {
    pub inbound_code: InboundCode,
    pub product_code: ProductCode,
    pub quantity: i32,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct InboundRow {
    inbound_code: String,
    product_code: String,
    quantity: i32,
    received_at: DateTime<Utc>,
}

impl From<InboundRow> for InboundEntry {
    fn from(row: InboundRow) -> Self {
        Self {
            inbound_code: InboundCode::from(row.inbound_code),
            product_code: ProductCode::from(row.product_code),
            quantity: row.quantity,
            received_at: row.received_at,
        }
    }
}

/// Repository for inventory operations.
pub struct InventoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InventoryRepository<'a> {
    /// Create a new inventory repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the whole catalog with stock levels.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<InventoryItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, InventoryRow>(
            r"
            SELECT product_code, name, price, current_stock, optimal_stock
            FROM products
            ORDER BY product_code
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(InventoryItem::from).collect())
    }

    /// Record an inbound receipt and add its quantity to stock, atomically.
    ///
    /// Retries with a fresh code when the generated inbound code collides.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if code generation keeps colliding.
    pub async fn record_inbound(
        &self,
        product: &ProductCode,
        quantity: i32,
    ) -> Result<InboundCode, RepositoryError> {
        for _ in 0..INBOUND_CODE_ATTEMPTS {
            let code = InboundCode::generate();
            match self.record_inbound_with_code(product, quantity, &code).await {
                Ok(()) => return Ok(code),
                Err(RepositoryError::Conflict(_)) => {
                    tracing::warn!(inbound_code = %code, "inbound code collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(RepositoryError::Conflict(
            "inbound code collision".to_owned(),
        ))
    }

    async fn record_inbound_with_code(
        &self,
        product: &ProductCode,
        quantity: i32,
        code: &InboundCode,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE products
            SET current_stock = current_stock + $2
            WHERE product_code = $1
            ",
        )
        .bind(product.as_str())
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            r"
            INSERT INTO stock_entries (inbound_code, product_code, quantity)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(code.as_str())
        .bind(product.as_str())
        .bind(quantity)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("inbound code already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        tx.commit().await?;
        Ok(())
    }

    /// Set a product's optimal stock target.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn set_optimal_stock(
        &self,
        product: &ProductCode,
        optimal_stock: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET optimal_stock = $2
            WHERE product_code = $1
            ",
        )
        .bind(product.as_str())
        .bind(optimal_stock)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Inbound receipt history for a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn inbound_history(
        &self,
        product: &ProductCode,
    ) -> Result<Vec<InboundEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, InboundRow>(
            r"
            SELECT inbound_code, product_code, quantity, received_at
            FROM stock_entries
            WHERE product_code = $1
            ORDER BY received_at DESC
            ",
        )
        .bind(product.as_str())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(InboundEntry::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(current_stock: i32, optimal_stock: i32) -> InventoryItem {
        InventoryItem::from(InventoryRow {
            product_code: "P001".to_owned(),
            name: "Keyboard".to_owned(),
            price: 89_000,
            current_stock,
            optimal_stock,
        })
    }

    #[test]
    fn threshold_fires_just_below_sixty_percent() {
        // floor(100 * 0.6) = 60: 59 is under the line, 60 is not.
        assert!(item(59, 100).below_threshold);
        assert!(!item(60, 100).below_threshold);
    }

    #[test]
    fn threshold_floors_the_target() {
        // floor(25 * 6 / 10) = 15
        assert!(item(14, 25).below_threshold);
        assert!(!item(15, 25).below_threshold);
    }

    #[test]
    fn zero_target_never_alerts() {
        assert!(!item(0, 0).below_threshold);
    }
}
