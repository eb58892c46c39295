//! Product repository: catalog reads, effective pricing, and stock movements.
//!
//! A product's effective price folds in the active discount, if any. When
//! several discount windows overlap, the one with the most recent start date
//! wins. Discounts carry either a fixed price or a percentage rate.

use sqlx::{PgConnection, PgPool};

use eagcart_core::ProductCode;

use super::RepositoryError;

/// A catalog product with its effective price applied.
#[derive(Debug, Clone)]
pub struct PricedProduct {
    pub code: ProductCode,
    pub name: String,
    /// List price before discount.
    pub price: i64,
    /// Price after the active discount, equal to `price` when none applies.
    pub sale_price: i64,
    pub current_stock: i32,
}

/// A product whose stock has fallen below the reorder threshold.
#[derive(Debug, Clone)]
pub struct LowStockProduct {
    pub code: ProductCode,
    pub name: String,
    pub current_stock: i32,
    pub optimal_stock: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct PricedProductRow {
    product_code: String,
    name: String,
    price: i64,
    current_stock: i32,
    discount_price: Option<i64>,
    discount_rate: Option<i32>,
}

impl From<PricedProductRow> for PricedProduct {
    fn from(row: PricedProductRow) -> Self {
        let sale_price = effective_price(row.price, row.discount_price, row.discount_rate);
        Self {
            code: ProductCode::from(row.product_code),
            name: row.name,
            price: row.price,
            sale_price,
            current_stock: row.current_stock,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LowStockRow {
    product_code: String,
    name: String,
    current_stock: i32,
    optimal_stock: i32,
}

impl From<LowStockRow> for LowStockProduct {
    fn from(row: LowStockRow) -> Self {
        Self {
            code: ProductCode::from(row.product_code),
            name: row.name,
            current_stock: row.current_stock,
            optimal_stock: row.optimal_stock,
        }
    }
}

/// Compute the effective price from the active discount.
///
/// A fixed discount price takes precedence over a rate. Rates floor toward
/// zero, matching how stored prices were produced historically.
#[must_use]
pub fn effective_price(price: i64, discount_price: Option<i64>, discount_rate: Option<i32>) -> i64 {
    if let Some(fixed) = discount_price {
        return fixed;
    }
    if let Some(rate) = discount_rate {
        let rate = i64::from(rate.clamp(0, 100));
        return price * (100 - rate) / 100;
    }
    price
}

const PRICED_SELECT: &str = r"
    SELECT p.product_code, p.name, p.price, p.current_stock,
           d.discount_price, d.discount_rate
    FROM products p
    LEFT JOIN LATERAL (
        SELECT discount_price, discount_rate
        FROM discounts
        WHERE product_code = p.product_code
          AND now() BETWEEN start_date AND end_date
        ORDER BY start_date DESC
        LIMIT 1
    ) d ON TRUE
";

/// Repository for product and stock operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product with its effective price.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_priced(
        &self,
        code: &ProductCode,
    ) -> Result<Option<PricedProduct>, RepositoryError> {
        let sql = format!("{PRICED_SELECT} WHERE p.product_code = $1");
        let row = sqlx::query_as::<_, PricedProductRow>(&sql)
            .bind(code.as_str())
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(PricedProduct::from))
    }

    /// Conditionally take `quantity` units of stock inside a transaction.
    ///
    /// The decrement only applies when enough stock remains; returns `false`
    /// when the product is missing or stock is insufficient, leaving the row
    /// untouched either way.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn try_decrement_stock(
        conn: &mut PgConnection,
        code: &ProductCode,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET current_stock = current_stock - $2
            WHERE product_code = $1 AND current_stock >= $2
            ",
        )
        .bind(code.as_str())
        .bind(quantity)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Return `quantity` units to stock inside a transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn increment_stock(
        conn: &mut PgConnection,
        code: &ProductCode,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET current_stock = current_stock + $2
            WHERE product_code = $1
            ",
        )
        .bind(code.as_str())
        .bind(quantity)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Find which of the given products have fallen below the reorder
    /// threshold (60% of optimal stock, floored).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(
        &self,
        codes: &[ProductCode],
    ) -> Result<Vec<LowStockProduct>, RepositoryError> {
        let codes: Vec<&str> = codes.iter().map(ProductCode::as_str).collect();
        let rows = sqlx::query_as::<_, LowStockRow>(
            r"
            SELECT product_code, name, current_stock, optimal_stock
            FROM products
            WHERE product_code = ANY($1)
              AND current_stock < (optimal_stock * 6) / 10
            ORDER BY product_code
            ",
        )
        .bind(&codes)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(LowStockProduct::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_discount_wins_over_rate() {
        assert_eq!(effective_price(10_000, Some(7_500), Some(50)), 7_500);
    }

    #[test]
    fn rate_discount_floors() {
        // 33% off 9_999 -> 6_699.33 floors to 6_699
        assert_eq!(effective_price(9_999, None, Some(33)), 6_699);
    }

    #[test]
    fn no_discount_keeps_list_price() {
        assert_eq!(effective_price(12_000, None, None), 12_000);
    }

    #[test]
    fn out_of_range_rates_are_clamped() {
        assert_eq!(effective_price(10_000, None, Some(150)), 0);
        assert_eq!(effective_price(10_000, None, Some(-5)), 10_000);
    }
}
