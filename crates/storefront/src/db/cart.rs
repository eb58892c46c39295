//! Cart repository.
//!
//! One row per user/product pair; adding a product that's already in the
//! cart bumps the quantity instead of inserting a second line.

use sqlx::{PgConnection, PgPool};

use eagcart_core::{ProductCode, UserCode};

use super::RepositoryError;
use crate::db::products::effective_price;

/// A cart line joined with the product's current effective price.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub id: i64,
    pub product_code: ProductCode,
    pub product_name: String,
    pub quantity: i32,
    /// List price at read time.
    pub price: i64,
    /// Effective price at read time (discount applied).
    pub sale_price: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i64,
    product_code: String,
    product_name: String,
    quantity: i32,
    price: i64,
    discount_price: Option<i64>,
    discount_rate: Option<i32>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        let sale_price = effective_price(row.price, row.discount_price, row.discount_rate);
        Self {
            id: row.id,
            product_code: ProductCode::from(row.product_code),
            product_name: row.product_name,
            quantity: row.quantity,
            price: row.price,
            sale_price,
        }
    }
}

/// Repository for cart operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a product to the user's cart, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add(
        &self,
        user: &UserCode,
        product: &ProductCode,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO carts (user_code, product_code, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_code, product_code)
            DO UPDATE SET quantity = carts.quantity + EXCLUDED.quantity
            ",
        )
        .bind(user.as_str())
        .bind(product.as_str())
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// List the user's cart lines with current effective prices.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, user: &UserCode) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT c.id, c.product_code, p.name AS product_name, c.quantity, p.price,
                   d.discount_price, d.discount_rate
            FROM carts c
            JOIN products p ON p.product_code = c.product_code
            LEFT JOIN LATERAL (
                SELECT discount_price, discount_rate
                FROM discounts
                WHERE product_code = p.product_code
                  AND now() BETWEEN start_date AND end_date
                ORDER BY start_date DESC
                LIMIT 1
            ) d ON TRUE
            WHERE c.user_code = $1
            ORDER BY c.id
            ",
        )
        .bind(user.as_str())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CartItem::from).collect())
    }

    /// List only the given cart lines, verifying they belong to the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items_by_id(
        &self,
        user: &UserCode,
        line_ids: &[i64],
    ) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT c.id, c.product_code, p.name AS product_name, c.quantity, p.price,
                   d.discount_price, d.discount_rate
            FROM carts c
            JOIN products p ON p.product_code = c.product_code
            LEFT JOIN LATERAL (
                SELECT discount_price, discount_rate
                FROM discounts
                WHERE product_code = p.product_code
                  AND now() BETWEEN start_date AND end_date
                ORDER BY start_date DESC
                LIMIT 1
            ) d ON TRUE
            WHERE c.user_code = $1 AND c.id = ANY($2)
            ORDER BY c.id
            ",
        )
        .bind(user.as_str())
        .bind(line_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CartItem::from).collect())
    }

    /// Set the quantity of a cart line owned by the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such line exists for the user.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_quantity(
        &self,
        user: &UserCode,
        line_id: i64,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE carts
            SET quantity = $3
            WHERE id = $1 AND user_code = $2
            ",
        )
        .bind(line_id)
        .bind(user.as_str())
        .bind(quantity)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Remove a cart line owned by the user.
    ///
    /// Returns `true` if the line was removed, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&self, user: &UserCode, line_id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM carts WHERE id = $1 AND user_code = $2")
            .bind(line_id)
            .bind(user.as_str())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count the user's cart lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, user: &UserCode) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM carts WHERE user_code = $1")
            .bind(user.as_str())
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Delete the user's cart lines for the given products inside an order
    /// transaction. Lines added after the order snapshot survive.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_purchased(
        conn: &mut PgConnection,
        user: &UserCode,
        products: &[ProductCode],
    ) -> Result<(), RepositoryError> {
        let codes: Vec<&str> = products.iter().map(ProductCode::as_str).collect();
        sqlx::query("DELETE FROM carts WHERE user_code = $1 AND product_code = ANY($2)")
            .bind(user.as_str())
            .bind(&codes)
            .execute(conn)
            .await?;

        Ok(())
    }
}
