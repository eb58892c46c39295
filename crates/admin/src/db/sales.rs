//! Sales repository: order history, delivery progression, claim decisions.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;

use eagcart_core::{ClaimDecision, OrderCode, OrderItemStatus, OrderStatus, ProductCode};

use super::RepositoryError;

/// Errors from claim decisions and status updates.
#[derive(Debug, Error)]
pub enum ClaimError {
    /// The line or order is not in a state the operation applies to.
    #[error("illegal transition {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for ClaimError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Filters for the sales listing. Cancelled lines are always excluded.
#[derive(Debug, Default, Clone)]
pub struct SalesFilter {
    /// Only lines currently in this status.
    pub status: Option<OrderItemStatus>,
    /// Substring match against product name or order code.
    pub keyword: Option<String>,
    /// Only lines with an open return/exchange claim.
    pub claims_only: bool,
    /// Only orders placed on or after this date.
    pub from: Option<NaiveDate>,
    /// Only orders placed on or before this date.
    pub to: Option<NaiveDate>,
}

/// A sold line with its order and customer context.
#[derive(Debug, Clone)]
pub struct SaleLine {
    pub item_id: i64,
    pub order_code: OrderCode,
    pub user_email: String,
    pub product_code: ProductCode,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub status: OrderItemStatus,
    pub claim_reason: Option<String>,
    pub ordered_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct SaleLineRow {
    item_id: i64,
    order_code: String,
    user_email: String,
    product_code: String,
    product_name: String,
    quantity: i32,
    unit_price: i64,
    status: String,
    claim_reason: Option<String>,
    ordered_at: DateTime<Utc>,
}

impl TryFrom<SaleLineRow> for SaleLine {
    type Error = RepositoryError;

    fn try_from(row: SaleLineRow) -> Result<Self, Self::Error> {
        let status = OrderItemStatus::from_str(&row.status).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid item status in database: {e}"))
        })?;

        Ok(Self {
            item_id: row.item_id,
            order_code: OrderCode::from(row.order_code),
            user_email: row.user_email,
            product_code: ProductCode::from(row.product_code),
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            status,
            claim_reason: row.claim_reason,
            ordered_at: row.ordered_at,
        })
    }
}

/// The data needed to notify the customer after a claim decision.
#[derive(Debug)]
pub struct ClaimOutcome {
    pub order_code: OrderCode,
    pub product_name: String,
    pub user_email: String,
    /// Stored `code|detail` reason the customer gave when filing.
    pub claim_reason: Option<String>,
    pub new_status: OrderItemStatus,
}

/// Repository for operator-side order operations.
pub struct SalesRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SalesRepository<'a> {
    /// Create a new sales repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List sold lines, newest orders first, with optional filters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status is invalid.
    pub async fn list(&self, filter: &SalesFilter) -> Result<Vec<SaleLine>, RepositoryError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r"
            SELECT oi.id AS item_id, oi.order_code, u.email AS user_email,
                   oi.product_code, p.name AS product_name, oi.quantity,
                   oi.unit_price, oi.status, oi.claim_reason, o.ordered_at
            FROM order_items oi
            JOIN orders o ON o.order_code = oi.order_code
            JOIN users u ON u.user_code = o.user_code
            JOIN products p ON p.product_code = oi.product_code
            WHERE oi.status <> 'CANCELLED'
            ",
        );

        if let Some(status) = filter.status {
            builder.push(" AND oi.status = ");
            builder.push_bind(status.as_str());
        }
        if filter.claims_only {
            builder.push(" AND oi.status IN (");
            builder.push_bind(OrderItemStatus::ReturnRequested.as_str());
            builder.push(", ");
            builder.push_bind(OrderItemStatus::ExchangeRequested.as_str());
            builder.push(")");
        }
        if let Some(keyword) = &filter.keyword {
            builder.push(" AND (p.name ILIKE ");
            builder.push_bind(format!("%{keyword}%"));
            builder.push(" OR oi.order_code ILIKE ");
            builder.push_bind(format!("%{keyword}%"));
            builder.push(")");
        }
        if let Some(from) = filter.from {
            builder.push(" AND o.ordered_at >= ");
            builder.push_bind(from);
        }
        if let Some(to) = filter.to {
            builder.push(" AND o.ordered_at < ");
            builder.push_bind(to + chrono::Duration::days(1));
        }
        builder.push(" ORDER BY o.ordered_at DESC, oi.id");

        let rows = builder
            .build_query_as::<SaleLineRow>()
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(SaleLine::try_from).collect()
    }

    /// Advance an order through delivery (payment completed -> shipping ->
    /// delivered), cascading to lines that are still on the delivery track.
    ///
    /// Lines with an open or resolved claim keep their own status.
    ///
    /// # Errors
    ///
    /// Returns `ClaimError::InvalidTransition` for any other move, or
    /// `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn advance_order_status(
        &self,
        code: &OrderCode,
        new_status: OrderStatus,
    ) -> Result<(), ClaimError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE order_code = $1 FOR UPDATE")
                .bind(code.as_str())
                .fetch_optional(&mut *tx)
                .await?;

        let Some(current) = current else {
            return Err(ClaimError::Repository(RepositoryError::NotFound));
        };
        let current = OrderStatus::from_str(&current).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;

        let legal = matches!(
            (current, new_status),
            (OrderStatus::PaymentCompleted, OrderStatus::Shipping)
                | (OrderStatus::Shipping, OrderStatus::Delivered)
        );
        if !legal {
            return Err(ClaimError::InvalidTransition {
                from: current.to_string(),
                to: new_status.to_string(),
            });
        }

        sqlx::query("UPDATE orders SET status = $2 WHERE order_code = $1")
            .bind(code.as_str())
            .bind(new_status.as_str())
            .execute(&mut *tx)
            .await?;

        // Cascade only to lines still tracking the header.
        let line_status = match new_status {
            OrderStatus::Shipping => OrderItemStatus::Shipping,
            _ => OrderItemStatus::Delivered,
        };
        sqlx::query(
            r"
            UPDATE order_items
            SET status = $2
            WHERE order_code = $1 AND status = $3
            ",
        )
        .bind(code.as_str())
        .bind(line_status.as_str())
        .bind(current.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Resolve an open claim on a line.
    ///
    /// Approving a return puts the quantity back into stock in the same
    /// transaction. Returns what the notifier needs to email the customer.
    ///
    /// # Errors
    ///
    /// Returns `ClaimError::InvalidTransition` if the line's current status
    /// doesn't allow the decision, or `RepositoryError::NotFound` if the
    /// line doesn't exist.
    pub async fn decide_claim(
        &self,
        item_id: i64,
        decision: ClaimDecision,
    ) -> Result<ClaimOutcome, ClaimError> {
        let mut tx = self.pool.begin().await?;

        #[derive(sqlx::FromRow)]
        struct ClaimRow {
            status: String,
            product_code: String,
            product_name: String,
            quantity: i32,
            order_code: String,
            user_email: String,
            claim_reason: Option<String>,
        }

        let row = sqlx::query_as::<_, ClaimRow>(
            r"
            SELECT oi.status, oi.product_code, p.name AS product_name,
                   oi.quantity, oi.order_code, u.email AS user_email,
                   oi.claim_reason
            FROM order_items oi
            JOIN orders o ON o.order_code = oi.order_code
            JOIN users u ON u.user_code = o.user_code
            JOIN products p ON p.product_code = oi.product_code
            WHERE oi.id = $1
            FOR UPDATE OF oi
            ",
        )
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(ClaimError::Repository(RepositoryError::NotFound));
        };

        let current = OrderItemStatus::from_str(&row.status).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid item status in database: {e}"))
        })?;

        let target = decision.target_status();
        if !current.can_transition_to(target) {
            return Err(ClaimError::InvalidTransition {
                from: current.to_string(),
                to: target.to_string(),
            });
        }

        sqlx::query("UPDATE order_items SET status = $2 WHERE id = $1")
            .bind(item_id)
            .bind(target.as_str())
            .execute(&mut *tx)
            .await?;

        if decision.restocks() {
            let result = sqlx::query(
                r"
                UPDATE products
                SET current_stock = current_stock + $2
                WHERE product_code = $1
                ",
            )
            .bind(&row.product_code)
            .bind(row.quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(ClaimError::Repository(RepositoryError::DataCorruption(
                    format!("order line references missing product {}", row.product_code),
                )));
            }
        }

        tx.commit().await?;

        Ok(ClaimOutcome {
            order_code: OrderCode::from(row.order_code),
            product_name: row.product_name,
            user_email: row.user_email,
            claim_reason: row.claim_reason,
            new_status: target,
        })
    }
}
