//! Order repository: placement, cancellation, claims, and history.
//!
//! Order placement is a single transaction: header insert, one line insert
//! plus conditional stock decrement per product, optional coupon redemption,
//! and removal of the purchased cart lines. Any failed step rolls the whole
//! order back, so stock and coupon state never drift from the order rows.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use thiserror::Error;

use eagcart_core::{
    ClaimType, OrderCode, OrderItemStatus, OrderStatus, ProductCode, ShippingAddress, UserCode,
};

use super::RepositoryError;
use crate::db::{CartRepository, CouponRepository, ProductRepository};

/// How many fresh order codes to try before giving up on a collision.
const ORDER_CODE_ATTEMPTS: u32 = 3;

/// Errors from order placement and lifecycle operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// A product had insufficient stock at commit time.
    #[error("insufficient stock for {0}")]
    OutOfStock(ProductCode),

    /// The coupon grant was used, expired, or not owned by the user.
    #[error("coupon unavailable")]
    CouponUnavailable,

    /// The order or line is not in a state that allows the operation.
    #[error("illegal transition from {from}")]
    InvalidTransition { from: String },

    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// A line of a new order, priced at checkout time.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_code: ProductCode,
    pub quantity: i32,
    /// Effective unit price captured at checkout.
    pub unit_price: i64,
}

/// Everything needed to write an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user: UserCode,
    pub lines: Vec<NewOrderLine>,
    pub address: ShippingAddress,
    pub receiver_phone: String,
    /// Free-form delivery instructions for the courier.
    pub delivery_request: String,
    /// Sum of list-price subtotals before any discount.
    pub total_amount: i64,
    /// Sale markdowns across the lines plus the coupon discount.
    pub discount_amount: i64,
    /// Amount charged: `total_amount - discount_amount`, floored at 0.
    pub final_amount: i64,
    /// Grant row ID of the coupon to consume, if any.
    pub coupon_grant_id: Option<i64>,
    pub delivery_date: NaiveDate,
    /// Whether to clear the purchased products from the user's cart.
    pub from_cart: bool,
}

/// An order line as shown in history.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub id: i64,
    pub product_code: ProductCode,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub status: OrderItemStatus,
    pub claim_reason: Option<String>,
}

/// The most recent order's shipping snapshot, used to prefill checkout.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecentShipping {
    /// Pipe-encoded `base|detail|receiver` snapshot.
    pub shipping_address: String,
    pub receiver_phone: String,
    pub delivery_request: String,
}

/// An order header with its lines.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub order_code: OrderCode,
    pub status: OrderStatus,
    pub total_amount: i64,
    pub discount_amount: i64,
    pub final_amount: i64,
    pub shipping_address: String,
    pub receiver_phone: String,
    pub delivery_date: Option<NaiveDate>,
    pub ordered_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderHeaderRow {
    order_code: String,
    status: String,
    total_amount: i64,
    discount_amount: i64,
    final_amount: i64,
    shipping_address: String,
    receiver_phone: String,
    delivery_date: Option<NaiveDate>,
    ordered_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    id: i64,
    order_code: String,
    product_code: String,
    product_name: String,
    quantity: i32,
    unit_price: i64,
    status: String,
    claim_reason: Option<String>,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = RepositoryError;

    fn try_from(row: OrderLineRow) -> Result<Self, Self::Error> {
        let status = OrderItemStatus::from_str(&row.status).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid item status in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            product_code: ProductCode::from(row.product_code),
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            status,
            claim_reason: row.claim_reason,
        })
    }
}

/// Repository for order operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Write a new order atomically and return its code.
    ///
    /// Retries with a fresh code when the generated order code collides
    /// with an existing row.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OutOfStock` if any line exceeds remaining stock,
    /// `OrderError::CouponUnavailable` if the coupon grant can't be consumed,
    /// or `OrderError::Repository` for database failures.
    pub async fn place(&self, order: &NewOrder) -> Result<OrderCode, OrderError> {
        let mut last_conflict = None;
        for _ in 0..ORDER_CODE_ATTEMPTS {
            let code = OrderCode::generate();
            match self.place_with_code(order, &code).await {
                Ok(()) => return Ok(code),
                Err(OrderError::Repository(RepositoryError::Conflict(msg))) => {
                    tracing::warn!(order_code = %code, "order code collision, retrying");
                    last_conflict = Some(msg);
                }
                Err(e) => return Err(e),
            }
        }

        Err(OrderError::Repository(RepositoryError::Conflict(
            last_conflict.unwrap_or_else(|| "order code collision".to_owned()),
        )))
    }

    async fn place_with_code(&self, order: &NewOrder, code: &OrderCode) -> Result<(), OrderError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO orders (order_code, user_code, status, total_amount,
                                discount_amount, final_amount, shipping_address,
                                receiver_phone, delivery_request, delivery_date,
                                ordered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now())
            ",
        )
        .bind(code.as_str())
        .bind(order.user.as_str())
        .bind(OrderStatus::PaymentCompleted.as_str())
        .bind(order.total_amount)
        .bind(order.discount_amount)
        .bind(order.final_amount)
        .bind(order.address.encode())
        .bind(order.receiver_phone.as_str())
        .bind(order.delivery_request.as_str())
        .bind(order.delivery_date)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return OrderError::Repository(RepositoryError::Conflict(
                    "order code already exists".to_owned(),
                ));
            }
            OrderError::from(e)
        })?;

        for line in &order.lines {
            let taken = ProductRepository::try_decrement_stock(
                &mut *tx,
                &line.product_code,
                line.quantity,
            )
            .await?;
            if !taken {
                return Err(OrderError::OutOfStock(line.product_code.clone()));
            }

            sqlx::query(
                r"
                INSERT INTO order_items (order_code, product_code, quantity,
                                         unit_price, status)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(code.as_str())
            .bind(line.product_code.as_str())
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(OrderItemStatus::PaymentCompleted.as_str())
            .execute(&mut *tx)
            .await?;
        }

        if let Some(grant_id) = order.coupon_grant_id {
            let redeemed = CouponRepository::redeem(&mut *tx, &order.user, grant_id).await?;
            if !redeemed {
                return Err(OrderError::CouponUnavailable);
            }
        }

        if order.from_cart {
            let codes: Vec<ProductCode> = order
                .lines
                .iter()
                .map(|l| l.product_code.clone())
                .collect();
            CartRepository::delete_purchased(&mut *tx, &order.user, &codes).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Cancel an order, restoring stock for every line.
    ///
    /// Only orders still before delivery can be cancelled. The delivery
    /// date is cleared so a cancelled order never shows a phantom ETA.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository(RepositoryError::NotFound)` if the
    /// user has no such order, `OrderError::InvalidTransition` if the order
    /// is already delivered or cancelled.
    pub async fn cancel(&self, user: &UserCode, code: &OrderCode) -> Result<(), OrderError> {
        let mut tx = self.pool.begin().await?;

        let status: Option<String> = sqlx::query_scalar(
            r"
            SELECT status FROM orders
            WHERE order_code = $1 AND user_code = $2
            FOR UPDATE
            ",
        )
        .bind(code.as_str())
        .bind(user.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(status) = status else {
            return Err(OrderError::Repository(RepositoryError::NotFound));
        };

        let status = OrderStatus::from_str(&status).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;
        if !matches!(status, OrderStatus::PaymentCompleted | OrderStatus::Shipping) {
            return Err(OrderError::InvalidTransition {
                from: status.to_string(),
            });
        }

        #[derive(sqlx::FromRow)]
        struct StockLine {
            product_code: String,
            quantity: i32,
        }

        let lines = sqlx::query_as::<_, StockLine>(
            "SELECT product_code, quantity FROM order_items WHERE order_code = $1",
        )
        .bind(code.as_str())
        .fetch_all(&mut *tx)
        .await?;

        for line in &lines {
            let product = ProductCode::from(line.product_code.as_str());
            ProductRepository::increment_stock(&mut *tx, &product, line.quantity).await?;
        }

        sqlx::query("UPDATE order_items SET status = $2 WHERE order_code = $1")
            .bind(code.as_str())
            .bind(OrderItemStatus::Cancelled.as_str())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r"
            UPDATE orders
            SET status = $2, delivery_date = NULL
            WHERE order_code = $1
            ",
        )
        .bind(code.as_str())
        .bind(OrderStatus::Cancelled.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Open a return or exchange claim on a delivered line.
    ///
    /// The delivered-state check is folded into the UPDATE so a second
    /// concurrent claim on the same line loses cleanly.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository(RepositoryError::NotFound)` if the
    /// user owns no such line, `OrderError::InvalidTransition` if the line
    /// is not currently delivered.
    pub async fn request_claim(
        &self,
        user: &UserCode,
        line_id: i64,
        claim: ClaimType,
        reason: &str,
    ) -> Result<(), OrderError> {
        let result = sqlx::query(
            r"
            UPDATE order_items oi
            SET status = $3, claim_reason = $4, claimed_at = now()
            FROM orders o
            WHERE oi.id = $1
              AND o.order_code = oi.order_code
              AND o.user_code = $2
              AND oi.status = $5
            ",
        )
        .bind(line_id)
        .bind(user.as_str())
        .bind(claim.requested_status().as_str())
        .bind(reason)
        .bind(OrderItemStatus::Delivered.as_str())
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Distinguish a missing line from a line in the wrong state.
        let current: Option<String> = sqlx::query_scalar(
            r"
            SELECT oi.status
            FROM order_items oi
            JOIN orders o ON o.order_code = oi.order_code
            WHERE oi.id = $1 AND o.user_code = $2
            ",
        )
        .bind(line_id)
        .bind(user.as_str())
        .fetch_optional(self.pool)
        .await?;

        match current {
            Some(status) => Err(OrderError::InvalidTransition { from: status }),
            None => Err(OrderError::Repository(RepositoryError::NotFound)),
        }
    }

    /// The shipping snapshot of the user's most recent order, address still
    /// encoded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_shipping(
        &self,
        user: &UserCode,
    ) -> Result<Option<RecentShipping>, RepositoryError> {
        let row = sqlx::query_as::<_, RecentShipping>(
            r"
            SELECT shipping_address, receiver_phone, delivery_request
            FROM orders
            WHERE user_code = $1
            ORDER BY ordered_at DESC
            LIMIT 1
            ",
        )
        .bind(user.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Order history for a user, newest first, with lines attached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status is invalid.
    pub async fn list_for_user(
        &self,
        user: &UserCode,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let headers = sqlx::query_as::<_, OrderHeaderRow>(
            r"
            SELECT order_code, status, total_amount, discount_amount, final_amount,
                   shipping_address, receiver_phone, delivery_date, ordered_at
            FROM orders
            WHERE user_code = $1
            ORDER BY ordered_at DESC
            ",
        )
        .bind(user.as_str())
        .fetch_all(self.pool)
        .await?;

        let line_rows = sqlx::query_as::<_, OrderLineRow>(
            r"
            SELECT oi.id, oi.order_code, oi.product_code, p.name AS product_name,
                   oi.quantity, oi.unit_price, oi.status, oi.claim_reason
            FROM order_items oi
            JOIN orders o ON o.order_code = oi.order_code
            JOIN products p ON p.product_code = oi.product_code
            WHERE o.user_code = $1
            ORDER BY oi.id
            ",
        )
        .bind(user.as_str())
        .fetch_all(self.pool)
        .await?;

        let mut lines_by_order: std::collections::HashMap<String, Vec<OrderLine>> =
            std::collections::HashMap::new();
        for row in line_rows {
            let order_code = row.order_code.clone();
            lines_by_order
                .entry(order_code)
                .or_default()
                .push(OrderLine::try_from(row)?);
        }

        let mut orders = Vec::with_capacity(headers.len());
        for header in headers {
            let status = OrderStatus::from_str(&header.status).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
            })?;

            let lines = lines_by_order.remove(&header.order_code).unwrap_or_default();

            orders.push(OrderSummary {
                order_code: OrderCode::from(header.order_code),
                status,
                total_amount: header.total_amount,
                discount_amount: header.discount_amount,
                final_amount: header.final_amount,
                shipping_address: header.shipping_address,
                receiver_phone: header.receiver_phone,
                delivery_date: header.delivery_date,
                ordered_at: header.ordered_at,
                lines,
            });
        }

        Ok(orders)
    }
}
