//! Coupon repository.
//!
//! Coupon definitions live in `coupons`; per-user grants live in
//! `user_coupons` with a validity window and a usage flag. Redemption is a
//! single conditional UPDATE so a grant can never be spent twice, even under
//! concurrent checkouts.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use eagcart_core::{CouponCode, CouponStatus, UserCode};

use super::RepositoryError;

/// A coupon grant usable by the user right now.
#[derive(Debug, Clone)]
pub struct UsableCoupon {
    /// Grant row ID (what checkout submits).
    pub id: i64,
    pub coupon_code: CouponCode,
    pub name: String,
    pub discount_amount: i64,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct UsableCouponRow {
    id: i64,
    coupon_code: String,
    name: String,
    discount_amount: i64,
    end_date: DateTime<Utc>,
}

impl From<UsableCouponRow> for UsableCoupon {
    fn from(row: UsableCouponRow) -> Self {
        Self {
            id: row.id,
            coupon_code: CouponCode::from(row.coupon_code),
            name: row.name,
            discount_amount: row.discount_amount,
            end_date: row.end_date,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct GrantRow {
    status: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    discount_amount: i64,
}

/// Whether a grant can still be spent at `now`: unused and inside its
/// validity window (inclusive on both ends).
fn grant_consumable(
    status: CouponStatus,
    now: DateTime<Utc>,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> bool {
    status == CouponStatus::Unused && now >= start_date && now <= end_date
}

/// Repository for coupon operations.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the user's unused, in-window coupon grants.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn usable(&self, user: &UserCode) -> Result<Vec<UsableCoupon>, RepositoryError> {
        let rows = sqlx::query_as::<_, UsableCouponRow>(
            r"
            SELECT uc.id, uc.coupon_code, c.name, c.discount_amount, uc.end_date
            FROM user_coupons uc
            JOIN coupons c ON c.coupon_code = uc.coupon_code
            WHERE uc.user_code = $1
              AND uc.status = $2
              AND now() BETWEEN uc.start_date AND uc.end_date
            ORDER BY uc.end_date
            ",
        )
        .bind(user.as_str())
        .bind(CouponStatus::Unused.as_str())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(UsableCoupon::from).collect())
    }

    /// Fetch the discount amount for a grant without consuming it.
    ///
    /// Returns `None` if the grant is missing, used, expired, or not owned
    /// by the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn discount_for(
        &self,
        user: &UserCode,
        grant_id: i64,
    ) -> Result<Option<i64>, RepositoryError> {
        let grant = sqlx::query_as::<_, GrantRow>(
            r"
            SELECT uc.status, uc.start_date, uc.end_date, c.discount_amount
            FROM user_coupons uc
            JOIN coupons c ON c.coupon_code = uc.coupon_code
            WHERE uc.id = $1 AND uc.user_code = $2
            ",
        )
        .bind(grant_id)
        .bind(user.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(grant.and_then(|g| {
            let status = g.status.parse().ok()?;
            grant_consumable(status, Utc::now(), g.start_date, g.end_date)
                .then_some(g.discount_amount)
        }))
    }

    /// Consume a grant inside an order transaction.
    ///
    /// The ownership, usage, and validity-window checks are folded into the
    /// UPDATE itself; returns `false` when any of them fail, in which case
    /// the caller must roll the order back.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn redeem(
        conn: &mut PgConnection,
        user: &UserCode,
        grant_id: i64,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE user_coupons
            SET status = $3, used_at = now()
            WHERE id = $1
              AND user_code = $2
              AND status = $4
              AND now() BETWEEN start_date AND end_date
            ",
        )
        .bind(grant_id)
        .bind(user.as_str())
        .bind(CouponStatus::Used.as_str())
        .bind(CouponStatus::Unused.as_str())
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete grants whose validity window has fully passed.
    ///
    /// Used grants are kept for order history; only unused expired grants
    /// are swept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM user_coupons
            WHERE status = $1 AND end_date < now()
            ",
        )
        .bind(CouponStatus::Unused.as_str())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 6, 30, 23, 59, 59).unwrap();
        (start, end)
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn used_grant_is_not_consumable() {
        let (start, end) = window();
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        assert!(grant_consumable(CouponStatus::Unused, now, start, end));
        assert!(!grant_consumable(CouponStatus::Used, now, start, end));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn window_edges_are_inclusive() {
        let (start, end) = window();
        assert!(grant_consumable(CouponStatus::Unused, start, start, end));
        assert!(grant_consumable(CouponStatus::Unused, end, start, end));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn outside_the_window_is_not_consumable() {
        let (start, end) = window();
        let before = Utc.with_ymd_and_hms(2025, 5, 31, 23, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        assert!(!grant_consumable(CouponStatus::Unused, before, start, end));
        assert!(!grant_consumable(CouponStatus::Unused, after, start, end));
    }
}
