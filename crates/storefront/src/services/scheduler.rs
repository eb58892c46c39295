//! Background maintenance tasks.
//!
//! A single long-lived task deletes expired coupon grants shortly after
//! midnight UTC every day. The task survives sweep failures; a missed sweep
//! is retried the next night.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use sqlx::PgPool;

use crate::db::CouponRepository;

/// Time to wait from `now` until the next midnight UTC.
fn until_next_midnight(now: DateTime<Utc>) -> std::time::Duration {
    let next_midnight = (now + ChronoDuration::days(1))
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_else(|| now.date_naive().and_time(chrono::NaiveTime::MIN))
        .and_utc();
    (next_midnight - now)
        .to_std()
        .unwrap_or(std::time::Duration::ZERO)
}

/// Spawn the nightly coupon-expiry sweep.
pub fn spawn_coupon_sweep(pool: PgPool) {
    tokio::spawn(async move {
        loop {
            let wait = until_next_midnight(Utc::now());
            tracing::debug!(seconds = wait.as_secs(), "coupon sweep sleeping");
            tokio::time::sleep(wait).await;

            match CouponRepository::new(&pool).delete_expired().await {
                Ok(deleted) => {
                    tracing::info!(deleted, "expired coupon grants swept");
                }
                Err(e) => {
                    tracing::error!(error = %e, "coupon sweep failed");
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn waits_until_next_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 23, 0, 0).single().expect("valid");
        let wait = until_next_midnight(now);
        assert_eq!(wait.as_secs(), 3600);
    }

    #[test]
    fn just_after_midnight_waits_a_full_day() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 1).single().expect("valid");
        let wait = until_next_midnight(now);
        assert_eq!(wait.as_secs(), 24 * 3600 - 1);
    }
}
