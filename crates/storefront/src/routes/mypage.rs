//! My-page handlers: order history, cancellation, and claims.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use eagcart_core::{ClaimType, OrderCode};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAuth;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrderLineBody {
    pub id: i64,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub status: String,
    pub claim_reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderBody {
    pub order_code: String,
    pub status: String,
    pub total_amount: i64,
    pub discount_amount: i64,
    pub final_amount: i64,
    pub shipping_address: String,
    pub receiver_phone: String,
    pub delivery_date: Option<chrono::NaiveDate>,
    pub ordered_at: chrono::DateTime<chrono::Utc>,
    pub lines: Vec<OrderLineBody>,
}

/// GET /mypage/orders - order history, newest first.
#[instrument(skip(state, user), fields(user = %user.0.code))]
pub async fn orders(
    State(state): State<AppState>,
    user: RequireAuth,
) -> Result<Json<Vec<OrderBody>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(&user.0.code)
        .await?;

    Ok(Json(
        orders
            .into_iter()
            .map(|o| OrderBody {
                order_code: o.order_code.into_inner(),
                status: o.status.to_string(),
                total_amount: o.total_amount,
                discount_amount: o.discount_amount,
                final_amount: o.final_amount,
                shipping_address: o.shipping_address,
                receiver_phone: o.receiver_phone,
                delivery_date: o.delivery_date,
                ordered_at: o.ordered_at,
                lines: o
                    .lines
                    .into_iter()
                    .map(|l| OrderLineBody {
                        id: l.id,
                        product_code: l.product_code.into_inner(),
                        product_name: l.product_name,
                        quantity: l.quantity,
                        unit_price: l.unit_price,
                        status: l.status.to_string(),
                        claim_reason: l.claim_reason,
                    })
                    .collect(),
            })
            .collect(),
    ))
}

/// POST /mypage/orders/{code}/cancel - cancel an order, restoring stock.
#[instrument(skip(state, user), fields(user = %user.0.code))]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: RequireAuth,
    Path(code): Path<String>,
) -> Result<StatusCode> {
    let code = OrderCode::from(code);
    OrderRepository::new(state.pool())
        .cancel(&user.0.code, &code)
        .await?;

    tracing::info!(order_code = %code, "order cancelled");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub claim_type: ClaimType,
    /// Structured reason category picked by the customer.
    pub reason_code: String,
    /// Free-form explanation.
    pub reason_detail: String,
}

/// Encode the claim reason as `code|detail`, mirroring the address codec.
///
/// The code is the selectable category and must be present; the detail is
/// free text and may be empty.
fn encode_claim_reason(code: &str, detail: &str) -> Result<String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AppError::Validation("reason code is required".into()));
    }
    if code.contains('|') {
        return Err(AppError::Validation(
            "reason code must not contain '|'".into(),
        ));
    }
    Ok(format!("{code}|{detail}"))
}

/// POST /mypage/orders/items/{id}/claim - open a return or exchange claim.
#[instrument(skip(state, user, body), fields(user = %user.0.code))]
pub async fn request_claim(
    State(state): State<AppState>,
    user: RequireAuth,
    Path(line_id): Path<i64>,
    Json(body): Json<ClaimRequest>,
) -> Result<StatusCode> {
    let reason = encode_claim_reason(&body.reason_code, &body.reason_detail)?;
    OrderRepository::new(state.pool())
        .request_claim(&user.0.code, line_id, body.claim_type, &reason)
        .await?;

    tracing::info!(line_id, claim = ?body.claim_type, "claim requested");
    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_reason_requires_a_code() {
        assert!(matches!(
            encode_claim_reason("", "box arrived crushed"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            encode_claim_reason("   ", "box arrived crushed"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn claim_reason_rejects_embedded_separator() {
        assert!(matches!(
            encode_claim_reason("DEFECT|EXTRA", "detail"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn claim_reason_encodes_code_and_detail() {
        let reason = encode_claim_reason("DEFECT", "dead pixels").expect("valid reason");
        assert_eq!(reason, "DEFECT|dead pixels");

        let bare = encode_claim_reason("CHANGED_MIND", "").expect("valid reason");
        assert_eq!(bare, "CHANGED_MIND|");
    }
}
