//! Sales handlers: listing, delivery progression, claim decisions.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use eagcart_core::{ClaimDecision, OrderCode, OrderItemStatus, OrderStatus};

use crate::db::SalesRepository;
use crate::db::sales::SalesFilter;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAdminAuth;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderItemStatus>,
    pub keyword: Option<String>,
    #[serde(default)]
    pub claims_only: bool,
    pub from: Option<chrono::NaiveDate>,
    pub to: Option<chrono::NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct SaleLineBody {
    pub item_id: i64,
    pub order_code: String,
    pub user_email: String,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub status: String,
    pub claim_reason: Option<String>,
    pub ordered_at: chrono::DateTime<chrono::Utc>,
}

/// GET /sales - sold lines, newest first, filterable by status and date.
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdminAuth,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SaleLineBody>>> {
    let filter = SalesFilter {
        status: query.status,
        keyword: query.keyword,
        claims_only: query.claims_only,
        from: query.from,
        to: query.to,
    };

    let lines = SalesRepository::new(state.pool()).list(&filter).await?;

    Ok(Json(
        lines
            .into_iter()
            .map(|l| SaleLineBody {
                item_id: l.item_id,
                order_code: l.order_code.into_inner(),
                user_email: l.user_email,
                product_code: l.product_code.into_inner(),
                product_name: l.product_name,
                quantity: l.quantity,
                unit_price: l.unit_price,
                status: l.status.to_string(),
                claim_reason: l.claim_reason,
                ordered_at: l.ordered_at,
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct AdvanceStatusRequest {
    pub status: OrderStatus,
}

/// POST /sales/orders/{code}/status - advance an order through delivery.
#[instrument(skip(state, _admin))]
pub async fn advance_status(
    State(state): State<AppState>,
    _admin: RequireAdminAuth,
    Path(code): Path<String>,
    Json(body): Json<AdvanceStatusRequest>,
) -> Result<StatusCode> {
    let code = OrderCode::from(code);
    SalesRepository::new(state.pool())
        .advance_order_status(&code, body.status)
        .await?;

    tracing::info!(order_code = %code, status = %body.status, "order status advanced");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ClaimDecisionRequest {
    pub decision: ClaimDecision,
}

#[derive(Debug, Serialize)]
pub struct ClaimDecisionBody {
    pub item_id: i64,
    pub new_status: String,
}

/// POST /sales/items/{id}/claim-decision - resolve a return/exchange claim.
///
/// Rejections notify the customer by email after the decision commits; a
/// failed email never rolls the decision back.
#[instrument(skip(state, _admin, body))]
pub async fn decide_claim(
    State(state): State<AppState>,
    _admin: RequireAdminAuth,
    Path(item_id): Path<i64>,
    Json(body): Json<ClaimDecisionRequest>,
) -> Result<Json<ClaimDecisionBody>> {
    let outcome = SalesRepository::new(state.pool())
        .decide_claim(item_id, body.decision)
        .await
        .map_err(AppError::from)?;

    tracing::info!(
        item_id,
        decision = ?body.decision,
        new_status = %outcome.new_status,
        "claim decided"
    );

    if body.decision == ClaimDecision::Reject {
        // Stored as "code|detail"; render it readably for the customer.
        let reason = outcome
            .claim_reason
            .clone()
            .map_or_else(|| "not specified".to_owned(), |r| r.replace('|', " - "));

        let email = state.email().clone();
        tokio::spawn(async move {
            if let Err(e) = email
                .send_claim_rejected(
                    &outcome.user_email,
                    outcome.order_code.as_str(),
                    &outcome.product_name,
                    &reason,
                )
                .await
            {
                tracing::error!(error = %e, "failed to send claim rejection email");
            }
        });

        return Ok(Json(ClaimDecisionBody {
            item_id,
            new_status: OrderItemStatus::Delivered.to_string(),
        }));
    }

    Ok(Json(ClaimDecisionBody {
        item_id,
        new_status: outcome.new_status.to_string(),
    }))
}
