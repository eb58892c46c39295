//! Checkout handlers.

use std::str::FromStr;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use eagcart_core::ShippingAddress;

use crate::db::{CouponRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAuth;
use crate::services::checkout::{
    self, CheckoutSelection, PlaceOrderRequest, compute_totals,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SummaryLineBody {
    pub product_code: String,
    pub product_name: String,
    pub quantity: i32,
    pub list_price: i64,
    pub unit_price: i64,
    pub line_discount: i64,
}

#[derive(Debug, Serialize)]
pub struct SummaryBody {
    pub lines: Vec<SummaryLineBody>,
    /// List-price sum before discounts.
    pub total: i64,
    /// Product discounts across all lines.
    pub total_discount: i64,
    /// Payable before any coupon.
    pub final_amount: i64,
}

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub selection: CheckoutSelection,
}

/// POST /checkout/summary - price a selection without placing an order.
#[instrument(skip(state, user), fields(user = %user.0.code))]
pub async fn summary(
    State(state): State<AppState>,
    user: RequireAuth,
    Json(body): Json<SummaryRequest>,
) -> Result<Json<SummaryBody>> {
    let lines = checkout::resolve_selection(&state, &user.0.code, &body.selection).await?;
    let totals = compute_totals(&lines, 0);

    let lines = lines
        .into_iter()
        .map(|l| SummaryLineBody {
            line_discount: l.line_discount(),
            product_code: l.product_code.into_inner(),
            product_name: l.product_name,
            quantity: l.quantity,
            list_price: l.list_price,
            unit_price: l.unit_price,
        })
        .collect();

    Ok(Json(SummaryBody {
        lines,
        total: totals.total,
        total_discount: totals.discount,
        final_amount: totals.final_amount,
    }))
}

#[derive(Debug, Serialize)]
pub struct CouponBody {
    pub grant_id: i64,
    pub coupon_code: String,
    pub name: String,
    pub discount_amount: i64,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

/// GET /checkout/coupons - the user's usable coupon grants.
#[instrument(skip(state, user), fields(user = %user.0.code))]
pub async fn coupons(
    State(state): State<AppState>,
    user: RequireAuth,
) -> Result<Json<Vec<CouponBody>>> {
    let coupons = CouponRepository::new(state.pool()).usable(&user.0.code).await?;

    Ok(Json(
        coupons
            .into_iter()
            .map(|c| CouponBody {
                grant_id: c.id,
                coupon_code: c.coupon_code.into_inner(),
                name: c.name,
                discount_amount: c.discount_amount,
                expires_at: c.end_date,
            })
            .collect(),
    ))
}

#[derive(Debug, Serialize)]
pub struct RecentAddressBody {
    pub base_address: String,
    pub detail_address: String,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub delivery_request: String,
}

/// GET /checkout/recent-address - the user's most recent shipping snapshot.
///
/// Returns 204 when the user has never ordered.
#[instrument(skip(state, user), fields(user = %user.0.code))]
pub async fn recent_address(
    State(state): State<AppState>,
    user: RequireAuth,
) -> Result<Response> {
    let recent = OrderRepository::new(state.pool())
        .recent_shipping(&user.0.code)
        .await?;

    let Some(recent) = recent else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let address = ShippingAddress::from_str(&recent.shipping_address)
        .map_err(|e| AppError::Internal(format!("stored address unreadable: {e}")))?;

    Ok(Json(RecentAddressBody {
        base_address: address.base,
        detail_address: address.detail,
        receiver_name: address.receiver,
        receiver_phone: recent.receiver_phone,
        delivery_request: recent.delivery_request,
    })
    .into_response())
}

#[derive(Debug, Serialize)]
pub struct PlacedOrderBody {
    pub order_code: String,
    pub final_amount: i64,
    pub delivery_date: chrono::NaiveDate,
}

/// POST /checkout/process - place the order.
#[instrument(skip(state, user, body), fields(user = %user.0.code))]
pub async fn process(
    State(state): State<AppState>,
    user: RequireAuth,
    Json(body): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<PlacedOrderBody>)> {
    let placed = checkout::place_order(&state, &user.0.code, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(PlacedOrderBody {
            order_code: placed.order_code.into_inner(),
            final_amount: placed.final_amount,
            delivery_date: placed.delivery_date,
        }),
    ))
}
