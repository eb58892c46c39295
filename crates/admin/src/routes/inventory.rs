//! Inventory handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use eagcart_core::ProductCode;

use crate::db::InventoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAdminAuth;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct InventoryItemBody {
    pub product_code: String,
    pub name: String,
    pub price: i64,
    pub current_stock: i32,
    pub optimal_stock: i32,
    pub below_threshold: bool,
}

/// GET /inventory - catalog with stock levels.
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdminAuth,
) -> Result<Json<Vec<InventoryItemBody>>> {
    let items = InventoryRepository::new(state.pool()).list().await?;

    Ok(Json(
        items
            .into_iter()
            .map(|i| InventoryItemBody {
                product_code: i.code.into_inner(),
                name: i.name,
                price: i.price,
                current_stock: i.current_stock,
                optimal_stock: i.optimal_stock,
                below_threshold: i.below_threshold,
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct InboundRequest {
    pub product_code: String,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct InboundBody {
    pub inbound_code: String,
}

/// POST /inventory/inbound - record an inbound receipt and add to stock.
#[instrument(skip(state, _admin))]
pub async fn record_inbound(
    State(state): State<AppState>,
    _admin: RequireAdminAuth,
    Json(body): Json<InboundRequest>,
) -> Result<(StatusCode, Json<InboundBody>)> {
    if body.quantity <= 0 {
        return Err(AppError::Validation("quantity must be positive".into()));
    }

    let product = ProductCode::from(body.product_code.as_str());
    let code = InventoryRepository::new(state.pool())
        .record_inbound(&product, body.quantity)
        .await?;

    tracing::info!(
        product_code = %product,
        quantity = body.quantity,
        inbound_code = %code,
        "inbound recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(InboundBody {
            inbound_code: code.into_inner(),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct OptimalStockRequest {
    pub optimal_stock: i32,
}

/// POST /inventory/{code}/optimal - set the optimal stock target.
#[instrument(skip(state, _admin))]
pub async fn set_optimal(
    State(state): State<AppState>,
    _admin: RequireAdminAuth,
    Path(code): Path<String>,
    Json(body): Json<OptimalStockRequest>,
) -> Result<StatusCode> {
    if body.optimal_stock < 0 {
        return Err(AppError::Validation(
            "optimal stock must not be negative".into(),
        ));
    }

    let product = ProductCode::from(code);
    InventoryRepository::new(state.pool())
        .set_optimal_stock(&product, body.optimal_stock)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct InboundEntryBody {
    pub inbound_code: String,
    pub product_code: String,
    pub quantity: i32,
    pub received_at: chrono::DateTime<chrono::Utc>,
}

/// GET /inventory/{code}/inbound-history - receipt history for a product.
#[instrument(skip(state, _admin))]
pub async fn inbound_history(
    State(state): State<AppState>,
    _admin: RequireAdminAuth,
    Path(code): Path<String>,
) -> Result<Json<Vec<InboundEntryBody>>> {
    let product = ProductCode::from(code);
    let entries = InventoryRepository::new(state.pool())
        .inbound_history(&product)
        .await?;

    Ok(Json(
        entries
            .into_iter()
            .map(|e| InboundEntryBody {
                inbound_code: e.inbound_code.into_inner(),
                product_code: e.product_code.into_inner(),
                quantity: e.quantity,
                received_at: e.received_at,
            })
            .collect(),
    ))
}
