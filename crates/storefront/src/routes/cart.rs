//! Cart handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use eagcart_core::ProductCode;

use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAuth;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CartItemBody {
    pub id: i64,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i32,
    pub price: i64,
    pub sale_price: i64,
    pub subtotal: i64,
}

#[derive(Debug, Serialize)]
pub struct CartBody {
    pub items: Vec<CartItemBody>,
    pub total: i64,
}

/// GET /cart - cart contents with current effective prices.
#[instrument(skip(state, user), fields(user = %user.0.code))]
pub async fn show(State(state): State<AppState>, user: RequireAuth) -> Result<Json<CartBody>> {
    let items = CartRepository::new(state.pool()).items(&user.0.code).await?;

    let items: Vec<CartItemBody> = items
        .into_iter()
        .map(|i| CartItemBody {
            id: i.id,
            product_code: i.product_code.into_inner(),
            product_name: i.product_name,
            quantity: i.quantity,
            price: i.price,
            sale_price: i.sale_price,
            subtotal: i.sale_price * i64::from(i.quantity),
        })
        .collect();
    let total = items.iter().map(|i| i.subtotal).sum();

    Ok(Json(CartBody { items, total }))
}

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub product_code: String,
    pub quantity: i32,
}

/// POST /cart/add - add a product, merging with an existing line.
#[instrument(skip(state, user), fields(user = %user.0.code))]
pub async fn add(
    State(state): State<AppState>,
    user: RequireAuth,
    Json(body): Json<AddRequest>,
) -> Result<StatusCode> {
    if body.quantity <= 0 {
        return Err(AppError::Validation("quantity must be positive".into()));
    }

    let code = ProductCode::from(body.product_code.as_str());
    ProductRepository::new(state.pool())
        .get_priced(&code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", body.product_code)))?;

    CartRepository::new(state.pool())
        .add(&user.0.code, &code, body.quantity)
        .await?;

    Ok(StatusCode::CREATED)
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub id: i64,
    pub quantity: i32,
}

/// POST /cart/update - set a line's quantity.
#[instrument(skip(state, user), fields(user = %user.0.code))]
pub async fn update(
    State(state): State<AppState>,
    user: RequireAuth,
    Json(body): Json<UpdateRequest>,
) -> Result<StatusCode> {
    if body.quantity <= 0 {
        return Err(AppError::Validation("quantity must be positive".into()));
    }

    CartRepository::new(state.pool())
        .update_quantity(&user.0.code, body.id, body.quantity)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct RemoveRequest {
    pub id: i64,
}

/// POST /cart/remove - remove a line.
#[instrument(skip(state, user), fields(user = %user.0.code))]
pub async fn remove(
    State(state): State<AppState>,
    user: RequireAuth,
    Json(body): Json<RemoveRequest>,
) -> Result<StatusCode> {
    let removed = CartRepository::new(state.pool())
        .remove(&user.0.code, body.id)
        .await?;
    if !removed {
        return Err(AppError::NotFound("cart line".into()));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct CountBody {
    pub count: i64,
}

/// GET /cart/count - number of cart lines.
#[instrument(skip(state, user), fields(user = %user.0.code))]
pub async fn count(State(state): State<AppState>, user: RequireAuth) -> Result<Json<CountBody>> {
    let count = CartRepository::new(state.pool()).count(&user.0.code).await?;
    Ok(Json(CountBody { count }))
}
