//! HTTP route handlers for the admin binary.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check (in main)
//! GET  /health/ready                   - Readiness check (in main)
//!
//! # Sales (requires admin auth)
//! GET  /sales                          - Sold lines, filterable by status/date
//! POST /sales/orders/{code}/status     - Advance delivery status
//! POST /sales/items/{id}/claim-decision - Resolve a return/exchange claim
//!
//! # Inventory (requires admin auth)
//! GET  /inventory                      - Catalog with stock levels
//! POST /inventory/inbound              - Record an inbound receipt
//! POST /inventory/{code}/optimal       - Set the optimal stock target
//! GET  /inventory/{code}/inbound-history - Receipt history for a product
//! ```

pub mod inventory;
pub mod sales;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the sales routes router.
pub fn sales_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(sales::list))
        .route("/orders/{code}/status", post(sales::advance_status))
        .route("/items/{id}/claim-decision", post(sales::decide_claim))
}

/// Create the inventory routes router.
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(inventory::list))
        .route("/inbound", post(inventory::record_inbound))
        .route("/{code}/optimal", post(inventory::set_optimal))
        .route("/{code}/inbound-history", get(inventory::inbound_history))
}

/// Create all routes for the admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/sales", sales_routes())
        .nest("/inventory", inventory_routes())
}
