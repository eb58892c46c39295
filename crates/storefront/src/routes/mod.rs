//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (in main)
//!
//! # Cart (requires auth)
//! GET  /cart                       - Cart contents with current prices
//! POST /cart/add                   - Add a product (merges quantities)
//! POST /cart/update                - Set a line's quantity
//! POST /cart/remove                - Remove a line
//! GET  /cart/count                 - Number of cart lines
//!
//! # Checkout (requires auth)
//! POST /checkout/summary           - Price a selection without ordering
//! GET  /checkout/coupons           - Usable coupon grants
//! GET  /checkout/recent-address    - Most recent shipping address
//! POST /checkout/process           - Place the order
//!
//! # My page (requires auth)
//! GET  /mypage/orders              - Order history with lines
//! POST /mypage/orders/{code}/cancel       - Cancel an order
//! POST /mypage/orders/items/{id}/claim    - Open a return/exchange claim
//! ```

pub mod cart;
pub mod checkout;
pub mod mypage;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/summary", post(checkout::summary))
        .route("/coupons", get(checkout::coupons))
        .route("/recent-address", get(checkout::recent_address))
        .route("/process", post(checkout::process))
}

/// Create the my-page routes router.
pub fn mypage_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(mypage::orders))
        .route("/orders/{code}/cancel", post(mypage::cancel_order))
        .route("/orders/items/{id}/claim", post(mypage::request_claim))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/mypage", mypage_routes())
}
