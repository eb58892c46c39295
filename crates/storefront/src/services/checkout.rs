//! Checkout orchestration: selection resolution, pricing, and order placement.
//!
//! The client submits the total it displayed; the server recomputes every
//! amount from current prices and rejects the order when they disagree, so
//! a stale page or a tampered request can never charge the wrong amount.

use chrono::{Datelike, NaiveDate, Utc, Weekday};
use serde::Deserialize;

use eagcart_core::{OrderCode, ProductCode, ShippingAddress, UserCode};

use crate::db::orders::{NewOrder, NewOrderLine, OrderError};
use crate::db::{CartRepository, CouponRepository, OrderRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Days until delivery for orders placed Monday through Thursday.
const DELIVERY_DAYS_WEEKDAY: i64 = 3;
/// Days until delivery for orders placed Friday through Sunday, when the
/// warehouse doesn't ship over the weekend.
const DELIVERY_DAYS_WEEKEND: i64 = 5;

/// What the customer chose to buy.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CheckoutSelection {
    /// Buy a single product directly, bypassing the cart.
    Direct { product_code: String, quantity: i32 },
    /// Buy specific lines from the cart.
    CartLines { ids: Vec<i64> },
}

/// A selection line resolved against the catalog with its effective price.
#[derive(Debug, Clone)]
pub struct ResolvedLine {
    pub product_code: ProductCode,
    pub product_name: String,
    pub quantity: i32,
    /// List price per unit.
    pub list_price: i64,
    /// Effective price per unit (discount applied).
    pub unit_price: i64,
}

impl ResolvedLine {
    /// List-price subtotal before any discount.
    #[must_use]
    pub fn list_subtotal(&self) -> i64 {
        self.list_price * i64::from(self.quantity)
    }

    /// Discount this line carries: `(list - sale) * quantity`.
    #[must_use]
    pub fn line_discount(&self) -> i64 {
        (self.list_price - self.unit_price) * i64::from(self.quantity)
    }
}

/// Server-computed order amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    /// Sum of list-price subtotals before any discount.
    pub total: i64,
    /// Line discounts plus the coupon discount.
    pub discount: i64,
    /// Amount charged: `total - discount`.
    pub final_amount: i64,
}

/// Compute order totals from resolved lines and the coupon discount.
///
/// The total is the list-price sum; product discounts and the coupon both
/// land in `discount`. The charged amount never goes below zero even when
/// the coupon exceeds the discounted total.
#[must_use]
pub fn compute_totals(lines: &[ResolvedLine], coupon_discount: i64) -> OrderTotals {
    let total: i64 = lines.iter().map(ResolvedLine::list_subtotal).sum();
    let line_discount: i64 = lines.iter().map(ResolvedLine::line_discount).sum();
    let discount = line_discount + coupon_discount;
    let final_amount = (total - discount).max(0);
    OrderTotals {
        total,
        discount,
        final_amount,
    }
}

/// Estimated delivery date for an order placed on `ordered_on`.
///
/// Friday through Sunday orders wait out the weekend.
#[must_use]
pub fn estimated_delivery(ordered_on: NaiveDate) -> NaiveDate {
    let days = match ordered_on.weekday() {
        Weekday::Fri | Weekday::Sat | Weekday::Sun => DELIVERY_DAYS_WEEKEND,
        _ => DELIVERY_DAYS_WEEKDAY,
    };
    ordered_on + chrono::Duration::days(days)
}

/// Resolve the customer's selection into priced lines.
///
/// # Errors
///
/// Returns `AppError::Validation` when the selection resolves to nothing or
/// the quantity is non-positive, `AppError::NotFound` when a direct-purchase
/// product is missing.
pub async fn resolve_selection(
    state: &AppState,
    user: &UserCode,
    selection: &CheckoutSelection,
) -> Result<Vec<ResolvedLine>> {
    match selection {
        CheckoutSelection::Direct {
            product_code,
            quantity,
        } => {
            if *quantity <= 0 {
                return Err(AppError::Validation("quantity must be positive".into()));
            }
            let code = ProductCode::from(product_code.as_str());
            let product = ProductRepository::new(state.pool())
                .get_priced(&code)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("product {product_code}")))?;

            Ok(vec![ResolvedLine {
                product_code: product.code,
                product_name: product.name,
                quantity: *quantity,
                list_price: product.price,
                unit_price: product.sale_price,
            }])
        }
        CheckoutSelection::CartLines { ids } => {
            // Line ids that no longer resolve (already removed, another
            // session) are dropped; only a fully empty selection fails.
            let items = CartRepository::new(state.pool()).items_by_id(user, ids).await?;
            if items.is_empty() {
                return Err(AppError::Validation("empty selection".into()));
            }

            Ok(items
                .into_iter()
                .map(|item| ResolvedLine {
                    product_code: item.product_code,
                    product_name: item.product_name,
                    quantity: item.quantity,
                    list_price: item.price,
                    unit_price: item.sale_price,
                })
                .collect())
        }
    }
}

/// Customer-submitted order.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub selection: CheckoutSelection,
    pub base_address: String,
    pub detail_address: String,
    pub receiver_name: String,
    pub receiver_phone: String,
    /// Free-form delivery instructions for the courier.
    pub delivery_request: String,
    /// Grant row ID of the coupon to apply, if any.
    pub coupon_grant_id: Option<i64>,
    /// The final amount the customer saw; must match the server's figure.
    pub expected_final_amount: i64,
}

/// A successfully placed order.
#[derive(Debug)]
pub struct PlacedOrder {
    pub order_code: OrderCode,
    pub final_amount: i64,
    pub delivery_date: NaiveDate,
}

/// Place an order end to end.
///
/// Resolves the selection, recomputes totals, verifies the client's figure,
/// writes the order transaction, and kicks off the post-commit low-stock
/// check without blocking the response.
///
/// # Errors
///
/// Propagates resolution errors, `AppError::Validation` on an amount
/// mismatch, `AppError::OutOfStock` / `AppError::CouponUnavailable` from
/// the order transaction.
pub async fn place_order(
    state: &AppState,
    user: &UserCode,
    request: PlaceOrderRequest,
) -> Result<PlacedOrder> {
    if request.receiver_name.trim().is_empty()
        || request.receiver_phone.trim().is_empty()
        || request.base_address.trim().is_empty()
    {
        return Err(AppError::Validation(
            "receiver name, phone, and address are required".into(),
        ));
    }

    let lines = resolve_selection(state, user, &request.selection).await?;

    let address = ShippingAddress::new(
        request.base_address,
        request.detail_address,
        request.receiver_name,
    )
    .map_err(|e| AppError::Validation(e.to_string()))?;

    let coupon_discount = match request.coupon_grant_id {
        Some(grant_id) => CouponRepository::new(state.pool())
            .discount_for(user, grant_id)
            .await?
            .ok_or(AppError::CouponUnavailable)?,
        None => 0,
    };

    let totals = compute_totals(&lines, coupon_discount);
    if totals.final_amount != request.expected_final_amount {
        tracing::warn!(
            user = %user,
            expected = request.expected_final_amount,
            computed = totals.final_amount,
            "order amount mismatch"
        );
        return Err(AppError::Validation("order total mismatch".into()));
    }

    let delivery_date = estimated_delivery(Utc::now().date_naive());
    let from_cart = matches!(request.selection, CheckoutSelection::CartLines { .. });

    let order = NewOrder {
        user: user.clone(),
        lines: lines
            .iter()
            .map(|l| NewOrderLine {
                product_code: l.product_code.clone(),
                quantity: l.quantity,
                unit_price: l.unit_price,
            })
            .collect(),
        address,
        receiver_phone: request.receiver_phone,
        delivery_request: request.delivery_request,
        total_amount: totals.total,
        discount_amount: totals.discount,
        final_amount: totals.final_amount,
        coupon_grant_id: request.coupon_grant_id,
        delivery_date,
        from_cart,
    };

    let order_code = OrderRepository::new(state.pool()).place(&order).await?;

    tracing::info!(
        user = %user,
        order_code = %order_code,
        final_amount = totals.final_amount,
        "order placed"
    );

    // The order is committed; stock alerting must not fail it.
    let ordered_codes: Vec<ProductCode> =
        lines.iter().map(|l| l.product_code.clone()).collect();
    let task_state = state.clone();
    tokio::spawn(async move {
        notify_low_stock(&task_state, &ordered_codes).await;
    });

    Ok(PlacedOrder {
        order_code,
        final_amount: totals.final_amount,
        delivery_date,
    })
}

/// Check the ordered products' stock levels and alert the operator when any
/// fell below the reorder threshold. Failures are logged, never surfaced.
async fn notify_low_stock(state: &AppState, codes: &[ProductCode]) {
    let low = match ProductRepository::new(state.pool()).low_stock(codes).await {
        Ok(low) => low,
        Err(e) => {
            tracing::error!(error = %e, "low-stock check failed");
            return;
        }
    };

    if low.is_empty() {
        return;
    }

    let operator = state.config().email.operator_address.clone();
    if let Err(e) = state.email().send_low_stock_alert(&operator, &low).await {
        tracing::error!(error = %e, "failed to send low-stock alert");
    }
}

impl From<OrderError> for AppError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::OutOfStock(code) => Self::OutOfStock(code.to_string()),
            OrderError::CouponUnavailable => Self::CouponUnavailable,
            OrderError::InvalidTransition { from } => Self::InvalidTransition(from),
            OrderError::Repository(err) => Self::Database(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(list_price: i64, sale_price: i64, quantity: i32) -> ResolvedLine {
        ResolvedLine {
            product_code: ProductCode::from("P001"),
            product_name: "Test".to_owned(),
            quantity,
            list_price,
            unit_price: sale_price,
        }
    }

    #[test]
    fn total_sums_list_prices_not_sale_prices() {
        // 2 units at list 10,000 with a 20% discount: the total stays at
        // the list sum and the discount carries the markdown.
        let totals = compute_totals(&[line(10_000, 8_000, 2)], 0);
        assert_eq!(totals.total, 20_000);
        assert_eq!(totals.discount, 4_000);
        assert_eq!(totals.final_amount, 16_000);
    }

    #[test]
    fn undiscounted_lines_carry_no_discount() {
        let totals = compute_totals(&[line(1_000, 1_000, 2), line(500, 500, 3)], 0);
        assert_eq!(totals.total, 3_500);
        assert_eq!(totals.discount, 0);
        assert_eq!(totals.final_amount, 3_500);
    }

    #[test]
    fn coupon_folds_into_discount() {
        let totals = compute_totals(&[line(10_000, 9_000, 1)], 3_000);
        assert_eq!(totals.total, 10_000);
        assert_eq!(totals.discount, 4_000);
        assert_eq!(totals.final_amount, 6_000);
    }

    #[test]
    fn final_amount_never_negative() {
        let totals = compute_totals(&[line(1_000, 1_000, 1)], 5_000);
        assert_eq!(totals.final_amount, 0);
    }

    #[test]
    fn midweek_orders_arrive_in_three_days() {
        // 2025-06-02 is a Monday
        let monday = NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date");
        assert_eq!(
            estimated_delivery(monday),
            NaiveDate::from_ymd_opt(2025, 6, 5).expect("valid date")
        );

        let thursday = NaiveDate::from_ymd_opt(2025, 6, 5).expect("valid date");
        assert_eq!(
            estimated_delivery(thursday),
            NaiveDate::from_ymd_opt(2025, 6, 8).expect("valid date")
        );
    }

    #[test]
    fn weekend_orders_wait_five_days() {
        // 2025-06-06 is a Friday
        let friday = NaiveDate::from_ymd_opt(2025, 6, 6).expect("valid date");
        assert_eq!(
            estimated_delivery(friday),
            NaiveDate::from_ymd_opt(2025, 6, 11).expect("valid date")
        );

        let sunday = NaiveDate::from_ymd_opt(2025, 6, 8).expect("valid date");
        assert_eq!(
            estimated_delivery(sunday),
            NaiveDate::from_ymd_opt(2025, 6, 13).expect("valid date")
        );
    }
}
