//! Status enums for orders, order lines, and coupon grants.
//!
//! Statuses are stored as `SCREAMING_SNAKE_CASE` text columns (the format
//! existing rows already use), so every enum round-trips through
//! `Display`/`FromStr` rather than a database-side enum type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a stored status string does not match any variant.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized status: {0}")]
pub struct StatusParseError(pub String);

/// Delivery status of an order header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PaymentCompleted,
    Shipping,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// The stored column value for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PaymentCompleted => "PAYMENT_COMPLETED",
            Self::Shipping => "SHIPPING",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PAYMENT_COMPLETED" => Ok(Self::PaymentCompleted),
            "SHIPPING" => Ok(Self::Shipping),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(StatusParseError(other.to_owned())),
        }
    }
}

/// Per-line status of an order item, including the claim lifecycle.
///
/// Lines start at `PaymentCompleted` together with their order header and
/// move through delivery; once delivered the customer can open a return or
/// exchange claim that an admin later resolves. The legal moves are encoded
/// in [`OrderItemStatus::can_transition_to`] and must be checked before any
/// status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderItemStatus {
    PaymentCompleted,
    Shipping,
    Delivered,
    Cancelled,
    ReturnRequested,
    ExchangeRequested,
    Returned,
    Exchanged,
}

impl OrderItemStatus {
    /// The stored column value for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PaymentCompleted => "PAYMENT_COMPLETED",
            Self::Shipping => "SHIPPING",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::ReturnRequested => "RETURN_REQUESTED",
            Self::ExchangeRequested => "EXCHANGE_REQUESTED",
            Self::Returned => "RETURNED",
            Self::Exchanged => "EXCHANGED",
        }
    }

    /// Whether this line sits in a state a customer or admin may still act on.
    ///
    /// `Returned`, `Exchanged` and `Cancelled` are terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Returned | Self::Exchanged | Self::Cancelled)
    }

    /// Whether a claim (return or exchange) is currently open on this line.
    #[must_use]
    pub const fn is_claim_open(self) -> bool {
        matches!(self, Self::ReturnRequested | Self::ExchangeRequested)
    }

    /// Transition table for line statuses.
    ///
    /// Delivery progress moves forward only; claims open from `Delivered`
    /// and resolve back to `Delivered` (reject) or into a terminal state
    /// (approve). Everything else is illegal.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::PaymentCompleted, Self::Shipping | Self::Cancelled)
                | (Self::Shipping, Self::Delivered | Self::Cancelled)
                | (Self::Delivered, Self::ReturnRequested | Self::ExchangeRequested)
                | (Self::ReturnRequested, Self::Returned | Self::Delivered)
                | (Self::ExchangeRequested, Self::Exchanged | Self::Delivered)
        )
    }
}

impl std::fmt::Display for OrderItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderItemStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PAYMENT_COMPLETED" => Ok(Self::PaymentCompleted),
            "SHIPPING" => Ok(Self::Shipping),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            "RETURN_REQUESTED" => Ok(Self::ReturnRequested),
            "EXCHANGE_REQUESTED" => Ok(Self::ExchangeRequested),
            "RETURNED" => Ok(Self::Returned),
            "EXCHANGED" => Ok(Self::Exchanged),
            other => Err(StatusParseError(other.to_owned())),
        }
    }
}

/// Usage status of a coupon grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponStatus {
    Unused,
    Used,
}

impl CouponStatus {
    /// The stored column value for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unused => "UNUSED",
            Self::Used => "USED",
        }
    }
}

impl std::fmt::Display for CouponStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CouponStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNUSED" => Ok(Self::Unused),
            "USED" => Ok(Self::Used),
            other => Err(StatusParseError(other.to_owned())),
        }
    }
}

/// Kind of claim a customer can open on a delivered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimType {
    Return,
    Exchange,
}

impl ClaimType {
    /// The line status a claim of this kind moves the line into.
    #[must_use]
    pub const fn requested_status(self) -> OrderItemStatus {
        match self {
            Self::Return => OrderItemStatus::ReturnRequested,
            Self::Exchange => OrderItemStatus::ExchangeRequested,
        }
    }
}

/// Admin resolution of an open claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimDecision {
    ApproveReturn,
    ApproveExchange,
    Reject,
}

impl ClaimDecision {
    /// The line status this decision writes.
    #[must_use]
    pub const fn target_status(self) -> OrderItemStatus {
        match self {
            Self::ApproveReturn => OrderItemStatus::Returned,
            Self::ApproveExchange => OrderItemStatus::Exchanged,
            Self::Reject => OrderItemStatus::Delivered,
        }
    }

    /// Whether this decision puts the claimed quantity back into stock.
    #[must_use]
    pub const fn restocks(self) -> bool {
        matches!(self, Self::ApproveReturn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn order_status_round_trip() {
        for status in [
            OrderStatus::PaymentCompleted,
            OrderStatus::Shipping,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_str(status.as_str()), Ok(status));
        }
        assert!(OrderStatus::from_str("REFUNDED").is_err());
    }

    #[test]
    fn item_status_round_trip() {
        for status in [
            OrderItemStatus::PaymentCompleted,
            OrderItemStatus::Shipping,
            OrderItemStatus::Delivered,
            OrderItemStatus::Cancelled,
            OrderItemStatus::ReturnRequested,
            OrderItemStatus::ExchangeRequested,
            OrderItemStatus::Returned,
            OrderItemStatus::Exchanged,
        ] {
            assert_eq!(OrderItemStatus::from_str(status.as_str()), Ok(status));
        }
    }

    #[test]
    fn claims_open_only_from_delivered() {
        assert!(
            OrderItemStatus::Delivered.can_transition_to(OrderItemStatus::ReturnRequested)
        );
        assert!(
            OrderItemStatus::Delivered.can_transition_to(OrderItemStatus::ExchangeRequested)
        );
        assert!(
            !OrderItemStatus::Shipping.can_transition_to(OrderItemStatus::ReturnRequested)
        );
        assert!(
            !OrderItemStatus::PaymentCompleted
                .can_transition_to(OrderItemStatus::ExchangeRequested)
        );
    }

    #[test]
    fn claim_resolution_transitions() {
        assert!(OrderItemStatus::ReturnRequested.can_transition_to(OrderItemStatus::Returned));
        assert!(OrderItemStatus::ReturnRequested.can_transition_to(OrderItemStatus::Delivered));
        assert!(
            OrderItemStatus::ExchangeRequested.can_transition_to(OrderItemStatus::Exchanged)
        );
        assert!(
            OrderItemStatus::ExchangeRequested.can_transition_to(OrderItemStatus::Delivered)
        );
        // Cross-resolution is illegal
        assert!(
            !OrderItemStatus::ReturnRequested.can_transition_to(OrderItemStatus::Exchanged)
        );
        assert!(
            !OrderItemStatus::ExchangeRequested.can_transition_to(OrderItemStatus::Returned)
        );
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for terminal in [
            OrderItemStatus::Returned,
            OrderItemStatus::Exchanged,
            OrderItemStatus::Cancelled,
        ] {
            assert!(terminal.is_terminal());
            for next in [
                OrderItemStatus::PaymentCompleted,
                OrderItemStatus::Shipping,
                OrderItemStatus::Delivered,
                OrderItemStatus::Cancelled,
                OrderItemStatus::ReturnRequested,
                OrderItemStatus::ExchangeRequested,
                OrderItemStatus::Returned,
                OrderItemStatus::Exchanged,
            ] {
                assert!(
                    !terminal.can_transition_to(next),
                    "{terminal} -> {next} must be illegal"
                );
            }
        }
    }

    #[test]
    fn decision_targets() {
        assert_eq!(
            ClaimDecision::ApproveReturn.target_status(),
            OrderItemStatus::Returned
        );
        assert_eq!(
            ClaimDecision::ApproveExchange.target_status(),
            OrderItemStatus::Exchanged
        );
        assert_eq!(
            ClaimDecision::Reject.target_status(),
            OrderItemStatus::Delivered
        );
        assert!(ClaimDecision::ApproveReturn.restocks());
        assert!(!ClaimDecision::ApproveExchange.restocks());
        assert!(!ClaimDecision::Reject.restocks());
    }
}
