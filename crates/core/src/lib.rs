//! Shared types for the EaGCart storefront and admin binaries.
//!
//! This crate holds the vocabulary both binaries speak: entity code newtypes,
//! order/line/coupon status enums (including the claim transition table), and
//! the pipe-encoded shipping address snapshot.
//!
//! Enable the `postgres` feature to get sqlx `Type`/`Encode`/`Decode`
//! implementations for the code newtypes.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::address::{AddressParseError, ShippingAddress};
pub use types::code::{CouponCode, InboundCode, OrderCode, ProductCode, UserCode};
pub use types::status::{
    ClaimDecision, ClaimType, CouponStatus, OrderItemStatus, OrderStatus, StatusParseError,
};
