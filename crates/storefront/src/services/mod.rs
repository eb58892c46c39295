//! Business logic services for the storefront.

pub mod checkout;
pub mod email;
pub mod scheduler;
