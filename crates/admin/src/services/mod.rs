//! Business logic services for the admin binary.

pub mod email;
