//! Core type definitions.

pub mod address;
pub mod code;
pub mod status;
