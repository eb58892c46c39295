//! Shipping address codec.
//!
//! Orders persist the destination as a single text column of the form
//! `base|detail|receiver`. Existing rows use that encoding, so both halves
//! of the codec live here and nothing else in the system is allowed to
//! split on `|` by hand.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Destination for an order: base address, unit detail, and receiver name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub base: String,
    pub detail: String,
    pub receiver: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("expected 3 pipe-separated fields, found {0}")]
    FieldCount(usize),
    #[error("address field must not contain '|'")]
    EmbeddedSeparator,
}

impl ShippingAddress {
    /// Builds an address, rejecting fields that contain the separator.
    pub fn new(
        base: impl Into<String>,
        detail: impl Into<String>,
        receiver: impl Into<String>,
    ) -> Result<Self, AddressParseError> {
        let addr = Self {
            base: base.into(),
            detail: detail.into(),
            receiver: receiver.into(),
        };
        if addr.base.contains('|') || addr.detail.contains('|') || addr.receiver.contains('|') {
            return Err(AddressParseError::EmbeddedSeparator);
        }
        Ok(addr)
    }

    /// Renders the stored column value.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}|{}|{}", self.base, self.detail, self.receiver)
    }
}

impl std::str::FromStr for ShippingAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('|').collect();
        if parts.len() != 3 {
            return Err(AddressParseError::FieldCount(parts.len()));
        }
        Ok(Self {
            base: parts[0].to_owned(),
            detail: parts[1].to_owned(),
            receiver: parts[2].to_owned(),
        })
    }
}

impl std::fmt::Display for ShippingAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn round_trip() {
        let addr = ShippingAddress::new("12 Teheran-ro", "Apt 301", "Kim Minji").unwrap();
        let encoded = addr.encode();
        assert_eq!(encoded, "12 Teheran-ro|Apt 301|Kim Minji");
        assert_eq!(ShippingAddress::from_str(&encoded).unwrap(), addr);
    }

    #[test]
    fn empty_detail_is_preserved() {
        let addr = ShippingAddress::from_str("Main St 1||Lee").unwrap();
        assert_eq!(addr.detail, "");
        assert_eq!(addr.encode(), "Main St 1||Lee");
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert_eq!(
            ShippingAddress::from_str("only-base"),
            Err(AddressParseError::FieldCount(1))
        );
        assert_eq!(
            ShippingAddress::from_str("a|b|c|d"),
            Err(AddressParseError::FieldCount(4))
        );
    }

    #[test]
    fn rejects_separator_in_field() {
        assert_eq!(
            ShippingAddress::new("a|b", "c", "d"),
            Err(AddressParseError::EmbeddedSeparator)
        );
    }
}
