//! Newtype entity codes for type-safe references.
//!
//! Every entity in the schema is keyed by a human-readable code column
//! (`ORDER_CODE`, `PRODUCT_CODE`, ...) rather than a surrogate integer.
//! The `define_code!` macro creates a String newtype per entity so an order
//! code can never be passed where a product code is expected.

use rand::Rng;

/// Macro to define a type-safe entity code wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Display`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>` and `From<&str>` implementations
/// - sqlx `Type`, `Encode`, and `Decode` implementations (with the
///   `postgres` feature), delegating to `TEXT`
#[macro_export]
macro_rules! define_code {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new code from a string value.
            #[must_use]
            pub fn new(code: impl Into<String>) -> Self {
                Self(code.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the code and return the underlying `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(code: String) -> Self {
                Self(code)
            }
        }

        impl From<&str> for $name {
            fn from(code: &str) -> Self {
                Self(code.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(code: $name) -> Self {
                code.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let code = <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(code))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_code!(UserCode);
define_code!(ProductCode);
define_code!(OrderCode);
define_code!(CouponCode);
define_code!(InboundCode);

impl OrderCode {
    /// Generate a fresh order code: `"ORD"` + millisecond timestamp + a
    /// random 0..999 suffix.
    ///
    /// The string shape is fixed by existing stored rows, so uniqueness stays
    /// probabilistic; the order insert carries a unique constraint that
    /// rejects the (vanishingly rare) collision.
    #[must_use]
    pub fn generate() -> Self {
        let millis = now_millis();
        let suffix: u32 = rand::rng().random_range(0..1000);
        Self(format!("ORD{millis}{suffix}"))
    }
}

impl InboundCode {
    /// Generate a fresh inbound (stock entry) code: `"I"` + millisecond
    /// timestamp.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("I{}", now_millis()))
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_code_shape() {
        let code = OrderCode::generate();
        let s = code.as_str();
        assert!(s.starts_with("ORD"));
        // 13-digit millis plus 1..3 random digits
        let digits = &s[3..];
        assert!(digits.len() >= 14 && digits.len() <= 16, "got {s}");
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn inbound_code_shape() {
        let code = InboundCode::generate();
        assert!(code.as_str().starts_with('I'));
        assert!(code.as_str()[1..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn codes_are_distinct_types() {
        let product = ProductCode::new("P1001");
        assert_eq!(product.as_str(), "P1001");
        assert_eq!(product.to_string(), "P1001");
        assert_eq!(ProductCode::from("P1001"), product);
    }
}
