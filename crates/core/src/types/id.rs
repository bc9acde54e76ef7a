//! Newtype IDs for marketplace entities.
//!
//! Every table uses a `SERIAL` primary key; wrapping it per entity keeps a
//! `FoodId` from being passed where a `MenuItemId` is expected.

/// Define a type-safe `i32` ID wrapper.
///
/// The generated type is `Copy`, orderable, serializes as a bare number, parses
/// from a string (for query parameters), and with the `postgres` feature can be
/// bound to and decoded from `INTEGER` columns.
///
/// ```rust
/// # use foodloc_core::define_id;
/// define_id!(DishId);
/// define_id!(KitchenId);
///
/// let dish = DishId::new(7);
/// assert_eq!(dish.as_i32(), 7);
/// assert_eq!("7".parse::<DishId>().ok(), Some(dish));
/// // let _: KitchenId = dish; // does not compile
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw database id.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Raw database id.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::postgres::PgHasArrayType for $name {
            fn array_type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::postgres::PgHasArrayType>::array_type_info()
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(UserId);
define_id!(MenuItemId);
define_id!(FoodId);
define_id!(TagId);
define_id!(PaymentMethodId);
define_id!(OrderId);
define_id!(OrderDetailId);
define_id!(CommentId);
define_id!(SubscriptionId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_bare_number() {
        let json = serde_json::to_string(&FoodId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: FoodId = serde_json::from_str("42").unwrap();
        assert_eq!(back, FoodId::new(42));
    }

    #[test]
    fn test_parse_from_query_string() {
        assert_eq!(" 12 ".parse::<UserId>().unwrap(), UserId::new(12));
        assert!("abc".parse::<UserId>().is_err());
    }

    #[test]
    fn test_ordering_follows_raw_id() {
        let mut ids = vec![OrderId::new(3), OrderId::new(1), OrderId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![OrderId::new(1), OrderId::new(2), OrderId::new(3)]);
    }
}
