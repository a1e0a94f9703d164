//! Strongly-typed identifiers for every table in the schema.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $t:ident, $name:literal) => {
        $(#[$doc])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered), so ascending id order follows creation order.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_id!(
    /// Identifier of a shop.
    ShopId,
    "ShopId"
);
uuid_id!(
    /// Identifier of a product category.
    CategoryId,
    "CategoryId"
);
uuid_id!(
    /// Identifier of an abstract catalog product.
    ProductId,
    "ProductId"
);
uuid_id!(
    /// Identifier of a shop's listing of a product.
    ProductInfoId,
    "ProductInfoId"
);
uuid_id!(
    /// Identifier of an attribute key.
    ParameterId,
    "ParameterId"
);
uuid_id!(
    /// Identifier of an attribute value attached to a listing.
    ProductParameterId,
    "ProductParameterId"
);
uuid_id!(
    /// Identifier of an order.
    OrderId,
    "OrderId"
);
uuid_id!(
    /// Identifier of an order line item.
    OrderItemId,
    "OrderItemId"
);
uuid_id!(
    /// Identifier of the (external) user owning orders.
    UserId,
    "UserId"
);
