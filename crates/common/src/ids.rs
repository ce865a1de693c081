//! Identifier newtypes.
//!
//! Every entity is referenced by a uuid-backed id rather than an embedded
//! object graph, so cross-crate APIs only ever pass these around.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an id from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for a company (the redeeming customer organization).
    CompanyId
}

uuid_id! {
    /// Unique identifier for an account manager placing orders on behalf of
    /// a company.
    AccountManagerId
}

uuid_id! {
    /// Unique identifier for a redeemable product.
    ProductId
}

uuid_id! {
    /// Unique identifier for a redemption order.
    OrderId
}

uuid_id! {
    /// Unique identifier for a single line item within an order.
    OrderItemId
}

uuid_id! {
    /// Unique identifier for a loyalty points transaction.
    TransactionId
}
