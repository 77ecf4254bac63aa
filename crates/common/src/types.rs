use serde::{Deserialize, Serialize};

macro_rules! store_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw identifier assigned by the backing store.
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw identifier.
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

store_id!(
    /// Identifier of a catalog product.
    ProductId
);

store_id!(
    /// Identifier of a product category.
    CategoryId
);

store_id!(
    /// Identifier of a persisted sale transaction.
    TransactionId
);

store_id!(
    /// Identifier of a single line of a persisted sale.
    TransactionDetailId
);
