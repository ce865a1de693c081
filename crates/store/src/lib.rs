//! Persistence boundary for the loyalty redemption platform.
//!
//! Four repository traits cover the system's state: `OrderStore`,
//! `InventoryLedger`, `TransactionStore`, and `Catalog`. Two backends
//! implement all of them: `InMemoryStore` for tests and local runs, and
//! `PostgresStore` for production.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use traits::{Catalog, InventoryLedger, OrderStore, TransactionStore};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
