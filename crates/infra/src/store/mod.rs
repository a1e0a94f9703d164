//! Store layer: the `RetailStore` contract and its implementations.

pub mod batch;
pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use batch::{Write, WriteBatch, Written};
pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use r#trait::{RetailStore, StoreError, StoreResult};
