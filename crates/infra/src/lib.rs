//! Infrastructure layer: stores, migrations, configuration.
//!
//! [`store::RetailStore`] is the persistence contract consumed by the service
//! layer. [`store::InMemoryStore`] enforces every constraint itself (tests/dev);
//! [`store::PostgresStore`] relies on the constraints installed by
//! [`migrations`].

pub mod config;
pub mod migrations;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use config::{ConfigError, SchemaConfig, StoreConfig};
pub use store::{
    InMemoryStore, PostgresStore, RetailStore, StoreError, StoreResult, Write, WriteBatch,
    Written,
};
