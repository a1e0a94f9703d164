//! `retail-core` — schema building blocks shared by the catalog and order crates.
//!
//! This crate contains **pure domain** primitives (no storage concerns): typed
//! identifiers, field validation, list ordering and the catalogue of named
//! constraints every store must enforce.

pub mod constraint;
pub mod entity;
pub mod error;
pub mod id;
pub mod ordering;
pub mod validation;

pub use constraint::{Constraint, ConstraintKind};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{
    CategoryId, OrderId, OrderItemId, ParameterId, ProductId, ProductInfoId, ProductParameterId,
    ShopId, UserId,
};
pub use ordering::{Direction, ListOrder, SortKey};
