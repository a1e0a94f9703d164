//! Order records: a user's basket/order and its line items.
//!
//! The status lifecycle is modelled as a closed enum. Stores accept any listed
//! status on write; the transition helpers on [`OrderStatus`] are for the service
//! layer that decides which moves it allows.

pub mod item;
pub mod order;

pub use item::{NewOrderItem, OrderItem, OrderItemPatch, OrderItemSort};
pub use order::{NewOrder, Order, OrderPatch, OrderSort, OrderStatus};
