//! Relational store boundary.
//!
//! Four narrow traits cover the tables the services touch. `InMemoryStore`
//! (tests/dev) and `PostgresStore` (production) implement all of them with the
//! same constraint semantics: unique SKU and tracking code, restrict deletes of
//! referenced products, cascade order children.

pub mod in_memory;
pub mod postgres;
pub mod query;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::{
    DEFAULT_ACTION_LIMIT, DEFAULT_MOVEMENT_LIMIT, DEFAULT_ORDER_LIMIT, MAX_LIMIT, OrderQuery,
    OrderSummary, ProductQuery, clamp_limit,
};
pub use r#trait::{AuditStore, CatalogStore, LedgerStore, OrderStore, StoreError, StoreResult};
