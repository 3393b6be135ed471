//! Product catalog domain module.
//!
//! This crate contains business rules for catalog entries, implemented purely as
//! deterministic domain logic (no IO, no storage). Stock figures live on the
//! product but are owned by the inventory ledger.

pub mod product;

pub use product::{DEFAULT_UNIT, Product, ProductDraft};
