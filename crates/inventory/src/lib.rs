//! Inventory ledger domain module.
//!
//! Stock is never a mutable counter: it is a projection folded over an
//! append-only list of [`StockMovement`]s. This crate holds the movement types
//! and the pure fold (no IO, no storage).

pub mod movement;
pub mod projection;

pub use movement::{MovementKind, NewMovement, StockMovement};
pub use projection::fold_stock;
