//! Order lifecycle domain module.
//!
//! This crate contains the order state machine, its history trail and the
//! per-state side effects, implemented purely as deterministic domain logic (no
//! IO, no storage). Executing effects against the ledger is the infra layer's
//! job.

pub mod effects;
pub mod order;
pub mod status;
pub mod tracking;

pub use effects::{StatusEffect, effects_on_enter};
pub use order::{
    CustomerInfo, NewOrder, Order, OrderItem, OrderLineRequest, StatusChange, StatusHistoryEntry,
    snapshot_items, ORDER_CREATED_COMMENT,
};
pub use status::{OrderStatus, TransitionPolicy, TransitionTable};
pub use tracking::{SuffixSource, TrackingCode};
