//! `orderdesk-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the caller-supplied [`Actor`], the shared [`DomainError`] and
//! the bounds every stored quantity or price must respect.

pub mod actor;
pub mod amount;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use actor::Actor;
pub use amount::{AMOUNT_INTEGER_DIGITS, AMOUNT_SCALE, checked_amount};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ActionLogId, MovementId, OrderId, ProductId, UserId};
pub use value_object::ValueObject;
