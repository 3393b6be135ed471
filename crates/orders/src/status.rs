//! Order status and the transition table that governs status changes.

use core::str::FromStr;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use orderdesk_core::{DomainError, DomainResult};

/// Order status lifecycle.
///
/// `Received → InPreparation → InTransit → Delivered`, with `Cancelled`
/// reachable from any non-terminal state. Whether other moves are accepted is
/// decided by the configured [`TransitionTable`], not by this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Received,
    InPreparation,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Received,
        OrderStatus::InPreparation,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Received => "received",
            OrderStatus::InPreparation => "in_preparation",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// The next step on the happy path, if any.
    pub fn forward(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Received => Some(OrderStatus::InPreparation),
            OrderStatus::InPreparation => Some(OrderStatus::InTransit),
            OrderStatus::InTransit => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| DomainError::invalid_argument(format!("unknown order status '{s}'")))
    }
}

/// Named transition policies selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionPolicy {
    /// Any status may be set to any other status (including itself).
    #[default]
    Permissive,
    /// One step forward on the happy path, or cancel from a non-terminal state.
    ForwardOnly,
}

impl TransitionPolicy {
    pub fn table(self) -> TransitionTable {
        match self {
            TransitionPolicy::Permissive => TransitionTable::permissive(),
            TransitionPolicy::ForwardOnly => TransitionTable::forward_only(),
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "forward-only" | "forward_only" => Ok(TransitionPolicy::ForwardOnly),
            other => Err(DomainError::invalid_argument(format!(
                "unknown transition policy '{other}' (expected permissive or forward-only)"
            ))),
        }
    }
}

/// Explicit table of allowed status changes.
///
/// Every accepted `from -> to` pair is listed; anything else is rejected with
/// [`DomainError::InvalidTransition`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransitionTable {
    allowed: HashMap<OrderStatus, Vec<OrderStatus>>,
}

impl TransitionTable {
    /// A table that allows nothing. Build up with [`TransitionTable::allow`].
    pub fn empty() -> Self {
        Self::default()
    }

    /// Any-to-any, including re-entering the current status.
    pub fn permissive() -> Self {
        let mut table = Self::empty();
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                table = table.allow(from, to);
            }
        }
        table
    }

    pub fn forward_only() -> Self {
        let mut table = Self::empty();
        for from in OrderStatus::ALL {
            if let Some(next) = from.forward() {
                table = table.allow(from, next);
            }
            if !from.is_terminal() {
                table = table.allow(from, OrderStatus::Cancelled);
            }
        }
        table
    }

    pub fn allow(mut self, from: OrderStatus, to: OrderStatus) -> Self {
        let next = self.allowed.entry(from).or_default();
        if !next.contains(&to) {
            next.push(to);
            next.sort();
        }
        self
    }

    pub fn valid_next_states(&self, from: OrderStatus) -> &[OrderStatus] {
        self.allowed.get(&from).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        self.valid_next_states(from).contains(&to)
    }

    pub fn check(&self, from: OrderStatus, to: OrderStatus) -> DomainResult<()> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(DomainError::invalid_transition(from, to))
        }
    }
}
