use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderdesk_core::{Actor, DomainError, DomainResult, MovementId, ProductId, UserId, checked_amount};

/// Kind of stock movement. The kind decides the sign applied to the stored quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Entry,
    Exit,
    Adjustment,
}

impl MovementKind {
    pub const ALL: [MovementKind; 3] = [MovementKind::Entry, MovementKind::Exit, MovementKind::Adjustment];

    /// Entry and Adjustment add, Exit subtracts.
    pub fn sign(self) -> Decimal {
        match self {
            MovementKind::Entry | MovementKind::Adjustment => Decimal::ONE,
            MovementKind::Exit => Decimal::NEGATIVE_ONE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MovementKind::Entry => "entry",
            MovementKind::Exit => "exit",
            MovementKind::Adjustment => "adjustment",
        }
    }
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entry" => Ok(MovementKind::Entry),
            "exit" => Ok(MovementKind::Exit),
            "adjustment" => Ok(MovementKind::Adjustment),
            other => Err(DomainError::invalid_argument(format!(
                "unknown movement kind '{other}' (expected entry, exit or adjustment)"
            ))),
        }
    }
}

/// Validated request to append a movement to a product's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub product_id: ProductId,
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub reason: String,
    pub actor: Actor,
}

impl NewMovement {
    /// Rejects a zero quantity and one the ledger cannot store exactly. The
    /// resulting stock may go negative.
    pub fn new(
        product_id: ProductId,
        kind: MovementKind,
        quantity: Decimal,
        reason: impl Into<String>,
        actor: Actor,
    ) -> DomainResult<Self> {
        if quantity.is_zero() {
            return Err(DomainError::invalid_argument("quantity cannot be zero"));
        }
        let quantity = checked_amount("quantity", quantity)?;
        Ok(Self {
            product_id,
            kind,
            quantity,
            reason: reason.into(),
            actor,
        })
    }
}

/// Immutable ledger fact. Never updated or deleted once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub reason: String,
    pub at: DateTime<Utc>,
    pub user_id: Option<UserId>,
    pub user_display: String,
}

impl StockMovement {
    pub fn record(id: MovementId, movement: NewMovement, at: DateTime<Utc>) -> Self {
        Self {
            id,
            product_id: movement.product_id,
            kind: movement.kind,
            quantity: movement.quantity,
            reason: movement.reason,
            at,
            user_id: movement.actor.user_id,
            user_display: movement.actor.display,
        }
    }

    /// Contribution of this movement to the product's stock.
    pub fn signed_quantity(&self) -> Decimal {
        self.kind.sign() * self.quantity
    }
}
