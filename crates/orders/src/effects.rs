//! Side effects attached to entering a status.
//!
//! The transition itself never performs IO; it returns the effect list for the
//! state it entered and the caller executes it. New terminal-state effects are
//! added here without touching [`Order::transition`](crate::Order::transition).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderdesk_core::ProductId;

use crate::order::Order;
use crate::status::OrderStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum StatusEffect {
    /// Post an inventory exit for one order item.
    PostExit {
        product_id: ProductId,
        quantity: Decimal,
        reason: String,
    },
}

/// Effects to run after `order` has entered `status`.
pub fn effects_on_enter(status: OrderStatus, order: &Order) -> Vec<StatusEffect> {
    match status {
        OrderStatus::Delivered => {
            let reason = format!("Exit for order {}", order.tracking_code());
            order
                .items()
                .iter()
                .map(|item| StatusEffect::PostExit {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    reason: reason.clone(),
                })
                .collect()
        }
        OrderStatus::Received
        | OrderStatus::InPreparation
        | OrderStatus::InTransit
        | OrderStatus::Cancelled => Vec::new(),
    }
}
