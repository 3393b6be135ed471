//! Read-side filters and row shapes shared by every store backend.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderdesk_core::{DomainError, OrderId};
use orderdesk_orders::{CustomerInfo, Order, OrderStatus, TrackingCode};
use orderdesk_products::Product;

/// Default page for order listings.
pub const DEFAULT_ORDER_LIMIT: u32 = 300;

/// Default page for movement listings.
pub const DEFAULT_MOVEMENT_LIMIT: u32 = 200;

/// Default page for the action log.
pub const DEFAULT_ACTION_LIMIT: u32 = 200;

/// Hard cap applied to every caller-supplied limit.
pub const MAX_LIMIT: u32 = 1000;

/// Resolve a caller-supplied page size.
pub fn clamp_limit(limit: Option<u32>, default: u32) -> u32 {
    limit.unwrap_or(default).clamp(1, MAX_LIMIT)
}

/// Product search filter. Results are sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    /// Case-insensitive substring of name or SKU.
    pub text: Option<String>,
    pub active_only: bool,
}

impl ProductQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn active() -> Self {
        Self {
            text: None,
            active_only: true,
        }
    }

    pub fn text(query: &str) -> Self {
        let query = query.trim();
        Self {
            text: (!query.is_empty()).then(|| query.to_string()),
            active_only: false,
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        if self.active_only && !product.is_active() {
            return false;
        }
        match &self.text {
            Some(text) => product.matches(text),
            None => true,
        }
    }
}

/// Order listing filter. Results are newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuery {
    /// Case-insensitive substring of tracking code, customer name or phone.
    pub text: Option<String>,
    pub status: Option<OrderStatus>,
    pub limit: u32,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            text: None,
            status: None,
            limit: DEFAULT_ORDER_LIMIT,
        }
    }
}

impl OrderQuery {
    pub fn new(text: Option<&str>, status: Option<OrderStatus>, limit: Option<u32>) -> Self {
        Self {
            text: text
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            status,
            limit: clamp_limit(limit, DEFAULT_ORDER_LIMIT),
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        if self.status.is_some_and(|s| s != order.status()) {
            return false;
        }
        let Some(text) = &self.text else {
            return true;
        };
        let needle = text.to_lowercase();
        [
            order.tracking_code().as_str(),
            order.customer().name.as_str(),
            order.customer().phone.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// One row of an order listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub tracking_code: TrackingCode,
    pub customer: CustomerInfo,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub item_count: u32,
    pub total: Decimal,
}

impl TryFrom<&Order> for OrderSummary {
    type Error = DomainError;

    fn try_from(order: &Order) -> Result<Self, Self::Error> {
        Ok(Self {
            id: order.id_typed(),
            tracking_code: order.tracking_code().clone(),
            customer: order.customer().clone(),
            status: order.status(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
            item_count: order.items().len() as u32,
            total: order.total()?,
        })
    }
}
