use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderdesk_core::{Actor, DomainError, DomainResult, Entity, OrderId, ProductId, UserId, ValueObject, checked_amount};
use orderdesk_products::Product;

use crate::effects::{StatusEffect, effects_on_enter};
use crate::status::{OrderStatus, TransitionTable};
use crate::tracking::TrackingCode;

/// Comment written on the history entry that opens every order.
pub const ORDER_CREATED_COMMENT: &str = "Order created";

/// Customer contact details captured at intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
}

impl ValueObject for CustomerInfo {}

impl CustomerInfo {
    pub fn new(name: impl Into<String>, phone: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            address: address.into(),
        }
    }

    /// Trim every field and require all three to be present.
    pub fn normalized(&self) -> DomainResult<CustomerInfo> {
        let required = |value: &str, field: &str| -> DomainResult<String> {
            let value = value.trim();
            if value.is_empty() {
                return Err(DomainError::invalid_argument(format!("customer {field} cannot be empty")));
            }
            Ok(value.to_string())
        };

        Ok(CustomerInfo {
            name: required(&self.name, "name")?,
            phone: required(&self.phone, "phone")?,
            address: required(&self.address, "address")?,
        })
    }
}

/// One line as submitted by the intake form. Blank lines are allowed and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: Option<ProductId>,
    pub quantity: Decimal,
}

impl OrderLineRequest {
    pub fn new(product_id: ProductId, quantity: Decimal) -> Self {
        Self {
            product_id: Some(product_id),
            quantity,
        }
    }

    pub fn blank() -> Self {
        Self {
            product_id: None,
            quantity: Decimal::ZERO,
        }
    }
}

/// Order intake request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer: CustomerInfo,
    pub notes: String,
    pub lines: Vec<OrderLineRequest>,
}

/// Order line with the unit price copied at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: Decimal,
    /// Snapshot of the catalog price when the order was placed.
    pub unit_price: Decimal,
}

impl OrderItem {
    pub fn line_total(&self) -> DomainResult<Decimal> {
        self.quantity
            .checked_mul(self.unit_price)
            .ok_or_else(|| DomainError::invalid_argument(format!("line total for product {} overflows", self.product_id)))
    }
}

/// Sum of line totals, failing rather than panicking on overflow.
fn items_total(items: &[OrderItem]) -> DomainResult<Decimal> {
    items.iter().try_fold(Decimal::ZERO, |acc, item| {
        acc.checked_add(item.line_total()?)
            .ok_or_else(|| DomainError::invalid_argument("order total overflows"))
    })
}

/// Append-only audit entry; one per status change, including creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub comment: String,
    pub at: DateTime<Utc>,
    pub user_id: Option<UserId>,
    pub user_display: String,
}

impl StatusHistoryEntry {
    pub fn new(status: OrderStatus, comment: impl Into<String>, actor: &Actor, at: DateTime<Utc>) -> Self {
        Self {
            status,
            comment: comment.into(),
            at,
            user_id: actor.user_id,
            user_display: actor.display.clone(),
        }
    }
}

/// Drop lines with no product or a non-positive quantity, then copy each
/// remaining line's unit price from the catalog.
///
/// Fails with `InvalidArgument` when nothing is left or a kept quantity cannot
/// be stored, and with `NotFound` when a line names a product missing from
/// `catalog`.
pub fn snapshot_items(lines: &[OrderLineRequest], catalog: &[Product]) -> DomainResult<Vec<OrderItem>> {
    let prices: HashMap<ProductId, Decimal> = catalog
        .iter()
        .map(|p| (p.id_typed(), p.unit_price()))
        .collect();

    let items = lines
        .iter()
        .filter(|l| l.quantity > Decimal::ZERO)
        .filter_map(|l| l.product_id.map(|product_id| (product_id, l.quantity)))
        .map(|(product_id, quantity)| {
            let quantity = checked_amount("quantity", quantity)?;
            let unit_price = prices
                .get(&product_id)
                .copied()
                .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))?;
            Ok(OrderItem {
                product_id,
                quantity,
                unit_price,
            })
        })
        .collect::<DomainResult<Vec<_>>>()?;

    if items.is_empty() {
        return Err(DomainError::invalid_argument("add at least one product to the order"));
    }
    Ok(items)
}

/// Result of a status change: the history entry written and the effects to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub entry: StatusHistoryEntry,
    pub effects: Vec<StatusEffect>,
}

/// Order with its items and status history.
///
/// Invariant: `status` always equals the status of the last history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    tracking_code: TrackingCode,
    customer: CustomerInfo,
    notes: String,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    items: Vec<OrderItem>,
    history: Vec<StatusHistoryEntry>,
}

impl Order {
    /// Open a new order in `Received` with its first history entry.
    pub fn place(
        id: OrderId,
        tracking_code: TrackingCode,
        customer: &CustomerInfo,
        notes: &str,
        items: Vec<OrderItem>,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let customer = customer.normalized()?;
        if items.is_empty() {
            return Err(DomainError::invalid_argument("add at least one product to the order"));
        }
        if items.iter().any(|i| i.quantity <= Decimal::ZERO) {
            return Err(DomainError::invalid_argument("item quantity must be positive"));
        }
        for item in &items {
            checked_amount("quantity", item.quantity)?;
            checked_amount("unit_price", item.unit_price)?;
        }
        checked_amount("order total", items_total(&items)?)?;

        Ok(Self {
            id,
            tracking_code,
            customer,
            notes: notes.trim().to_string(),
            status: OrderStatus::Received,
            created_at: at,
            updated_at: None,
            items,
            history: vec![StatusHistoryEntry::new(
                OrderStatus::Received,
                ORDER_CREATED_COMMENT,
                actor,
                at,
            )],
        })
    }

    /// Rehydrate a persisted order. Stores use this; domain code should not.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: OrderId,
        tracking_code: TrackingCode,
        customer: CustomerInfo,
        notes: String,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        updated_at: Option<DateTime<Utc>>,
        items: Vec<OrderItem>,
        history: Vec<StatusHistoryEntry>,
    ) -> Self {
        Self {
            id,
            tracking_code,
            customer,
            notes,
            status,
            created_at,
            updated_at,
            items,
            history,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn tracking_code(&self) -> &TrackingCode {
        &self.tracking_code
    }

    pub fn customer(&self) -> &CustomerInfo {
        &self.customer
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// History in the order it was written (oldest first).
    pub fn history(&self) -> &[StatusHistoryEntry] {
        &self.history
    }

    /// History newest first; entries sharing a timestamp keep reverse write order.
    pub fn history_newest_first(&self) -> Vec<&StatusHistoryEntry> {
        let mut entries: Vec<_> = self.history.iter().rev().collect();
        entries.sort_by(|a, b| b.at.cmp(&a.at));
        entries
    }

    pub fn total(&self) -> DomainResult<Decimal> {
        items_total(&self.items)
    }

    /// Move to `to` if `table` allows it, appending exactly one history entry.
    ///
    /// Returns the effects attached to entering `to`; the caller runs them after
    /// the status change is persisted.
    pub fn transition(
        &mut self,
        to: OrderStatus,
        comment: &str,
        actor: &Actor,
        at: DateTime<Utc>,
        table: &TransitionTable,
    ) -> DomainResult<StatusChange> {
        let from = self.status;
        table.check(from, to)?;

        let entry = StatusHistoryEntry::new(to, comment.trim(), actor, at);
        self.status = to;
        self.updated_at = Some(at);
        self.history.push(entry.clone());

        Ok(StatusChange {
            from,
            to,
            entry,
            effects: effects_on_enter(to, self),
        })
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use orderdesk_products::ProductDraft;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn tracking() -> TrackingCode {
        TrackingCode::compose("ORD", NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(), 1234).unwrap()
    }

    fn product(sku: &str, cents: i64) -> Product {
        Product::create(ProductId::new(), &ProductDraft::new(sku, sku, Decimal::new(cents, 2)), test_time()).unwrap()
    }

    fn customer() -> CustomerInfo {
        CustomerInfo::new(" Ana ", "555-0101", "12 Market St")
    }

    fn placed(items: Vec<OrderItem>) -> Order {
        Order::place(OrderId::new(), tracking(), &customer(), "", items, &Actor::system(), test_time()).unwrap()
    }

    #[test]
    fn snapshot_drops_blank_and_non_positive_lines() {
        let p = product("P", 150);
        let p2 = product("P2", 300);
        let lines = vec![
            OrderLineRequest::new(p.id_typed(), Decimal::new(2, 0)),
            OrderLineRequest::new(p2.id_typed(), Decimal::ZERO),
            OrderLineRequest::blank(),
            OrderLineRequest::new(p2.id_typed(), Decimal::new(-1, 0)),
        ];

        let items = snapshot_items(&lines, &[p.clone(), p2]).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, p.id_typed());
        assert_eq!(items[0].unit_price, Decimal::new(150, 2));
    }

    #[test]
    fn snapshot_of_only_blank_lines_is_invalid() {
        let err = snapshot_items(&[OrderLineRequest::blank(), OrderLineRequest::blank()], &[]).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn snapshot_of_unknown_product_is_not_found() {
        let err = snapshot_items(&[OrderLineRequest::new(ProductId::new(), Decimal::ONE)], &[]).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn snapshot_price_is_a_copy() {
        let mut p = product("P", 100);
        let items = snapshot_items(&[OrderLineRequest::new(p.id_typed(), Decimal::ONE)], &[p.clone()]).unwrap();

        p.apply_edit(&ProductDraft::new("P", "P", Decimal::new(999, 2))).unwrap();
        assert_eq!(items[0].unit_price, Decimal::new(100, 2));
    }

    #[test]
    fn place_opens_in_received_with_one_history_entry() {
        let p = product("P", 100);
        let order = placed(vec![OrderItem {
            product_id: p.id_typed(),
            quantity: Decimal::new(2, 0),
            unit_price: Decimal::new(100, 2),
        }]);

        assert_eq!(order.status(), OrderStatus::Received);
        assert_eq!(order.customer().name, "Ana");
        assert_eq!(order.history().len(), 1);
        assert_eq!(order.history()[0].comment, ORDER_CREATED_COMMENT);
        assert_eq!(order.updated_at(), None);
        assert_eq!(order.total().unwrap(), Decimal::new(200, 2));
    }

    #[test]
    fn snapshot_rejects_unstorable_quantity() {
        let p = product("P", 100);
        let err = snapshot_items(&[OrderLineRequest::new(p.id_typed(), Decimal::new(1, 5))], &[p]).unwrap_err();
        assert_eq!(err, DomainError::invalid_argument("quantity allows at most 4 decimal places"));
    }

    #[test]
    fn place_rejects_totals_past_the_storable_range() {
        let line = OrderItem {
            product_id: ProductId::new(),
            quantity: Decimal::from(10_000_000i64),
            unit_price: Decimal::from(99_999_999_999i64),
        };
        let err = Order::place(OrderId::new(), tracking(), &customer(), "", vec![line], &Actor::system(), test_time())
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn overflowing_total_is_an_error() {
        let huge = OrderItem {
            product_id: ProductId::new(),
            quantity: Decimal::MAX,
            unit_price: Decimal::TWO,
        };
        assert!(huge.line_total().unwrap_err().is_invalid_argument());

        let order = Order::restore(
            OrderId::new(),
            tracking(),
            customer(),
            String::new(),
            OrderStatus::Received,
            test_time(),
            None,
            vec![huge],
            Vec::new(),
        );
        assert!(order.total().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn newest_first_breaks_timestamp_ties_by_write_order() {
        let mut order = placed(vec![OrderItem {
            product_id: ProductId::new(),
            quantity: Decimal::ONE,
            unit_price: Decimal::ONE,
        }]);
        let at = order.created_at();
        order
            .transition(OrderStatus::Delivered, "", &Actor::system(), at, &TransitionTable::permissive())
            .unwrap();

        let newest_first = order.history_newest_first();
        assert_eq!(newest_first[0].status, OrderStatus::Delivered);
        assert_eq!(newest_first[0].status, order.status());
        assert_eq!(newest_first[1].status, OrderStatus::Received);
    }

    #[test]
    fn place_requires_customer_fields() {
        let err = Order::place(
            OrderId::new(),
            tracking(),
            &CustomerInfo::new("Ana", " ", "addr"),
            "",
            vec![OrderItem {
                product_id: ProductId::new(),
                quantity: Decimal::ONE,
                unit_price: Decimal::ONE,
            }],
            &Actor::system(),
            test_time(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::invalid_argument("customer phone cannot be empty"));
    }

    #[test]
    fn each_transition_appends_exactly_one_entry() {
        let mut order = placed(vec![OrderItem {
            product_id: ProductId::new(),
            quantity: Decimal::ONE,
            unit_price: Decimal::ONE,
        }]);
        let table = TransitionTable::permissive();
        let start = test_time();

        for (i, to) in [OrderStatus::InPreparation, OrderStatus::InTransit, OrderStatus::InPreparation]
            .into_iter()
            .enumerate()
        {
            order
                .transition(to, "", &Actor::system(), start + Duration::seconds(i as i64 + 1), &table)
                .unwrap();
        }

        assert_eq!(order.history().len(), 4);
        assert_eq!(order.status(), order.history().last().unwrap().status);
        assert_eq!(order.history_newest_first()[0].status, OrderStatus::InPreparation);
    }

    #[test]
    fn rejected_transition_changes_nothing() {
        let mut order = placed(vec![OrderItem {
            product_id: ProductId::new(),
            quantity: Decimal::ONE,
            unit_price: Decimal::ONE,
        }]);
        let before = order.clone();

        let err = order
            .transition(OrderStatus::Delivered, "", &Actor::system(), test_time(), &TransitionTable::forward_only())
            .unwrap_err();

        assert_eq!(err, DomainError::invalid_transition("received", "delivered"));
        assert_eq!(order, before);
    }

    #[test]
    fn delivering_yields_one_exit_effect_per_item() {
        let a = ProductId::new();
        let b = ProductId::new();
        let mut order = placed(vec![
            OrderItem {
                product_id: a,
                quantity: Decimal::new(3, 0),
                unit_price: Decimal::ONE,
            },
            OrderItem {
                product_id: b,
                quantity: Decimal::new(1, 0),
                unit_price: Decimal::ONE,
            },
        ]);

        let change = order
            .transition(OrderStatus::Delivered, "handed over", &Actor::system(), test_time(), &TransitionTable::permissive())
            .unwrap();

        assert_eq!(change.from, OrderStatus::Received);
        assert_eq!(change.entry.comment, "handed over");
        assert_eq!(
            change.effects,
            vec![
                StatusEffect::PostExit {
                    product_id: a,
                    quantity: Decimal::new(3, 0),
                    reason: "Exit for order ORD-20260102-1234".to_string(),
                },
                StatusEffect::PostExit {
                    product_id: b,
                    quantity: Decimal::new(1, 0),
                    reason: "Exit for order ORD-20260102-1234".to_string(),
                },
            ]
        );
    }
}
