//! Order lifecycle service: intake, status changes with their effects, deletion.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use orderdesk_core::{Actor, DomainError, DomainResult, OrderId};
use orderdesk_inventory::MovementKind;
use orderdesk_orders::{
    NewOrder, Order, OrderStatus, StatusChange, StatusEffect, SuffixSource, TrackingCode,
    TransitionTable, snapshot_items,
};

use crate::error::{ServiceError, ServiceResult};
use crate::ledger::{AddMovement, InventoryLedger, MovementPosted};
use crate::store::{CatalogStore, LedgerStore, OrderQuery, OrderStore, OrderSummary, StoreError};

/// Default tracking code prefix.
pub const DEFAULT_TRACKING_PREFIX: &str = "ORD";

/// Default number of candidate codes tried per order.
pub const DEFAULT_TRACKING_ATTEMPTS: u32 = 20;

/// `rand`-backed suffix source.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSuffix;

impl SuffixSource for RandomSuffix {
    fn next_suffix(&self) -> u16 {
        rand::rng().random_range(TrackingCode::SUFFIX_RANGE)
    }
}

/// Candidate tracking code generator with a bounded attempt budget.
#[derive(Clone)]
pub struct TrackingCodes {
    prefix: String,
    max_attempts: u32,
    suffixes: Arc<dyn SuffixSource>,
}

impl core::fmt::Debug for TrackingCodes {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TrackingCodes")
            .field("prefix", &self.prefix)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl Default for TrackingCodes {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_TRACKING_PREFIX.to_string(),
            max_attempts: DEFAULT_TRACKING_ATTEMPTS,
            suffixes: Arc::new(RandomSuffix),
        }
    }
}

impl TrackingCodes {
    pub fn new(prefix: impl Into<String>, max_attempts: u32) -> DomainResult<Self> {
        let prefix = prefix.into();
        TrackingCode::check_prefix(&prefix)?;
        if max_attempts == 0 {
            return Err(DomainError::invalid_argument("tracking code attempts must be at least 1"));
        }
        Ok(Self {
            prefix,
            max_attempts,
            suffixes: Arc::new(RandomSuffix),
        })
    }

    pub fn with_source(mut self, suffixes: Arc<dyn SuffixSource>) -> Self {
        self.suffixes = suffixes;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn candidate(&self, date: NaiveDate) -> DomainResult<TrackingCode> {
        TrackingCode::compose(&self.prefix, date, self.suffixes.next_suffix())
    }
}

/// Command: place an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub order: NewOrder,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

/// Command: move an order to another status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatus {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub comment: String,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

/// Outcome of a status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdated {
    pub order: Order,
    pub change: StatusChange,
    /// Ledger movements posted by the entered state's effects.
    pub movements: Vec<MovementPosted>,
}

/// Order lifecycle over a store.
#[derive(Debug, Clone)]
pub struct OrderLifecycle<S> {
    store: S,
    ledger: InventoryLedger<S>,
    table: TransitionTable,
    tracking: TrackingCodes,
}

impl<S> OrderLifecycle<S>
where
    S: CatalogStore + LedgerStore + OrderStore + Clone,
{
    pub fn new(store: S, table: TransitionTable, tracking: TrackingCodes) -> Self {
        Self {
            ledger: InventoryLedger::new(store.clone()),
            store,
            table,
            tracking,
        }
    }

    pub fn transition_table(&self) -> &TransitionTable {
        &self.table
    }

    /// Validate lines and customer, allocate a tracking code, snapshot prices
    /// and store the order with its first history entry.
    ///
    /// A candidate code is skipped when it already exists or when the insert
    /// hits the unique constraint; both spend one attempt from the budget.
    #[instrument(skip(self, cmd), err)]
    pub async fn create_order(&self, cmd: CreateOrder) -> ServiceResult<Order> {
        let customer = cmd.order.customer.normalized()?;

        let mut product_ids: Vec<_> = cmd
            .order
            .lines
            .iter()
            .filter(|l| l.quantity > rust_decimal::Decimal::ZERO)
            .filter_map(|l| l.product_id)
            .collect();
        product_ids.sort();
        product_ids.dedup();

        let products = self.store.products_by_ids(&product_ids).await?;
        let items = snapshot_items(&cmd.order.lines, &products)?;
        let date = cmd.occurred_at.date_naive();

        for attempt in 1..=self.tracking.max_attempts() {
            let code = self.tracking.candidate(date)?;
            if self.store.tracking_code_exists(&code).await? {
                tracing::warn!(tracking_code = %code, attempt, "tracking code taken, retrying");
                continue;
            }

            let order = Order::place(
                OrderId::new(),
                code,
                &customer,
                &cmd.order.notes,
                items.clone(),
                &cmd.actor,
                cmd.occurred_at,
            )?;

            match self.store.insert_order(&order).await {
                Ok(()) => {
                    tracing::info!(
                        order_id = %order.id_typed(),
                        tracking_code = %order.tracking_code(),
                        items = order.items().len(),
                        "order created"
                    );
                    return Ok(order);
                }
                Err(StoreError::UniqueViolation(msg)) => {
                    tracing::warn!(tracking_code = %order.tracking_code(), attempt, %msg, "tracking code collided on insert, retrying");
                }
                Err(StoreError::ForeignKeyViolation(_)) => {
                    return Err(DomainError::not_found("product referenced by the order").into());
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::conflict(format!(
            "no free tracking code after {} attempts",
            self.tracking.max_attempts()
        ))
        .into())
    }

    /// Apply a status change, persist it with its history entry, then run the
    /// entered state's effects.
    ///
    /// If an effect fails, the status change stays committed and the error is
    /// returned.
    #[instrument(skip(self, cmd), fields(order_id = %cmd.order_id, to = %cmd.status), err)]
    pub async fn update_status(&self, cmd: UpdateStatus) -> ServiceResult<StatusUpdated> {
        let mut order = self.get_order(cmd.order_id).await?;
        let change = order.transition(cmd.status, &cmd.comment, &cmd.actor, cmd.occurred_at, &self.table)?;

        self.store
            .record_status_change(order.id_typed(), change.to, cmd.occurred_at, &change.entry)
            .await?;
        tracing::info!(from = %change.from, to = %change.to, "order status changed");

        let mut movements = Vec::with_capacity(change.effects.len());
        for effect in &change.effects {
            movements.push(self.run_effect(effect, &cmd).await?);
        }

        Ok(StatusUpdated {
            order,
            change,
            movements,
        })
    }

    async fn run_effect(&self, effect: &StatusEffect, cmd: &UpdateStatus) -> ServiceResult<MovementPosted> {
        match effect {
            StatusEffect::PostExit {
                product_id,
                quantity,
                reason,
            } => {
                self.ledger
                    .add_movement(AddMovement {
                        product_id: *product_id,
                        kind: MovementKind::Exit,
                        quantity: *quantity,
                        reason: reason.clone(),
                        actor: cmd.actor.clone(),
                        occurred_at: cmd.occurred_at,
                    })
                    .await
            }
        }
    }

    /// Remove the order, its items and history. Ledger movements stay.
    #[instrument(skip(self), fields(order_id = %order_id), err)]
    pub async fn delete_order(&self, order_id: OrderId) -> ServiceResult<Order> {
        let order = self.get_order(order_id).await?;
        self.store.delete_order(order_id).await?;
        tracing::info!(tracking_code = %order.tracking_code(), "order deleted");
        Ok(order)
    }

    pub async fn get_order(&self, order_id: OrderId) -> ServiceResult<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| ServiceError::from(DomainError::not_found(format!("order {order_id}"))))
    }

    /// Newest first.
    pub async fn list_orders(&self, query: &OrderQuery) -> ServiceResult<Vec<OrderSummary>> {
        Ok(self.store.list_orders(query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use chrono::Duration;
    use rust_decimal::Decimal;

    use orderdesk_core::{ProductId, UserId};
    use orderdesk_inventory::StockMovement;
    use orderdesk_orders::{CustomerInfo, OrderLineRequest, ORDER_CREATED_COMMENT, StatusHistoryEntry};
    use orderdesk_products::{Product, ProductDraft};

    use crate::store::{InMemoryStore, ProductQuery, StoreResult};

    /// Hands out a fixed sequence of suffixes, then repeats the last one.
    struct FixedSuffixes(Mutex<VecDeque<u16>>);

    impl FixedSuffixes {
        fn new(values: &[u16]) -> Arc<Self> {
            Arc::new(Self(Mutex::new(values.iter().copied().collect())))
        }
    }

    impl SuffixSource for FixedSuffixes {
        fn next_suffix(&self) -> u16 {
            let mut q = self.0.lock().unwrap();
            if q.len() > 1 { q.pop_front().unwrap() } else { *q.front().unwrap() }
        }
    }

    fn actor() -> Actor {
        Actor::user(UserId::new(), "clerk@shop.test")
    }

    fn today() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-05-04T10:00:00Z").unwrap().with_timezone(&Utc)
    }

    async fn seeded(store: &InMemoryStore, sku: &str, price_cents: i64) -> Product {
        let p = Product::create(
            ProductId::new(),
            &ProductDraft::new(sku, sku, Decimal::new(price_cents, 2)),
            today(),
        )
        .unwrap();
        store.insert_product(&p).await.unwrap();
        p
    }

    fn lifecycle(
        store: Arc<InMemoryStore>,
        table: TransitionTable,
        suffixes: &[u16],
    ) -> OrderLifecycle<Arc<InMemoryStore>> {
        let tracking = TrackingCodes::new("ORD", 3).unwrap().with_source(FixedSuffixes::new(suffixes));
        OrderLifecycle::new(store, table, tracking)
    }

    fn create(lines: Vec<OrderLineRequest>) -> CreateOrder {
        CreateOrder {
            order: NewOrder {
                customer: CustomerInfo::new("Ana Ruiz", "555-0101", "12 Market St"),
                notes: "ring twice".to_string(),
                lines,
            },
            actor: actor(),
            occurred_at: today(),
        }
    }

    fn status(order_id: OrderId, to: OrderStatus, at: DateTime<Utc>) -> UpdateStatus {
        UpdateStatus {
            order_id,
            status: to,
            comment: String::new(),
            actor: actor(),
            occurred_at: at,
        }
    }

    #[tokio::test]
    async fn create_snapshots_prices_and_opens_history() {
        let store = Arc::new(InMemoryStore::new());
        let p = seeded(&store, "CUP", 350).await;
        let lc = lifecycle(store.clone(), TransitionTable::permissive(), &[4321]);

        let order = lc
            .create_order(create(vec![
                OrderLineRequest::new(p.id_typed(), Decimal::new(2, 0)),
                OrderLineRequest::blank(),
            ]))
            .await
            .unwrap();

        assert_eq!(order.tracking_code().as_str(), "ORD-20260504-4321");
        assert_eq!(order.status(), OrderStatus::Received);
        assert_eq!(order.items().len(), 1);
        assert_eq!(order.items()[0].unit_price, Decimal::new(350, 2));
        assert_eq!(order.history().len(), 1);
        assert_eq!(order.history()[0].comment, ORDER_CREATED_COMMENT);

        let stored = lc.get_order(order.id_typed()).await.unwrap();
        assert_eq!(stored, order);
    }

    #[tokio::test]
    async fn create_without_usable_lines_is_invalid_and_writes_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let p = seeded(&store, "CUP", 350).await;
        let lc = lifecycle(store.clone(), TransitionTable::permissive(), &[1000]);

        let err = lc
            .create_order(create(vec![
                OrderLineRequest::new(p.id_typed(), Decimal::ZERO),
                OrderLineRequest::blank(),
            ]))
            .await
            .unwrap_err();

        assert!(err.is_invalid_argument());
        assert!(lc.list_orders(&OrderQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_with_unknown_product_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let lc = lifecycle(store, TransitionTable::permissive(), &[1000]);

        let err = lc
            .create_order(create(vec![OrderLineRequest::new(ProductId::new(), Decimal::ONE)]))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn create_with_blank_customer_field_is_invalid() {
        let store = Arc::new(InMemoryStore::new());
        let p = seeded(&store, "CUP", 350).await;
        let lc = lifecycle(store, TransitionTable::permissive(), &[1000]);

        let mut cmd = create(vec![OrderLineRequest::new(p.id_typed(), Decimal::ONE)]);
        cmd.order.customer.address = "   ".to_string();

        assert!(lc.create_order(cmd).await.unwrap_err().is_invalid_argument());
    }

    #[tokio::test]
    async fn existing_tracking_code_is_skipped() {
        let store = Arc::new(InMemoryStore::new());
        let p = seeded(&store, "CUP", 350).await;
        let lc = lifecycle(store, TransitionTable::permissive(), &[1111, 1111, 2222]);
        let line = || vec![OrderLineRequest::new(p.id_typed(), Decimal::ONE)];

        let first = lc.create_order(create(line())).await.unwrap();
        let second = lc.create_order(create(line())).await.unwrap();

        assert_eq!(first.tracking_code().suffix(), Some(1111));
        assert_eq!(second.tracking_code().suffix(), Some(2222));
    }

    #[tokio::test]
    async fn exhausted_attempts_are_a_conflict() {
        let store = Arc::new(InMemoryStore::new());
        let p = seeded(&store, "CUP", 350).await;
        let lc = lifecycle(store, TransitionTable::permissive(), &[5555]);
        let line = || vec![OrderLineRequest::new(p.id_typed(), Decimal::ONE)];

        lc.create_order(create(line())).await.unwrap();
        let err = lc.create_order(create(line())).await.unwrap_err();
        assert!(err.is_conflict());
    }

    /// Store whose existence check always says "free", so collisions surface
    /// only as unique violations on insert.
    #[derive(Clone)]
    struct BlindStore(Arc<InMemoryStore>);

    #[async_trait::async_trait]
    impl CatalogStore for BlindStore {
        async fn insert_product(&self, product: &Product) -> StoreResult<()> {
            self.0.insert_product(product).await
        }
        async fn update_product(&self, product: &Product) -> StoreResult<()> {
            self.0.update_product(product).await
        }
        async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
            self.0.get_product(id).await
        }
        async fn find_by_sku(&self, sku: &str) -> StoreResult<Option<Product>> {
            self.0.find_by_sku(sku).await
        }
        async fn products_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
            self.0.products_by_ids(ids).await
        }
        async fn list_products(&self, query: &ProductQuery) -> StoreResult<Vec<Product>> {
            self.0.list_products(query).await
        }
        async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
            self.0.delete_product(id).await
        }
    }

    #[async_trait::async_trait]
    impl LedgerStore for BlindStore {
        async fn append_movement(&self, movement: &StockMovement) -> StoreResult<()> {
            self.0.append_movement(movement).await
        }
        async fn movements_for(&self, product_id: ProductId) -> StoreResult<Vec<StockMovement>> {
            self.0.movements_for(product_id).await
        }
        async fn recent_movements(&self, product_id: Option<ProductId>, limit: u32) -> StoreResult<Vec<StockMovement>> {
            self.0.recent_movements(product_id, limit).await
        }
        async fn write_stock(&self, product_id: ProductId, stock: Decimal) -> StoreResult<()> {
            self.0.write_stock(product_id, stock).await
        }
    }

    #[async_trait::async_trait]
    impl OrderStore for BlindStore {
        async fn tracking_code_exists(&self, _code: &TrackingCode) -> StoreResult<bool> {
            Ok(false)
        }
        async fn insert_order(&self, order: &Order) -> StoreResult<()> {
            self.0.insert_order(order).await
        }
        async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
            self.0.get_order(id).await
        }
        async fn record_status_change(
            &self,
            id: OrderId,
            status: OrderStatus,
            updated_at: DateTime<Utc>,
            entry: &StatusHistoryEntry,
        ) -> StoreResult<()> {
            self.0.record_status_change(id, status, updated_at, entry).await
        }
        async fn delete_order(&self, id: OrderId) -> StoreResult<()> {
            self.0.delete_order(id).await
        }
        async fn list_orders(&self, query: &OrderQuery) -> StoreResult<Vec<OrderSummary>> {
            self.0.list_orders(query).await
        }
    }

    #[tokio::test]
    async fn unique_violation_on_insert_is_retried() {
        let inner = Arc::new(InMemoryStore::new());
        let p = seeded(&inner, "CUP", 350).await;
        let tracking = TrackingCodes::new("ORD", 3)
            .unwrap()
            .with_source(FixedSuffixes::new(&[7777, 7777, 8888]));
        let lc = OrderLifecycle::new(BlindStore(inner), TransitionTable::permissive(), tracking);
        let line = || vec![OrderLineRequest::new(p.id_typed(), Decimal::ONE)];

        lc.create_order(create(line())).await.unwrap();
        let second = lc.create_order(create(line())).await.unwrap();
        assert_eq!(second.tracking_code().suffix(), Some(8888));
    }

    #[tokio::test]
    async fn delivering_posts_one_exit_per_item() {
        let store = Arc::new(InMemoryStore::new());
        let cup = seeded(&store, "CUP", 350).await;
        let mug = seeded(&store, "MUG", 900).await;
        let lc = lifecycle(store.clone(), TransitionTable::permissive(), &[1234]);
        let ledger = InventoryLedger::new(store.clone());
        for pid in [cup.id_typed(), mug.id_typed()] {
            ledger
                .add_movement(AddMovement {
                    product_id: pid,
                    kind: MovementKind::Entry,
                    quantity: Decimal::new(10, 0),
                    reason: "stock in".to_string(),
                    actor: actor(),
                    occurred_at: today(),
                })
                .await
                .unwrap();
        }

        let order = lc
            .create_order(create(vec![
                OrderLineRequest::new(cup.id_typed(), Decimal::new(3, 0)),
                OrderLineRequest::new(mug.id_typed(), Decimal::new(1, 0)),
            ]))
            .await
            .unwrap();

        let updated = lc
            .update_status(status(order.id_typed(), OrderStatus::Delivered, today() + Duration::hours(1)))
            .await
            .unwrap();

        assert_eq!(updated.movements.len(), 2);
        assert!(updated.movements.iter().all(|m| m.movement.reason == "Exit for order ORD-20260504-1234"));

        let cup_stock = store.get_product(cup.id_typed()).await.unwrap().unwrap().current_stock();
        let mug_stock = store.get_product(mug.id_typed()).await.unwrap().unwrap().current_stock();
        assert_eq!(cup_stock, Decimal::new(7, 0));
        assert_eq!(mug_stock, Decimal::new(9, 0));

        let stored = lc.get_order(order.id_typed()).await.unwrap();
        assert_eq!(stored.status(), OrderStatus::Delivered);
        assert_eq!(stored.history().len(), 2);
        assert_eq!(stored.updated_at(), Some(today() + Duration::hours(1)));
    }

    #[tokio::test]
    async fn non_delivery_transitions_touch_no_stock() {
        let store = Arc::new(InMemoryStore::new());
        let cup = seeded(&store, "CUP", 350).await;
        let lc = lifecycle(store.clone(), TransitionTable::permissive(), &[1234]);
        let order = lc
            .create_order(create(vec![OrderLineRequest::new(cup.id_typed(), Decimal::ONE)]))
            .await
            .unwrap();

        for (i, to) in [OrderStatus::InPreparation, OrderStatus::InTransit, OrderStatus::Cancelled]
            .into_iter()
            .enumerate()
        {
            let updated = lc
                .update_status(status(order.id_typed(), to, today() + Duration::minutes(i as i64 + 1)))
                .await
                .unwrap();
            assert!(updated.movements.is_empty());
        }

        assert!(store.movements_for(cup.id_typed()).await.unwrap().is_empty());
        let stored = lc.get_order(order.id_typed()).await.unwrap();
        assert_eq!(stored.history().len(), 4);
        assert_eq!(stored.history_newest_first()[0].status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn forward_only_rejects_before_writing() {
        let store = Arc::new(InMemoryStore::new());
        let cup = seeded(&store, "CUP", 350).await;
        let lc = lifecycle(store.clone(), TransitionTable::forward_only(), &[1234]);
        let order = lc
            .create_order(create(vec![OrderLineRequest::new(cup.id_typed(), Decimal::ONE)]))
            .await
            .unwrap();

        let err = lc
            .update_status(status(order.id_typed(), OrderStatus::Delivered, today()))
            .await
            .unwrap_err();

        assert!(err.is_invalid_transition());
        let stored = lc.get_order(order.id_typed()).await.unwrap();
        assert_eq!(stored.status(), OrderStatus::Received);
        assert_eq!(stored.history().len(), 1);
        assert!(store.movements_for(cup.id_typed()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_change_on_missing_order_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let lc = lifecycle(store, TransitionTable::permissive(), &[1234]);
        let err = lc
            .update_status(status(OrderId::new(), OrderStatus::InTransit, today()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_removes_order_but_keeps_movements() {
        let store = Arc::new(InMemoryStore::new());
        let cup = seeded(&store, "CUP", 350).await;
        let lc = lifecycle(store.clone(), TransitionTable::permissive(), &[1234]);
        let order = lc
            .create_order(create(vec![OrderLineRequest::new(cup.id_typed(), Decimal::new(2, 0))]))
            .await
            .unwrap();
        lc.update_status(status(order.id_typed(), OrderStatus::Delivered, today()))
            .await
            .unwrap();

        lc.delete_order(order.id_typed()).await.unwrap();

        assert!(lc.get_order(order.id_typed()).await.unwrap_err().is_not_found());
        assert!(lc.delete_order(order.id_typed()).await.unwrap_err().is_not_found());
        assert_eq!(store.movements_for(cup.id_typed()).await.unwrap().len(), 1);
        let stock = store.get_product(cup.id_typed()).await.unwrap().unwrap().current_stock();
        assert_eq!(stock, Decimal::new(-2, 0));
    }

    #[tokio::test]
    async fn list_filters_by_text_and_status_newest_first() {
        let store = Arc::new(InMemoryStore::new());
        let cup = seeded(&store, "CUP", 350).await;
        let lc = lifecycle(store, TransitionTable::permissive(), &[1001, 1002, 1003]);

        let mut ids = Vec::new();
        for (i, name) in ["Ana Ruiz", "Bo Chen", "Ana Lopez"].into_iter().enumerate() {
            let mut cmd = create(vec![OrderLineRequest::new(cup.id_typed(), Decimal::ONE)]);
            cmd.order.customer.name = name.to_string();
            cmd.occurred_at = today() + Duration::minutes(i as i64);
            ids.push(lc.create_order(cmd).await.unwrap().id_typed());
        }
        lc.update_status(status(ids[0], OrderStatus::InTransit, today() + Duration::hours(1)))
            .await
            .unwrap();

        let anas = lc.list_orders(&OrderQuery::new(Some("ana"), None, None)).await.unwrap();
        assert_eq!(anas.iter().map(|o| o.id).collect::<Vec<_>>(), vec![ids[2], ids[0]]);

        let by_code = lc
            .list_orders(&OrderQuery::new(Some("20260504-1002"), None, None))
            .await
            .unwrap();
        assert_eq!(by_code.len(), 1);
        assert_eq!(by_code[0].id, ids[1]);

        let in_transit = lc
            .list_orders(&OrderQuery::new(None, Some(OrderStatus::InTransit), None))
            .await
            .unwrap();
        assert_eq!(in_transit.len(), 1);
        assert_eq!(in_transit[0].total, Decimal::new(350, 2));

        let limited = lc.list_orders(&OrderQuery::new(None, None, Some(2))).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn tracking_codes_reject_bad_configuration() {
        assert!(TrackingCodes::new("ord", 3).is_err());
        assert!(TrackingCodes::new("ORD", 0).is_err());
    }

    #[test]
    fn random_suffix_stays_four_digits() {
        for _ in 0..500 {
            assert!(TrackingCode::SUFFIX_RANGE.contains(&RandomSuffix.next_suffix()));
        }
    }
}
