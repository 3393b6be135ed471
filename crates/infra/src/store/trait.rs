use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use orderdesk_core::{OrderId, ProductId};
use orderdesk_inventory::StockMovement;
use orderdesk_orders::{Order, OrderStatus, StatusHistoryEntry, TrackingCode};
use orderdesk_products::Product;

use crate::audit::ActionLog;

use super::query::{OrderQuery, OrderSummary, ProductQuery};

/// Persistence failure.
///
/// These are **infrastructure errors** (constraints, connectivity) as opposed
/// to domain errors (validation, invariants). Services translate the
/// constraint variants they expect; everything else propagates unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Product catalog rows.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fails with `UniqueViolation` when the SKU is taken.
    async fn insert_product(&self, product: &Product) -> StoreResult<()>;

    /// Overwrites the descriptive columns only; `current_stock` is left alone.
    async fn update_product(&self, product: &Product) -> StoreResult<()>;

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>>;

    async fn find_by_sku(&self, sku: &str) -> StoreResult<Option<Product>>;

    async fn products_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>>;

    async fn list_products(&self, query: &ProductQuery) -> StoreResult<Vec<Product>>;

    /// Fails with `ForeignKeyViolation` while a movement or order item references it.
    async fn delete_product(&self, id: ProductId) -> StoreResult<()>;
}

/// Append-only stock ledger plus the per-product stock projection column.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    /// Fails with `ForeignKeyViolation` when the product does not exist.
    async fn append_movement(&self, movement: &StockMovement) -> StoreResult<()>;

    /// Every movement of one product, in no particular order.
    async fn movements_for(&self, product_id: ProductId) -> StoreResult<Vec<StockMovement>>;

    /// Newest first, optionally restricted to one product.
    async fn recent_movements(
        &self,
        product_id: Option<ProductId>,
        limit: u32,
    ) -> StoreResult<Vec<StockMovement>>;

    async fn write_stock(&self, product_id: ProductId, stock: Decimal) -> StoreResult<()>;
}

/// Orders with their items and status history.
#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    async fn tracking_code_exists(&self, code: &TrackingCode) -> StoreResult<bool>;

    /// Order, items and history in one unit of work. Fails with
    /// `UniqueViolation` when the tracking code is taken.
    async fn insert_order(&self, order: &Order) -> StoreResult<()>;

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>>;

    /// Status, `updated_at` and one history row in one unit of work.
    async fn record_status_change(
        &self,
        id: OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
        entry: &StatusHistoryEntry,
    ) -> StoreResult<()>;

    /// Order, items and history in one unit of work.
    async fn delete_order(&self, id: OrderId) -> StoreResult<()>;

    async fn list_orders(&self, query: &OrderQuery) -> StoreResult<Vec<OrderSummary>>;
}

/// Append-only action log.
#[async_trait::async_trait]
pub trait AuditStore: Send + Sync {
    async fn append_action(&self, entry: &ActionLog) -> StoreResult<()>;

    /// Newest first.
    async fn recent_actions(&self, limit: u32) -> StoreResult<Vec<ActionLog>>;
}

#[async_trait::async_trait]
impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        (**self).insert_product(product).await
    }

    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        (**self).update_product(product).await
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        (**self).get_product(id).await
    }

    async fn find_by_sku(&self, sku: &str) -> StoreResult<Option<Product>> {
        (**self).find_by_sku(sku).await
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
        (**self).products_by_ids(ids).await
    }

    async fn list_products(&self, query: &ProductQuery) -> StoreResult<Vec<Product>> {
        (**self).list_products(query).await
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        (**self).delete_product(id).await
    }
}

#[async_trait::async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn append_movement(&self, movement: &StockMovement) -> StoreResult<()> {
        (**self).append_movement(movement).await
    }

    async fn movements_for(&self, product_id: ProductId) -> StoreResult<Vec<StockMovement>> {
        (**self).movements_for(product_id).await
    }

    async fn recent_movements(
        &self,
        product_id: Option<ProductId>,
        limit: u32,
    ) -> StoreResult<Vec<StockMovement>> {
        (**self).recent_movements(product_id, limit).await
    }

    async fn write_stock(&self, product_id: ProductId, stock: Decimal) -> StoreResult<()> {
        (**self).write_stock(product_id, stock).await
    }
}

#[async_trait::async_trait]
impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    async fn tracking_code_exists(&self, code: &TrackingCode) -> StoreResult<bool> {
        (**self).tracking_code_exists(code).await
    }

    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        (**self).insert_order(order).await
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        (**self).get_order(id).await
    }

    async fn record_status_change(
        &self,
        id: OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
        entry: &StatusHistoryEntry,
    ) -> StoreResult<()> {
        (**self).record_status_change(id, status, updated_at, entry).await
    }

    async fn delete_order(&self, id: OrderId) -> StoreResult<()> {
        (**self).delete_order(id).await
    }

    async fn list_orders(&self, query: &OrderQuery) -> StoreResult<Vec<OrderSummary>> {
        (**self).list_orders(query).await
    }
}

#[async_trait::async_trait]
impl<S> AuditStore for Arc<S>
where
    S: AuditStore + ?Sized,
{
    async fn append_action(&self, entry: &ActionLog) -> StoreResult<()> {
        (**self).append_action(entry).await
    }

    async fn recent_actions(&self, limit: u32) -> StoreResult<Vec<ActionLog>> {
        (**self).recent_actions(limit).await
    }
}
