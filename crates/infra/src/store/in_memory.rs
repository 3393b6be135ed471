use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use orderdesk_core::{OrderId, ProductId};
use orderdesk_inventory::StockMovement;
use orderdesk_orders::{Order, OrderStatus, StatusHistoryEntry, TrackingCode};
use orderdesk_products::Product;

use crate::audit::{ActionLog, newest_first};

use super::query::{OrderQuery, OrderSummary, ProductQuery};
use super::r#trait::{AuditStore, CatalogStore, LedgerStore, OrderStore, StoreError, StoreResult};

/// In-memory implementation of every store trait.
///
/// Intended for tests/dev. Enforces the same constraints as the Postgres
/// schema: unique SKU, unique tracking code, movements and order items must
/// reference an existing product, and referenced products cannot be deleted.
///
/// Locks are never held across an `.await`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    products: RwLock<HashMap<ProductId, Product>>,
    movements: RwLock<Vec<StockMovement>>,
    orders: RwLock<HashMap<OrderId, Order>>,
    actions: RwLock<Vec<ActionLog>>,
}

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sku_taken(products: &HashMap<ProductId, Product>, sku: &str, except: Option<ProductId>) -> bool {
        products
            .values()
            .any(|p| p.sku() == sku && Some(p.id_typed()) != except)
    }

    /// Callers hold the `products` lock so no reference can appear meanwhile.
    fn product_referenced(&self, id: ProductId) -> StoreResult<bool> {
        if read(&self.movements)?.iter().any(|m| m.product_id == id) {
            return Ok(true);
        }
        Ok(read(&self.orders)?
            .values()
            .any(|o| o.items().iter().any(|i| i.product_id == id)))
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        let mut products = write(&self.products)?;
        if products.contains_key(&product.id_typed()) {
            return Err(StoreError::UniqueViolation(format!("product {}", product.id_typed())));
        }
        if Self::sku_taken(&products, product.sku(), None) {
            return Err(StoreError::UniqueViolation(format!("sku '{}'", product.sku())));
        }
        products.insert(product.id_typed(), product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        let mut products = write(&self.products)?;
        if Self::sku_taken(&products, product.sku(), Some(product.id_typed())) {
            return Err(StoreError::UniqueViolation(format!("sku '{}'", product.sku())));
        }
        let existing = products
            .get_mut(&product.id_typed())
            .ok_or_else(|| StoreError::NotFound(format!("product {}", product.id_typed())))?;

        let stock = existing.current_stock();
        *existing = product.clone();
        existing.set_current_stock(stock);
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(read(&self.products)?.get(&id).cloned())
    }

    async fn find_by_sku(&self, sku: &str) -> StoreResult<Option<Product>> {
        Ok(read(&self.products)?.values().find(|p| p.sku() == sku).cloned())
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
        let products = read(&self.products)?;
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }

    async fn list_products(&self, query: &ProductQuery) -> StoreResult<Vec<Product>> {
        let mut out: Vec<Product> = read(&self.products)?
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.sku().cmp(b.sku())));
        Ok(out)
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut products = write(&self.products)?;
        if !products.contains_key(&id) {
            return Err(StoreError::NotFound(format!("product {id}")));
        }
        if self.product_referenced(id)? {
            return Err(StoreError::ForeignKeyViolation(format!("product {id} is referenced")));
        }
        products.remove(&id);
        Ok(())
    }
}

#[async_trait::async_trait]
impl LedgerStore for InMemoryStore {
    async fn append_movement(&self, movement: &StockMovement) -> StoreResult<()> {
        // Lock order: products before movements, everywhere.
        let products = read(&self.products)?;
        if !products.contains_key(&movement.product_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "product {} does not exist",
                movement.product_id
            )));
        }
        write(&self.movements)?.push(movement.clone());
        Ok(())
    }

    async fn movements_for(&self, product_id: ProductId) -> StoreResult<Vec<StockMovement>> {
        Ok(read(&self.movements)?
            .iter()
            .filter(|m| m.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn recent_movements(
        &self,
        product_id: Option<ProductId>,
        limit: u32,
    ) -> StoreResult<Vec<StockMovement>> {
        let mut out: Vec<StockMovement> = read(&self.movements)?
            .iter()
            .filter(|m| product_id.is_none_or(|p| m.product_id == p))
            .cloned()
            .collect();
        // Stable sort keeps append order for equal timestamps; reverse that too.
        out.reverse();
        out.sort_by(|a, b| b.at.cmp(&a.at));
        out.truncate(limit as usize);
        Ok(out)
    }

    async fn write_stock(&self, product_id: ProductId, stock: Decimal) -> StoreResult<()> {
        write(&self.products)?
            .get_mut(&product_id)
            .map(|p| p.set_current_stock(stock))
            .ok_or_else(|| StoreError::NotFound(format!("product {product_id}")))
    }
}

#[async_trait::async_trait]
impl OrderStore for InMemoryStore {
    async fn tracking_code_exists(&self, code: &TrackingCode) -> StoreResult<bool> {
        Ok(read(&self.orders)?
            .values()
            .any(|o| o.tracking_code() == code))
    }

    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        // Lock order: products before orders, everywhere.
        let products = read(&self.products)?;
        if let Some(item) = order.items().iter().find(|i| !products.contains_key(&i.product_id)) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "product {} does not exist",
                item.product_id
            )));
        }

        let mut orders = write(&self.orders)?;
        if orders.contains_key(&order.id_typed()) {
            return Err(StoreError::UniqueViolation(format!("order {}", order.id_typed())));
        }
        if orders.values().any(|o| o.tracking_code() == order.tracking_code()) {
            return Err(StoreError::UniqueViolation(format!(
                "tracking code '{}'",
                order.tracking_code()
            )));
        }
        orders.insert(order.id_typed(), order.clone());
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(read(&self.orders)?.get(&id).cloned())
    }

    async fn record_status_change(
        &self,
        id: OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
        entry: &StatusHistoryEntry,
    ) -> StoreResult<()> {
        let mut orders = write(&self.orders)?;
        let current = orders
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;

        let mut history = current.history().to_vec();
        history.push(entry.clone());
        let updated = Order::restore(
            id,
            current.tracking_code().clone(),
            current.customer().clone(),
            current.notes().to_string(),
            status,
            current.created_at(),
            Some(updated_at),
            current.items().to_vec(),
            history,
        );
        orders.insert(id, updated);
        Ok(())
    }

    async fn delete_order(&self, id: OrderId) -> StoreResult<()> {
        write(&self.orders)?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))
    }

    async fn list_orders(&self, query: &OrderQuery) -> StoreResult<Vec<OrderSummary>> {
        let orders = read(&self.orders)?;
        let mut matching: Vec<&Order> = orders.values().filter(|o| query.matches(o)).collect();
        matching.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id_typed().cmp(&a.id_typed()))
        });
        matching
            .into_iter()
            .take(query.limit as usize)
            .map(|order| {
                OrderSummary::try_from(order)
                    .map_err(|e| StoreError::Backend(format!("order {}: {e}", order.id_typed())))
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl AuditStore for InMemoryStore {
    async fn append_action(&self, entry: &ActionLog) -> StoreResult<()> {
        write(&self.actions)?.push(entry.clone());
        Ok(())
    }

    async fn recent_actions(&self, limit: u32) -> StoreResult<Vec<ActionLog>> {
        Ok(newest_first(&read(&self.actions)?, limit))
    }
}
