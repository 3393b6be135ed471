//! Postgres-backed implementation of every store trait.
//!
//! ## Error Mapping
//!
//! | PostgreSQL Error Code | StoreError | Scenario |
//! |-----------------------|------------|----------|
//! | `23505` | `UniqueViolation` | Duplicate SKU or tracking code |
//! | `23503` | `ForeignKeyViolation` | Movement/item for a missing product, delete of a referenced product |
//! | any other | `Backend` | Check constraints, connectivity, decoding |
//!
//! Multi-row writes (order insert, status change, order delete) run in one
//! transaction.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;
use uuid::Uuid;

use orderdesk_core::{ActionLogId, MovementId, OrderId, ProductId, UserId};
use orderdesk_inventory::{MovementKind, StockMovement};
use orderdesk_orders::{CustomerInfo, Order, OrderItem, OrderStatus, StatusHistoryEntry, TrackingCode};
use orderdesk_products::Product;

use crate::audit::ActionLog;

use super::query::{OrderQuery, OrderSummary, ProductQuery};
use super::r#trait::{AuditStore, CatalogStore, LedgerStore, OrderStore, StoreError, StoreResult};

const SCHEMA: &str = include_str!("../../migrations/0001_orderdesk.sql");

/// Postgres store over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the schema. Every statement is idempotent.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let Some(row) = sqlx::query(
            r#"
            SELECT id, tracking_code, customer_name, customer_phone, customer_address,
                   notes, status, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_order", e))?
        else {
            return Ok(None);
        };

        let items = sqlx::query(
            r#"
            SELECT product_id, quantity, unit_price
            FROM order_items
            WHERE order_id = $1
            ORDER BY line_no ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_order_items", e))?
        .iter()
        .map(item_from_row)
        .collect::<StoreResult<Vec<_>>>()?;

        let history = sqlx::query(
            r#"
            SELECT status, comment, at, user_id, user_display
            FROM order_status_history
            WHERE order_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_order_history", e))?
        .iter()
        .map(history_from_row)
        .collect::<StoreResult<Vec<_>>>()?;

        Ok(Some(Order::restore(
            id,
            parse_column::<TrackingCode>(&row, "tracking_code")?,
            CustomerInfo::new(
                get::<String>(&row, "customer_name")?,
                get::<String>(&row, "customer_phone")?,
                get::<String>(&row, "customer_address")?,
            ),
            get(&row, "notes")?,
            parse_column::<OrderStatus>(&row, "status")?,
            get(&row, "created_at")?,
            get(&row, "updated_at")?,
            items,
            history,
        )))
    }
}

#[async_trait::async_trait]
impl CatalogStore for PostgresStore {
    #[instrument(skip(self, product), fields(product_id = %product.id_typed(), sku = %product.sku()), err)]
    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, sku, name, unit, unit_price, current_stock, active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(product.id_typed().as_uuid())
        .bind(product.sku())
        .bind(product.name())
        .bind(product.unit())
        .bind(product.unit_price())
        .bind(product.current_stock())
        .bind(product.is_active())
        .bind(product.created_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    #[instrument(skip(self, product), fields(product_id = %product.id_typed()), err)]
    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET sku = $2, name = $3, unit = $4, unit_price = $5, active = $6
            WHERE id = $1
            "#,
        )
        .bind(product.id_typed().as_uuid())
        .bind(product.sku())
        .bind(product.name())
        .bind(product.unit())
        .bind(product.unit_price())
        .bind(product.is_active())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("product {}", product.id_typed())));
        }
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        sqlx::query(&format!("{PRODUCT_SELECT} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?
            .as_ref()
            .map(product_from_row)
            .transpose()
    }

    async fn find_by_sku(&self, sku: &str) -> StoreResult<Option<Product>> {
        sqlx::query(&format!("{PRODUCT_SELECT} WHERE sku = $1"))
            .bind(sku)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_sku", e))?
            .as_ref()
            .map(product_from_row)
            .transpose()
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        sqlx::query(&format!("{PRODUCT_SELECT} WHERE id = ANY($1)"))
            .bind(&ids)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("products_by_ids", e))?
            .iter()
            .map(product_from_row)
            .collect()
    }

    async fn list_products(&self, query: &ProductQuery) -> StoreResult<Vec<Product>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(PRODUCT_SELECT);
        qb.push(" WHERE TRUE");
        if query.active_only {
            qb.push(" AND active");
        }
        if let Some(text) = &query.text {
            let pattern = like_pattern(text);
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR sku ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" ORDER BY name ASC, sku ASC");

        qb.build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?
            .iter()
            .map(product_from_row)
            .collect()
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("product {id}")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl LedgerStore for PostgresStore {
    #[instrument(
        skip(self, movement),
        fields(movement_id = %movement.id, product_id = %movement.product_id, kind = %movement.kind),
        err
    )]
    async fn append_movement(&self, movement: &StockMovement) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_movements (id, product_id, kind, quantity, reason, at, user_id, user_display)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(movement.id.as_uuid())
        .bind(movement.product_id.as_uuid())
        .bind(movement.kind.as_str())
        .bind(movement.quantity)
        .bind(&movement.reason)
        .bind(movement.at)
        .bind(movement.user_id.map(|u| *u.as_uuid()))
        .bind(&movement.user_display)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("append_movement", e))?;
        Ok(())
    }

    async fn movements_for(&self, product_id: ProductId) -> StoreResult<Vec<StockMovement>> {
        sqlx::query(&format!("{MOVEMENT_SELECT} WHERE product_id = $1"))
            .bind(product_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("movements_for", e))?
            .iter()
            .map(movement_from_row)
            .collect()
    }

    async fn recent_movements(
        &self,
        product_id: Option<ProductId>,
        limit: u32,
    ) -> StoreResult<Vec<StockMovement>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(MOVEMENT_SELECT);
        if let Some(product_id) = product_id {
            qb.push(" WHERE product_id = ").push_bind(*product_id.as_uuid());
        }
        qb.push(" ORDER BY at DESC, id DESC LIMIT ")
            .push_bind(i64::from(limit));

        qb.build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("recent_movements", e))?
            .iter()
            .map(movement_from_row)
            .collect()
    }

    #[instrument(skip(self), fields(product_id = %product_id, stock = %stock), err)]
    async fn write_stock(&self, product_id: ProductId, stock: Decimal) -> StoreResult<()> {
        let result = sqlx::query("UPDATE products SET current_stock = $2 WHERE id = $1")
            .bind(product_id.as_uuid())
            .bind(stock)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("write_stock", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("product {product_id}")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl OrderStore for PostgresStore {
    async fn tracking_code_exists(&self, code: &TrackingCode) -> StoreResult<bool> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM orders WHERE tracking_code = $1) AS taken")
            .bind(code.as_str())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("tracking_code_exists", e))?;
        get(&row, "taken")
    }

    #[instrument(
        skip(self, order),
        fields(order_id = %order.id_typed(), tracking_code = %order.tracking_code()),
        err
    )]
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, tracking_code, customer_name, customer_phone, customer_address,
                                notes, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id_typed().as_uuid())
        .bind(order.tracking_code().as_str())
        .bind(&order.customer().name)
        .bind(&order.customer().phone)
        .bind(&order.customer().address)
        .bind(order.notes())
        .bind(order.status().as_str())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        for (line_no, item) in order.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, line_no, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order.id_typed().as_uuid())
            .bind(line_no as i32)
            .bind(item.product_id.as_uuid())
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_item", e))?;
        }

        for (seq, entry) in order.history().iter().enumerate() {
            insert_history(&mut tx, order.id_typed(), seq as i32, entry).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        self.load_order(id).await
    }

    #[instrument(skip(self, entry), fields(order_id = %id, status = %status), err)]
    async fn record_status_change(
        &self,
        id: OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
        entry: &StatusHistoryEntry,
    ) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let result = sqlx::query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .bind(updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_order_status", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("order {id}")));
        }

        let next_seq: i32 = sqlx::query(
            "SELECT COALESCE(MAX(seq) + 1, 0) AS next_seq FROM order_status_history WHERE order_id = $1",
        )
        .bind(id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("next_history_seq", e))
        .and_then(|row| get(&row, "next_seq"))?;

        insert_history(&mut tx, id, next_seq, entry).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn delete_order(&self, id: OrderId) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        for table in ["order_items", "order_status_history"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE order_id = $1"))
                .bind(id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("delete_order_children", e))?;
        }

        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_order", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("order {id}")));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    async fn list_orders(&self, query: &OrderQuery) -> StoreResult<Vec<OrderSummary>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT o.id, o.tracking_code, o.customer_name, o.customer_phone, o.customer_address,
                   o.status, o.created_at, o.updated_at,
                   COUNT(i.line_no) AS item_count,
                   COALESCE(SUM(i.quantity * i.unit_price), 0) AS total
            FROM orders o
            LEFT JOIN order_items i ON i.order_id = o.id
            WHERE TRUE
            "#,
        );
        if let Some(status) = query.status {
            qb.push(" AND o.status = ").push_bind(status.as_str());
        }
        if let Some(text) = &query.text {
            let pattern = like_pattern(text);
            qb.push(" AND (o.tracking_code ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR o.customer_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR o.customer_phone ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" GROUP BY o.id ORDER BY o.created_at DESC, o.id DESC LIMIT ")
            .push_bind(i64::from(query.limit));

        qb.build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_orders", e))?
            .iter()
            .map(|row| {
                Ok(OrderSummary {
                    id: OrderId::from_uuid(get(row, "id")?),
                    tracking_code: parse_column(row, "tracking_code")?,
                    customer: CustomerInfo::new(
                        get::<String>(row, "customer_name")?,
                        get::<String>(row, "customer_phone")?,
                        get::<String>(row, "customer_address")?,
                    ),
                    status: parse_column(row, "status")?,
                    created_at: get(row, "created_at")?,
                    updated_at: get(row, "updated_at")?,
                    item_count: get::<i64>(row, "item_count")? as u32,
                    total: get(row, "total")?,
                })
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl AuditStore for PostgresStore {
    #[instrument(skip(self, entry), fields(action = %entry.action, entity_id = %entry.entity_id), err)]
    async fn append_action(&self, entry: &ActionLog) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO action_logs (id, at, actor_user_id, actor_display, action, entity, entity_id, detail, source)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.at)
        .bind(entry.actor_user_id.map(|u| *u.as_uuid()))
        .bind(&entry.actor_display)
        .bind(&entry.action)
        .bind(&entry.entity)
        .bind(&entry.entity_id)
        .bind(&entry.detail)
        .bind(entry.source.as_deref())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("append_action", e))?;
        Ok(())
    }

    async fn recent_actions(&self, limit: u32) -> StoreResult<Vec<ActionLog>> {
        sqlx::query(
            r#"
            SELECT id, at, actor_user_id, actor_display, action, entity, entity_id, detail, source
            FROM action_logs
            ORDER BY at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("recent_actions", e))?
        .iter()
        .map(|row| {
            Ok(ActionLog {
                id: ActionLogId::from_uuid(get(row, "id")?),
                at: get(row, "at")?,
                actor_user_id: get::<Option<Uuid>>(row, "actor_user_id")?.map(UserId::from_uuid),
                actor_display: get(row, "actor_display")?,
                action: get(row, "action")?,
                entity: get(row, "entity")?,
                entity_id: get(row, "entity_id")?,
                detail: get::<JsonValue>(row, "detail")?,
                source: get(row, "source")?,
            })
        })
        .collect()
    }
}

const PRODUCT_SELECT: &str =
    "SELECT id, sku, name, unit, unit_price, current_stock, active, created_at FROM products";

const MOVEMENT_SELECT: &str =
    "SELECT id, product_id, kind, quantity, reason, at, user_id, user_display FROM stock_movements";

async fn insert_history(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    order_id: OrderId,
    seq: i32,
    entry: &StatusHistoryEntry,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_status_history (order_id, seq, status, comment, at, user_id, user_display)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(order_id.as_uuid())
    .bind(seq)
    .bind(entry.status.as_str())
    .bind(&entry.comment)
    .bind(entry.at)
    .bind(entry.user_id.map(|u| *u.as_uuid()))
    .bind(&entry.user_display)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_history", e))?;
    Ok(())
}

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    Ok(Product::restore(
        ProductId::from_uuid(get(row, "id")?),
        get(row, "sku")?,
        get(row, "name")?,
        get(row, "unit")?,
        get(row, "unit_price")?,
        get(row, "current_stock")?,
        get(row, "active")?,
        get(row, "created_at")?,
    ))
}

fn movement_from_row(row: &PgRow) -> StoreResult<StockMovement> {
    Ok(StockMovement {
        id: MovementId::from_uuid(get(row, "id")?),
        product_id: ProductId::from_uuid(get(row, "product_id")?),
        kind: parse_column::<MovementKind>(row, "kind")?,
        quantity: get(row, "quantity")?,
        reason: get(row, "reason")?,
        at: get(row, "at")?,
        user_id: get::<Option<Uuid>>(row, "user_id")?.map(UserId::from_uuid),
        user_display: get(row, "user_display")?,
    })
}

fn item_from_row(row: &PgRow) -> StoreResult<OrderItem> {
    Ok(OrderItem {
        product_id: ProductId::from_uuid(get(row, "product_id")?),
        quantity: get(row, "quantity")?,
        unit_price: get(row, "unit_price")?,
    })
}

fn history_from_row(row: &PgRow) -> StoreResult<StatusHistoryEntry> {
    Ok(StatusHistoryEntry {
        status: parse_column(row, "status")?,
        comment: get(row, "comment")?,
        at: get(row, "at")?,
        user_id: get::<Option<Uuid>>(row, "user_id")?.map(UserId::from_uuid),
        user_display: get(row, "user_display")?,
    })
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Backend(format!("failed to decode column '{column}': {e}")))
}

/// Decode a TEXT column through the domain type's `FromStr`.
fn parse_column<T>(row: &PgRow, column: &str) -> StoreResult<T>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    let raw: String = get(row, column)?;
    raw.parse()
        .map_err(|e| StoreError::Backend(format!("invalid value '{raw}' in column '{column}': {e}")))
}

fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Map sqlx errors onto `StoreError`, classifying constraint violations by SQLSTATE.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            match db_err.code().as_deref() {
                Some("23505") => StoreError::UniqueViolation(msg),
                Some("23503") => StoreError::ForeignKeyViolation(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::RowNotFound => {
            StoreError::NotFound(format!("row not found in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
