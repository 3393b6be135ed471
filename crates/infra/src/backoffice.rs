//! Back-office facade: permission check, core operation, audit record.
//!
//! Every mutating call checks one permission, runs the service operation and,
//! only if it succeeded, records exactly one [`ActionLog`]. Reads check the
//! matching view permission and record nothing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::instrument;

use orderdesk_auth::{Permission, Principal, authorize};
use orderdesk_core::{OrderId, ProductId};
use orderdesk_inventory::{MovementKind, StockMovement};
use orderdesk_orders::{NewOrder, Order, OrderStatus, TransitionTable};
use orderdesk_products::{Product, ProductDraft};

use crate::audit::{ActionLog, AuditSink, actions, entities};
use crate::catalog::ProductCatalog;
use crate::error::ServiceResult;
use crate::ledger::{AddMovement, InventoryLedger, MovementPosted};
use crate::lifecycle::{CreateOrder, OrderLifecycle, StatusUpdated, TrackingCodes, UpdateStatus};
use crate::store::{
    CatalogStore, DEFAULT_ACTION_LIMIT, LedgerStore, OrderQuery, OrderStore, OrderSummary, clamp_limit,
};

#[derive(Debug, Clone)]
pub struct BackOffice<S, A> {
    catalog: ProductCatalog<S>,
    ledger: InventoryLedger<S>,
    lifecycle: OrderLifecycle<S>,
    audit: A,
}

impl<S, A> BackOffice<S, A>
where
    S: CatalogStore + LedgerStore + OrderStore + Clone,
    A: AuditSink,
{
    pub fn new(store: S, audit: A, table: TransitionTable, tracking: TrackingCodes) -> Self {
        Self {
            catalog: ProductCatalog::new(store.clone()),
            ledger: InventoryLedger::new(store.clone()),
            lifecycle: OrderLifecycle::new(store, table, tracking),
            audit,
        }
    }

    pub fn catalog(&self) -> &ProductCatalog<S> {
        &self.catalog
    }

    pub fn ledger(&self) -> &InventoryLedger<S> {
        &self.ledger
    }

    pub fn lifecycle(&self) -> &OrderLifecycle<S> {
        &self.lifecycle
    }

    async fn record(&self, entry: ActionLog) -> ServiceResult<()> {
        Ok(self.audit.record(entry).await?)
    }

    // ── Products ────────────────────────────────────────────────────────────

    #[instrument(skip(self, principal, draft), fields(actor = %principal.actor.display), err)]
    pub async fn create_product(
        &self,
        principal: &Principal,
        draft: &ProductDraft,
        at: DateTime<Utc>,
    ) -> ServiceResult<Product> {
        authorize(principal, &Permission::INV_MANAGE)?;
        let product = self.catalog.create_product(draft, at).await?;
        self.record(ActionLog::new(
            &principal.actor,
            actions::INV_CREATE_PRODUCT,
            entities::PRODUCT,
            product.id_typed(),
            json!({ "sku": product.sku(), "name": product.name() }),
            at,
        ))
        .await?;
        Ok(product)
    }

    #[instrument(skip(self, principal, draft), fields(actor = %principal.actor.display), err)]
    pub async fn edit_product(
        &self,
        principal: &Principal,
        id: ProductId,
        draft: &ProductDraft,
        at: DateTime<Utc>,
    ) -> ServiceResult<Product> {
        authorize(principal, &Permission::INV_MANAGE)?;
        let product = self.catalog.edit_product(id, draft).await?;
        self.record(ActionLog::new(
            &principal.actor,
            actions::INV_EDIT_PRODUCT,
            entities::PRODUCT,
            id,
            json!({ "sku": product.sku(), "name": product.name() }),
            at,
        ))
        .await?;
        Ok(product)
    }

    #[instrument(skip(self, principal), fields(actor = %principal.actor.display), err)]
    pub async fn delete_product(&self, principal: &Principal, id: ProductId, at: DateTime<Utc>) -> ServiceResult<()> {
        authorize(principal, &Permission::INV_MANAGE)?;
        let product = self.catalog.delete_product(id).await?;
        self.record(ActionLog::new(
            &principal.actor,
            actions::INV_DELETE_PRODUCT,
            entities::PRODUCT,
            id,
            json!({ "sku": product.sku() }),
            at,
        ))
        .await
    }

    pub async fn get_product(&self, principal: &Principal, id: ProductId) -> ServiceResult<Product> {
        authorize(principal, &Permission::INV_VIEW)?;
        self.catalog.get_product(id).await
    }

    pub async fn search_products(&self, principal: &Principal, query: &str) -> ServiceResult<Vec<Product>> {
        authorize(principal, &Permission::INV_VIEW)?;
        self.catalog.search_products(query).await
    }

    /// Products for the order intake form.
    pub async fn active_products(&self, principal: &Principal) -> ServiceResult<Vec<Product>> {
        authorize(principal, &Permission::ORD_MANAGE)?;
        self.catalog.active_products().await
    }

    // ── Stock ───────────────────────────────────────────────────────────────

    #[instrument(skip(self, principal, reason), fields(actor = %principal.actor.display), err)]
    pub async fn add_movement(
        &self,
        principal: &Principal,
        product_id: ProductId,
        kind: MovementKind,
        quantity: Decimal,
        reason: &str,
        at: DateTime<Utc>,
    ) -> ServiceResult<MovementPosted> {
        authorize(principal, &Permission::INV_MOVEMENTS)?;
        let posted = self
            .ledger
            .add_movement(AddMovement {
                product_id,
                kind,
                quantity,
                reason: reason.trim().to_string(),
                actor: principal.actor.clone(),
                occurred_at: at,
            })
            .await?;
        self.record(ActionLog::new(
            &principal.actor,
            actions::INV_MOVEMENT,
            entities::STOCK_MOVEMENT,
            posted.movement.id,
            json!({
                "product_id": product_id,
                "kind": kind,
                "quantity": quantity,
                "reason": posted.movement.reason,
            }),
            at,
        ))
        .await?;
        Ok(posted)
    }

    pub async fn movements(
        &self,
        principal: &Principal,
        product_id: Option<ProductId>,
        limit: Option<u32>,
    ) -> ServiceResult<Vec<StockMovement>> {
        authorize(principal, &Permission::INV_VIEW)?;
        self.ledger.movements(product_id, limit).await
    }

    // ── Orders ──────────────────────────────────────────────────────────────

    #[instrument(skip(self, principal, order), fields(actor = %principal.actor.display), err)]
    pub async fn create_order(&self, principal: &Principal, order: NewOrder, at: DateTime<Utc>) -> ServiceResult<Order> {
        authorize(principal, &Permission::ORD_MANAGE)?;
        let order = self
            .lifecycle
            .create_order(CreateOrder {
                order,
                actor: principal.actor.clone(),
                occurred_at: at,
            })
            .await?;
        let total = order.total()?;
        self.record(ActionLog::new(
            &principal.actor,
            actions::ORD_CREATE,
            entities::ORDER,
            order.id_typed(),
            json!({
                "tracking_code": order.tracking_code(),
                "items": order.items().len(),
                "total": total,
            }),
            at,
        ))
        .await?;
        Ok(order)
    }

    #[instrument(skip(self, principal, comment), fields(actor = %principal.actor.display), err)]
    pub async fn update_status(
        &self,
        principal: &Principal,
        order_id: OrderId,
        status: OrderStatus,
        comment: &str,
        at: DateTime<Utc>,
    ) -> ServiceResult<StatusUpdated> {
        authorize(principal, &Permission::ORD_STATUS)?;
        let updated = self
            .lifecycle
            .update_status(UpdateStatus {
                order_id,
                status,
                comment: comment.to_string(),
                actor: principal.actor.clone(),
                occurred_at: at,
            })
            .await?;
        self.record(ActionLog::new(
            &principal.actor,
            actions::ORD_STATUS,
            entities::ORDER,
            order_id,
            json!({
                "from": updated.change.from,
                "to": updated.change.to,
                "comment": updated.change.entry.comment,
                "movements": updated.movements.len(),
            }),
            at,
        ))
        .await?;
        Ok(updated)
    }

    #[instrument(skip(self, principal), fields(actor = %principal.actor.display), err)]
    pub async fn delete_order(&self, principal: &Principal, order_id: OrderId, at: DateTime<Utc>) -> ServiceResult<()> {
        authorize(principal, &Permission::ORD_MANAGE)?;
        let order = self.lifecycle.delete_order(order_id).await?;
        self.record(ActionLog::new(
            &principal.actor,
            actions::ORD_DELETE,
            entities::ORDER,
            order_id,
            json!({ "tracking_code": order.tracking_code() }),
            at,
        ))
        .await
    }

    pub async fn get_order(&self, principal: &Principal, order_id: OrderId) -> ServiceResult<Order> {
        authorize(principal, &Permission::ORD_VIEW)?;
        self.lifecycle.get_order(order_id).await
    }

    pub async fn list_orders(&self, principal: &Principal, query: &OrderQuery) -> ServiceResult<Vec<OrderSummary>> {
        authorize(principal, &Permission::ORD_VIEW)?;
        self.lifecycle.list_orders(query).await
    }

    // ── Audit ───────────────────────────────────────────────────────────────

    pub async fn recent_actions(&self, principal: &Principal, limit: Option<u32>) -> ServiceResult<Vec<ActionLog>> {
        authorize(principal, &Permission::USR_AUDIT)?;
        Ok(self.audit.recent(clamp_limit(limit, DEFAULT_ACTION_LIMIT)).await?)
    }
}
