//! Append-only action log for back-office mutations.
//!
//! The ledger and lifecycle services never write here; the back-office facade
//! records one entry per successful mutation.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use orderdesk_core::{ActionLogId, Actor, UserId};

use crate::store::{AuditStore, StoreError, StoreResult};

/// Action codes written by the back-office facade.
pub mod actions {
    pub const INV_CREATE_PRODUCT: &str = "INV.CREATE_PRODUCT";
    pub const INV_EDIT_PRODUCT: &str = "INV.EDIT_PRODUCT";
    pub const INV_DELETE_PRODUCT: &str = "INV.DELETE_PRODUCT";
    pub const INV_MOVEMENT: &str = "INV.MOVEMENT";
    pub const ORD_CREATE: &str = "ORD.CREATE";
    pub const ORD_STATUS: &str = "ORD.STATUS";
    pub const ORD_DELETE: &str = "ORD.DELETE";
}

/// Entity type names stored on action log rows.
pub mod entities {
    pub const PRODUCT: &str = "Product";
    pub const STOCK_MOVEMENT: &str = "StockMovement";
    pub const ORDER: &str = "Order";
}

/// One audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLog {
    pub id: ActionLogId,
    pub at: DateTime<Utc>,
    pub actor_user_id: Option<UserId>,
    pub actor_display: String,
    pub action: String,
    pub entity: String,
    pub entity_id: String,
    pub detail: JsonValue,
    pub source: Option<String>,
}

impl ActionLog {
    pub fn new(
        actor: &Actor,
        action: impl Into<String>,
        entity: impl Into<String>,
        entity_id: impl ToString,
        detail: JsonValue,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActionLogId::new(),
            at,
            actor_user_id: actor.user_id,
            actor_display: actor.display.clone(),
            action: action.into(),
            entity: entity.into(),
            entity_id: entity_id.to_string(),
            detail,
            source: actor.source.clone(),
        }
    }
}

/// Destination for audit records.
#[async_trait::async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: ActionLog) -> StoreResult<()>;

    /// Newest first.
    async fn recent(&self, limit: u32) -> StoreResult<Vec<ActionLog>>;
}

#[async_trait::async_trait]
impl<A> AuditSink for Arc<A>
where
    A: AuditSink + ?Sized,
{
    async fn record(&self, entry: ActionLog) -> StoreResult<()> {
        (**self).record(entry).await
    }

    async fn recent(&self, limit: u32) -> StoreResult<Vec<ActionLog>> {
        (**self).recent(limit).await
    }
}

/// In-memory sink.
///
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    entries: RwLock<Vec<ActionLog>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn record(&self, entry: ActionLog) -> StoreResult<()> {
        self.entries
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?
            .push(entry);
        Ok(())
    }

    async fn recent(&self, limit: u32) -> StoreResult<Vec<ActionLog>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(newest_first(&entries, limit))
    }
}

/// Newest `at` first; entries sharing a timestamp come back in reverse write order.
pub(crate) fn newest_first(entries: &[ActionLog], limit: u32) -> Vec<ActionLog> {
    let mut out: Vec<ActionLog> = entries.iter().rev().cloned().collect();
    out.sort_by(|a, b| b.at.cmp(&a.at));
    out.truncate(limit as usize);
    out
}

/// Sink that writes to the `action_logs` table through an [`AuditStore`].
#[derive(Debug, Clone)]
pub struct StoreAuditSink<S> {
    store: S,
}

impl<S> StoreAuditSink<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl<S> AuditSink for StoreAuditSink<S>
where
    S: AuditStore,
{
    async fn record(&self, entry: ActionLog) -> StoreResult<()> {
        self.store.append_action(&entry).await
    }

    async fn recent(&self, limit: u32) -> StoreResult<Vec<ActionLog>> {
        self.store.recent_actions(limit).await
    }
}

/// Sink that emits each record as a structured `tracing` event and keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait::async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, entry: ActionLog) -> StoreResult<()> {
        tracing::info!(
            audit_id = %entry.id,
            action = %entry.action,
            entity = %entry.entity,
            entity_id = %entry.entity_id,
            actor = %entry.actor_display,
            source = entry.source.as_deref().unwrap_or(""),
            detail = %entry.detail,
            "action recorded"
        );
        Ok(())
    }

    async fn recent(&self, _limit: u32) -> StoreResult<Vec<ActionLog>> {
        Ok(Vec::new())
    }
}
