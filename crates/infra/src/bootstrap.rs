//! Wiring from [`AppConfig`] to a ready [`BackOffice`].

use std::sync::Arc;

use anyhow::Context;

use crate::audit::StoreAuditSink;
use crate::backoffice::BackOffice;
use crate::config::AppConfig;
use crate::lifecycle::TrackingCodes;
use crate::store::{InMemoryStore, PostgresStore};

pub type MemoryBackOffice = BackOffice<Arc<InMemoryStore>, StoreAuditSink<Arc<InMemoryStore>>>;
pub type PgBackOffice = BackOffice<Arc<PostgresStore>, StoreAuditSink<Arc<PostgresStore>>>;

const PG_MAX_CONNECTIONS: u32 = 10;

/// Install the process-wide tracing subscriber using the configured filter.
pub fn init_logging(config: &AppConfig) {
    orderdesk_observability::init_with_filter(config.log_filter.as_deref());
}

pub fn tracking_codes(config: &AppConfig) -> anyhow::Result<TrackingCodes> {
    TrackingCodes::new(config.tracking_prefix.clone(), config.tracking_max_attempts)
        .context("invalid tracking code configuration")
}

/// Back office over a fresh in-memory store.
pub fn in_memory(config: &AppConfig) -> anyhow::Result<MemoryBackOffice> {
    let store = Arc::new(InMemoryStore::new());
    Ok(BackOffice::new(
        store.clone(),
        StoreAuditSink::new(store),
        config.transitions.table(),
        tracking_codes(config)?,
    ))
}

/// Connect to Postgres, apply the schema and build the back office.
pub async fn postgres(config: &AppConfig) -> anyhow::Result<PgBackOffice> {
    let url = config
        .database_url
        .as_deref()
        .context("no database URL configured (set ORDERDESK_DATABASE_URL or DATABASE_URL)")?;

    let store = Arc::new(
        PostgresStore::connect(url, PG_MAX_CONNECTIONS)
            .await
            .context("failed to connect to Postgres")?,
    );
    store.migrate().await.context("failed to apply schema")?;
    tracing::info!(transitions = ?config.transitions, prefix = %config.tracking_prefix, "back office ready");

    Ok(BackOffice::new(
        store.clone(),
        StoreAuditSink::new(store),
        config.transitions.table(),
        tracking_codes(config)?,
    ))
}
