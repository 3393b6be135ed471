//! `orderdesk-infra`: storage, services and wiring.
//!
//! - [`store`]: store traits with in-memory and Postgres implementations
//! - [`ledger`], [`lifecycle`], [`catalog`]: the core services
//! - [`audit`], [`backoffice`]: permission-checked, audited entry points
//! - [`config`], [`bootstrap`]: environment configuration and wiring

pub mod audit;
pub mod backoffice;
pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod store;


pub use audit::{ActionLog, AuditSink, InMemoryAuditSink, StoreAuditSink, TracingAuditSink};
pub use backoffice::BackOffice;
pub use catalog::ProductCatalog;
pub use config::{AppConfig, ConfigError};
pub use error::{ServiceError, ServiceResult};
pub use ledger::{AddMovement, InventoryLedger, MovementPosted};
pub use lifecycle::{CreateOrder, OrderLifecycle, RandomSuffix, StatusUpdated, TrackingCodes, UpdateStatus};
pub use store::{
    AuditStore, CatalogStore, InMemoryStore, LedgerStore, OrderQuery, OrderStore, OrderSummary,
    PostgresStore, ProductQuery, StoreError, StoreResult,
};
