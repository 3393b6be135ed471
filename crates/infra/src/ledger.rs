//! Inventory ledger service: append movements, keep `current_stock` in step.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use orderdesk_core::{Actor, DomainError, MovementId, ProductId, checked_amount};
use orderdesk_inventory::{MovementKind, NewMovement, StockMovement, fold_stock};

use crate::error::ServiceResult;
use crate::store::{CatalogStore, DEFAULT_MOVEMENT_LIMIT, LedgerStore, ProductQuery, clamp_limit};

/// Command: append one movement to a product's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMovement {
    pub product_id: ProductId,
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub reason: String,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

/// The stored movement and the product's stock after recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementPosted {
    pub movement: StockMovement,
    pub current_stock: Decimal,
}

/// Stock ledger over a store.
///
/// `current_stock` is a projection: it is only ever written by
/// [`InventoryLedger::recalculate_stock`], which folds the product's full
/// movement history. The append and the stock write are separate writes; if
/// the second fails the projection stays stale until the next recomputation.
#[derive(Debug, Clone)]
pub struct InventoryLedger<S> {
    store: S,
}

impl<S> InventoryLedger<S>
where
    S: CatalogStore + LedgerStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validate, append, then recompute. Zero or unstorable quantities, unknown
    /// products and movements that would push stock past the storable range are
    /// rejected before anything is written. Negative resulting stock is allowed.
    #[instrument(
        skip(self, cmd),
        fields(product_id = %cmd.product_id, kind = %cmd.kind, quantity = %cmd.quantity),
        err
    )]
    pub async fn add_movement(&self, cmd: AddMovement) -> ServiceResult<MovementPosted> {
        let new = NewMovement::new(cmd.product_id, cmd.kind, cmd.quantity, cmd.reason, cmd.actor)?;

        if self.store.get_product(cmd.product_id).await?.is_none() {
            return Err(DomainError::not_found(format!("product {}", cmd.product_id)).into());
        }

        let movement = StockMovement::record(MovementId::new(), new, cmd.occurred_at);
        let existing = self.store.movements_for(movement.product_id).await?;
        let projected = fold_stock(existing.iter().chain(std::iter::once(&movement)))?;
        checked_amount("resulting stock", projected)?;

        self.store.append_movement(&movement).await?;

        let current_stock = self.recalculate_stock(movement.product_id).await?;
        tracing::info!(movement_id = %movement.id, %current_stock, "movement posted");

        Ok(MovementPosted {
            movement,
            current_stock,
        })
    }

    /// Recompute a product's stock from its full ledger and store it.
    ///
    /// Idempotent; movement order does not matter.
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub async fn recalculate_stock(&self, product_id: ProductId) -> ServiceResult<Decimal> {
        let movements = self.store.movements_for(product_id).await?;
        let stock = fold_stock(&movements)?;
        self.store.write_stock(product_id, stock).await?;
        Ok(stock)
    }

    /// Movements newest first, optionally for one product.
    pub async fn movements(
        &self,
        product_id: Option<ProductId>,
        limit: Option<u32>,
    ) -> ServiceResult<Vec<StockMovement>> {
        let limit = clamp_limit(limit, DEFAULT_MOVEMENT_LIMIT);
        Ok(self.store.recent_movements(product_id, limit).await?)
    }

    /// Recompute every product's stock. Returns the number of products rebuilt.
    #[instrument(skip(self), err)]
    pub async fn rebuild_all_stock(&self) -> ServiceResult<usize> {
        let products = self.store.list_products(&ProductQuery::all()).await?;
        for product in &products {
            let stock = self.recalculate_stock(product.id_typed()).await?;
            if stock != product.current_stock() {
                tracing::warn!(
                    product_id = %product.id_typed(),
                    stored = %product.current_stock(),
                    folded = %stock,
                    "stale stock projection corrected"
                );
            }
        }
        Ok(products.len())
    }
}
