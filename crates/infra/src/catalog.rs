//! Product catalog service.

use chrono::{DateTime, Utc};
use tracing::instrument;

use orderdesk_core::{DomainError, ProductId};
use orderdesk_products::{Product, ProductDraft};

use crate::error::ServiceResult;
use crate::store::{CatalogStore, ProductQuery, StoreError};

#[derive(Debug, Clone)]
pub struct ProductCatalog<S> {
    store: S,
}

impl<S> ProductCatalog<S>
where
    S: CatalogStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// New products start with zero stock. Duplicate SKU is a `Conflict`.
    #[instrument(skip(self, draft), fields(sku = %draft.sku), err)]
    pub async fn create_product(&self, draft: &ProductDraft, created_at: DateTime<Utc>) -> ServiceResult<Product> {
        let product = Product::create(ProductId::new(), draft, created_at)?;

        if self.store.find_by_sku(product.sku()).await?.is_some() {
            return Err(duplicate_sku(product.sku()).into());
        }
        self.store
            .insert_product(&product)
            .await
            .map_err(|e| sku_conflict(e, product.sku()))?;

        tracing::info!(product_id = %product.id_typed(), "product created");
        Ok(product)
    }

    /// Catalog fields only; `current_stock` is never touched here.
    #[instrument(skip(self, draft), fields(product_id = %id), err)]
    pub async fn edit_product(&self, id: ProductId, draft: &ProductDraft) -> ServiceResult<Product> {
        let mut product = self.get_product(id).await?;
        product.apply_edit(draft)?;

        let taken_elsewhere = self
            .store
            .find_by_sku(product.sku())
            .await?
            .is_some_and(|other| other.id_typed() != id);
        if taken_elsewhere {
            return Err(duplicate_sku(product.sku()).into());
        }
        self.store
            .update_product(&product)
            .await
            .map_err(|e| sku_conflict(e, product.sku()))?;

        // Re-read so the returned stock is the stored one, not the pre-edit copy.
        self.get_product(id).await
    }

    pub async fn get_product(&self, id: ProductId) -> ServiceResult<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("product {id}")).into())
    }

    /// Name or SKU substring, sorted by name. A blank query lists everything.
    pub async fn search_products(&self, query: &str) -> ServiceResult<Vec<Product>> {
        Ok(self.store.list_products(&ProductQuery::text(query)).await?)
    }

    /// Products offered at order intake, sorted by name.
    pub async fn active_products(&self) -> ServiceResult<Vec<Product>> {
        Ok(self.store.list_products(&ProductQuery::active()).await?)
    }

    /// Refused with `Conflict` while any movement or order item references it.
    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn delete_product(&self, id: ProductId) -> ServiceResult<Product> {
        let product = self.get_product(id).await?;
        match self.store.delete_product(id).await {
            Ok(()) => Ok(product),
            Err(StoreError::ForeignKeyViolation(_)) => {
                tracing::warn!("delete refused: product is referenced");
                Err(DomainError::conflict(format!(
                    "product '{}' has stock movements or order lines",
                    product.sku()
                ))
                .into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn duplicate_sku(sku: &str) -> DomainError {
    DomainError::conflict(format!("sku '{sku}' already exists"))
}

fn sku_conflict(err: StoreError, sku: &str) -> crate::error::ServiceError {
    match err {
        StoreError::UniqueViolation(_) => duplicate_sku(sku).into(),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use orderdesk_core::{Actor, MovementId};
    use orderdesk_inventory::{MovementKind, NewMovement, StockMovement};
    use rust_decimal::Decimal;

    use crate::store::{InMemoryStore, LedgerStore};

    fn catalog() -> (Arc<InMemoryStore>, ProductCatalog<Arc<InMemoryStore>>) {
        let store = Arc::new(InMemoryStore::new());
        (store.clone(), ProductCatalog::new(store))
    }

    fn draft(sku: &str, name: &str) -> ProductDraft {
        ProductDraft::new(sku, name, Decimal::new(1999, 2))
    }

    #[tokio::test]
    async fn create_trims_and_defaults_unit() {
        let (_, catalog) = catalog();
        let p = catalog
            .create_product(&draft("  SKU-1 ", " Widget ").with_unit(" "), Utc::now())
            .await
            .unwrap();

        assert_eq!(p.sku(), "SKU-1");
        assert_eq!(p.name(), "Widget");
        assert_eq!(p.unit(), orderdesk_products::DEFAULT_UNIT);
        assert_eq!(p.current_stock(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn duplicate_sku_is_a_conflict() {
        let (_, catalog) = catalog();
        catalog.create_product(&draft("SKU-1", "A"), Utc::now()).await.unwrap();

        let err = catalog.create_product(&draft("SKU-1", "B"), Utc::now()).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn edit_to_a_taken_sku_is_a_conflict() {
        let (_, catalog) = catalog();
        catalog.create_product(&draft("SKU-1", "A"), Utc::now()).await.unwrap();
        let b = catalog.create_product(&draft("SKU-2", "B"), Utc::now()).await.unwrap();

        let err = catalog.edit_product(b.id_typed(), &draft("SKU-1", "B")).await.unwrap_err();
        assert!(err.is_conflict());

        // Keeping its own SKU is fine.
        catalog.edit_product(b.id_typed(), &draft("SKU-2", "B2")).await.unwrap();
    }

    #[tokio::test]
    async fn edit_never_changes_stock() {
        let (store, catalog) = catalog();
        let p = catalog.create_product(&draft("SKU-1", "A"), Utc::now()).await.unwrap();
        store.write_stock(p.id_typed(), Decimal::new(12, 0)).await.unwrap();

        let edited = catalog
            .edit_product(p.id_typed(), &draft("SKU-1", "A renamed"))
            .await
            .unwrap();

        assert_eq!(edited.name(), "A renamed");
        assert_eq!(edited.current_stock(), Decimal::new(12, 0));
    }

    #[tokio::test]
    async fn edit_of_missing_product_is_not_found() {
        let (_, catalog) = catalog();
        let err = catalog.edit_product(ProductId::new(), &draft("X", "X")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn search_and_active_listing_are_sorted_by_name() {
        let (_, catalog) = catalog();
        catalog.create_product(&draft("S-2", "Zinc plate"), Utc::now()).await.unwrap();
        catalog.create_product(&draft("S-1", "Anchor"), Utc::now()).await.unwrap();
        catalog
            .create_product(&draft("S-3", "Bracket").inactive(), Utc::now())
            .await
            .unwrap();

        let names = |ps: Vec<Product>| ps.iter().map(|p| p.name().to_string()).collect::<Vec<_>>();

        assert_eq!(names(catalog.search_products("s-").await.unwrap()), vec!["Anchor", "Bracket", "Zinc plate"]);
        assert_eq!(names(catalog.search_products("zinc").await.unwrap()), vec!["Zinc plate"]);
        assert_eq!(names(catalog.active_products().await.unwrap()), vec!["Anchor", "Zinc plate"]);
    }

    #[tokio::test]
    async fn referenced_product_delete_is_refused() {
        let (store, catalog) = catalog();
        let p = catalog.create_product(&draft("SKU-1", "A"), Utc::now()).await.unwrap();
        let new = NewMovement::new(p.id_typed(), MovementKind::Entry, Decimal::ONE, "", Actor::system()).unwrap();
        store
            .append_movement(&StockMovement::record(MovementId::new(), new, Utc::now()))
            .await
            .unwrap();

        let err = catalog.delete_product(p.id_typed()).await.unwrap_err();
        assert!(err.is_conflict());
        assert!(catalog.get_product(p.id_typed()).await.is_ok());
    }

    #[tokio::test]
    async fn unreferenced_product_can_be_deleted() {
        let (_, catalog) = catalog();
        let p = catalog.create_product(&draft("SKU-1", "A"), Utc::now()).await.unwrap();

        catalog.delete_product(p.id_typed()).await.unwrap();
        assert!(catalog.get_product(p.id_typed()).await.unwrap_err().is_not_found());
    }
}
