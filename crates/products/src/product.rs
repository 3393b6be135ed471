use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderdesk_core::{DomainError, DomainResult, Entity, ProductId, checked_amount};

/// Unit of measure used when the caller leaves it blank.
pub const DEFAULT_UNIT: &str = "unit";

/// Catalog input for creating or editing a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub sku: String,
    pub name: String,
    pub unit: String,
    pub unit_price: Decimal,
    pub active: bool,
}

impl ProductDraft {
    pub fn new(sku: impl Into<String>, name: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            unit: DEFAULT_UNIT.to_string(),
            unit_price,
            active: true,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Trim and validate the draft.
    ///
    /// SKU uniqueness needs the store and is checked by the catalog service.
    pub fn normalized(&self) -> DomainResult<ProductDraft> {
        let sku = self.sku.trim();
        if sku.is_empty() {
            return Err(DomainError::invalid_argument("SKU cannot be empty"));
        }

        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::invalid_argument("name cannot be empty"));
        }

        if self.unit_price < Decimal::ZERO {
            return Err(DomainError::invalid_argument("unit_price cannot be negative"));
        }
        let unit_price = checked_amount("unit_price", self.unit_price)?;

        let unit = match self.unit.trim() {
            "" => DEFAULT_UNIT,
            u => u,
        };

        Ok(ProductDraft {
            sku: sku.to_string(),
            name: name.to_string(),
            unit: unit.to_string(),
            unit_price,
            active: self.active,
        })
    }
}

/// Catalog entry.
///
/// `current_stock` is a projection of the product's movement ledger. Catalog
/// edits never touch it; only ledger recomputation does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    sku: String,
    name: String,
    unit: String,
    unit_price: Decimal,
    current_stock: Decimal,
    active: bool,
    created_at: DateTime<Utc>,
}

impl Product {
    /// Build a new catalog entry with zero stock.
    pub fn create(id: ProductId, draft: &ProductDraft, created_at: DateTime<Utc>) -> DomainResult<Self> {
        let draft = draft.normalized()?;
        Ok(Self {
            id,
            sku: draft.sku,
            name: draft.name,
            unit: draft.unit,
            unit_price: draft.unit_price,
            current_stock: Decimal::ZERO,
            active: draft.active,
            created_at,
        })
    }

    /// Rehydrate a persisted row. Stores use this; domain code should not.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: ProductId,
        sku: String,
        name: String,
        unit: String,
        unit_price: Decimal,
        current_stock: Decimal,
        active: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            sku,
            name,
            unit,
            unit_price,
            current_stock,
            active,
            created_at,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn current_stock(&self) -> Decimal {
        self.current_stock
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Apply catalog edits. Stock is left as is.
    pub fn apply_edit(&mut self, draft: &ProductDraft) -> DomainResult<()> {
        let draft = draft.normalized()?;
        self.sku = draft.sku;
        self.name = draft.name;
        self.unit = draft.unit;
        self.unit_price = draft.unit_price;
        self.active = draft.active;
        Ok(())
    }

    /// Overwrite the stock projection with a freshly folded value.
    pub fn set_current_stock(&mut self, stock: Decimal) {
        self.current_stock = stock;
    }

    /// Case-insensitive substring match on name or SKU.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&q) || self.sku.to_lowercase().contains(&q)
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
