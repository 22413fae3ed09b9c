//! Persistence seam for product records.
//!
//! The host's storage layer implements `ProductStore`; a single `write`
//! call is assumed atomic for one product. `InMemoryProductStore` backs the
//! tests and small embeddings.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::{Result, SyncError};
use crate::types::{AttributeValues, CategoryId, ProductRecord};

pub trait ProductStore {
    fn get(&self, id: Uuid) -> Result<ProductRecord>;

    /// Merge `values` into the product in one write.
    fn write(&mut self, id: Uuid, values: &AttributeValues) -> Result<()>;

    /// Products the scheduled batch selects: those with a non-empty barcode.
    fn ids_with_barcode(&self) -> Vec<Uuid>;

    /// Category assigned to synchronized products, if the host has one.
    fn sync_category(&self) -> Option<CategoryId>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryProductStore {
    products: HashMap<Uuid, ProductRecord>,
    sync_category: Option<CategoryId>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sync_category(mut self, category: CategoryId) -> Self {
        self.sync_category = Some(category);
        self
    }

    pub fn insert(&mut self, product: ProductRecord) -> Uuid {
        let id = product.id;
        self.products.insert(id, product);
        id
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl ProductStore for InMemoryProductStore {
    fn get(&self, id: Uuid) -> Result<ProductRecord> {
        self.products.get(&id).cloned().ok_or(SyncError::ProductNotFound(id))
    }

    fn write(&mut self, id: Uuid, values: &AttributeValues) -> Result<()> {
        let product = self.products.get_mut(&id).ok_or(SyncError::ProductNotFound(id))?;
        product.apply(values);
        Ok(())
    }

    fn ids_with_barcode(&self) -> Vec<Uuid> {
        let mut selected: Vec<&ProductRecord> =
            self.products.values().filter(|p| p.has_barcode()).collect();
        // Stable order keeps batch logs comparable between runs.
        selected.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        selected.into_iter().map(|p| p.id).collect()
    }

    fn sync_category(&self) -> Option<CategoryId> {
        self.sync_category
    }
}
