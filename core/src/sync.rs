//! Single-product and batch synchronization against the article API.
//!
//! # Design
//! `sync_one` resolves the query identifier, fetches, maps and persists in
//! one write. Any failure is first recorded on the product (status, message,
//! timestamp) and then returned to the caller. `sync_all_with_barcode` turns
//! per-product failures into counts and never aborts the batch.
//!
//! The batch selects products by barcode while `sync_one` queries by article
//! reference or item number, so a selected product can still fail with
//! `MissingIdentifier`. Both predicates are kept as they are.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::client::ArticleSource;
use crate::error::{Result, SyncError};
use crate::mapper::FieldMapper;
use crate::store::ProductStore;
use crate::types::{AttributeValues, ProductRecord};

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub success_count: usize,
    pub error_count: usize,
    /// Failed products with the message recorded on them.
    pub failures: Vec<(Uuid, String)>,
}

/// Drives synchronization for products held in a `ProductStore`.
#[derive(Debug)]
pub struct SyncService<S> {
    source: S,
    batch_running: AtomicBool,
}

impl<S: ArticleSource> SyncService<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            batch_running: AtomicBool::new(false),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Synchronize one product, recording the outcome on it either way.
    ///
    /// If recording a failure itself fails, that write error is only logged
    /// and the original error is returned.
    pub fn sync_one<P: ProductStore + ?Sized>(&self, store: &mut P, id: Uuid) -> Result<()> {
        let product = store.get(id)?;

        match self.fetch_and_write(store, &product) {
            Ok(()) => {
                info!(product = %product.name, %id, "updated product from article API");
                Ok(())
            }
            Err(e) => {
                error!(product = %product.name, %id, error = %e, "failed to update product from article API");
                let failure = AttributeValues::failure(Utc::now(), e.to_string());
                if let Err(write_err) = store.write(id, &failure) {
                    error!(%id, error = %write_err, "could not record sync failure");
                }
                Err(e)
            }
        }
    }

    /// Synchronize every product with a non-empty barcode, one at a time.
    ///
    /// Fails only with `BatchInProgress` when another batch is running on
    /// this service.
    pub fn sync_all_with_barcode<P: ProductStore + ?Sized>(&self, store: &mut P) -> Result<SyncSummary> {
        let _guard = BatchGuard::acquire(&self.batch_running)?;

        let mut summary = SyncSummary::default();
        for id in store.ids_with_barcode() {
            match self.sync_one(store, id) {
                Ok(()) => summary.success_count += 1,
                Err(e) => {
                    error!(%id, error = %e, "scheduled update failed for product");
                    summary.error_count += 1;
                    summary.failures.push((id, e.to_string()));
                }
            }
        }

        info!(
            success = summary.success_count,
            errors = summary.error_count,
            "article API sync completed"
        );
        Ok(summary)
    }

    fn fetch_and_write<P: ProductStore + ?Sized>(&self, store: &mut P, product: &ProductRecord) -> Result<()> {
        let identifier = product
            .query_identifier()
            .ok_or_else(|| SyncError::MissingIdentifier {
                product: product.name.clone(),
            })?;
        let flat = self.source.fetch(identifier)?;
        let values = FieldMapper::new(store.sync_category()).map(&flat);
        store.write(product.id, &values)
    }
}

/// Holds the batch flag for the duration of one run.
struct BatchGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BatchGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SyncError::BatchInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
