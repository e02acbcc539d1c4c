//! Per-mutation index writes.
//!
//! The relational store is the source of truth. Every method here reports a
//! [`SyncOutcome`] instead of returning an error: mutation handlers call the
//! writer after their write has committed and are free to ignore the outcome.
//! Drift left behind by a failed sync is healed by the bulk resync.

use crate::catalog::ProductStore;
use crate::models::Product;
use crate::search::client::{DeleteOutcome, SearchEngine};
use crate::search::document::{DocumentProjector, ProductDocument};
use crate::search::error::SearchError;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one advisory index write
#[derive(Debug)]
pub enum SyncOutcome {
    /// Document created or overwritten
    Indexed,
    /// Document removed
    Removed,
    /// Delete found nothing to remove; treated as success
    AlreadyAbsent,
    /// Index write failed; the relational write stands regardless
    Failed(SearchError),
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, SyncOutcome::Failed(_))
    }

    pub fn error(&self) -> Option<&SearchError> {
        match self {
            SyncOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Mirrors product mutations into the search index
pub struct SyncWriter {
    engine: Arc<dyn SearchEngine>,
    catalog: Arc<dyn ProductStore>,
    projector: DocumentProjector,
    index_name: String,
}

impl SyncWriter {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        catalog: Arc<dyn ProductStore>,
        projector: DocumentProjector,
        index_name: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            catalog,
            projector,
            index_name: index_name.into(),
        }
    }

    /// Upsert a product's document and make it visible to the next search
    pub async fn index_product(&self, product: &Product) -> SyncOutcome {
        self.upsert(product, true).await
    }

    /// Remove a product's document; a missing document counts as success
    pub async fn delete_from_index(&self, product_id: i64) -> SyncOutcome {
        let id = ProductDocument::document_id(product_id);
        match self.engine.delete_document(&self.index_name, &id).await {
            Ok(DeleteOutcome::Deleted) => {
                info!(product_id, index = %self.index_name, "Product removed from search index");
                SyncOutcome::Removed
            }
            Ok(DeleteOutcome::NotFound) => {
                debug!(product_id, index = %self.index_name, "Product was not in search index");
                SyncOutcome::AlreadyAbsent
            }
            Err(e) => {
                warn!(
                    product_id,
                    index = %self.index_name,
                    error = %e,
                    transient = e.is_transient(),
                    "Failed to remove product from search index"
                );
                SyncOutcome::Failed(e)
            }
        }
    }

    /// Project and write one document; `refresh` trades throughput for visibility
    pub(crate) async fn upsert(&self, product: &Product, refresh: bool) -> SyncOutcome {
        let label = self.resolve_category(product).await;
        let document = self.projector.project(product, label.as_deref());
        let id = ProductDocument::document_id(product.id);

        match self
            .engine
            .put_document(&self.index_name, &id, &document, refresh)
            .await
        {
            Ok(()) => {
                debug!(product_id = product.id, index = %self.index_name, "Product indexed");
                SyncOutcome::Indexed
            }
            Err(e) => {
                warn!(
                    product_id = product.id,
                    index = %self.index_name,
                    error = %e,
                    transient = e.is_transient(),
                    "Failed to index product"
                );
                SyncOutcome::Failed(e)
            }
        }
    }

    async fn resolve_category(&self, product: &Product) -> Option<String> {
        match self.catalog.category_label(product.category_id).await {
            Ok(label) => label,
            Err(e) => {
                warn!(
                    product_id = product.id,
                    category_id = product.category_id,
                    error = %e,
                    "Category lookup failed, indexing with default category"
                );
                None
            }
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub(crate) fn engine(&self) -> &Arc<dyn SearchEngine> {
        &self.engine
    }
}
