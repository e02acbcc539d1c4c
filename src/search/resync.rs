//! Full rebuild of the product index from the relational store

use crate::catalog::ProductStore;
use crate::error::Result;
use crate::search::document::ProductDocument;
use crate::search::schema::IndexSchemaManager;
use crate::search::sync::{SyncOutcome, SyncWriter};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Summary of a bulk resync
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResyncReport {
    /// Documents written successfully
    pub indexed: usize,

    /// Products whose document write failed
    pub failed: usize,

    /// Ids of the failed products
    pub failed_ids: Vec<i64>,

    /// Documents removed because their product no longer exists
    pub removed: u64,

    /// Whether the stale-document sweep failed
    pub sweep_failed: bool,

    pub duration_ms: u64,
}

/// Rebuilds the index from the source of truth.
///
/// Safe to run alongside live traffic: it only ever moves the index toward
/// the current relational state.
pub struct BulkResynchronizer {
    schema: Arc<IndexSchemaManager>,
    writer: Arc<SyncWriter>,
    catalog: Arc<dyn ProductStore>,
    concurrency: usize,
}

impl BulkResynchronizer {
    pub fn new(
        schema: Arc<IndexSchemaManager>,
        writer: Arc<SyncWriter>,
        catalog: Arc<dyn ProductStore>,
        concurrency: usize,
    ) -> Self {
        Self {
            schema,
            writer,
            catalog,
            concurrency: concurrency.max(1),
        }
    }

    /// Ensure the index, upsert every product, then sweep documents of
    /// deleted products.
    ///
    /// Only index setup and the product read are fatal; a failing document
    /// is logged and counted while the rest continue.
    pub async fn resync_all(&self) -> Result<ResyncReport> {
        let started = Instant::now();

        self.schema.ensure_index().await?;
        let products = self.catalog.find_all().await?;
        let total = products.len();

        info!(
            products = total,
            index = %self.writer.index_name(),
            concurrency = self.concurrency,
            "Starting search index resync"
        );

        let outcomes: Vec<(i64, SyncOutcome)> = stream::iter(products)
            .map(|product| {
                let writer = Arc::clone(&self.writer);
                async move { (product.id, writer.upsert(&product, false).await) }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = ResyncReport::default();
        for (product_id, outcome) in outcomes {
            if outcome.is_success() {
                report.indexed += 1;
            } else {
                report.failed += 1;
                report.failed_ids.push(product_id);
            }
        }
        report.failed_ids.sort_unstable();

        match self.sweep_stale_documents().await {
            Ok(removed) => report.removed = removed,
            Err(e) => {
                warn!(error = %e, "Failed to sweep stale documents from search index");
                report.sweep_failed = true;
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;

        if report.failed > 0 {
            warn!(
                indexed = report.indexed,
                failed = report.failed,
                failed_ids = ?report.failed_ids,
                "Search index resync finished with failures"
            );
        } else {
            info!(
                indexed = report.indexed,
                removed = report.removed,
                duration_ms = report.duration_ms,
                "Search index resync finished"
            );
        }

        Ok(report)
    }

    /// Remove documents whose product no longer exists.
    ///
    /// The index is listed before the store is re-read, so a product created
    /// at any point during the resync is either in the re-read or absent
    /// from the listing. Only ids that are indexed and missing from the
    /// store are deleted.
    async fn sweep_stale_documents(&self) -> Result<u64> {
        let engine = self.writer.engine();
        let index = self.writer.index_name();

        let indexed = engine.document_ids(index).await?;
        let live: HashSet<String> = self
            .catalog
            .find_all()
            .await?
            .iter()
            .map(|product| ProductDocument::document_id(product.id))
            .collect();

        let stale: Vec<String> = indexed
            .into_iter()
            .filter(|id| !live.contains(id))
            .collect();
        if stale.is_empty() {
            return Ok(0);
        }

        debug!(stale = stale.len(), index = %index, "Removing stale documents");
        Ok(engine.delete_documents(index, &stale).await?)
    }
}
