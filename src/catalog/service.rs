use crate::catalog::ProductStore;
use crate::error::{AppError, Result};
use crate::models::{Category, NewProduct, Product, ProductChanges, SIZE_LABELS};
use crate::search::SyncWriter;
use std::sync::Arc;
use tracing::{debug, info};

/// Product mutations with post-commit index sync.
///
/// The store write decides the outcome of every call; the index write that
/// follows it is advisory and its outcome is deliberately dropped.
pub struct ProductService {
    store: Arc<dyn ProductStore>,
    sync: Arc<SyncWriter>,
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>, sync: Arc<SyncWriter>) -> Self {
        Self { store, sync }
    }

    pub async fn create(&self, product: NewProduct) -> Result<Product> {
        validate_price(product.price)?;
        self.require_category(product.category_id).await?;

        let created = self.store.insert(product).await?;
        info!(product_id = created.id, "Product created");

        let _ = self.sync.index_product(&created).await;
        Ok(created)
    }

    pub async fn update(&self, id: i64, changes: ProductChanges) -> Result<Product> {
        let mut product = self.get(id).await?;
        if changes.is_empty() {
            debug!(product_id = id, "Update carried no changes");
            return Ok(product);
        }

        if let Some(price) = changes.price {
            validate_price(price)?;
        }
        if let Some(category_id) = changes.category_id {
            self.require_category(category_id).await?;
        }

        changes.apply(&mut product);
        self.store.update(&product).await?;
        info!(product_id = id, "Product updated");

        let _ = self.sync.index_product(&product).await;
        Ok(product)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.store.delete(id).await? {
            return Err(AppError::NotFound(format!("Product {} not found", id)));
        }
        info!(product_id = id, "Product deleted");

        let _ = self.sync.delete_from_index(id).await;
        Ok(())
    }

    /// Add `delta` units of one size; a removal larger than the stock is refused.
    ///
    /// Stock is not part of the search document, so the index is left alone.
    pub async fn adjust_stock(&self, id: i64, size: u16, delta: i64) -> Result<Product> {
        let mut product = self.get(id).await?;

        if !SIZE_LABELS.contains(&size) {
            return Err(AppError::Validation(format!("Unknown size {}", size)));
        }
        if delta < 0 {
            let wanted = u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX);
            if !product.stock.is_available(size, wanted) {
                return Err(AppError::Validation(format!(
                    "Not enough stock for product {} in size {}",
                    id, size
                )));
            }
        }
        if !product.stock.adjust(size, delta) {
            return Err(AppError::Validation(format!(
                "Stock for size {} is out of range",
                size
            )));
        }

        self.store.update(&product).await?;
        info!(
            product_id = id,
            size,
            delta,
            remaining = product.stock.quantity(size),
            "Product stock adjusted"
        );
        Ok(product)
    }

    /// Authoritative read; never consults the search index
    pub async fn get(&self, id: i64) -> Result<Product> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))
    }

    pub async fn list(&self) -> Result<Vec<Product>> {
        self.store.find_all().await
    }

    pub async fn create_category(&self, name: &str) -> Result<Category> {
        let category = self.store.insert_category(name).await?;
        info!(category_id = category.id, name = %category.name, "Category created");
        Ok(category)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.store.list_categories().await
    }

    pub async fn get_category(&self, id: i64) -> Result<Category> {
        self.store
            .find_category(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    async fn require_category(&self, category_id: i64) -> Result<()> {
        match self.store.category_label(category_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::Validation(format!(
                "Category {} does not exist",
                category_id
            ))),
        }
    }
}

fn validate_price(price: f64) -> Result<()> {
    if price.is_finite() && price >= 0.0 {
        Ok(())
    } else {
        Err(AppError::Validation(
            "price must be a non-negative number".to_string(),
        ))
    }
}
