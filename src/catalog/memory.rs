use crate::catalog::ProductStore;
use crate::error::{AppError, Result};
use crate::models::{Category, NewProduct, Product};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// In-memory product store (for standalone runs and testing)
#[derive(Clone)]
pub struct InMemoryProductStore {
    products: Arc<DashMap<i64, Product>>,
    categories: Arc<DashMap<i64, Category>>,
    next_product_id: Arc<AtomicI64>,
    next_category_id: Arc<AtomicI64>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self {
            products: Arc::new(DashMap::new()),
            categories: Arc::new(DashMap::new()),
            next_product_id: Arc::new(AtomicI64::new(1)),
            next_category_id: Arc::new(AtomicI64::new(1)),
        }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl Default for InMemoryProductStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn find_all(&self) -> Result<Vec<Product>> {
        let mut products: Vec<Product> = self
            .products
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        products.sort_by_key(|product| product.id);
        Ok(products)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>> {
        Ok(self.products.get(&id).map(|entry| entry.clone()))
    }

    async fn insert(&self, product: NewProduct) -> Result<Product> {
        let id = self.next_product_id.fetch_add(1, Ordering::SeqCst);
        let product = product.into_product(id);
        self.products.insert(id, product.clone());
        tracing::debug!(product_id = id, "Product saved");
        Ok(product)
    }

    async fn update(&self, product: &Product) -> Result<()> {
        match self.products.get_mut(&product.id) {
            Some(mut entry) => {
                *entry = product.clone();
                tracing::debug!(product_id = product.id, "Product updated");
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Product {} not found",
                product.id
            ))),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let removed = self.products.remove(&id).is_some();
        if removed {
            tracing::debug!(product_id = id, "Product deleted");
        }
        Ok(removed)
    }

    async fn insert_category(&self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation(
                "category name must not be empty".to_string(),
            ));
        }
        if self
            .categories
            .iter()
            .any(|entry| entry.name.eq_ignore_ascii_case(name))
        {
            return Err(AppError::Validation(format!(
                "Category '{}' already exists",
                name
            )));
        }
        let id = self.next_category_id.fetch_add(1, Ordering::SeqCst);
        let category = Category {
            id,
            name: name.to_string(),
        };
        self.categories.insert(id, category.clone());
        tracing::debug!(category_id = id, "Category saved");
        Ok(category)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> = self
            .categories
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn find_category(&self, category_id: i64) -> Result<Option<Category>> {
        Ok(self.categories.get(&category_id).map(|entry| entry.clone()))
    }

    async fn category_label(&self, category_id: i64) -> Result<Option<String>> {
        Ok(self
            .categories
            .get(&category_id)
            .map(|entry| entry.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Stock;

    fn new_product(name: &str, category_id: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: None,
            price: 50.0,
            stock: Stock::empty(),
            category_id,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let store = InMemoryProductStore::new();
        let first = store.insert(new_product("A", 1)).await.unwrap();
        let second = store.insert(new_product("B", 1)).await.unwrap();

        assert!(second.id > first.id);
        let all = store.find_all().await.unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let store = InMemoryProductStore::new();
        let ghost = new_product("Ghost", 1).into_product(99);
        assert!(matches!(
            store.update(&ghost).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_reports_presence() {
        let store = InMemoryProductStore::new();
        let product = store.insert(new_product("A", 1)).await.unwrap();

        assert!(store.delete(product.id).await.unwrap());
        assert!(!store.delete(product.id).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_category_labels() {
        let store = InMemoryProductStore::new();
        let running = store.insert_category("running").await.unwrap();

        assert_eq!(
            store.category_label(running.id).await.unwrap().as_deref(),
            Some("running")
        );
        assert_eq!(store.category_label(404).await.unwrap(), None);
        assert!(store.insert_category("  ").await.is_err());
    }

    #[tokio::test]
    async fn test_categories_sorted_and_unique() {
        let store = InMemoryProductStore::new();
        let trail = store.insert_category("trail").await.unwrap();
        store.insert_category("basketball").await.unwrap();

        let names: Vec<String> = store
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["basketball", "trail"]);

        assert!(matches!(
            store.insert_category("Trail").await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(store.find_category(trail.id).await.unwrap(), Some(trail));
        assert_eq!(store.find_category(404).await.unwrap(), None);
    }
}
