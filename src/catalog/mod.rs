pub mod memory;
pub mod service;

pub use memory::InMemoryProductStore;
pub use service::ProductService;

use crate::error::Result;
use crate::models::{Category, NewProduct, Product};
use async_trait::async_trait;

/// Relational product storage, the source of truth for the search index
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Every product, ordered by id
    async fn find_all(&self) -> Result<Vec<Product>>;

    /// Get a product by ID
    async fn find_by_id(&self, id: i64) -> Result<Option<Product>>;

    /// Insert a product and return it with its assigned id
    async fn insert(&self, product: NewProduct) -> Result<Product>;

    /// Overwrite an existing product
    async fn update(&self, product: &Product) -> Result<()>;

    /// Delete a product; `false` when it did not exist
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Register a category and return it with its assigned id
    async fn insert_category(&self, name: &str) -> Result<Category>;

    /// Every category, ordered by name
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Get a category by ID
    async fn find_category(&self, category_id: i64) -> Result<Option<Category>>;

    /// Display label of a category, if it exists
    async fn category_label(&self, category_id: i64) -> Result<Option<String>>;
}
