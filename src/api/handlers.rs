use crate::api::AppState;
use crate::error::ApiError;
use crate::models::{Category, NewProduct, Product, ProductChanges, Stock};
use crate::search::{ProductHit, SearchParams, Suggestion};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Full-text product search
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResponse>> {
    let results = state
        .search
        .search_params(&params)
        .await
        .map_err(|e| state.api_error(e).with_message("Error performing search"))?;

    Ok(Json(SearchResponse {
        success: true,
        meta: SearchMeta {
            total: results.total,
            page: results.page,
            total_pages: results.total_pages,
            limit: results.page_size,
        },
        data: results.hits,
        suggestions: results.suggestions,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub data: Vec<ProductHit>,
    pub meta: SearchMeta,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMeta {
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
    pub limit: u32,
}

/// Rebuild the search index from the catalog
pub async fn sync_products(State(state): State<AppState>) -> ApiResult<Json<SyncResponse>> {
    let report = state
        .resync
        .resync_all()
        .await
        .map_err(|e| state.api_error(e).with_message("Error synchronizing products"))?;

    Ok(Json(SyncResponse {
        success: true,
        message: format!("Synced {} products to the search index", report.indexed),
        count: report.indexed,
        failed: report.failed,
        removed: report.removed,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    pub success: bool,
    pub message: String,
    pub count: usize,
    pub failed: usize,
    pub removed: u64,
}

/// List every product
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    let products = state
        .products
        .list()
        .await
        .map_err(|e| state.api_error(e).with_message("Error fetching products"))?;
    Ok(Json(products))
}

/// Get a product by ID
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Product>> {
    let product = state
        .products
        .get(id)
        .await
        .map_err(|e| state.api_error(e))?;
    Ok(Json(product))
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    request.validate().map_err(|e| state.api_error(e))?;

    let created = state
        .products
        .create(request.into())
        .await
        .map_err(|e| state.api_error(e).with_message("Error creating product"))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[serde(default)]
    pub stock: Stock,
    pub category_id: i64,
    #[validate(length(max = 2048))]
    pub image: Option<String>,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(request: CreateProductRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            price: request.price,
            stock: request.stock,
            category_id: request.category_id,
            image: request.image,
        }
    }
}

/// Update a product (partial)
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    request.validate().map_err(|e| state.api_error(e))?;

    let updated = state
        .products
        .update(id, request.into())
        .await
        .map_err(|e| state.api_error(e).with_message("Error updating product"))?;

    Ok(Json(updated))
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub stock: Option<Stock>,
    pub category_id: Option<i64>,
    #[validate(length(max = 2048))]
    pub image: Option<String>,
}

impl From<UpdateProductRequest> for ProductChanges {
    fn from(request: UpdateProductRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            price: request.price,
            stock: request.stock,
            category_id: request.category_id,
            image: request.image,
        }
    }
}

/// Delete a product
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteResponse>> {
    state
        .products
        .delete(id)
        .await
        .map_err(|e| state.api_error(e).with_message("Error deleting product"))?;

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Product {} deleted", id),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Add or remove units of one size
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<StockAdjustmentRequest>,
) -> ApiResult<Json<Product>> {
    let product = state
        .products
        .adjust_stock(id, request.size, request.delta)
        .await
        .map_err(|e| state.api_error(e).with_message("Error adjusting stock"))?;
    Ok(Json(product))
}

#[derive(Debug, Deserialize)]
pub struct StockAdjustmentRequest {
    pub size: u16,
    pub delta: i64,
}

/// List categories by name
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let categories = state
        .products
        .list_categories()
        .await
        .map_err(|e| state.api_error(e).with_message("Error fetching categories"))?;
    Ok(Json(categories))
}

/// Get a category by ID
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Category>> {
    let category = state
        .products
        .get_category(id)
        .await
        .map_err(|e| state.api_error(e))?;
    Ok(Json(category))
}

/// Create a category
pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    request.validate().map_err(|e| state.api_error(e))?;

    let category = state
        .products
        .create_category(&request.name)
        .await
        .map_err(|e| state.api_error(e).with_message("Error creating category"))?;

    Ok((StatusCode::CREATED, Json(category)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}
