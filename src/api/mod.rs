pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::catalog::ProductService;
use crate::error::{ApiError, AppError};
use crate::search::{BulkResynchronizer, SearchGateway};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub products: Arc<ProductService>,
    pub search: Arc<SearchGateway>,
    pub resync: Arc<BulkResynchronizer>,
    /// Include internal error detail in responses (development mode)
    pub expose_error_details: bool,
}

impl AppState {
    pub fn new(
        products: Arc<ProductService>,
        search: Arc<SearchGateway>,
        resync: Arc<BulkResynchronizer>,
    ) -> Self {
        Self {
            products,
            search,
            resync,
            expose_error_details: false,
        }
    }

    pub fn with_error_details(mut self, expose: bool) -> Self {
        self.expose_error_details = expose;
        self
    }

    /// Render an error according to the deployment mode
    pub fn api_error(&self, error: impl Into<AppError>) -> ApiError {
        error.into().into_api_error(self.expose_error_details)
    }
}
