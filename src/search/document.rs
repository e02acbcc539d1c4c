//! Search document shape and the product projection

use crate::models::Product;
use serde::{Deserialize, Serialize};

/// Flat document stored in the product index
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductDocument {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub price: f64,

    /// Category display label, never the numeric id
    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub image: String,
}

impl ProductDocument {
    /// Index document id for a product id
    pub fn document_id(product_id: i64) -> String {
        product_id.to_string()
    }
}

/// Projects product rows into index documents.
///
/// Pure and total: malformed values degrade to defaults instead of failing,
/// so a bad row can never abort a sync.
#[derive(Debug, Clone)]
pub struct DocumentProjector {
    default_category: String,
}

impl DocumentProjector {
    pub fn new(default_category: impl Into<String>) -> Self {
        Self {
            default_category: default_category.into(),
        }
    }

    /// Project a product; `category_label` is the resolved display label, if any
    pub fn project(&self, product: &Product, category_label: Option<&str>) -> ProductDocument {
        ProductDocument {
            name: product.name.trim().to_string(),
            description: product
                .description
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            price: coerce_price(product.price),
            category: category_label
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .unwrap_or(&self.default_category)
                .to_string(),
            image: product
                .image_ref()
                .map(|image| image.as_str().to_string())
                .unwrap_or_default(),
        }
    }
}

impl Default for DocumentProjector {
    fn default() -> Self {
        Self::new("uncategorized")
    }
}

/// Non-finite or negative prices collapse to zero
pub fn coerce_price(raw: f64) -> f64 {
    if raw.is_finite() && raw >= 0.0 {
        raw
    } else {
        0.0
    }
}
