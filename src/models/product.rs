use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shoe sizes a product can be stocked in
pub const SIZE_LABELS: [u16; 9] = [36, 37, 38, 39, 40, 41, 42, 43, 44];

/// Product row as owned by the relational layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub stock: Stock,
    pub category_id: i64,
    #[serde(default)]
    pub image: Option<String>,
}

impl Product {
    pub fn image_ref(&self) -> Option<ImageRef> {
        self.image.as_deref().and_then(ImageRef::parse)
    }
}

/// Product fields supplied on creation; the store assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: Stock,
    pub category_id: i64,
    pub image: Option<String>,
}

impl NewProduct {
    pub fn into_product(self, id: i64) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            category_id: self.category_id,
            image: self.image,
        }
    }
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<Stock>,
    pub category_id: Option<i64>,
    pub image: Option<String>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = Some(description);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(category_id) = self.category_id {
            product.category_id = category_id;
        }
        if let Some(image) = self.image {
            product.image = Some(image);
        }
    }
}

/// Category row; only the display label matters to search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Per-size stock counts
///
/// Keys are always drawn from [`SIZE_LABELS`]; counts are unsigned so they
/// can never go negative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "BTreeMap<String, u32>", into = "BTreeMap<String, u32>")]
pub struct Stock(BTreeMap<u16, u32>);

impl Stock {
    /// Every size present with a zero count
    pub fn empty() -> Self {
        Self(SIZE_LABELS.iter().map(|&size| (size, 0)).collect())
    }

    /// Build from `(size, count)` pairs; sizes outside the fixed set are rejected
    pub fn from_counts<I>(counts: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (u16, u32)>,
    {
        let mut stock = Self::empty();
        for (size, count) in counts {
            if !SIZE_LABELS.contains(&size) {
                return Err(format!("unknown size label {}", size));
            }
            stock.0.insert(size, count);
        }
        Ok(stock)
    }

    pub fn quantity(&self, size: u16) -> u32 {
        self.0.get(&size).copied().unwrap_or(0)
    }

    pub fn is_available(&self, size: u16, quantity: u32) -> bool {
        self.quantity(size) >= quantity
    }

    /// Add (positive) or remove (negative) units for one size.
    ///
    /// Returns `false` and leaves the stock untouched when the size is unknown
    /// or the result would drop below zero.
    pub fn adjust(&mut self, size: u16, delta: i64) -> bool {
        let Some(current) = self.0.get_mut(&size) else {
            return false;
        };
        let next = i64::from(*current) + delta;
        match u32::try_from(next) {
            Ok(value) => {
                *current = value;
                true
            }
            Err(_) => false,
        }
    }
}

impl Default for Stock {
    fn default() -> Self {
        Self::empty()
    }
}

impl TryFrom<BTreeMap<String, u32>> for Stock {
    type Error = String;

    fn try_from(raw: BTreeMap<String, u32>) -> Result<Self, Self::Error> {
        let mut counts = Vec::with_capacity(raw.len());
        for (label, count) in raw {
            let size: u16 = label
                .trim()
                .parse()
                .map_err(|_| format!("invalid size label '{}'", label))?;
            counts.push((size, count));
        }
        Self::from_counts(counts)
    }
}

impl From<Stock> for BTreeMap<String, u32> {
    fn from(stock: Stock) -> Self {
        stock
            .0
            .into_iter()
            .map(|(size, count)| (size.to_string(), count))
            .collect()
    }
}

/// Where a product image lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Absolute `http(s)` URL served elsewhere
    Remote(String),
    /// Path relative to managed upload storage
    Upload(String),
}

impl ImageRef {
    /// Classify a stored image reference; blank references yield `None`
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Some(ImageRef::Remote(trimmed.to_string()))
        } else {
            Some(ImageRef::Upload(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ImageRef::Remote(url) => url,
            ImageRef::Upload(path) => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stock_covers_every_size() {
        let stock = Stock::empty();
        assert!(SIZE_LABELS.iter().all(|&size| stock.quantity(size) == 0));
        let value = serde_json::to_value(&stock).unwrap();
        assert_eq!(value.as_object().unwrap().len(), SIZE_LABELS.len());
    }

    #[test]
    fn test_stock_rejects_unknown_size() {
        assert!(Stock::from_counts([(45, 1)]).is_err());
        assert!(Stock::from_counts([(40, 3)]).is_ok());
    }

    #[test]
    fn test_stock_adjust_never_goes_negative() {
        let mut stock = Stock::from_counts([(40, 2)]).unwrap();
        assert!(!stock.adjust(40, -3));
        assert_eq!(stock.quantity(40), 2);
        assert!(stock.adjust(40, -2));
        assert_eq!(stock.quantity(40), 0);
        assert!(!stock.adjust(50, 1));
    }

    #[test]
    fn test_stock_availability() {
        let stock = Stock::from_counts([(38, 4)]).unwrap();
        assert!(stock.is_available(38, 4));
        assert!(!stock.is_available(38, 5));
        assert!(!stock.is_available(39, 1));
    }

    #[test]
    fn test_stock_json_uses_string_keys() {
        let stock: Stock = serde_json::from_str(r#"{"36": 1, "44": 7}"#).unwrap();
        assert_eq!(stock.quantity(44), 7);
        assert_eq!(stock.quantity(40), 0);

        let value = serde_json::to_value(&stock).unwrap();
        assert_eq!(value["36"], 1);

        assert!(serde_json::from_str::<Stock>(r#"{"XL": 1}"#).is_err());
    }

    #[test]
    fn test_changes_apply_only_present_fields() {
        let mut product = NewProduct {
            name: "Air Max 90".into(),
            description: None,
            price: 129.99,
            stock: Stock::empty(),
            category_id: 1,
            image: None,
        }
        .into_product(3);

        let changes = ProductChanges {
            price: Some(99.0),
            ..Default::default()
        };
        assert!(!changes.is_empty());
        changes.apply(&mut product);

        assert_eq!(product.id, 3);
        assert_eq!(product.name, "Air Max 90");
        assert_eq!(product.price, 99.0);
        assert!(ProductChanges::default().is_empty());
    }

    #[test]
    fn test_image_ref_classification() {
        assert_eq!(
            ImageRef::parse("https://cdn.example.com/a.png"),
            Some(ImageRef::Remote("https://cdn.example.com/a.png".into()))
        );
        assert_eq!(
            ImageRef::parse("/uploads/a.png"),
            Some(ImageRef::Upload("/uploads/a.png".into()))
        );
        assert_eq!(ImageRef::parse("   "), None);
    }
}
