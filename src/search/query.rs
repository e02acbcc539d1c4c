//! Search requests and their translation into the engine's query DSL

use crate::search::schema::{NAME_KEYWORD_FIELD, NAME_LOCALIZED_FIELD};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Name under which the did-you-mean suggestion is requested
pub const SUGGESTION_NAME: &str = "did_you_mean";

/// A validated product search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text term
    pub query: Option<String>,

    /// Exact category label
    pub category: Option<String>,

    /// Inclusive lower price bound
    pub min_price: Option<f64>,

    /// Inclusive upper price bound
    pub max_price: Option<f64>,

    /// 1-based page number
    pub page: u32,

    /// Results per page
    pub page_size: u32,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: None,
            category: None,
            min_price: None,
            max_price: None,
            page: 1,
            page_size: 10,
        }
    }
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self::default().with_query(query)
    }

    /// Blank terms are dropped so filters alone drive the result set
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        let trimmed = query.trim();
        self.query = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        let trimmed = category.trim();
        self.category = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Engine offset for the requested page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.page_size)
    }
}

/// Builds native query bodies from [`SearchRequest`]s
#[derive(Debug, Clone)]
pub struct QueryTranslator {
    name_boost: u32,
    localized_boost: u32,
    description_boost: u32,
}

impl Default for QueryTranslator {
    fn default() -> Self {
        Self {
            name_boost: 3,
            localized_boost: 2,
            description_boost: 1,
        }
    }
}

impl QueryTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(&self, request: &SearchRequest) -> Value {
        let must = match &request.query {
            Some(text) => json!([{
                "multi_match": {
                    "query": text,
                    "fields": [
                        format!("name^{}", self.name_boost),
                        format!("{}^{}", NAME_LOCALIZED_FIELD, self.localized_boost),
                        format!("description^{}", self.description_boost),
                    ],
                    "fuzziness": "AUTO",
                    "operator": "and"
                }
            }]),
            None => json!([{ "match_all": {} }]),
        };

        let mut filter = Vec::new();
        if let Some(category) = &request.category {
            filter.push(json!({ "term": { "category": category } }));
        }
        if request.min_price.is_some() || request.max_price.is_some() {
            let mut range = Map::new();
            if let Some(min) = request.min_price {
                range.insert("gte".to_string(), json!(min));
            }
            if let Some(max) = request.max_price {
                range.insert("lte".to_string(), json!(max));
            }
            filter.push(json!({ "range": { "price": range } }));
        }

        let mut body = json!({
            "query": {
                "bool": {
                    "must": must,
                    "filter": filter
                }
            },
            "highlight": {
                "fields": {
                    "name": {},
                    "description": {}
                }
            },
            "sort": [
                { "_score": { "order": "desc" } },
                { NAME_KEYWORD_FIELD: { "order": "asc" } }
            ],
            "from": request.offset(),
            "size": request.page_size,
            "track_total_hits": true
        });

        // A phrase suggester needs text to work on
        if let Some(text) = &request.query {
            body["suggest"] = json!({
                "text": text,
                SUGGESTION_NAME: {
                    "phrase": {
                        "field": NAME_LOCALIZED_FIELD,
                        "size": 1,
                        "direct_generator": [{
                            "field": NAME_LOCALIZED_FIELD,
                            "suggest_mode": "always",
                            "min_word_length": 3
                        }]
                    }
                }
            });
        }

        body
    }
}
