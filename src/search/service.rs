//! Search gateway: request coercion, execution and response shaping

use crate::search::client::{RawHit, RawSearchResponse, SearchEngine};
use crate::search::config::SearchConfig;
use crate::search::document::ProductDocument;
use crate::search::error::SearchResult;
use crate::search::query::{QueryTranslator, SearchRequest, SUGGESTION_NAME};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Raw query-string parameters as received over HTTP
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub categoria: Option<String>,
    #[serde(rename = "minPrecio")]
    pub min_precio: Option<String>,
    #[serde(rename = "maxPrecio")]
    pub max_precio: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// One matched product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductHit {
    pub id: String,

    #[serde(flatten)]
    pub document: ProductDocument,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub highlight: Option<HashMap<String, Vec<String>>>,
}

impl From<RawHit> for ProductHit {
    fn from(hit: RawHit) -> Self {
        Self {
            id: hit.id,
            document: hit.source.unwrap_or_default(),
            highlight: hit.highlight,
        }
    }
}

/// Did-you-mean proposal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub text: String,
    pub score: f64,
}

/// A page of search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultSet {
    /// Hits in relevance order, ties broken by name
    pub hits: Vec<ProductHit>,

    /// Total matches across all pages
    pub total: u64,

    pub page: u32,

    pub page_size: u32,

    pub total_pages: u64,

    /// At most one spelling suggestion
    pub suggestions: Vec<Suggestion>,

    pub took_ms: u64,
}

/// Public entry point for product search
pub struct SearchGateway {
    engine: Arc<dyn SearchEngine>,
    translator: QueryTranslator,
    index_name: String,
    default_page_size: u32,
    max_page_size: u32,
    max_result_window: u64,
}

impl SearchGateway {
    pub fn new(engine: Arc<dyn SearchEngine>, config: &SearchConfig) -> Self {
        Self {
            engine,
            translator: QueryTranslator::new(),
            index_name: config.index_name.clone(),
            default_page_size: config.default_page_size.max(1),
            max_page_size: config.max_page_size.max(1),
            max_result_window: config.max_result_window,
        }
    }

    /// Turn raw parameters into a request, defaulting instead of rejecting
    pub fn coerce(&self, params: &SearchParams) -> SearchRequest {
        let page = parse_positive(params.page.as_deref()).unwrap_or(1);
        let page_size = parse_positive(params.limit.as_deref())
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size);

        let mut request = SearchRequest::default()
            .with_price_range(
                parse_price_bound(params.min_precio.as_deref()),
                parse_price_bound(params.max_precio.as_deref()),
            )
            .with_page(page)
            .with_page_size(page_size);
        if let Some(q) = &params.q {
            request = request.with_query(q.as_str());
        }
        if let Some(category) = &params.categoria {
            request = request.with_category(category.as_str());
        }
        request
    }

    /// Coerce and run a search from raw parameters
    pub async fn search_params(&self, params: &SearchParams) -> SearchResult<SearchResultSet> {
        let request = self.coerce(params);
        self.search(&request).await
    }

    pub async fn search(&self, request: &SearchRequest) -> SearchResult<SearchResultSet> {
        let started = Instant::now();
        let mut body = self.translator.translate(request);

        // The engine rejects pages past its result window; ask for the
        // count only so the caller still gets `total` and an empty page.
        if request.offset() + u64::from(request.page_size) > self.max_result_window {
            debug!(
                page = request.page,
                page_size = request.page_size,
                max_result_window = self.max_result_window,
                "Requested page lies beyond the result window"
            );
            body["from"] = json!(0);
            body["size"] = json!(0);
        }

        let response = self
            .engine
            .search(&self.index_name, &body)
            .await
            .map_err(|e| {
                error!(index = %self.index_name, error = %e, "Product search failed");
                e
            })?;

        let result = shape_response(response, request, started.elapsed().as_millis() as u64);
        debug!(
            query = ?request.query,
            total = result.total,
            page = result.page,
            took_ms = result.took_ms,
            "Product search executed"
        );
        Ok(result)
    }
}

fn shape_response(response: RawSearchResponse, request: &SearchRequest, took_ms: u64) -> SearchResultSet {
    let total = response.hits.total.value();
    let suggestions = response
        .suggest
        .get(SUGGESTION_NAME)
        .and_then(|entries| entries.first())
        .and_then(|entry| entry.options.first())
        .map(|option| Suggestion {
            text: option.text.clone(),
            score: option.score,
        })
        .into_iter()
        .collect();

    SearchResultSet {
        hits: response.hits.hits.into_iter().map(ProductHit::from).collect(),
        total,
        page: request.page,
        page_size: request.page_size,
        total_pages: total_pages(total, request.page_size),
        suggestions,
        took_ms,
    }
}

/// `ceil(total / page_size)`
pub fn total_pages(total: u64, page_size: u32) -> u64 {
    let size = u64::from(page_size.max(1));
    total.div_ceil(size)
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|&value| value >= 1)
}

fn parse_price_bound(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::client::{RawHits, RawSuggestEntry, RawSuggestOption, TotalHits};

    fn params(pairs: &[(&str, &str)]) -> SearchParams {
        let mut params = SearchParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "q" => params.q = value,
                "categoria" => params.categoria = value,
                "minPrecio" => params.min_precio = value,
                "maxPrecio" => params.max_precio = value,
                "page" => params.page = value,
                "limit" => params.limit = value,
                _ => unreachable!(),
            }
        }
        params
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, 0), 5);
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_positive(Some("3")), Some(3));
        assert_eq!(parse_positive(Some("0")), None);
        assert_eq!(parse_positive(Some("-2")), None);
        assert_eq!(parse_positive(Some("abc")), None);
        assert_eq!(parse_price_bound(Some("150")), Some(150.0));
        assert_eq!(parse_price_bound(Some("NaN")), None);
        assert_eq!(parse_price_bound(None), None);
    }

    #[test]
    fn test_shape_response() {
        let response = RawSearchResponse {
            hits: RawHits {
                total: TotalHits::Object { value: 21 },
                hits: vec![RawHit {
                    id: "2".into(),
                    score: Some(3.2),
                    source: Some(ProductDocument {
                        name: "Air Jordan 1".into(),
                        price: 179.99,
                        category: "basketball".into(),
                        ..Default::default()
                    }),
                    highlight: None,
                }],
            },
            suggest: HashMap::from([(
                SUGGESTION_NAME.to_string(),
                vec![RawSuggestEntry {
                    text: "air jordn".into(),
                    options: vec![RawSuggestOption {
                        text: "air jordan".into(),
                        score: 0.8,
                    }],
                }],
            )]),
        };
        let request = SearchRequest::new("air jordn").with_page_size(10);

        let result = shape_response(response, &request, 4);
        assert_eq!(result.total, 21);
        assert_eq!(result.total_pages, 3);
        assert_eq!(result.hits[0].id, "2");
        assert_eq!(result.hits[0].document.name, "Air Jordan 1");
        assert_eq!(
            result.suggestions,
            vec![Suggestion {
                text: "air jordan".into(),
                score: 0.8
            }]
        );
    }

    #[test]
    fn test_hit_serialization_is_flat() {
        let hit = ProductHit {
            id: "9".into(),
            document: ProductDocument {
                name: "Air Max 90".into(),
                price: 129.99,
                ..Default::default()
            },
            highlight: Some(HashMap::from([(
                "name".to_string(),
                vec!["<em>Air</em> Max 90".to_string()],
            )])),
        };

        let value = serde_json::to_value(&hit).unwrap();
        assert_eq!(value["id"], "9");
        assert_eq!(value["name"], "Air Max 90");
        assert_eq!(value["price"], 129.99);
        assert_eq!(value["highlight"]["name"][0], "<em>Air</em> Max 90");
    }

    #[test]
    fn test_coerce_defaults_on_invalid_input() {
        let gateway = SearchGateway::new(
            Arc::new(crate::search::client::ElasticsearchClient::new(&SearchConfig::default()).unwrap()),
            &SearchConfig::default(),
        );

        let request = gateway.coerce(&params(&[("page", "zero"), ("limit", "-5"), ("minPrecio", "cheap")]));
        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, 10);
        assert_eq!(request.min_price, None);

        let request = gateway.coerce(&params(&[
            ("q", " air "),
            ("categoria", "running"),
            ("maxPrecio", "200"),
            ("page", "2"),
            ("limit", "500"),
        ]));
        assert_eq!(request.query.as_deref(), Some("air"));
        assert_eq!(request.category.as_deref(), Some("running"));
        assert_eq!(request.max_price, Some(200.0));
        assert_eq!(request.page, 2);
        assert_eq!(request.page_size, 100);
    }
}
