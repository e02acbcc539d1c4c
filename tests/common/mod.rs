//! Shared test utilities
//!
//! `FakeSearchEngine` keeps documents in memory and evaluates the subset of
//! the query DSL the gateway emits, so sync and search flows can run end to
//! end without an Elasticsearch node.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use storefront_search::api::AppState;
use storefront_search::catalog::{InMemoryProductStore, ProductService, ProductStore};
use storefront_search::models::{NewProduct, Stock};
use storefront_search::search::{
    BulkResynchronizer, DeleteOutcome, DocumentProjector, IndexSchemaManager, ProductDocument,
    RawHit, RawHits, RawSearchResponse, RawSuggestEntry, RawSuggestOption, SearchConfig,
    SearchEngine, SearchError, SearchGateway, SearchResult, SyncWriter, TotalHits,
    SUGGESTION_NAME,
};

pub const INDEX: &str = "products";

/// Work injected into an engine call before it runs
pub type EngineHook = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

#[derive(Default)]
pub struct FakeSearchEngine {
    indices: Mutex<HashMap<String, BTreeMap<String, ProductDocument>>>,
    definitions: Mutex<HashMap<String, Value>>,
    suggestions: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
    create_calls: AtomicUsize,
    search_calls: AtomicUsize,
    before_listing: Mutex<Option<EngineHook>>,
    before_bulk_delete: Mutex<Option<EngineHook>>,
}

impl FakeSearchEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every subsequent call fail with a transport error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Canned did-you-mean answer for a query text
    pub fn suggest(&self, text: &str, suggestion: &str) {
        self.suggestions
            .lock()
            .unwrap()
            .insert(text.to_lowercase(), suggestion.to_string());
    }

    /// Insert a document directly, bypassing the sync writer
    pub fn seed(&self, id: &str, document: ProductDocument) {
        self.indices
            .lock()
            .unwrap()
            .entry(INDEX.to_string())
            .or_default()
            .insert(id.to_string(), document);
    }

    pub fn document(&self, id: &str) -> Option<ProductDocument> {
        self.indices
            .lock()
            .unwrap()
            .get(INDEX)
            .and_then(|docs| docs.get(id).cloned())
    }

    pub fn document_count(&self) -> usize {
        self.indices
            .lock()
            .unwrap()
            .get(INDEX)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    pub fn definition(&self, index: &str) -> Option<Value> {
        self.definitions.lock().unwrap().get(index).cloned()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Run `hook` once, just before the next index listing
    pub fn before_listing(&self, hook: EngineHook) {
        *self.before_listing.lock().unwrap() = Some(hook);
    }

    /// Run `hook` once, just before the next multi-document delete
    pub fn before_bulk_delete(&self, hook: EngineHook) {
        *self.before_bulk_delete.lock().unwrap() = Some(hook);
    }

    fn check(&self) -> SearchResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(SearchError::Transport("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SearchEngine for FakeSearchEngine {
    async fn index_exists(&self, index: &str) -> SearchResult<bool> {
        self.check()?;
        Ok(self.definitions.lock().unwrap().contains_key(index))
    }

    async fn create_index(&self, index: &str, definition: &Value) -> SearchResult<()> {
        self.check()?;
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.definitions
            .lock()
            .unwrap()
            .insert(index.to_string(), definition.clone());
        self.indices
            .lock()
            .unwrap()
            .entry(index.to_string())
            .or_default();
        Ok(())
    }

    async fn put_document(
        &self,
        index: &str,
        id: &str,
        document: &ProductDocument,
        _refresh: bool,
    ) -> SearchResult<()> {
        self.check()?;
        self.indices
            .lock()
            .unwrap()
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), document.clone());
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &str) -> SearchResult<DeleteOutcome> {
        self.check()?;
        let removed = self
            .indices
            .lock()
            .unwrap()
            .get_mut(index)
            .and_then(|docs| docs.remove(id));
        Ok(match removed {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }

    async fn document_ids(&self, index: &str) -> SearchResult<Vec<String>> {
        let hook = self.before_listing.lock().unwrap().take();
        if let Some(hook) = hook {
            hook().await;
        }
        self.check()?;
        Ok(self
            .indices
            .lock()
            .unwrap()
            .get(index)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_documents(&self, index: &str, ids: &[String]) -> SearchResult<u64> {
        let hook = self.before_bulk_delete.lock().unwrap().take();
        if let Some(hook) = hook {
            hook().await;
        }
        self.check()?;
        let mut indices = self.indices.lock().unwrap();
        let Some(docs) = indices.get_mut(index) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|id, _| !ids.contains(id));
        Ok((before - docs.len()) as u64)
    }

    async fn search(&self, index: &str, body: &Value) -> SearchResult<RawSearchResponse> {
        self.check()?;
        self.search_calls.fetch_add(1, Ordering::SeqCst);

        let docs = self
            .indices
            .lock()
            .unwrap()
            .get(index)
            .cloned()
            .unwrap_or_default();

        let query = &body["query"]["bool"];
        let text = query["must"][0]["multi_match"]["query"].as_str();
        let terms: Vec<String> = text
            .map(|t| t.split_whitespace().map(str::to_lowercase).collect())
            .unwrap_or_default();

        let mut matched: Vec<(f64, String, ProductDocument)> = docs
            .into_iter()
            .filter(|(_, doc)| passes_filters(doc, &query["filter"]))
            .filter_map(|(id, doc)| score(&doc, &terms).map(|s| (s, id, doc)))
            .collect();

        matched.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.2.name.cmp(&b.2.name))
        });

        let total = matched.len() as u64;
        let from = body["from"].as_u64().unwrap_or(0) as usize;
        let size = body["size"].as_u64().unwrap_or(10) as usize;

        let hits = matched
            .into_iter()
            .skip(from)
            .take(size)
            .map(|(score, id, doc)| RawHit {
                id,
                score: Some(score),
                highlight: highlight(&doc, &terms),
                source: Some(doc),
            })
            .collect();

        let mut suggest = HashMap::new();
        if let Some(suggest_text) = body["suggest"]["text"].as_str() {
            let options = self
                .suggestions
                .lock()
                .unwrap()
                .get(&suggest_text.to_lowercase())
                .map(|text| {
                    vec![RawSuggestOption {
                        text: text.clone(),
                        score: 0.8,
                    }]
                })
                .unwrap_or_default();
            suggest.insert(
                SUGGESTION_NAME.to_string(),
                vec![RawSuggestEntry {
                    text: suggest_text.to_string(),
                    options,
                }],
            );
        }

        Ok(RawSearchResponse {
            hits: RawHits {
                total: TotalHits::Object { value: total },
                hits,
            },
            suggest,
        })
    }
}

fn passes_filters(doc: &ProductDocument, filters: &Value) -> bool {
    let Some(filters) = filters.as_array() else {
        return true;
    };
    filters.iter().all(|filter| {
        if let Some(category) = filter["term"]["category"].as_str() {
            return doc.category == category;
        }
        let range = &filter["range"]["price"];
        if range.is_object() {
            let above = range["gte"].as_f64().map_or(true, |min| doc.price >= min);
            let below = range["lte"].as_f64().map_or(true, |max| doc.price <= max);
            return above && below;
        }
        true
    })
}

/// Every term must appear in name (weight 3) or description (weight 1)
fn score(doc: &ProductDocument, terms: &[String]) -> Option<f64> {
    if terms.is_empty() {
        return Some(1.0);
    }
    let name = words(&doc.name);
    let description = words(&doc.description);

    let mut total = 0.0;
    for term in terms {
        if name.contains(term) {
            total += 3.0;
        } else if description.contains(term) {
            total += 1.0;
        } else {
            return None;
        }
    }
    Some(total)
}

fn highlight(doc: &ProductDocument, terms: &[String]) -> Option<HashMap<String, Vec<String>>> {
    if terms.is_empty() || !terms.iter().any(|t| words(&doc.name).contains(t)) {
        return None;
    }
    let marked = doc
        .name
        .split_whitespace()
        .map(|word| {
            if terms.contains(&word.to_lowercase()) {
                format!("<em>{}</em>", word)
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    Some(HashMap::from([("name".to_string(), vec![marked])]))
}

fn words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Fully wired components over a fake engine and an in-memory store
pub struct TestHarness {
    pub engine: Arc<FakeSearchEngine>,
    pub store: Arc<InMemoryProductStore>,
    pub schema: Arc<IndexSchemaManager>,
    pub writer: Arc<SyncWriter>,
    pub resync: Arc<BulkResynchronizer>,
    pub products: Arc<ProductService>,
    pub gateway: Arc<SearchGateway>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    pub fn with_config(config: SearchConfig) -> Self {
        let engine = FakeSearchEngine::new();
        let dyn_engine: Arc<dyn SearchEngine> = engine.clone();
        let store = Arc::new(InMemoryProductStore::new());
        let dyn_store: Arc<dyn ProductStore> = store.clone();

        let schema = Arc::new(IndexSchemaManager::new(
            dyn_engine.clone(),
            config.index_name.clone(),
            config.analyzer.clone(),
        ));
        let writer = Arc::new(SyncWriter::new(
            dyn_engine.clone(),
            dyn_store.clone(),
            DocumentProjector::new(config.default_category.clone()),
            config.index_name.clone(),
        ));
        let resync = Arc::new(BulkResynchronizer::new(
            schema.clone(),
            writer.clone(),
            dyn_store.clone(),
            config.resync_concurrency,
        ));
        let products = Arc::new(ProductService::new(dyn_store, writer.clone()));
        let gateway = Arc::new(SearchGateway::new(dyn_engine, &config));

        Self {
            engine,
            store,
            schema,
            writer,
            resync,
            products,
            gateway,
        }
    }

    pub fn app_state(&self, expose_error_details: bool) -> AppState {
        AppState::new(
            self.products.clone(),
            self.gateway.clone(),
            self.resync.clone(),
        )
        .with_error_details(expose_error_details)
    }

    /// Register a category and return its id
    pub async fn category(&self, name: &str) -> i64 {
        self.store.insert_category(name).await.unwrap().id
    }
}

pub fn new_product(name: &str, price: f64, category_id: i64) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: None,
        price,
        stock: Stock::empty(),
        category_id,
        image: None,
    }
}
