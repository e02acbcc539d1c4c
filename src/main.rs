use anyhow::Context;
use std::sync::Arc;
use storefront_search::{
    api::{build_router, AppState},
    catalog::{InMemoryProductStore, ProductService, ProductStore},
    config::Config,
    search::{
        BulkResynchronizer, DocumentProjector, ElasticsearchClient, IndexSchemaManager,
        SearchEngine, SearchGateway, SyncWriter,
    },
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_result = Config::load();
    let config = config_result.as_ref().cloned().unwrap_or_default();

    init_tracing(&config);

    if let Err(e) = config_result {
        tracing::warn!("Failed to load configuration: {}", e);
        tracing::warn!("Using default configuration");
    }

    tracing::info!(
        "Starting {} v{}",
        config.observability.service_name,
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("Deployment mode: {:?}", config.deployment.mode);

    // Search engine client
    let engine: Arc<dyn SearchEngine> = Arc::new(
        ElasticsearchClient::new(&config.search).context("invalid search configuration")?,
    );
    tracing::info!(
        node = %config.search.node_url,
        index = %config.search.index_name,
        "Search engine client initialized"
    );

    // The index must exist before any traffic is served
    let schema = Arc::new(IndexSchemaManager::new(
        engine.clone(),
        config.search.index_name.clone(),
        config.search.analyzer.clone(),
    ));
    schema
        .ensure_index()
        .await
        .context("search index setup failed")?;
    tracing::info!("Search index ready");

    // Catalog and sync components
    let store: Arc<dyn ProductStore> = Arc::new(InMemoryProductStore::new());
    let writer = Arc::new(SyncWriter::new(
        engine.clone(),
        store.clone(),
        DocumentProjector::new(config.search.default_category.clone()),
        config.search.index_name.clone(),
    ));
    let resync = Arc::new(BulkResynchronizer::new(
        schema,
        writer.clone(),
        store.clone(),
        config.search.resync_concurrency,
    ));
    let products = Arc::new(ProductService::new(store, writer));
    let gateway = Arc::new(SearchGateway::new(engine, &config.search));

    let app_state = AppState::new(products, gateway, resync)
        .with_error_details(config.expose_error_details());
    let app = build_router(app_state);

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("failed to bind {}", http_addr))?;

    tracing::info!("HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Search: http://{}/search?q=", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Shut down gracefully");
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "storefront_search={},tower_http=info",
            config.observability.log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
