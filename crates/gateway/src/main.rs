//! StudyForge API Gateway
//!
//! The single entry point for all external API requests. Handles:
//! - PDF upload and ingestion
//! - Artifact generation endpoints (one per artifact type)
//! - Content search and store statistics
//! - Artifact file download
//! - Rate limiting and observability (logging, metrics, tracing)

mod handlers;
mod middleware;
mod outputs;

use axum::{
    error_handling::HandleErrorLayer,
    http::StatusCode,
    routing::{get, post},
    BoxError, Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use studyforge_common::{
    config::AppConfig,
    db::DbPool,
    embeddings::create_embedder,
    llm::create_generator,
    metrics,
    store::{ChunkSource, ContentStore},
};
use studyforge_generation::ContentGenerator;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub store: Arc<ContentStore>,
    pub generator: Arc<ContentGenerator>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .json()
        .init();

    info!("Starting StudyForge API Gateway v{}", studyforge_common::VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;

    let config = Arc::new(config);

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()?;
        info!("Prometheus metrics listening on {}", metrics_addr);
    }

    // Ensure working directories exist
    std::fs::create_dir_all(&config.storage.uploads_dir)?;
    std::fs::create_dir_all(&config.storage.outputs_dir)?;

    // Initialize database connection and the content store
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    let embedder = create_embedder(&config.embedding)?;
    let store = Arc::new(ContentStore::new(db.clone(), embedder));
    store.ensure_schema().await?;

    // Initialize the text-generation backend; a provider without
    // credentials refuses to start here
    let llm = create_generator(&config.llm)?;
    let source: Arc<dyn ChunkSource> = store.clone();
    let generator = Arc::new(ContentGenerator::new(source, llm, config.llm.max_tokens));

    // Create app state
    let state = AppState {
        config: config.clone(),
        db,
        store,
        generator,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        .route("/stats", get(handlers::stats::get_stats))
        .route("/upload-pdf", post(handlers::upload::upload_pdf))
        .route("/search", get(handlers::search::search_content))
        .route("/download/{filename}", get(handlers::download::download_file))
        // Generation endpoints, one per artifact type
        .route("/generate/mcq", post(handlers::generate::generate_mcq))
        .route("/generate/fill-blanks", post(handlers::generate::generate_fill_blanks))
        .route("/generate/short-answer", post(handlers::generate::generate_short_answer))
        .route("/generate/long-answer", post(handlers::generate::generate_long_answer))
        .route(
            "/generate/very-short-answer",
            post(handlers::generate::generate_very_short_answer),
        )
        .route("/generate/flashcards", post(handlers::generate::generate_flashcards))
        .route("/generate/notes", post(handlers::generate::generate_notes))
        .route("/generate/worksheet", post(handlers::generate::generate_worksheet))
        .route("/generate/exam", post(handlers::generate::generate_exam));

    let mut app = Router::new()
        // Health endpoints (outside /api, no rate limiting concerns)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/api", api_routes);

    // Token-bucket rate limiting
    if state.config.rate_limit.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(
            state.config.rate_limit.requests_per_second,
            state.config.rate_limit.burst,
        );
        app = app.layer(axum::middleware::from_fn(
            move |request: axum::extract::Request, next: axum::middleware::Next| {
                let limiter = limiter.clone();
                async move {
                    middleware::rate_limit::rate_limit_middleware(request, next, limiter).await
                }
            },
        ));
    }

    let request_timeout = state.config.request_timeout();

    app.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_timeout_error))
            .layer(tower::timeout::TimeoutLayer::new(request_timeout)),
    )
    .layer(TraceLayer::new_for_http())
    .layer(cors)
    .layer(request_id)
    .layer(propagate_id)
    .with_state(state)
}

/// Map router-level timeouts to a client-visible status
async fn handle_timeout_error(err: BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            "Request took too long".to_string(),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Unhandled internal error: {}", err),
        )
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
