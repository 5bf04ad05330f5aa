use analytics::MetricsDeriver;
use axum::{routing::get, Router};
use configuration::{Config, Dashboard};
use database::DbRepository;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub db_repo: DbRepository,
    pub dashboard: Dashboard,
    pub deriver: MetricsDeriver,
}

impl AppState {
    pub fn new(db_repo: DbRepository, dashboard: Dashboard) -> Self {
        Self {
            db_repo,
            dashboard,
            deriver: MetricsDeriver::new(),
        }
    }
}

/// Builds the API router. Kept separate from `run_server` so tests can drive it directly.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/filters", get(handlers::get_filter_options))
        .route("/api/metrics/summary", get(handlers::get_key_metrics))
        .route("/api/metrics/yoy", get(handlers::get_yoy_growth))
        .route("/api/metrics/qoq", get(handlers::get_qoq_growth))
        .route("/api/metrics/growth/latest", get(handlers::get_latest_growth))
        .route("/api/metrics/market-share", get(handlers::get_market_share))
        .route("/api/metrics/market-share/latest", get(handlers::get_latest_market_share))
        .route("/api/metrics/market-share/leaders", get(handlers::get_share_leaders))
        .route("/api/trends/categories", get(handlers::get_category_trends))
        .route("/api/trends/manufacturers", get(handlers::get_manufacturer_trends))
        .route("/api/summary/categories", get(handlers::get_category_summary))
        .route("/api/summary/states", get(handlers::get_state_summary))
        .route("/api/records", get(handlers::get_records))
        .route("/api/records/export", get(handlers::export_records))
        .with_state(state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// Connects to the database, applies migrations, and serves the API until shutdown.
///
/// Tracing is expected to be initialized by the caller.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let db_pool = database::connect(&config.database.url, config.database.max_connections).await?;
    database::run_migrations(&db_pool).await?;
    let db_repo = DbRepository::new(db_pool);

    let app_state = Arc::new(AppState::new(db_repo, config.dashboard.clone()));
    let app = build_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
