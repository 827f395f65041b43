use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use payroll_rs::{
    config::Config,
    db,
    esocial::builders::BuilderRegistry,
    health::health,
    metrics::Metrics,
    middleware::metrics::metrics_middleware,
    routes::{self, AppState},
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    tracing::info!("Starting payroll service...");

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration from environment");

    tracing::info!(
        "Configuration loaded: host={}, port={}",
        config.host,
        config.port
    );

    // Database connection
    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let state = Arc::new(AppState {
        pool,
        metrics: Metrics::new(),
        esocial_registry: BuilderRegistry::with_default_builders(),
    });

    // Build the application router
    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/metrics", get(routes::metrics::metrics))
        .route(
            "/api/payroll/events/consolidate",
            post(routes::events::consolidate_events),
        )
        .route("/api/payroll/events", get(routes::events::list_events))
        .route(
            "/api/payroll/events/approve",
            post(routes::events::approve_events),
        )
        .route(
            "/api/payroll/events/reject",
            post(routes::events::reject_events),
        )
        .route(
            "/api/payroll/calculations",
            post(routes::calculations::calculate).get(routes::calculations::get_calculation),
        )
        .route(
            "/api/payroll/esocial/process",
            post(routes::esocial::process_events),
        )
        .with_state(state.clone())
        .layer(from_fn_with_state(state, metrics_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        );

    // Bind to the configured address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Payroll service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    // Start the server
    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
