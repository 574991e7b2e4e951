use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use elevated::{
    db::{PostgresConnectionStore, PostgresRequestStore},
    get_db_pool, handlers,
    services::channels::HttpChannelProvisioner,
    utils, Config, MentorshipService,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    let config = Config::from_env()?;
    let db_config = elevated::db::DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    // Run migrations
    elevated::db::migrations::run_migrations(&pool).await?;

    let service = Arc::new(MentorshipService::new(
        Arc::new(PostgresRequestStore::new(pool.clone())),
        Arc::new(PostgresConnectionStore::new(pool)),
        Arc::new(HttpChannelProvisioner::new(
            config.messaging_api_url.clone(),
            config.messaging_api_key.clone(),
        )),
    ));

    let port = config.port;
    let app = create_router(service, &config);

    let listener = tokio::net::TcpListener::bind(&format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Server running on port {}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(service: Arc<MentorshipService>, config: &Config) -> Router {
    let cors_layer = create_cors_layer(config);

    Router::new()
        .route("/health", get(health_check))
        // Mentorship protocol endpoints
        .route("/api/requests", post(handlers::submit_request))
        .route(
            "/api/requests/{request_id}/resolve",
            post(handlers::resolve_request),
        )
        // Live read views (SSE)
        .route(
            "/api/mentors/{mentor_id}/requests/watch",
            get(handlers::watch_pending_requests),
        )
        .route(
            "/api/connections/{role}/{user_id}/watch",
            get(handlers::watch_connections),
        )
        .layer(cors_layer)
        .with_state(service)
}

fn create_cors_layer(_config: &Config) -> CorsLayer {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false);

    // Check if ALLOWED_ORIGINS environment variable is set for multiple domains
    if let Ok(cors_origins) = std::env::var("ALLOWED_ORIGINS") {
        let origins: Vec<HeaderValue> = cors_origins
            .split(',')
            .filter_map(|origin| {
                let trimmed = origin.trim();
                if !trimmed.is_empty() {
                    trimmed.parse().ok()
                } else {
                    None
                }
            })
            .collect();

        if !origins.is_empty() {
            cors = cors.allow_origin(origins);
        } else {
            // Fallback to permissive if parsing fails
            cors = cors.allow_origin(Any);
        }
    } else {
        // Default to permissive for development
        cors = cors.allow_origin(Any);
    }

    cors
}

async fn health_check() -> &'static str {
    "OK"
}
