use std::sync::Arc;

use gameverse_backend::{
    AppConfig, AppState, HttpWebhookTransport, RateLimiter, Store, config::Env, create_router,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main Entry Point
///
/// Initializes the application environment, builds the shared state
/// (in-memory store, rate limiter, webhook transport), and starts the
/// Axum HTTP server.
#[tokio::main]
async fn main() {
    // 1. Environment Setup: load .env variables for local development.
    dotenv::dotenv().ok();

    // 2. Configuration: fail-fast load of all required settings.
    let config = AppConfig::load();

    // 3. Logging: RUST_LOG wins; otherwise a sensible default per layer.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gameverse_backend=debug,tower_http=info,axum=trace".into());

    // Pretty output for local debugging, JSON for log aggregators in prod.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!(env = ?config.env, "starting gameverse backend");

    // 4. Storage: in-memory store (catalog pre-seeded) plus the bootstrap
    // admin account from configuration.
    let store = Arc::new(Store::new());
    store.bootstrap_admin(&config.admin_email, &config.admin_api_key);

    // 5. Rate Limiting: fixed-window counters shared across requests.
    let limiter = Arc::new(RateLimiter::new(config.rate_window_secs));

    // 6. Webhook Delivery: real HTTP transport for runtime use.
    let transport = Arc::new(HttpWebhookTransport::new());

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        store,
        config,
        limiter,
        transport,
    };

    // 7. Router Assembly and Server Startup
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: failed to bind server address");

    tracing::info!("listening on {bind_addr}");

    axum::serve(listener, app)
        .await
        .expect("FATAL: server error");
}
