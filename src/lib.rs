use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod collection;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod models;
pub mod ratelimit;
pub mod scoring;
pub mod store;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use config::AppConfig;
pub use dispatch::{HttpWebhookTransport, MockWebhookTransport, TransportState};
pub use ratelimit::{RateLimiter, RateLimiterState};
pub use store::{Store, StoreState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the platform.
/// It aggregates every API path and data schema decorated with the
/// `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` macros.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    // List all handler functions here for documentation generation.
    paths(
        handlers::catalog::get_games, handlers::catalog::get_game,
        handlers::catalog::get_similar_games, handlers::catalog::get_recommendations,
        handlers::portal::register_developer, handlers::portal::create_key,
        handlers::portal::list_keys, handlers::portal::revoke_key,
        handlers::portal::rate_limit_status, handlers::portal::create_webhook,
        handlers::portal::list_webhooks, handlers::portal::update_webhook,
        handlers::portal::delete_webhook, handlers::portal::test_webhook,
        handlers::portal::create_sandbox, handlers::portal::list_sandboxes,
        handlers::portal::get_sandbox, handlers::portal::reset_sandbox,
        handlers::portal::delete_sandbox, handlers::portal::get_sdks,
        handlers::portal::get_sdk, handlers::portal::get_docs, handlers::portal::get_doc,
        handlers::analytics::create_player, handlers::analytics::list_players,
        handlers::analytics::get_player, handlers::analytics::update_player,
        handlers::analytics::delete_player, handlers::analytics::start_session,
        handlers::analytics::end_session, handlers::analytics::list_sessions,
        handlers::analytics::ingest_event, handlers::analytics::ingest_event_batch,
        handlers::analytics::list_events, handlers::analytics::create_funnel,
        handlers::analytics::list_funnels, handlers::analytics::funnel_results,
        handlers::analytics::create_experiment, handlers::analytics::list_experiments,
        handlers::analytics::assign_player, handlers::analytics::experiment_results,
        handlers::analytics::retention_report, handlers::analytics::churn_prediction,
        handlers::analytics::create_dashboard, handlers::analytics::list_dashboards,
        handlers::analytics::get_dashboard, handlers::analytics::update_dashboard,
        handlers::analytics::delete_dashboard, handlers::analytics::dashboard_summary,
        handlers::admin::get_admin_stats, handlers::admin::list_developers,
        handlers::admin::publish_sdk, handlers::admin::update_sdk,
        handlers::admin::create_doc_page, handlers::admin::update_doc_page,
        handlers::admin::admin_revoke_key,
    ),
    // List all models (schemas) used in the request/response bodies.
    components(
        schemas(
            models::Game, models::Strategy, models::Recommendation, models::SimilarGame,
            models::Developer, models::RegisterDeveloperRequest,
            models::RegisterDeveloperResponse, models::ApiKey, models::CreateKeyRequest,
            models::RateLimitStatus, models::Webhook, models::CreateWebhookRequest,
            models::UpdateWebhookRequest, models::Sdk, models::PublishSdkRequest,
            models::UpdateSdkRequest, models::Sandbox, models::CreateSandboxRequest,
            models::DocPage, models::CreateDocPageRequest, models::UpdateDocPageRequest,
            models::AdminStats, models::Player, models::CreatePlayerRequest,
            models::UpdatePlayerRequest, models::Session, models::StartSessionRequest,
            models::AnalyticsEvent, models::IngestEventRequest, models::EventBatchRequest,
            models::EventBatchResponse, models::Funnel, models::CreateFunnelRequest,
            models::FunnelStepResult, models::FunnelResults, models::Variant,
            models::Experiment, models::CreateExperimentRequest, models::Assignment,
            models::AssignRequest, models::VariantResult, models::ExperimentResults,
            models::RetentionReport, models::ChurnPrediction, models::Widget,
            models::Dashboard, models::CreateDashboardRequest,
            models::UpdateDashboardRequest, models::DashboardSummary,
        )
    ),
    tags(
        (name = "gameverse", description = "GameVerse Platform API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe container holding all essential application
/// services and configuration, shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Storage Layer: the in-memory collection store.
    pub store: StoreState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
    /// Rate Limiter: fixed-window counters per API key.
    pub limiter: RateLimiterState,
    /// Webhook Delivery: abstract transport (HTTP in prod, mock in tests).
    pub transport: TransportState,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow extractors and handlers to selectively pull
// components from the shared AppState.

impl FromRef<AppState> for StoreState {
    fn from_ref(app_state: &AppState) -> StoreState {
        app_state.store.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for RateLimiterState {
    fn from_ref(app_state: &AppState) -> RateLimiterState {
        app_state.limiter.clone()
    }
}

impl FromRef<AppState> for TransportState {
    fn from_ref(app_state: &AppState) -> TransportState {
        app_state.transport.clone()
    }
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and
/// scoped middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: No authentication.
        .merge(public::public_routes())
        // Authenticated Routes: every handler demands the `AuthDev`
        // extractor, which resolves the API key and counts the request
        // against the rate limit exactly once.
        .merge(authenticated::authenticated_routes())
        // Admin Routes: Nested under '/admin'. The 'admin' role check is
        // performed *inside* the handlers after key authentication.
        .nest("/admin", admin::admin_routes())
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a unique UUID for every request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the request/response lifecycle in
                // a span carrying the generated request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: return the x-request-id header
                // to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes `TraceLayer` span creation: extracts the `x-request-id`
/// header (if present) and includes it alongside the HTTP method and URI,
/// so every log line for a single request is correlated by a unique id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
