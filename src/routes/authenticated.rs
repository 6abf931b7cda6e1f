use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// Every handler here takes the `AuthDev` extractor: a valid API key (or
/// the local dev bypass) is required, and each request is counted against
/// the key's rate-limit window before the handler body runs.
///
/// Tier gates (experiments, churn, extra sandboxes) are enforced inside the
/// handlers, where the specific tier requirement is known.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // --- Recommendations ---
        .route(
            "/recommendations/{player_id}",
            get(handlers::get_recommendations),
        )
        .route("/games/{id}/similar", get(handlers::get_similar_games))
        // --- API keys & limits ---
        .route("/keys", post(handlers::create_key).get(handlers::list_keys))
        .route("/keys/{id}", delete(handlers::revoke_key))
        .route("/limits", get(handlers::rate_limit_status))
        // --- Webhooks ---
        .route(
            "/webhooks",
            post(handlers::create_webhook).get(handlers::list_webhooks),
        )
        .route(
            "/webhooks/{id}",
            put(handlers::update_webhook).delete(handlers::delete_webhook),
        )
        .route("/webhooks/{id}/test", post(handlers::test_webhook))
        // --- Sandboxes ---
        .route(
            "/sandboxes",
            post(handlers::create_sandbox).get(handlers::list_sandboxes),
        )
        .route(
            "/sandboxes/{id}",
            get(handlers::get_sandbox).delete(handlers::delete_sandbox),
        )
        .route("/sandboxes/{id}/reset", post(handlers::reset_sandbox))
        // --- Analytics: players ---
        .route(
            "/analytics/players",
            post(handlers::create_player).get(handlers::list_players),
        )
        .route(
            "/analytics/players/{id}",
            get(handlers::get_player)
                .put(handlers::update_player)
                .delete(handlers::delete_player),
        )
        .route(
            "/analytics/players/{id}/churn",
            get(handlers::churn_prediction),
        )
        // --- Analytics: sessions ---
        .route(
            "/analytics/sessions",
            post(handlers::start_session).get(handlers::list_sessions),
        )
        .route("/analytics/sessions/{id}/end", post(handlers::end_session))
        // --- Analytics: events ---
        .route(
            "/analytics/events",
            post(handlers::ingest_event).get(handlers::list_events),
        )
        .route("/analytics/events/batch", post(handlers::ingest_event_batch))
        // --- Analytics: funnels ---
        .route(
            "/analytics/funnels",
            post(handlers::create_funnel).get(handlers::list_funnels),
        )
        .route(
            "/analytics/funnels/{id}/results",
            get(handlers::funnel_results),
        )
        // --- Analytics: experiments (pro tier) ---
        .route(
            "/analytics/experiments",
            post(handlers::create_experiment).get(handlers::list_experiments),
        )
        .route(
            "/analytics/experiments/{id}/assign",
            post(handlers::assign_player),
        )
        .route(
            "/analytics/experiments/{id}/results",
            get(handlers::experiment_results),
        )
        // --- Analytics: retention ---
        .route("/analytics/retention", get(handlers::retention_report))
        // --- Analytics: dashboards ---
        .route(
            "/analytics/dashboards",
            post(handlers::create_dashboard).get(handlers::list_dashboards),
        )
        .route(
            "/analytics/dashboards/{id}",
            get(handlers::get_dashboard)
                .put(handlers::update_dashboard)
                .delete(handlers::delete_dashboard),
        )
        .route(
            "/analytics/dashboards/{id}/summary",
            get(handlers::dashboard_summary),
        )
}
