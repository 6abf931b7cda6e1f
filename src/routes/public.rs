use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any
/// client. These routes handle read-only catalog and documentation access
/// plus developer registration.
///
/// Security Mandate:
/// The SDK and documentation handlers must only return records with
/// `published = true`; drafts and yanked entries stay admin-only.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitors and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // Developer account creation; also mints the initial free-tier key.
        .route("/register", post(handlers::register_developer))
        // GET /games?genre=...&search=...
        // Catalog listing with genre filter, title search and pagination.
        .route("/games", get(handlers::get_games))
        // GET /games/{id}
        // Single catalog entry.
        .route("/games/{id}", get(handlers::get_game))
        // GET /sdks, GET /sdks/{id}
        // Published SDK registry entries only.
        .route("/sdks", get(handlers::get_sdks))
        .route("/sdks/{id}", get(handlers::get_sdk))
        // GET /docs, GET /docs/{slug}
        // Published documentation pages only.
        .route("/docs", get(handlers::get_docs))
        .route("/docs/{slug}", get(handlers::get_doc))
}
