use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to developers with the 'admin'
/// role: platform oversight, SDK registry publishing, documentation
/// authoring, and the key-revocation override.
///
/// Access Control:
/// Each handler authenticates via the `AuthDev` extractor and then
/// explicitly checks `role == "admin"` before touching any data, so a
/// routing mistake alone can never expose these endpoints.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Platform-wide counters (developers, keys, players, events, ...).
        .route("/stats", get(handlers::get_admin_stats))
        // GET /admin/developers
        // Every registered developer account, for support and oversight.
        .route("/developers", get(handlers::list_developers))
        // POST /admin/sdks, PUT /admin/sdks/{id}
        // SDK registry publishing and updates (including yanking).
        .route("/sdks", post(handlers::publish_sdk))
        .route("/sdks/{id}", put(handlers::update_sdk))
        // POST /admin/docs, PUT /admin/docs/{slug}
        // Documentation authoring; the `published` flag gates public reads.
        .route("/docs", post(handlers::create_doc_page))
        .route("/docs/{slug}", put(handlers::update_doc_page))
        // DELETE /admin/keys/{id}
        // Revoke ANY key regardless of owner (abuse handling).
        .route("/keys/{id}", delete(handlers::admin_revoke_key))
}
