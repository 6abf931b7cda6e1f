/// Handler Module Index
///
/// Handlers are grouped by service area. All of them are thin: validate the
/// request, read or mutate the collection store, compute a simple aggregate,
/// serialize JSON.

/// Game catalog browsing and the recommendation endpoints.
pub mod catalog;

/// Developer portal: registration, API keys, webhooks, SDK registry,
/// sandboxes, documentation, rate-limit status.
pub mod portal;

/// Product analytics: players, sessions, events, funnels, experiments,
/// retention, churn, dashboards.
pub mod analytics;

/// Admin-only platform management.
pub mod admin;

pub use admin::*;
pub use analytics::*;
pub use catalog::*;
pub use portal::*;
