/// Model Module Index
///
/// Splits the API schemas along the three service areas so each stays
/// readable. Everything is re-exported flat, so handlers and tests can keep
/// importing from `models::` directly.

/// Game catalog and recommendation schemas.
pub mod catalog;

/// Developer-portal schemas: developers, API keys, webhooks, SDKs,
/// sandboxes, documentation pages, rate limits.
pub mod portal;

/// Analytics schemas: players, sessions, events, funnels, experiments,
/// retention, churn, dashboards.
pub mod analytics;

pub use analytics::*;
pub use catalog::*;
pub use portal::*;
