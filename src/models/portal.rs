use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Developer identity ---

/// Developer
///
/// The canonical third-party developer record. The `role` field drives RBAC
/// ("developer" or "admin"); the `plan` field is the account-level tier that
/// caps what tier new API keys may request.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Developer {
    pub id: Uuid,
    pub email: String,
    pub studio_name: String,
    // RBAC field: 'developer' or 'admin'.
    pub role: String,
    // Account tier: 'free', 'pro' or 'enterprise'. New keys cannot exceed it.
    pub plan: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// RegisterDeveloperRequest
///
/// Input payload for the public registration endpoint (POST /register).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterDeveloperRequest {
    pub email: String,
    pub studio_name: String,
}

/// RegisterDeveloperResponse
///
/// Registration hands back the developer record together with the initial
/// free-tier API key, since the key secret is only shown once.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterDeveloperResponse {
    pub developer: Developer,
    pub api_key: ApiKey,
}

// --- API keys & rate limits ---

/// ApiKey
///
/// A tiered credential for the authenticated API surface. Revocation marks
/// the record rather than deleting it, so the key history stays auditable.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ApiKey {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub name: String,
    /// The bearer secret presented in the `x-api-key` header.
    pub secret: String,
    // 'free', 'pro' or 'enterprise'. Drives the rate-limit quota and
    // tier-gated endpoints.
    pub tier: String,
    pub revoked: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// CreateKeyRequest
///
/// Input payload for minting an additional key. The tier defaults to the
/// developer's plan and may never exceed it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateKeyRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

/// RateLimitStatus
///
/// Output schema for GET /limits: the calling key's consumption within the
/// current fixed window.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RateLimitStatus {
    pub tier: String,
    pub limit: u32,
    pub used: u32,
    pub remaining: u32,
    pub window_seconds: u64,
}

// --- Webhooks ---

/// Webhook
///
/// A developer-registered delivery target. `last_delivery_status` records the
/// outcome of the most recent test delivery ("2xx", "failed", ...).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Webhook {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub url: String,
    /// Subscribed event kinds, e.g. "player.created" or "session.ended".
    pub events: Vec<String>,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_delivery_status: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// CreateWebhookRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateWebhookRequest {
    pub url: String,
    pub events: Vec<String>,
}

/// UpdateWebhookRequest
///
/// Partial update payload; only provided fields are applied.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateWebhookRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

// --- SDK registry ---

/// Sdk
///
/// A registry entry for an official GameVerse SDK. Only admins publish;
/// unpublished entries are invisible on the public listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Sdk {
    pub id: Uuid,
    pub name: String,
    pub language: String,
    pub version: String,
    pub download_url: String,
    pub published: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// PublishSdkRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PublishSdkRequest {
    pub name: String,
    pub language: String,
    pub version: String,
    pub download_url: String,
}

/// UpdateSdkRequest
///
/// Partial update; setting `published: false` yanks the entry from the
/// public listing without deleting it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateSdkRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

// --- Sandboxes ---

/// Sandbox
///
/// An isolated play area pre-seeded with sample players and events. Reset
/// restores the seed counts and bumps `reset_count`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Sandbox {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub name: String,
    pub seeded_players: i64,
    pub seeded_events: i64,
    pub reset_count: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// CreateSandboxRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateSandboxRequest {
    pub name: String,
}

// --- Documentation ---

/// DocPage
///
/// A documentation page. The public listing and slug lookup only expose
/// pages with `published = true`; authoring happens on the admin routes.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DocPage {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub published: bool,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// CreateDocPageRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateDocPageRequest {
    pub slug: String,
    pub title: String,
    pub body: String,
    pub published: bool,
}

/// UpdateDocPageRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateDocPageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

// --- Admin dashboard ---

/// AdminStats
///
/// Output schema for the platform-wide statistics dashboard (GET /admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminStats {
    pub total_developers: i64,
    pub total_keys: i64,
    pub total_webhooks: i64,
    pub total_players: i64,
    pub total_sessions: i64,
    pub total_events: i64,
    /// Registry entries not yet visible on the public SDK listing.
    pub unpublished_sdks: i64,
}
