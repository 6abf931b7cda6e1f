use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Players ---

/// Player
///
/// A tracked player, scoped to the developer that ingested it. `external_id`
/// is the developer's own identifier for the player; it is opaque to us.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Player {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub external_id: String,
    pub display_name: String,
    // 'pc', 'console', 'mobile', ... free-form but lowercased on ingest.
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// CreatePlayerRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePlayerRequest {
    pub external_id: String,
    pub display_name: String,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// UpdatePlayerRequest
///
/// Partial update payload; only provided fields are applied.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePlayerRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

// --- Sessions ---

/// Session
///
/// A play session. `ended_at` stays `None` while the session is open; ending
/// an already-ended session is a conflict.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Session {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub player_id: Uuid,
    #[ts(type = "string")]
    pub started_at: DateTime<Utc>,
    #[ts(type = "string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

/// StartSessionRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct StartSessionRequest {
    pub player_id: Uuid,
}

// --- Events ---

/// AnalyticsEvent
///
/// A single tracked event. `properties` is an opaque JSON object; the only
/// property the platform itself interprets is `game_id` on "game_played"
/// events, which feeds the recommendation heuristics.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AnalyticsEvent {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub player_id: Uuid,
    pub name: String,
    #[ts(type = "Record<string, unknown>")]
    pub properties: serde_json::Value,
    #[ts(type = "string")]
    pub occurred_at: DateTime<Utc>,
}

/// IngestEventRequest
///
/// Single-event ingest payload. `occurred_at` defaults to now, allowing
/// clients to backfill with their own timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct IngestEventRequest {
    pub player_id: Uuid,
    pub name: String,
    #[ts(type = "Record<string, unknown>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
    #[ts(type = "string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<DateTime<Utc>>,
}

/// EventBatchRequest
///
/// Batch ingest payload, capped at 500 events per call.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EventBatchRequest {
    pub events: Vec<IngestEventRequest>,
}

/// EventBatchResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EventBatchResponse {
    pub accepted: i64,
}

// --- Funnels ---

/// Funnel
///
/// An ordered list of 2..=10 event names. Results are computed on demand by
/// scanning the event collection; nothing is materialized.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Funnel {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub name: String,
    pub steps: Vec<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// CreateFunnelRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateFunnelRequest {
    pub name: String,
    pub steps: Vec<String>,
}

/// FunnelStepResult
///
/// Per-step slice of a funnel report. `conversion_from_previous_pct` is 100
/// for the first step by definition.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FunnelStepResult {
    pub name: String,
    pub entered: i64,
    pub conversion_from_previous_pct: f64,
}

/// FunnelResults
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FunnelResults {
    pub funnel_id: Uuid,
    pub name: String,
    pub steps: Vec<FunnelStepResult>,
    /// Last-step entrants as a percentage of first-step entrants.
    pub overall_conversion_pct: f64,
}

// --- Experiments ---

/// Variant
///
/// One experiment arm. Weights across an experiment's variants must sum
/// to 100.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Variant {
    pub name: String,
    pub weight: u32,
}

/// Experiment
///
/// An A/B experiment with 2..=5 weighted variants. Conversion is measured
/// against `goal_event`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Experiment {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub name: String,
    pub goal_event: String,
    pub variants: Vec<Variant>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// CreateExperimentRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateExperimentRequest {
    pub name: String,
    pub goal_event: String,
    pub variants: Vec<Variant>,
}

/// Assignment
///
/// A player's variant assignment. Assignment is deterministic (a hash of the
/// player id picks the weight bucket), so re-assigning returns the same row.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Assignment {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub experiment_id: Uuid,
    pub player_id: Uuid,
    pub variant: String,
    #[ts(type = "string")]
    pub assigned_at: DateTime<Utc>,
}

/// AssignRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AssignRequest {
    pub player_id: Uuid,
}

/// VariantResult
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct VariantResult {
    pub name: String,
    pub assigned: i64,
    pub conversions: i64,
    pub conversion_rate_pct: f64,
}

/// ExperimentResults
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ExperimentResults {
    pub experiment_id: Uuid,
    pub name: String,
    pub variants: Vec<VariantResult>,
}

// --- Retention & churn ---

/// RetentionReport
///
/// Output of GET /analytics/retention: how many players created at least
/// `window_days` ago came back within the last `window_days`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RetentionReport {
    pub window_days: i64,
    pub cohort_size: i64,
    pub retained: i64,
    pub retention_pct: f64,
}

/// ChurnPrediction
///
/// Output of the churn endpoint. The probability is a toy heuristic over
/// recency, frequency and session length — not a trained model.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ChurnPrediction {
    pub player_id: Uuid,
    pub churn_probability: f64,
    /// "low" | "medium" | "high", banded from the probability.
    pub risk: String,
    pub days_since_last_session: i64,
    pub total_sessions: i64,
}

// --- Dashboards ---

/// Widget
///
/// One tile on a dashboard. `kind` must be one of "counter", "timeseries",
/// "table" or "funnel"; `metric` is the free-form metric name it displays.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Widget {
    pub title: String,
    pub kind: String,
    pub metric: String,
}

/// Dashboard
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Dashboard {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub name: String,
    pub widgets: Vec<Widget>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// CreateDashboardRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateDashboardRequest {
    pub name: String,
    pub widgets: Vec<Widget>,
}

/// UpdateDashboardRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateDashboardRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widgets: Option<Vec<Widget>>,
}

/// DashboardSummary
///
/// The aggregate counters behind GET /analytics/dashboards/{id}/summary,
/// computed for the owning developer's data.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DashboardSummary {
    pub dashboard_id: Uuid,
    pub players: i64,
    pub sessions: i64,
    pub events: i64,
    pub avg_session_minutes: f64,
    pub events_per_player: f64,
}
