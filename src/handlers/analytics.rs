use crate::{
    AppState,
    auth::AuthDev,
    error::ApiError,
    models::{
        AnalyticsEvent, AssignRequest, Assignment, ChurnPrediction, CreateDashboardRequest,
        CreateExperimentRequest, CreateFunnelRequest, CreatePlayerRequest, Dashboard,
        DashboardSummary, EventBatchRequest, EventBatchResponse, Experiment, ExperimentResults,
        Funnel, FunnelResults, FunnelStepResult, IngestEventRequest, Player, RetentionReport,
        Session, StartSessionRequest, UpdateDashboardRequest, UpdatePlayerRequest, VariantResult,
        Widget,
    },
    scoring,
    store::paginate,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Widget kinds a dashboard may contain.
pub const WIDGET_KINDS: &[&str] = &["counter", "timeseries", "table", "funnel"];

// --- Filter Structs ---

/// PlayerFilter
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PlayerFilter {
    pub platform: Option<String>,
    pub country: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// SessionFilter
#[derive(Deserialize, utoipa::IntoParams)]
pub struct SessionFilter {
    pub player_id: Option<Uuid>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// EventFilter
///
/// Query parameters for the event listing: name/player filters plus an
/// inclusive RFC3339 time range.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct EventFilter {
    pub name: Option<String>,
    pub player_id: Option<Uuid>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// RetentionQuery
#[derive(Deserialize, utoipa::IntoParams)]
pub struct RetentionQuery {
    /// Cohort window in days, 1..=90. Defaults to 7.
    pub days: Option<i64>,
}

// --- Players ---

/// create_player
///
/// [Authenticated Route] Registers a tracked player under the caller.
#[utoipa::path(
    post,
    path = "/analytics/players",
    request_body = CreatePlayerRequest,
    responses(
        (status = 201, description = "Created", body = Player),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn create_player(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Json(payload): Json<CreatePlayerRequest>,
) -> Result<(StatusCode, Json<Player>), ApiError> {
    if payload.external_id.trim().is_empty() {
        return Err(ApiError::validation("external_id must not be empty"));
    }
    if payload.display_name.trim().is_empty() {
        return Err(ApiError::validation("display_name must not be empty"));
    }
    if payload.platform.trim().is_empty() {
        return Err(ApiError::validation("platform must not be empty"));
    }

    let id = Uuid::new_v4();
    let player = Player {
        id,
        developer_id,
        external_id: payload.external_id.trim().to_string(),
        display_name: payload.display_name.trim().to_string(),
        platform: payload.platform.trim().to_lowercase(),
        country: payload.country,
        created_at: Utc::now(),
    };
    state.store.players.insert(id, player.clone());
    Ok((StatusCode::CREATED, Json(player)))
}

/// list_players
///
/// [Authenticated Route] The caller's players with platform/country filters
/// and pagination, ordered by creation time.
#[utoipa::path(
    get,
    path = "/analytics/players",
    params(PlayerFilter),
    responses((status = 200, description = "Players", body = [Player]))
)]
pub async fn list_players(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Query(filter): Query<PlayerFilter>,
) -> Json<Vec<Player>> {
    let players = state.store.players_for(
        developer_id,
        filter.platform.as_deref(),
        filter.country.as_deref(),
    );
    Json(paginate(players, filter.limit, filter.offset))
}

/// get_player
#[utoipa::path(
    get,
    path = "/analytics/players/{id}",
    params(("id" = Uuid, Path, description = "Player ID")),
    responses(
        (status = 200, description = "Found", body = Player),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_player(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Player>, ApiError> {
    state
        .store
        .player_of(developer_id, id)
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// update_player
///
/// [Authenticated Route] Partial update of a player record.
#[utoipa::path(
    put,
    path = "/analytics/players/{id}",
    params(("id" = Uuid, Path, description = "Player ID")),
    request_body = UpdatePlayerRequest,
    responses(
        (status = 200, description = "Updated", body = Player),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_player(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlayerRequest>,
) -> Result<Json<Player>, ApiError> {
    state
        .store
        .player_of(developer_id, id)
        .ok_or(ApiError::NotFound)?;
    if payload
        .display_name
        .as_deref()
        .is_some_and(|n| n.trim().is_empty())
    {
        return Err(ApiError::validation("display_name must not be empty"));
    }
    if payload
        .platform
        .as_deref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(ApiError::validation("platform must not be empty"));
    }
    let updated = state
        .store
        .players
        .update(id, |p| {
            if let Some(name) = payload.display_name.clone() {
                p.display_name = name.trim().to_string();
            }
            if let Some(platform) = payload.platform.clone() {
                p.platform = platform.trim().to_lowercase();
            }
            if let Some(country) = payload.country.clone() {
                p.country = Some(country);
            }
        })
        .ok_or(ApiError::NotFound)?;
    Ok(Json(updated))
}

/// delete_player
///
/// [Authenticated Route] Removes the player record. Sessions and events the
/// player produced stay behind for aggregate history.
#[utoipa::path(
    delete,
    path = "/analytics/players/{id}",
    params(("id" = Uuid, Path, description = "Player ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_player(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.store.player_of(developer_id, id).is_none() {
        return Err(ApiError::NotFound);
    }
    state.store.players.remove(id);
    Ok(StatusCode::NO_CONTENT)
}

// --- Sessions ---

/// start_session
///
/// [Authenticated Route] Opens a session for a player. The session stays
/// open until explicitly ended.
#[utoipa::path(
    post,
    path = "/analytics/sessions",
    request_body = StartSessionRequest,
    responses(
        (status = 201, description = "Started", body = Session),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn start_session(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    state
        .store
        .player_of(developer_id, payload.player_id)
        .ok_or(ApiError::NotFound)?;

    let id = Uuid::new_v4();
    let session = Session {
        id,
        developer_id,
        player_id: payload.player_id,
        started_at: Utc::now(),
        ended_at: None,
    };
    state.store.sessions.insert(id, session.clone());
    Ok((StatusCode::CREATED, Json(session)))
}

/// end_session
///
/// [Authenticated Route] Closes an open session. Ending a session twice is a
/// conflict, not a silent success, so clients notice double-submission bugs.
#[utoipa::path(
    post,
    path = "/analytics/sessions/{id}/end",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Ended", body = Session),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Already ended")
    )
)]
pub async fn end_session(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Session>, ApiError> {
    let session = state
        .store
        .session_of(developer_id, id)
        .ok_or(ApiError::NotFound)?;
    if session.ended_at.is_some() {
        return Err(ApiError::conflict("session already ended"));
    }
    let updated = state
        .store
        .sessions
        .update(id, |s| s.ended_at = Some(Utc::now()))
        .ok_or(ApiError::NotFound)?;
    Ok(Json(updated))
}

/// list_sessions
#[utoipa::path(
    get,
    path = "/analytics/sessions",
    params(SessionFilter),
    responses((status = 200, description = "Sessions", body = [Session]))
)]
pub async fn list_sessions(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Query(filter): Query<SessionFilter>,
) -> Json<Vec<Session>> {
    let sessions = state.store.sessions_for(developer_id, filter.player_id);
    Json(paginate(sessions, filter.limit, filter.offset))
}

// --- Events ---

const MAX_EVENT_BATCH: usize = 500;

fn build_event(
    developer_id: Uuid,
    req: IngestEventRequest,
) -> Result<AnalyticsEvent, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::validation("event name must not be empty"));
    }
    Ok(AnalyticsEvent {
        id: Uuid::new_v4(),
        developer_id,
        player_id: req.player_id,
        name: req.name.trim().to_string(),
        properties: req.properties.unwrap_or_else(|| serde_json::json!({})),
        occurred_at: req.occurred_at.unwrap_or_else(Utc::now),
    })
}

/// ingest_event
///
/// [Authenticated Route] Records a single event against one of the caller's
/// players. `occurred_at` may backfill; it defaults to now.
#[utoipa::path(
    post,
    path = "/analytics/events",
    request_body = IngestEventRequest,
    responses(
        (status = 201, description = "Recorded", body = AnalyticsEvent),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn ingest_event(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Json(payload): Json<IngestEventRequest>,
) -> Result<(StatusCode, Json<AnalyticsEvent>), ApiError> {
    state
        .store
        .player_of(developer_id, payload.player_id)
        .ok_or(ApiError::NotFound)?;
    let event = build_event(developer_id, payload)?;
    state.store.events.insert(event.id, event.clone());
    Ok((StatusCode::CREATED, Json(event)))
}

/// ingest_event_batch
///
/// [Authenticated Route] Records up to 500 events in one call. The whole
/// batch is validated before anything is written: a bad entry rejects the
/// batch rather than half-applying it.
#[utoipa::path(
    post,
    path = "/analytics/events/batch",
    request_body = EventBatchRequest,
    responses(
        (status = 201, description = "Recorded", body = EventBatchResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Unknown player in batch")
    )
)]
pub async fn ingest_event_batch(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Json(payload): Json<EventBatchRequest>,
) -> Result<(StatusCode, Json<EventBatchResponse>), ApiError> {
    if payload.events.is_empty() {
        return Err(ApiError::validation("batch must not be empty"));
    }
    if payload.events.len() > MAX_EVENT_BATCH {
        return Err(ApiError::validation(format!(
            "batch exceeds {} events",
            MAX_EVENT_BATCH
        )));
    }

    let mut events = Vec::with_capacity(payload.events.len());
    for req in payload.events {
        state
            .store
            .player_of(developer_id, req.player_id)
            .ok_or(ApiError::NotFound)?;
        events.push(build_event(developer_id, req)?);
    }

    let accepted = events.len() as i64;
    for event in events {
        state.store.events.insert(event.id, event);
    }
    Ok((StatusCode::CREATED, Json(EventBatchResponse { accepted })))
}

/// list_events
///
/// [Authenticated Route] Event query with name/player/time-range filters,
/// ordered by occurrence time.
#[utoipa::path(
    get,
    path = "/analytics/events",
    params(EventFilter),
    responses((status = 200, description = "Events", body = [AnalyticsEvent]))
)]
pub async fn list_events(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> Json<Vec<AnalyticsEvent>> {
    let events = state.store.events_for(
        developer_id,
        filter.name.as_deref(),
        filter.player_id,
        filter.since,
        filter.until,
    );
    Json(paginate(events, filter.limit, filter.offset))
}

// --- Funnels ---

/// create_funnel
///
/// [Authenticated Route] Defines a funnel over 2..=10 ordered event names.
#[utoipa::path(
    post,
    path = "/analytics/funnels",
    request_body = CreateFunnelRequest,
    responses(
        (status = 201, description = "Created", body = Funnel),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn create_funnel(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Json(payload): Json<CreateFunnelRequest>,
) -> Result<(StatusCode, Json<Funnel>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    if payload.steps.len() < 2 || payload.steps.len() > 10 {
        return Err(ApiError::validation("funnels need 2 to 10 steps"));
    }
    if payload.steps.iter().any(|s| s.trim().is_empty()) {
        return Err(ApiError::validation("step names must not be empty"));
    }

    let id = Uuid::new_v4();
    let funnel = Funnel {
        id,
        developer_id,
        name: payload.name.trim().to_string(),
        steps: payload.steps,
        created_at: Utc::now(),
    };
    state.store.funnels.insert(id, funnel.clone());
    Ok((StatusCode::CREATED, Json(funnel)))
}

/// list_funnels
#[utoipa::path(
    get,
    path = "/analytics/funnels",
    responses((status = 200, description = "Funnels", body = [Funnel]))
)]
pub async fn list_funnels(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
) -> Json<Vec<Funnel>> {
    let mut funnels = state.store.funnels.filter(|f| f.developer_id == developer_id);
    funnels.sort_by_key(|f| f.created_at);
    Json(funnels)
}

/// funnel_results
///
/// [Authenticated Route] Computes the funnel report on demand by a linear
/// scan over the caller's events: per-step entrants, step-to-step conversion
/// and the overall first-to-last conversion percentage.
#[utoipa::path(
    get,
    path = "/analytics/funnels/{id}/results",
    params(("id" = Uuid, Path, description = "Funnel ID")),
    responses(
        (status = 200, description = "Computed results", body = FunnelResults),
        (status = 404, description = "Not Found")
    )
)]
pub async fn funnel_results(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FunnelResults>, ApiError> {
    let funnel = state
        .store
        .funnel_of(developer_id, id)
        .ok_or(ApiError::NotFound)?;

    let events = state
        .store
        .events_for(developer_id, None, None, None, None);
    let counts = scoring::funnel_counts(&funnel.steps, &events);

    let steps: Vec<FunnelStepResult> = funnel
        .steps
        .iter()
        .zip(&counts)
        .enumerate()
        .map(|(i, (name, &entered))| FunnelStepResult {
            name: name.clone(),
            entered,
            conversion_from_previous_pct: if i == 0 {
                100.0
            } else {
                scoring::percentage(entered, counts[i - 1])
            },
        })
        .collect();

    let overall = scoring::percentage(*counts.last().unwrap_or(&0), counts[0]);
    Ok(Json(FunnelResults {
        funnel_id: funnel.id,
        name: funnel.name,
        steps,
        overall_conversion_pct: overall,
    }))
}

// --- Experiments ---

fn require_pro(auth: &AuthDev) -> Result<(), ApiError> {
    if auth.is_pro() {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "experiments and predictions require the pro tier",
        ))
    }
}

/// create_experiment
///
/// [Authenticated Route, pro tier] Defines an A/B experiment: 2..=5 named
/// variants whose weights sum to 100, and a goal event for conversion.
#[utoipa::path(
    post,
    path = "/analytics/experiments",
    request_body = CreateExperimentRequest,
    responses(
        (status = 201, description = "Created", body = Experiment),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Tier too low")
    )
)]
pub async fn create_experiment(
    auth: AuthDev,
    State(state): State<AppState>,
    Json(payload): Json<CreateExperimentRequest>,
) -> Result<(StatusCode, Json<Experiment>), ApiError> {
    require_pro(&auth)?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    if payload.goal_event.trim().is_empty() {
        return Err(ApiError::validation("goal_event must not be empty"));
    }
    if payload.variants.len() < 2 || payload.variants.len() > 5 {
        return Err(ApiError::validation("experiments need 2 to 5 variants"));
    }
    if payload.variants.iter().any(|v| v.name.trim().is_empty()) {
        return Err(ApiError::validation("variant names must not be empty"));
    }
    // Widened sum: u32 weights from the wire could overflow a u32 total.
    let weight_sum: u64 = payload.variants.iter().map(|v| u64::from(v.weight)).sum();
    if weight_sum != 100 {
        return Err(ApiError::validation("variant weights must sum to 100"));
    }

    let id = Uuid::new_v4();
    let experiment = Experiment {
        id,
        developer_id: auth.developer_id,
        name: payload.name.trim().to_string(),
        goal_event: payload.goal_event.trim().to_string(),
        variants: payload.variants,
        created_at: Utc::now(),
    };
    state.store.experiments.insert(id, experiment.clone());
    Ok((StatusCode::CREATED, Json(experiment)))
}

/// list_experiments
#[utoipa::path(
    get,
    path = "/analytics/experiments",
    responses(
        (status = 200, description = "Experiments", body = [Experiment]),
        (status = 403, description = "Tier too low")
    )
)]
pub async fn list_experiments(
    auth: AuthDev,
    State(state): State<AppState>,
) -> Result<Json<Vec<Experiment>>, ApiError> {
    require_pro(&auth)?;
    let mut experiments = state
        .store
        .experiments
        .filter(|e| e.developer_id == auth.developer_id);
    experiments.sort_by_key(|e| e.created_at);
    Ok(Json(experiments))
}

/// assign_player
///
/// [Authenticated Route, pro tier] Assigns a player to a variant. The bucket
/// is a deterministic function of the player id, and re-assignment returns
/// the existing record, so a player can never switch arms.
#[utoipa::path(
    post,
    path = "/analytics/experiments/{id}/assign",
    params(("id" = Uuid, Path, description = "Experiment ID")),
    request_body = AssignRequest,
    responses(
        (status = 200, description = "Assigned", body = Assignment),
        (status = 403, description = "Tier too low"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn assign_player(
    auth: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> Result<Json<Assignment>, ApiError> {
    require_pro(&auth)?;
    let experiment = state
        .store
        .experiment_of(auth.developer_id, id)
        .ok_or(ApiError::NotFound)?;
    state
        .store
        .player_of(auth.developer_id, payload.player_id)
        .ok_or(ApiError::NotFound)?;

    if let Some(existing) = state
        .store
        .assignments
        .filter(|a| a.experiment_id == id && a.player_id == payload.player_id)
        .into_iter()
        .next()
    {
        return Ok(Json(existing));
    }

    let variant = scoring::variant_for(payload.player_id, &experiment.variants);
    let assignment_id = Uuid::new_v4();
    let assignment = Assignment {
        id: assignment_id,
        developer_id: auth.developer_id,
        experiment_id: id,
        player_id: payload.player_id,
        variant: variant.name.clone(),
        assigned_at: Utc::now(),
    };
    state.store.assignments.insert(assignment_id, assignment.clone());
    Ok(Json(assignment))
}

/// experiment_results
///
/// [Authenticated Route, pro tier] Per-variant assignment counts and the
/// conversion rate: the share of assigned players that fired the goal event
/// at least once.
#[utoipa::path(
    get,
    path = "/analytics/experiments/{id}/results",
    params(("id" = Uuid, Path, description = "Experiment ID")),
    responses(
        (status = 200, description = "Computed results", body = ExperimentResults),
        (status = 403, description = "Tier too low"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn experiment_results(
    auth: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExperimentResults>, ApiError> {
    require_pro(&auth)?;
    let experiment = state
        .store
        .experiment_of(auth.developer_id, id)
        .ok_or(ApiError::NotFound)?;

    let assignments = state.store.assignments_for(id);
    let goal_events = state.store.events_for(
        auth.developer_id,
        Some(experiment.goal_event.as_str()),
        None,
        None,
        None,
    );

    let variants = experiment
        .variants
        .iter()
        .map(|variant| {
            let assigned: Vec<&Assignment> = assignments
                .iter()
                .filter(|a| a.variant == variant.name)
                .collect();
            let conversions = assigned
                .iter()
                .filter(|a| goal_events.iter().any(|e| e.player_id == a.player_id))
                .count() as i64;
            VariantResult {
                name: variant.name.clone(),
                assigned: assigned.len() as i64,
                conversions,
                conversion_rate_pct: scoring::percentage(conversions, assigned.len() as i64),
            }
        })
        .collect();

    Ok(Json(ExperimentResults {
        experiment_id: experiment.id,
        name: experiment.name,
        variants,
    }))
}

// --- Retention & churn ---

/// retention_report
///
/// [Authenticated Route] N-day retention: of the players created at least N
/// days ago, how many had a session within the last N days.
#[utoipa::path(
    get,
    path = "/analytics/retention",
    params(RetentionQuery),
    responses(
        (status = 200, description = "Retention report", body = RetentionReport),
        (status = 400, description = "days out of range")
    )
)]
pub async fn retention_report(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Query(query): Query<RetentionQuery>,
) -> Result<Json<RetentionReport>, ApiError> {
    let days = query.days.unwrap_or(7);
    if !(1..=90).contains(&days) {
        return Err(ApiError::validation("days must be between 1 and 90"));
    }

    let cutoff = Utc::now() - Duration::days(days);
    let cohort: Vec<Uuid> = state
        .store
        .players
        .filter(|p| p.developer_id == developer_id && p.created_at <= cutoff)
        .into_iter()
        .map(|p| p.id)
        .collect();

    let recent_sessions = state.store.sessions.filter(|s| {
        s.developer_id == developer_id && s.started_at >= cutoff
    });
    let retained = cohort
        .iter()
        .filter(|id| recent_sessions.iter().any(|s| s.player_id == **id))
        .count() as i64;

    let cohort_size = cohort.len() as i64;
    Ok(Json(RetentionReport {
        window_days: days,
        cohort_size,
        retained,
        retention_pct: scoring::percentage(retained, cohort_size),
    }))
}

/// churn_prediction
///
/// [Authenticated Route, pro tier] The fabricated churn score: recency,
/// frequency and session length blended into a probability and banded into
/// low/medium/high risk.
#[utoipa::path(
    get,
    path = "/analytics/players/{id}/churn",
    params(("id" = Uuid, Path, description = "Player ID")),
    responses(
        (status = 200, description = "Prediction", body = ChurnPrediction),
        (status = 403, description = "Tier too low"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn churn_prediction(
    auth: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ChurnPrediction>, ApiError> {
    require_pro(&auth)?;
    let player = state
        .store
        .player_of(auth.developer_id, id)
        .ok_or(ApiError::NotFound)?;

    let sessions = state.store.sessions_for(auth.developer_id, Some(id));
    let total_sessions = sessions.len() as i64;

    // A player with no sessions ages from their creation date instead.
    let last_seen = sessions
        .iter()
        .map(|s| s.ended_at.unwrap_or(s.started_at))
        .max()
        .unwrap_or(player.created_at);
    let days_since = (Utc::now() - last_seen).num_days().max(0);

    let ended: Vec<f64> = sessions
        .iter()
        .filter_map(|s| {
            s.ended_at
                .map(|end| (end - s.started_at).num_seconds() as f64 / 60.0)
        })
        .collect();
    let avg_minutes = if ended.is_empty() {
        0.0
    } else {
        ended.iter().sum::<f64>() / ended.len() as f64
    };

    let probability = scoring::churn_probability(days_since, total_sessions, avg_minutes);
    Ok(Json(ChurnPrediction {
        player_id: id,
        churn_probability: probability,
        risk: scoring::risk_band(probability).to_string(),
        days_since_last_session: days_since,
        total_sessions,
    }))
}

// --- Dashboards ---

fn validate_widgets(widgets: &[Widget]) -> Result<(), ApiError> {
    for widget in widgets {
        if widget.title.trim().is_empty() {
            return Err(ApiError::validation("widget titles must not be empty"));
        }
        if !WIDGET_KINDS.contains(&widget.kind.as_str()) {
            return Err(ApiError::validation(format!(
                "unknown widget kind '{}'",
                widget.kind
            )));
        }
    }
    Ok(())
}

/// create_dashboard
#[utoipa::path(
    post,
    path = "/analytics/dashboards",
    request_body = CreateDashboardRequest,
    responses(
        (status = 201, description = "Created", body = Dashboard),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn create_dashboard(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Json(payload): Json<CreateDashboardRequest>,
) -> Result<(StatusCode, Json<Dashboard>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    validate_widgets(&payload.widgets)?;

    let now = Utc::now();
    let id = Uuid::new_v4();
    let dashboard = Dashboard {
        id,
        developer_id,
        name: payload.name.trim().to_string(),
        widgets: payload.widgets,
        created_at: now,
        updated_at: now,
    };
    state.store.dashboards.insert(id, dashboard.clone());
    Ok((StatusCode::CREATED, Json(dashboard)))
}

/// list_dashboards
#[utoipa::path(
    get,
    path = "/analytics/dashboards",
    responses((status = 200, description = "Dashboards", body = [Dashboard]))
)]
pub async fn list_dashboards(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
) -> Json<Vec<Dashboard>> {
    let mut dashboards = state
        .store
        .dashboards
        .filter(|d| d.developer_id == developer_id);
    dashboards.sort_by_key(|d| d.created_at);
    Json(dashboards)
}

/// get_dashboard
#[utoipa::path(
    get,
    path = "/analytics/dashboards/{id}",
    params(("id" = Uuid, Path, description = "Dashboard ID")),
    responses(
        (status = 200, description = "Found", body = Dashboard),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_dashboard(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Dashboard>, ApiError> {
    state
        .store
        .dashboard_of(developer_id, id)
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// update_dashboard
#[utoipa::path(
    put,
    path = "/analytics/dashboards/{id}",
    params(("id" = Uuid, Path, description = "Dashboard ID")),
    request_body = UpdateDashboardRequest,
    responses(
        (status = 200, description = "Updated", body = Dashboard),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_dashboard(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDashboardRequest>,
) -> Result<Json<Dashboard>, ApiError> {
    state
        .store
        .dashboard_of(developer_id, id)
        .ok_or(ApiError::NotFound)?;
    if payload.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::validation("name must not be empty"));
    }
    if let Some(widgets) = &payload.widgets {
        validate_widgets(widgets)?;
    }

    let updated = state
        .store
        .dashboards
        .update(id, |d| {
            if let Some(name) = payload.name.clone() {
                d.name = name.trim().to_string();
            }
            if let Some(widgets) = payload.widgets.clone() {
                d.widgets = widgets;
            }
            d.updated_at = Utc::now();
        })
        .ok_or(ApiError::NotFound)?;
    Ok(Json(updated))
}

/// delete_dashboard
#[utoipa::path(
    delete,
    path = "/analytics/dashboards/{id}",
    params(("id" = Uuid, Path, description = "Dashboard ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_dashboard(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.store.dashboard_of(developer_id, id).is_none() {
        return Err(ApiError::NotFound);
    }
    state.store.dashboards.remove(id);
    Ok(StatusCode::NO_CONTENT)
}

/// dashboard_summary
///
/// [Authenticated Route] The aggregate counters behind a dashboard: totals
/// plus average ended-session length and events-per-player for the caller.
#[utoipa::path(
    get,
    path = "/analytics/dashboards/{id}/summary",
    params(("id" = Uuid, Path, description = "Dashboard ID")),
    responses(
        (status = 200, description = "Aggregates", body = DashboardSummary),
        (status = 404, description = "Not Found")
    )
)]
pub async fn dashboard_summary(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DashboardSummary>, ApiError> {
    state
        .store
        .dashboard_of(developer_id, id)
        .ok_or(ApiError::NotFound)?;

    let players = state
        .store
        .players
        .filter(|p| p.developer_id == developer_id)
        .len() as i64;
    let sessions = state.store.sessions_for(developer_id, None);
    let events = state
        .store
        .events
        .filter(|e| e.developer_id == developer_id)
        .len() as i64;

    let ended: Vec<f64> = sessions
        .iter()
        .filter_map(|s| {
            s.ended_at
                .map(|end| (end - s.started_at).num_seconds() as f64 / 60.0)
        })
        .collect();
    let avg_session_minutes = if ended.is_empty() {
        0.0
    } else {
        (ended.iter().sum::<f64>() / ended.len() as f64 * 100.0).round() / 100.0
    };
    let events_per_player = if players == 0 {
        0.0
    } else {
        (events as f64 / players as f64 * 100.0).round() / 100.0
    };

    Ok(Json(DashboardSummary {
        dashboard_id: id,
        players,
        sessions: sessions.len() as i64,
        events,
        avg_session_minutes,
        events_per_player,
    }))
}
