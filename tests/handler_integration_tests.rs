use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{Duration, Utc};
use gameverse_backend::{
    AppState, MockWebhookTransport, RateLimiter, Store,
    auth::AuthDev,
    config::AppConfig,
    error::ApiError,
    handlers,
    models::{
        AssignRequest, CreateDashboardRequest, CreateDocPageRequest, CreateExperimentRequest,
        CreateFunnelRequest, CreateKeyRequest, CreatePlayerRequest, CreateSandboxRequest,
        CreateWebhookRequest, EventBatchRequest, IngestEventRequest, Player, PublishSdkRequest,
        RegisterDeveloperRequest, StartSessionRequest, UpdateDashboardRequest, UpdateDocPageRequest,
        UpdatePlayerRequest, UpdateSdkRequest, UpdateWebhookRequest, Variant, Widget,
    },
};
use std::sync::Arc;
use tokio::test;
use uuid::Uuid;

// --- TEST UTILITIES ---

// Handlers run against the real in-memory store; only the webhook transport
// is mocked, so no test ever touches the network.
fn create_test_state(transport: MockWebhookTransport) -> AppState {
    AppState {
        store: Arc::new(Store::new()),
        config: AppConfig::default(),
        limiter: Arc::new(RateLimiter::new(60)),
        transport: Arc::new(transport),
    }
}

// Inserts a developer record and returns the matching extractor output, the
// way the auth layer would have produced it.
fn seed_dev(state: &AppState, role: &str, plan: &str) -> AuthDev {
    let dev_id = Uuid::new_v4();
    state.store.developers.insert(
        dev_id,
        gameverse_backend::models::Developer {
            id: dev_id,
            email: format!("{}@studio.test", dev_id.simple()),
            studio_name: "Test Studio".to_string(),
            role: role.to_string(),
            plan: plan.to_string(),
            created_at: Utc::now(),
        },
    );
    AuthDev {
        developer_id: dev_id,
        key_id: Uuid::new_v4(),
        role: role.to_string(),
        tier: plan.to_string(),
    }
}

fn free_dev(state: &AppState) -> AuthDev {
    seed_dev(state, "developer", "free")
}

fn pro_dev(state: &AppState) -> AuthDev {
    seed_dev(state, "developer", "pro")
}

fn admin_dev(state: &AppState) -> AuthDev {
    seed_dev(state, "admin", "enterprise")
}

fn seed_player(state: &AppState, developer_id: Uuid) -> Player {
    let id = Uuid::new_v4();
    let player = Player {
        id,
        developer_id,
        external_id: format!("ext-{}", id.simple()),
        display_name: "Test Player".to_string(),
        platform: "pc".to_string(),
        country: None,
        created_at: Utc::now(),
    };
    state.store.players.insert(id, player.clone());
    player
}

// --- REGISTRATION ---

#[test]
async fn test_register_developer_mints_free_key() {
    let state = create_test_state(MockWebhookTransport::new());

    let result = handlers::register_developer(
        State(state.clone()),
        Json(RegisterDeveloperRequest {
            email: "new@studio.test".to_string(),
            studio_name: "New Studio".to_string(),
        }),
    )
    .await;

    let (status, Json(response)) = result.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(response.developer.plan, "free");
    assert_eq!(response.api_key.tier, "free");
    assert!(response.api_key.secret.starts_with("gv_"));
    // The minted key authenticates
    assert!(
        state
            .store
            .find_key_by_secret(&response.api_key.secret)
            .is_some()
    );
}

#[test]
async fn test_register_developer_duplicate_email_conflict() {
    let state = create_test_state(MockWebhookTransport::new());
    let request = RegisterDeveloperRequest {
        email: "dup@studio.test".to_string(),
        studio_name: "Studio".to_string(),
    };

    handlers::register_developer(State(state.clone()), Json(request.clone()))
        .await
        .unwrap();
    let result = handlers::register_developer(State(state), Json(request)).await;

    assert_eq!(result.unwrap_err().status(), StatusCode::CONFLICT);
}

#[test]
async fn test_register_developer_rejects_bad_email() {
    let state = create_test_state(MockWebhookTransport::new());
    let result = handlers::register_developer(
        State(state),
        Json(RegisterDeveloperRequest {
            email: "not-an-email".to_string(),
            studio_name: "Studio".to_string(),
        }),
    )
    .await;

    assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
}

// --- API KEYS ---

#[test]
async fn test_create_key_cannot_exceed_plan() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);

    let result = handlers::create_key(
        auth,
        State(state),
        Json(CreateKeyRequest {
            name: "ambitious".to_string(),
            tier: Some("enterprise".to_string()),
        }),
    )
    .await;

    assert_eq!(result.unwrap_err().status(), StatusCode::FORBIDDEN);
}

#[test]
async fn test_create_key_defaults_to_plan_tier() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = pro_dev(&state);

    let (status, Json(key)) = handlers::create_key(
        auth,
        State(state),
        Json(CreateKeyRequest {
            name: "ci".to_string(),
            tier: None,
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(key.tier, "pro");
}

#[test]
async fn test_revoke_key_is_owner_scoped() {
    let state = create_test_state(MockWebhookTransport::new());
    let owner = free_dev(&state);
    let stranger = free_dev(&state);

    let (_, Json(key)) = handlers::create_key(
        owner.clone(),
        State(state.clone()),
        Json(CreateKeyRequest {
            name: "mine".to_string(),
            tier: None,
        }),
    )
    .await
    .unwrap();

    // Someone else's key reads as absent
    let result = handlers::revoke_key(stranger, State(state.clone()), Path(key.id)).await;
    assert_eq!(result.unwrap_err(), ApiError::NotFound);

    // The owner can revoke it
    let status = handlers::revoke_key(owner, State(state.clone()), Path(key.id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(state.store.api_keys.get(key.id).unwrap().revoked);
}

// --- WEBHOOKS ---

#[test]
async fn test_create_webhook_rejects_unknown_event_kind() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);

    let result = handlers::create_webhook(
        auth,
        State(state),
        Json(CreateWebhookRequest {
            url: "https://hooks.example.com/x".to_string(),
            events: vec!["player.created".to_string(), "comet.landed".to_string()],
        }),
    )
    .await;

    assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
}

#[test]
async fn test_test_webhook_records_delivery_status() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);

    let (_, Json(webhook)) = handlers::create_webhook(
        auth.clone(),
        State(state.clone()),
        Json(CreateWebhookRequest {
            url: "https://hooks.example.com/x".to_string(),
            events: vec!["session.ended".to_string()],
        }),
    )
    .await
    .unwrap();

    let Json(updated) = handlers::test_webhook(auth, State(state), Path(webhook.id))
        .await
        .unwrap();

    assert_eq!(updated.last_delivery_status, Some("200".to_string()));
}

#[test]
async fn test_test_webhook_failure_is_recorded_not_propagated() {
    let state = create_test_state(MockWebhookTransport::new_failing());
    let auth = free_dev(&state);

    let (_, Json(webhook)) = handlers::create_webhook(
        auth.clone(),
        State(state.clone()),
        Json(CreateWebhookRequest {
            url: "https://hooks.example.com/x".to_string(),
            events: vec!["session.ended".to_string()],
        }),
    )
    .await
    .unwrap();

    let Json(updated) = handlers::test_webhook(auth, State(state), Path(webhook.id))
        .await
        .unwrap();

    assert_eq!(updated.last_delivery_status, Some("failed".to_string()));
}

#[test]
async fn test_test_webhook_inactive_conflict() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);

    let (_, Json(webhook)) = handlers::create_webhook(
        auth.clone(),
        State(state.clone()),
        Json(CreateWebhookRequest {
            url: "https://hooks.example.com/x".to_string(),
            events: vec!["session.ended".to_string()],
        }),
    )
    .await
    .unwrap();

    handlers::update_webhook(
        auth.clone(),
        State(state.clone()),
        Path(webhook.id),
        Json(UpdateWebhookRequest {
            url: None,
            events: None,
            active: Some(false),
        }),
    )
    .await
    .unwrap();

    let result = handlers::test_webhook(auth, State(state), Path(webhook.id)).await;
    assert_eq!(result.unwrap_err().status(), StatusCode::CONFLICT);
}

// --- SANDBOXES ---

#[test]
async fn test_free_tier_limited_to_one_sandbox() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);

    let (status, _) = handlers::create_sandbox(
        auth.clone(),
        State(state.clone()),
        Json(CreateSandboxRequest {
            name: "first".to_string(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let result = handlers::create_sandbox(
        auth,
        State(state),
        Json(CreateSandboxRequest {
            name: "second".to_string(),
        }),
    )
    .await;
    assert_eq!(result.unwrap_err().status(), StatusCode::FORBIDDEN);
}

#[test]
async fn test_reset_sandbox_bumps_counter() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = pro_dev(&state);

    let (_, Json(sandbox)) = handlers::create_sandbox(
        auth.clone(),
        State(state.clone()),
        Json(CreateSandboxRequest {
            name: "staging".to_string(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(sandbox.reset_count, 0);

    let Json(reset) = handlers::reset_sandbox(auth, State(state), Path(sandbox.id))
        .await
        .unwrap();
    assert_eq!(reset.reset_count, 1);
    assert_eq!(reset.seeded_players, sandbox.seeded_players);
}

// --- PLAYERS & SESSIONS ---

#[test]
async fn test_create_player_lowercases_platform() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);

    let (status, Json(player)) = handlers::create_player(
        auth,
        State(state),
        Json(CreatePlayerRequest {
            external_id: "steam-123".to_string(),
            display_name: "Alex".to_string(),
            platform: "PC".to_string(),
            country: Some("IE".to_string()),
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(player.platform, "pc");
}

#[test]
async fn test_update_player_rejects_empty_display_name() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);
    let player = seed_player(&state, auth.developer_id);

    let result = handlers::update_player(
        auth,
        State(state.clone()),
        Path(player.id),
        Json(UpdatePlayerRequest {
            display_name: Some("".to_string()),
            platform: None,
            country: None,
        }),
    )
    .await;

    assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
    let stored = state.store.players.get(player.id).unwrap();
    assert_eq!(stored.display_name, "Test Player");
}

#[test]
async fn test_get_player_cross_developer_is_not_found() {
    let state = create_test_state(MockWebhookTransport::new());
    let owner = free_dev(&state);
    let stranger = free_dev(&state);
    let player = seed_player(&state, owner.developer_id);

    let result = handlers::get_player(stranger, State(state), Path(player.id)).await;
    assert_eq!(result.unwrap_err(), ApiError::NotFound);
}

#[test]
async fn test_end_session_twice_conflicts() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);
    let player = seed_player(&state, auth.developer_id);

    let (_, Json(session)) = handlers::start_session(
        auth.clone(),
        State(state.clone()),
        Json(StartSessionRequest {
            player_id: player.id,
        }),
    )
    .await
    .unwrap();
    assert!(session.ended_at.is_none());

    let Json(ended) = handlers::end_session(auth.clone(), State(state.clone()), Path(session.id))
        .await
        .unwrap();
    assert!(ended.ended_at.is_some());

    let result = handlers::end_session(auth, State(state), Path(session.id)).await;
    assert_eq!(result.unwrap_err().status(), StatusCode::CONFLICT);
}

// --- EVENTS ---

#[test]
async fn test_ingest_event_unknown_player_is_not_found() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);

    let result = handlers::ingest_event(
        auth,
        State(state),
        Json(IngestEventRequest {
            player_id: Uuid::new_v4(),
            name: "level_up".to_string(),
            properties: None,
            occurred_at: None,
        }),
    )
    .await;

    assert_eq!(result.unwrap_err(), ApiError::NotFound);
}

#[test]
async fn test_event_batch_is_all_or_nothing() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);
    let player = seed_player(&state, auth.developer_id);

    let batch = EventBatchRequest {
        events: vec![
            IngestEventRequest {
                player_id: player.id,
                name: "level_up".to_string(),
                properties: None,
                occurred_at: None,
            },
            // Unknown player poisons the whole batch
            IngestEventRequest {
                player_id: Uuid::new_v4(),
                name: "level_up".to_string(),
                properties: None,
                occurred_at: None,
            },
        ],
    };

    let result = handlers::ingest_event_batch(auth, State(state.clone()), Json(batch)).await;
    assert!(result.is_err());
    assert!(state.store.events.is_empty());
}

#[test]
async fn test_event_batch_accepts_valid_events() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);
    let player = seed_player(&state, auth.developer_id);

    let events = (0..3)
        .map(|n| IngestEventRequest {
            player_id: player.id,
            name: format!("step_{}", n),
            properties: None,
            occurred_at: None,
        })
        .collect();

    let (status, Json(response)) =
        handlers::ingest_event_batch(auth, State(state.clone()), Json(EventBatchRequest { events }))
            .await
            .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(response.accepted, 3);
    assert_eq!(state.store.events.len(), 3);
}

// --- FUNNELS ---

#[test]
async fn test_funnel_needs_at_least_two_steps() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);

    let result = handlers::create_funnel(
        auth,
        State(state),
        Json(CreateFunnelRequest {
            name: "stub".to_string(),
            steps: vec!["signup".to_string()],
        }),
    )
    .await;

    assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
}

#[test]
async fn test_funnel_results_step_conversion() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);

    // Two players enter, one converts
    for converts in [true, false] {
        let player = seed_player(&state, auth.developer_id);
        let mut names = vec!["signup"];
        if converts {
            names.push("purchase");
        }
        for (i, name) in names.iter().enumerate() {
            let id = Uuid::new_v4();
            state.store.events.insert(
                id,
                gameverse_backend::models::AnalyticsEvent {
                    id,
                    developer_id: auth.developer_id,
                    player_id: player.id,
                    name: name.to_string(),
                    properties: serde_json::json!({}),
                    occurred_at: Utc::now() - Duration::minutes(10 - i as i64),
                },
            );
        }
    }

    let (_, Json(funnel)) = handlers::create_funnel(
        auth.clone(),
        State(state.clone()),
        Json(CreateFunnelRequest {
            name: "checkout".to_string(),
            steps: vec!["signup".to_string(), "purchase".to_string()],
        }),
    )
    .await
    .unwrap();

    let Json(results) = handlers::funnel_results(auth, State(state), Path(funnel.id))
        .await
        .unwrap();

    assert_eq!(results.steps[0].entered, 2);
    assert_eq!(results.steps[0].conversion_from_previous_pct, 100.0);
    assert_eq!(results.steps[1].entered, 1);
    assert_eq!(results.steps[1].conversion_from_previous_pct, 50.0);
    assert_eq!(results.overall_conversion_pct, 50.0);
}

// --- EXPERIMENTS ---

fn two_variants() -> Vec<Variant> {
    vec![
        Variant {
            name: "control".to_string(),
            weight: 50,
        },
        Variant {
            name: "treatment".to_string(),
            weight: 50,
        },
    ]
}

#[test]
async fn test_experiments_gated_to_pro_tier() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);

    let result = handlers::create_experiment(
        auth,
        State(state),
        Json(CreateExperimentRequest {
            name: "onboarding".to_string(),
            goal_event: "purchase".to_string(),
            variants: two_variants(),
        }),
    )
    .await;

    assert_eq!(result.unwrap_err().status(), StatusCode::FORBIDDEN);
}

#[test]
async fn test_experiment_weights_must_sum_to_100() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = pro_dev(&state);

    let result = handlers::create_experiment(
        auth,
        State(state),
        Json(CreateExperimentRequest {
            name: "onboarding".to_string(),
            goal_event: "purchase".to_string(),
            variants: vec![
                Variant {
                    name: "a".to_string(),
                    weight: 50,
                },
                Variant {
                    name: "b".to_string(),
                    weight: 30,
                },
            ],
        }),
    )
    .await;

    assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
}

#[test]
async fn test_experiment_weights_summed_without_wrapping() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = pro_dev(&state);

    // These two wrap around to exactly 100 in u32 arithmetic.
    let result = handlers::create_experiment(
        auth,
        State(state.clone()),
        Json(CreateExperimentRequest {
            name: "onboarding".to_string(),
            goal_event: "purchase".to_string(),
            variants: vec![
                Variant {
                    name: "a".to_string(),
                    weight: 4_294_967_196,
                },
                Variant {
                    name: "b".to_string(),
                    weight: 200,
                },
            ],
        }),
    )
    .await;

    assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
    assert!(state.store.experiments.is_empty());
}

#[test]
async fn test_assignment_is_sticky() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = pro_dev(&state);
    let player = seed_player(&state, auth.developer_id);

    let (_, Json(experiment)) = handlers::create_experiment(
        auth.clone(),
        State(state.clone()),
        Json(CreateExperimentRequest {
            name: "onboarding".to_string(),
            goal_event: "purchase".to_string(),
            variants: two_variants(),
        }),
    )
    .await
    .unwrap();

    let Json(first) = handlers::assign_player(
        auth.clone(),
        State(state.clone()),
        Path(experiment.id),
        Json(AssignRequest {
            player_id: player.id,
        }),
    )
    .await
    .unwrap();

    let Json(second) = handlers::assign_player(
        auth,
        State(state),
        Path(experiment.id),
        Json(AssignRequest {
            player_id: player.id,
        }),
    )
    .await
    .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.variant, second.variant);
}

#[test]
async fn test_experiment_results_count_goal_conversions() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = pro_dev(&state);
    let player = seed_player(&state, auth.developer_id);

    let (_, Json(experiment)) = handlers::create_experiment(
        auth.clone(),
        State(state.clone()),
        Json(CreateExperimentRequest {
            name: "onboarding".to_string(),
            goal_event: "purchase".to_string(),
            variants: two_variants(),
        }),
    )
    .await
    .unwrap();

    let Json(assignment) = handlers::assign_player(
        auth.clone(),
        State(state.clone()),
        Path(experiment.id),
        Json(AssignRequest {
            player_id: player.id,
        }),
    )
    .await
    .unwrap();

    handlers::ingest_event(
        auth.clone(),
        State(state.clone()),
        Json(IngestEventRequest {
            player_id: player.id,
            name: "purchase".to_string(),
            properties: None,
            occurred_at: None,
        }),
    )
    .await
    .unwrap();

    let Json(results) = handlers::experiment_results(auth, State(state), Path(experiment.id))
        .await
        .unwrap();

    let converted = results
        .variants
        .iter()
        .find(|v| v.name == assignment.variant)
        .unwrap();
    assert_eq!(converted.assigned, 1);
    assert_eq!(converted.conversions, 1);
    assert_eq!(converted.conversion_rate_pct, 100.0);

    let other = results
        .variants
        .iter()
        .find(|v| v.name != assignment.variant)
        .unwrap();
    assert_eq!(other.assigned, 0);
    assert_eq!(other.conversion_rate_pct, 0.0);
}

// --- RETENTION & CHURN ---

#[test]
async fn test_retention_report_counts_returning_players() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);

    // Two old players; only one has a recent session
    let retained = seed_player(&state, auth.developer_id);
    let lapsed = seed_player(&state, auth.developer_id);
    for player in [&retained, &lapsed] {
        state
            .store
            .players
            .update(player.id, |p| p.created_at = Utc::now() - Duration::days(30));
    }

    let session_id = Uuid::new_v4();
    state.store.sessions.insert(
        session_id,
        gameverse_backend::models::Session {
            id: session_id,
            developer_id: auth.developer_id,
            player_id: retained.id,
            started_at: Utc::now() - Duration::days(2),
            ended_at: None,
        },
    );

    let Json(report) = handlers::retention_report(
        auth,
        State(state),
        Query(handlers::analytics::RetentionQuery { days: Some(7) }),
    )
    .await
    .unwrap();

    assert_eq!(report.cohort_size, 2);
    assert_eq!(report.retained, 1);
    assert_eq!(report.retention_pct, 50.0);
}

#[test]
async fn test_retention_days_out_of_range() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);

    let result = handlers::retention_report(
        auth,
        State(state),
        Query(handlers::analytics::RetentionQuery { days: Some(120) }),
    )
    .await;

    assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
}

#[test]
async fn test_churn_requires_pro_tier() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);
    let player = seed_player(&state, auth.developer_id);

    let result = handlers::churn_prediction(auth, State(state), Path(player.id)).await;
    assert_eq!(result.unwrap_err().status(), StatusCode::FORBIDDEN);
}

#[test]
async fn test_churn_prediction_for_inactive_player_is_high_risk() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = pro_dev(&state);
    let player = seed_player(&state, auth.developer_id);
    // No sessions, created long ago: recency and frequency both max out
    state
        .store
        .players
        .update(player.id, |p| p.created_at = Utc::now() - Duration::days(60));

    let Json(prediction) = handlers::churn_prediction(auth, State(state), Path(player.id))
        .await
        .unwrap();

    assert_eq!(prediction.risk, "high");
    assert_eq!(prediction.total_sessions, 0);
    assert!(prediction.days_since_last_session >= 59);
}

// --- DASHBOARDS ---

#[test]
async fn test_create_dashboard_rejects_unknown_widget_kind() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);

    let result = handlers::create_dashboard(
        auth,
        State(state),
        Json(CreateDashboardRequest {
            name: "ops".to_string(),
            widgets: vec![Widget {
                title: "DAU".to_string(),
                kind: "hologram".to_string(),
                metric: "daily_active".to_string(),
            }],
        }),
    )
    .await;

    assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
}

#[test]
async fn test_dashboard_summary_aggregates_owner_data() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);
    let player = seed_player(&state, auth.developer_id);

    handlers::ingest_event(
        auth.clone(),
        State(state.clone()),
        Json(IngestEventRequest {
            player_id: player.id,
            name: "level_up".to_string(),
            properties: None,
            occurred_at: None,
        }),
    )
    .await
    .unwrap();

    let (_, Json(dashboard)) = handlers::create_dashboard(
        auth.clone(),
        State(state.clone()),
        Json(CreateDashboardRequest {
            name: "ops".to_string(),
            widgets: vec![],
        }),
    )
    .await
    .unwrap();

    let Json(summary) = handlers::dashboard_summary(auth, State(state), Path(dashboard.id))
        .await
        .unwrap();

    assert_eq!(summary.players, 1);
    assert_eq!(summary.events, 1);
    assert_eq!(summary.sessions, 0);
    assert_eq!(summary.events_per_player, 1.0);
}

#[test]
async fn test_update_dashboard_rejects_empty_name() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);

    let (_, Json(dashboard)) = handlers::create_dashboard(
        auth.clone(),
        State(state.clone()),
        Json(CreateDashboardRequest {
            name: "ops".to_string(),
            widgets: vec![],
        }),
    )
    .await
    .unwrap();

    let result = handlers::update_dashboard(
        auth,
        State(state.clone()),
        Path(dashboard.id),
        Json(UpdateDashboardRequest {
            name: Some("  ".to_string()),
            widgets: None,
        }),
    )
    .await;

    assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
    let stored = state.store.dashboards.get(dashboard.id).unwrap();
    assert_eq!(stored.name, "ops");
}

// --- ADMIN ---

#[test]
async fn test_admin_stats_forbidden_for_developer_role() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);

    let result = handlers::get_admin_stats(auth, State(state)).await;
    assert_eq!(result.unwrap_err().status(), StatusCode::FORBIDDEN);
}

#[test]
async fn test_admin_stats_counts_records() {
    let state = create_test_state(MockWebhookTransport::new());
    let admin = admin_dev(&state);
    let dev = free_dev(&state);
    seed_player(&state, dev.developer_id);

    let Json(stats) = handlers::get_admin_stats(admin, State(state)).await.unwrap();
    assert_eq!(stats.total_developers, 2);
    assert_eq!(stats.total_players, 1);
}

#[test]
async fn test_publish_sdk_requires_https() {
    let state = create_test_state(MockWebhookTransport::new());
    let admin = admin_dev(&state);

    let result = handlers::publish_sdk(
        admin,
        State(state),
        Json(PublishSdkRequest {
            name: "gameverse-sdk".to_string(),
            language: "Rust".to_string(),
            version: "1.0.0".to_string(),
            download_url: "http://insecure.example.com/sdk.tar.gz".to_string(),
        }),
    )
    .await;

    assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
}

#[test]
async fn test_update_sdk_rejects_empty_version() {
    let state = create_test_state(MockWebhookTransport::new());
    let admin = admin_dev(&state);

    let (_, Json(sdk)) = handlers::publish_sdk(
        admin.clone(),
        State(state.clone()),
        Json(PublishSdkRequest {
            name: "gameverse-sdk".to_string(),
            language: "Rust".to_string(),
            version: "1.0.0".to_string(),
            download_url: "https://sdk.example.com/sdk.tar.gz".to_string(),
        }),
    )
    .await
    .unwrap();

    let result = handlers::update_sdk(
        admin,
        State(state.clone()),
        Path(sdk.id),
        Json(UpdateSdkRequest {
            version: Some("".to_string()),
            download_url: None,
            published: None,
        }),
    )
    .await;

    assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
    let stored = state.store.sdks.get(sdk.id).unwrap();
    assert_eq!(stored.version, "1.0.0");
}

#[test]
async fn test_update_doc_page_rejects_empty_title() {
    let state = create_test_state(MockWebhookTransport::new());
    let admin = admin_dev(&state);

    let (_, Json(page)) = handlers::create_doc_page(
        admin.clone(),
        State(state.clone()),
        Json(CreateDocPageRequest {
            slug: "getting-started".to_string(),
            title: "Getting Started".to_string(),
            body: "Welcome".to_string(),
            published: true,
        }),
    )
    .await
    .unwrap();

    let result = handlers::update_doc_page(
        admin,
        State(state.clone()),
        Path(page.slug.clone()),
        Json(UpdateDocPageRequest {
            title: Some("".to_string()),
            body: None,
            published: None,
        }),
    )
    .await;

    assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
    let stored = state.store.doc_pages.get(page.id).unwrap();
    assert_eq!(stored.title, "Getting Started");
}

#[test]
async fn test_unpublished_sdk_hidden_from_public_listing() {
    let state = create_test_state(MockWebhookTransport::new());
    let admin = admin_dev(&state);

    let (_, Json(sdk)) = handlers::publish_sdk(
        admin.clone(),
        State(state.clone()),
        Json(PublishSdkRequest {
            name: "gameverse-sdk".to_string(),
            language: "Rust".to_string(),
            version: "1.0.0".to_string(),
            download_url: "https://cdn.example.com/sdk.tar.gz".to_string(),
        }),
    )
    .await
    .unwrap();

    // Visible while published
    let Json(listed) = handlers::get_sdks(State(state.clone())).await;
    assert_eq!(listed.len(), 1);

    // Yank it
    handlers::update_sdk(
        admin,
        State(state.clone()),
        Path(sdk.id),
        Json(gameverse_backend::models::UpdateSdkRequest {
            version: None,
            download_url: None,
            published: Some(false),
        }),
    )
    .await
    .unwrap();

    let Json(listed) = handlers::get_sdks(State(state.clone())).await;
    assert!(listed.is_empty());
    let result = handlers::get_sdk(State(state), Path(sdk.id)).await;
    assert_eq!(result.unwrap_err(), ApiError::NotFound);
}

#[test]
async fn test_doc_page_slug_conflict() {
    let state = create_test_state(MockWebhookTransport::new());
    let admin = admin_dev(&state);

    let page = CreateDocPageRequest {
        slug: "getting-started".to_string(),
        title: "Getting Started".to_string(),
        body: "Welcome.".to_string(),
        published: true,
    };

    handlers::create_doc_page(admin.clone(), State(state.clone()), Json(page.clone()))
        .await
        .unwrap();
    let result = handlers::create_doc_page(admin, State(state), Json(page)).await;

    assert_eq!(result.unwrap_err().status(), StatusCode::CONFLICT);
}

#[test]
async fn test_admin_revoke_key_overrides_ownership() {
    let state = create_test_state(MockWebhookTransport::new());
    let admin = admin_dev(&state);
    let dev = free_dev(&state);

    let (_, Json(key)) = handlers::create_key(
        dev,
        State(state.clone()),
        Json(CreateKeyRequest {
            name: "victim".to_string(),
            tier: None,
        }),
    )
    .await
    .unwrap();

    let status = handlers::admin_revoke_key(admin, State(state.clone()), Path(key.id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(state.store.api_keys.get(key.id).unwrap().revoked);
}

// --- RECOMMENDATIONS ---

#[test]
async fn test_recommendations_unknown_player_is_not_found() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);

    let result = handlers::get_recommendations(
        auth,
        State(state),
        Path(Uuid::new_v4()),
        Query(handlers::catalog::RecommendQuery {
            strategy: None,
            limit: None,
        }),
    )
    .await;

    assert_eq!(result.unwrap_err(), ApiError::NotFound);
}

#[test]
async fn test_recommendations_exclude_played_catalog_games() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);
    let player = seed_player(&state, auth.developer_id);
    let played = Uuid::from_u128(2); // Ember Vale

    handlers::ingest_event(
        auth.clone(),
        State(state.clone()),
        Json(IngestEventRequest {
            player_id: player.id,
            name: "game_played".to_string(),
            properties: Some(serde_json::json!({ "game_id": played.to_string() })),
            occurred_at: None,
        }),
    )
    .await
    .unwrap();

    let Json(recs) = handlers::get_recommendations(
        auth,
        State(state),
        Path(player.id),
        Query(handlers::catalog::RecommendQuery {
            strategy: Some(gameverse_backend::models::Strategy::Content),
            limit: None,
        }),
    )
    .await
    .unwrap();

    assert!(!recs.is_empty());
    assert!(recs.iter().all(|r| r.game_id != played));
}

#[test]
async fn test_similar_games_excludes_reference_and_sorts() {
    let state = create_test_state(MockWebhookTransport::new());
    let auth = free_dev(&state);
    let reference = Uuid::from_u128(2); // Ember Vale, rpg

    let Json(similar) = handlers::get_similar_games(
        auth,
        State(state),
        Path(reference),
        Query(handlers::catalog::SimilarQuery { limit: Some(3) }),
    )
    .await
    .unwrap();

    assert_eq!(similar.len(), 3);
    assert!(similar.iter().all(|s| s.game_id != reference));
    // Skybound Saga shares genre and tags with Ember Vale, so it ranks first
    assert_eq!(similar[0].title, "Skybound Saga");
    assert!(similar.windows(2).all(|w| w[0].score >= w[1].score));
}
