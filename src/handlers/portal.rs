use crate::{
    AppState,
    auth::AuthDev,
    error::ApiError,
    models::{
        ApiKey, CreateKeyRequest, CreateSandboxRequest, CreateWebhookRequest, Developer, DocPage,
        RateLimitStatus, RegisterDeveloperRequest, RegisterDeveloperResponse, Sandbox, Sdk,
        UpdateWebhookRequest, Webhook,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

/// Event kinds a webhook may subscribe to.
pub const WEBHOOK_EVENT_KINDS: &[&str] = &[
    "player.created",
    "player.deleted",
    "session.started",
    "session.ended",
    "event.ingested",
    "sdk.published",
];

/// Numeric ordering of tiers, for "key tier must not exceed the plan" checks.
fn tier_rank(tier: &str) -> Option<u8> {
    match tier {
        "free" => Some(0),
        "pro" => Some(1),
        "enterprise" => Some(2),
        _ => None,
    }
}

fn new_key(developer_id: Uuid, name: &str, tier: &str) -> ApiKey {
    ApiKey {
        id: Uuid::new_v4(),
        developer_id,
        name: name.to_string(),
        secret: format!("gv_{}", Uuid::new_v4().simple()),
        tier: tier.to_string(),
        revoked: false,
        created_at: Utc::now(),
    }
}

// --- Registration ---

/// register_developer
///
/// [Public Route] Creates a developer account on the free plan together with
/// its initial API key. The key secret is only ever returned here.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterDeveloperRequest,
    responses(
        (status = 201, description = "Registered", body = RegisterDeveloperResponse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_developer(
    State(state): State<AppState>,
    Json(payload): Json<RegisterDeveloperRequest>,
) -> Result<(StatusCode, Json<RegisterDeveloperResponse>), ApiError> {
    if !payload.email.contains('@') {
        return Err(ApiError::validation("email must be a valid address"));
    }
    if payload.studio_name.trim().is_empty() {
        return Err(ApiError::validation("studio_name must not be empty"));
    }
    if state.store.developer_by_email(&payload.email).is_some() {
        return Err(ApiError::conflict("email already registered"));
    }

    let dev_id = Uuid::new_v4();
    let developer = Developer {
        id: dev_id,
        email: payload.email,
        studio_name: payload.studio_name,
        role: "developer".to_string(),
        plan: "free".to_string(),
        created_at: Utc::now(),
    };
    state.store.developers.insert(dev_id, developer.clone());

    let key = new_key(dev_id, "default", "free");
    state.store.api_keys.insert(key.id, key.clone());

    tracing::info!(developer_id = %dev_id, "developer registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterDeveloperResponse {
            developer,
            api_key: key,
        }),
    ))
}

// --- API keys ---

/// create_key
///
/// [Authenticated Route] Mints an additional API key. The requested tier
/// defaults to the developer's plan and may never exceed it.
#[utoipa::path(
    post,
    path = "/keys",
    request_body = CreateKeyRequest,
    responses(
        (status = 201, description = "Created", body = ApiKey),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Tier exceeds plan")
    )
)]
pub async fn create_key(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Json(payload): Json<CreateKeyRequest>,
) -> Result<(StatusCode, Json<ApiKey>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    let dev = state
        .store
        .developers
        .get(developer_id)
        .ok_or(ApiError::Unauthorized)?;

    let tier = payload.tier.unwrap_or_else(|| dev.plan.clone());
    let requested = tier_rank(&tier)
        .ok_or_else(|| ApiError::validation("tier must be free, pro or enterprise"))?;
    let plan = tier_rank(&dev.plan).unwrap_or(0);
    if requested > plan {
        return Err(ApiError::forbidden(format!(
            "key tier '{}' exceeds account plan '{}'",
            tier, dev.plan
        )));
    }

    let key = new_key(developer_id, payload.name.trim(), &tier);
    state.store.api_keys.insert(key.id, key.clone());
    Ok((StatusCode::CREATED, Json(key)))
}

/// list_keys
///
/// [Authenticated Route] All of the caller's keys, revoked ones included.
#[utoipa::path(
    get,
    path = "/keys",
    responses((status = 200, description = "My keys", body = [ApiKey]))
)]
pub async fn list_keys(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
) -> Json<Vec<ApiKey>> {
    Json(state.store.keys_for(developer_id))
}

/// revoke_key
///
/// [Authenticated Route] Revokes one of the caller's keys. The record is
/// marked rather than deleted; a revoked key can no longer authenticate.
#[utoipa::path(
    delete,
    path = "/keys/{id}",
    params(("id" = Uuid, Path, description = "Key ID")),
    responses(
        (status = 204, description = "Revoked"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn revoke_key(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let owned = state
        .store
        .api_keys
        .get(id)
        .filter(|k| k.developer_id == developer_id);
    if owned.is_none() {
        return Err(ApiError::NotFound);
    }
    state.store.api_keys.update(id, |k| k.revoked = true);
    Ok(StatusCode::NO_CONTENT)
}

/// rate_limit_status
///
/// [Authenticated Route] The calling key's consumption inside the current
/// fixed window. The request that fetches this status is itself counted.
#[utoipa::path(
    get,
    path = "/limits",
    responses((status = 200, description = "Current window usage", body = RateLimitStatus))
)]
pub async fn rate_limit_status(
    AuthDev { key_id, tier, .. }: AuthDev,
    State(state): State<AppState>,
) -> Json<RateLimitStatus> {
    let quota = state.config.quota_for(&tier);
    let usage = state.limiter.usage(key_id, quota);
    Json(RateLimitStatus {
        tier,
        limit: quota,
        used: usage.used,
        remaining: usage.remaining,
        window_seconds: state.config.rate_window_secs,
    })
}

// --- Webhooks ---

fn validate_webhook_url(url: &str) -> Result<(), ApiError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ApiError::validation("url must be http or https"))
    }
}

fn validate_webhook_events(events: &[String]) -> Result<(), ApiError> {
    if events.is_empty() {
        return Err(ApiError::validation("at least one event kind required"));
    }
    for kind in events {
        if !WEBHOOK_EVENT_KINDS.contains(&kind.as_str()) {
            return Err(ApiError::validation(format!(
                "unknown event kind '{}'",
                kind
            )));
        }
    }
    Ok(())
}

/// create_webhook
///
/// [Authenticated Route] Registers a delivery target for the given event
/// kinds. The URL scheme and every event kind are validated up front.
#[utoipa::path(
    post,
    path = "/webhooks",
    request_body = CreateWebhookRequest,
    responses(
        (status = 201, description = "Created", body = Webhook),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn create_webhook(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Json(payload): Json<CreateWebhookRequest>,
) -> Result<(StatusCode, Json<Webhook>), ApiError> {
    validate_webhook_url(&payload.url)?;
    validate_webhook_events(&payload.events)?;

    let id = Uuid::new_v4();
    let webhook = Webhook {
        id,
        developer_id,
        url: payload.url,
        events: payload.events,
        active: true,
        last_delivery_status: None,
        created_at: Utc::now(),
    };
    state.store.webhooks.insert(id, webhook.clone());
    Ok((StatusCode::CREATED, Json(webhook)))
}

/// list_webhooks
#[utoipa::path(
    get,
    path = "/webhooks",
    responses((status = 200, description = "My webhooks", body = [Webhook]))
)]
pub async fn list_webhooks(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
) -> Json<Vec<Webhook>> {
    Json(state.store.webhooks_for(developer_id))
}

/// update_webhook
///
/// [Authenticated Route] Partial update of one of the caller's webhooks.
#[utoipa::path(
    put,
    path = "/webhooks/{id}",
    params(("id" = Uuid, Path, description = "Webhook ID")),
    request_body = UpdateWebhookRequest,
    responses(
        (status = 200, description = "Updated", body = Webhook),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_webhook(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWebhookRequest>,
) -> Result<Json<Webhook>, ApiError> {
    state
        .store
        .webhook_of(developer_id, id)
        .ok_or(ApiError::NotFound)?;

    if let Some(url) = &payload.url {
        validate_webhook_url(url)?;
    }
    if let Some(events) = &payload.events {
        validate_webhook_events(events)?;
    }

    let updated = state
        .store
        .webhooks
        .update(id, |w| {
            if let Some(url) = payload.url.clone() {
                w.url = url;
            }
            if let Some(events) = payload.events.clone() {
                w.events = events;
            }
            if let Some(active) = payload.active {
                w.active = active;
            }
        })
        .ok_or(ApiError::NotFound)?;
    Ok(Json(updated))
}

/// delete_webhook
#[utoipa::path(
    delete,
    path = "/webhooks/{id}",
    params(("id" = Uuid, Path, description = "Webhook ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_webhook(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.store.webhook_of(developer_id, id).is_none() {
        return Err(ApiError::NotFound);
    }
    state.store.webhooks.remove(id);
    Ok(StatusCode::NO_CONTENT)
}

/// test_webhook
///
/// [Authenticated Route] Fires a synthetic payload at the webhook through
/// the delivery transport and records the outcome on the record. Inactive
/// webhooks cannot be tested.
#[utoipa::path(
    post,
    path = "/webhooks/{id}/test",
    params(("id" = Uuid, Path, description = "Webhook ID")),
    responses(
        (status = 200, description = "Delivery attempted", body = Webhook),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Webhook inactive")
    )
)]
pub async fn test_webhook(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Webhook>, ApiError> {
    let webhook = state
        .store
        .webhook_of(developer_id, id)
        .ok_or(ApiError::NotFound)?;
    if !webhook.active {
        return Err(ApiError::conflict("webhook is inactive"));
    }

    let payload = serde_json::json!({
        "kind": "test",
        "webhook_id": webhook.id,
        "sent_at": Utc::now(),
    });

    let status = match state.transport.deliver(&webhook.url, &payload).await {
        Ok(code) => format!("{}", code),
        Err(e) => {
            tracing::warn!(webhook_id = %id, error = %e, "test delivery failed");
            "failed".to_string()
        }
    };

    let updated = state
        .store
        .webhooks
        .update(id, |w| w.last_delivery_status = Some(status.clone()))
        .ok_or(ApiError::NotFound)?;
    Ok(Json(updated))
}

// --- Sandboxes ---

const SANDBOX_SEED_PLAYERS: i64 = 5;
const SANDBOX_SEED_EVENTS: i64 = 50;

/// create_sandbox
///
/// [Authenticated Route] Creates a pre-seeded sandbox environment. Free-tier
/// keys are limited to a single sandbox; pro and enterprise may hold several.
#[utoipa::path(
    post,
    path = "/sandboxes",
    request_body = CreateSandboxRequest,
    responses(
        (status = 201, description = "Created", body = Sandbox),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Sandbox limit for tier")
    )
)]
pub async fn create_sandbox(
    auth: AuthDev,
    State(state): State<AppState>,
    Json(payload): Json<CreateSandboxRequest>,
) -> Result<(StatusCode, Json<Sandbox>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    let existing = state.store.sandboxes_for(auth.developer_id).len();
    if existing >= 1 && !auth.is_pro() {
        return Err(ApiError::forbidden(
            "free tier allows a single sandbox; upgrade for more",
        ));
    }

    let id = Uuid::new_v4();
    let sandbox = Sandbox {
        id,
        developer_id: auth.developer_id,
        name: payload.name.trim().to_string(),
        seeded_players: SANDBOX_SEED_PLAYERS,
        seeded_events: SANDBOX_SEED_EVENTS,
        reset_count: 0,
        created_at: Utc::now(),
    };
    state.store.sandboxes.insert(id, sandbox.clone());
    Ok((StatusCode::CREATED, Json(sandbox)))
}

/// list_sandboxes
#[utoipa::path(
    get,
    path = "/sandboxes",
    responses((status = 200, description = "My sandboxes", body = [Sandbox]))
)]
pub async fn list_sandboxes(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
) -> Json<Vec<Sandbox>> {
    Json(state.store.sandboxes_for(developer_id))
}

/// get_sandbox
#[utoipa::path(
    get,
    path = "/sandboxes/{id}",
    params(("id" = Uuid, Path, description = "Sandbox ID")),
    responses(
        (status = 200, description = "Found", body = Sandbox),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_sandbox(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Sandbox>, ApiError> {
    state
        .store
        .sandbox_of(developer_id, id)
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// reset_sandbox
///
/// [Authenticated Route] Restores the sandbox to its seeded state and bumps
/// the reset counter.
#[utoipa::path(
    post,
    path = "/sandboxes/{id}/reset",
    params(("id" = Uuid, Path, description = "Sandbox ID")),
    responses(
        (status = 200, description = "Reset", body = Sandbox),
        (status = 404, description = "Not Found")
    )
)]
pub async fn reset_sandbox(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Sandbox>, ApiError> {
    state
        .store
        .sandbox_of(developer_id, id)
        .ok_or(ApiError::NotFound)?;
    let updated = state
        .store
        .sandboxes
        .update(id, |s| {
            s.seeded_players = SANDBOX_SEED_PLAYERS;
            s.seeded_events = SANDBOX_SEED_EVENTS;
            s.reset_count += 1;
        })
        .ok_or(ApiError::NotFound)?;
    Ok(Json(updated))
}

/// delete_sandbox
#[utoipa::path(
    delete,
    path = "/sandboxes/{id}",
    params(("id" = Uuid, Path, description = "Sandbox ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_sandbox(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.store.sandbox_of(developer_id, id).is_none() {
        return Err(ApiError::NotFound);
    }
    state.store.sandboxes.remove(id);
    Ok(StatusCode::NO_CONTENT)
}

// --- SDK registry (public read side) ---

/// get_sdks
///
/// [Public Route] Lists published SDK registry entries. Unpublished entries
/// only appear through the admin surface.
#[utoipa::path(
    get,
    path = "/sdks",
    responses((status = 200, description = "Published SDKs", body = [Sdk]))
)]
pub async fn get_sdks(State(state): State<AppState>) -> Json<Vec<Sdk>> {
    Json(state.store.published_sdks())
}

/// get_sdk
#[utoipa::path(
    get,
    path = "/sdks/{id}",
    params(("id" = Uuid, Path, description = "SDK ID")),
    responses(
        (status = 200, description = "Found", body = Sdk),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_sdk(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Sdk>, ApiError> {
    state
        .store
        .sdks
        .get(id)
        .filter(|s| s.published)
        .map(Json)
        .ok_or(ApiError::NotFound)
}

// --- Documentation (public read side) ---

/// get_docs
///
/// [Public Route] Lists published documentation pages, ordered by slug.
#[utoipa::path(
    get,
    path = "/docs",
    responses((status = 200, description = "Published pages", body = [DocPage]))
)]
pub async fn get_docs(State(state): State<AppState>) -> Json<Vec<DocPage>> {
    Json(state.store.published_docs())
}

/// get_doc
#[utoipa::path(
    get,
    path = "/docs/{slug}",
    params(("slug" = String, Path, description = "Page slug")),
    responses(
        (status = 200, description = "Found", body = DocPage),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_doc(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<DocPage>, ApiError> {
    state
        .store
        .doc_by_slug(&slug)
        .filter(|p| p.published)
        .map(Json)
        .ok_or(ApiError::NotFound)
}
