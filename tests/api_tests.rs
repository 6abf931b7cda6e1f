use gameverse_backend::{
    AppState, MockWebhookTransport, RateLimiter, Store, create_router,
    config::AppConfig,
    models::{Game, RateLimitStatus, RegisterDeveloperResponse, Sandbox},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub store: Arc<Store>,
}

async fn spawn_app_with_config(config: AppConfig) -> TestApp {
    let store = Arc::new(Store::new());
    store.bootstrap_admin(&config.admin_email, &config.admin_api_key);
    let limiter = Arc::new(RateLimiter::new(config.rate_window_secs));

    let state = AppState {
        store: store.clone(),
        config,
        limiter,
        transport: Arc::new(MockWebhookTransport::new()),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, store }
}

async fn spawn_app() -> TestApp {
    spawn_app_with_config(AppConfig::default()).await
}

async fn register(app: &TestApp, client: &reqwest::Client) -> RegisterDeveloperResponse {
    client
        .post(format!("{}/register", app.address))
        .json(&serde_json::json!({
            "email": format!("{}@studio.test", Uuid::new_v4().simple()),
            "studio_name": "Integration Studio"
        }))
        .send()
        .await
        .expect("register failed")
        .json()
        .await
        .expect("register body")
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_public_catalog_listing() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/games?genre=rpg", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let games: Vec<Game> = response.json().await.unwrap();
    assert_eq!(games.len(), 2);
    assert!(games.iter().all(|g| g.genre == "rpg"));
}

#[tokio::test]
async fn test_authenticated_route_rejects_anonymous() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/keys", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_api_key_authenticates() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let registration = register(&app, &client).await;

    let response = client
        .get(format!("{}/keys", app.address))
        .header("x-api-key", &registration.api_key.secret)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_revoked_key_is_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let registration = register(&app, &client).await;
    let secret = registration.api_key.secret.clone();

    // Revoke via the key's own credential
    let response = client
        .delete(format!("{}/keys/{}", app.address, registration.api_key.id))
        .header("x-api-key", &secret)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/keys", app.address))
        .header("x-api-key", &secret)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_local_dev_bypass_header() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let registration = register(&app, &client).await;

    // In Env::Local the x-developer-id header authenticates without a key
    let response = client
        .get(format!("{}/webhooks", app.address))
        .header("x-developer-id", registration.developer.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_rate_limit_exhaustion_returns_429() {
    let config = AppConfig {
        quota_free: 3,
        ..AppConfig::default()
    };
    let app = spawn_app_with_config(config).await;
    let client = reqwest::Client::new();
    let registration = register(&app, &client).await;

    for _ in 0..3 {
        let response = client
            .get(format!("{}/keys", app.address))
            .header("x-api-key", &registration.api_key.secret)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let response = client
        .get(format!("{}/keys", app.address))
        .header("x-api-key", &registration.api_key.secret)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 429);
}

#[tokio::test]
async fn test_rate_limit_status_reflects_usage() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let registration = register(&app, &client).await;

    let response = client
        .get(format!("{}/limits", app.address))
        .header("x-api-key", &registration.api_key.secret)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let status: RateLimitStatus = response.json().await.unwrap();
    assert_eq!(status.tier, "free");
    // The /limits request itself consumed one slot
    assert_eq!(status.used, 1);
    assert_eq!(status.remaining, status.limit - 1);
}

#[tokio::test]
async fn test_admin_route_enforces_role() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let registration = register(&app, &client).await;

    // Plain developer key: authenticated but forbidden
    let response = client
        .get(format!("{}/admin/stats", app.address))
        .header("x-api-key", &registration.api_key.secret)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // Bootstrap admin key passes
    let response = client
        .get(format!("{}/admin/stats", app.address))
        .header("x-api-key", "gv_local_admin_key")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_sandbox_lifecycle_over_http() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let registration = register(&app, &client).await;
    let secret = &registration.api_key.secret;

    let response = client
        .post(format!("{}/sandboxes", app.address))
        .header("x-api-key", secret)
        .json(&serde_json::json!({ "name": "staging" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let sandbox: Sandbox = response.json().await.unwrap();

    let response = client
        .post(format!("{}/sandboxes/{}/reset", app.address, sandbox.id))
        .header("x-api-key", secret)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let reset: Sandbox = response.json().await.unwrap();
    assert_eq!(reset.reset_count, 1);

    let response = client
        .delete(format!("{}/sandboxes/{}", app.address, sandbox.id))
        .header("x-api-key", secret)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
    assert!(app.store.sandbox_of(registration.developer.id, sandbox.id).is_none());
}

#[tokio::test]
async fn test_validation_error_shape() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/register", app.address))
        .json(&serde_json::json!({
            "email": "no-at-sign",
            "studio_name": "Studio"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body.get("error").and_then(|e| e.as_str()).is_some());
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api-docs/openapi.json", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let doc: serde_json::Value = response.json().await.unwrap();
    assert!(doc.get("paths").is_some());
}
