use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    ratelimit::RateLimiterState,
    store::StoreState,
};

/// AuthDev Extractor Result
///
/// The resolved identity of an authenticated request: which developer is
/// calling, through which key, and what that key is allowed to do. Handlers
/// take this as an argument to get identity, RBAC role and tier in one go.
#[derive(Debug, Clone)]
pub struct AuthDev {
    /// The owning developer of the presented API key.
    pub developer_id: Uuid,
    /// The key record the request authenticated with. `Uuid::nil()` when the
    /// local dev bypass was used (no key involved).
    pub key_id: Uuid,
    /// RBAC field: 'developer' or 'admin'.
    pub role: String,
    /// Key tier: 'free', 'pro' or 'enterprise'. Gates features and quota.
    pub tier: String,
}

impl AuthDev {
    /// Whether the tier admits the pro-gated features (experiments, churn,
    /// multiple sandboxes).
    pub fn is_pro(&self) -> bool {
        matches!(self.tier.as_str(), "pro" | "enterprise")
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// AuthDev Extractor Implementation
///
/// Implements Axum's FromRequestParts trait so any handler can demand an
/// authenticated caller by taking `AuthDev` as a parameter. The flow:
///
/// 1. Dependency resolution: pull Store, AppConfig and RateLimiter from state.
/// 2. Local bypass: in `Env::Local` the `x-developer-id` header may name an
///    existing developer directly, skipping key auth and rate limiting.
/// 3. Key resolution: look up the `x-api-key` secret; unknown and revoked
///    keys are both rejected with 401.
/// 4. Rate limiting: count the request against the key's fixed window and
///    reject with 429 once the tier quota is spent.
impl<S> FromRequestParts<S> for AuthDev
where
    S: Send + Sync,
    StoreState: FromRef<S>,
    AppConfig: FromRef<S>,
    RateLimiterState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = StoreState::from_ref(state);
        let config = AppConfig::from_ref(state);
        let limiter = RateLimiterState::from_ref(state);

        // Local development bypass: authenticate as an existing developer by
        // id alone. Guarded by the Env check so it can never work in prod.
        if config.env == Env::Local {
            if let Some(header) = parts.headers.get("x-developer-id") {
                if let Ok(id_str) = header.to_str() {
                    if let Ok(dev_id) = Uuid::parse_str(id_str) {
                        if let Some(dev) = store.developers.get(dev_id) {
                            return Ok(AuthDev {
                                developer_id: dev.id,
                                key_id: Uuid::nil(),
                                role: dev.role,
                                tier: dev.plan,
                            });
                        }
                    }
                }
            }
        }

        let secret = parts
            .headers
            .get("x-api-key")
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let key = store
            .find_key_by_secret(secret)
            .ok_or(ApiError::Unauthorized)?;

        // The developer record must still exist; a deleted developer
        // invalidates all of their keys.
        let dev = store
            .developers
            .get(key.developer_id)
            .ok_or(ApiError::Unauthorized)?;

        let decision = limiter.check(key.id, config.quota_for(&key.tier));
        if !decision.allowed {
            return Err(ApiError::RateLimited);
        }

        Ok(AuthDev {
            developer_id: dev.id,
            key_id: key.id,
            role: dev.role,
            tier: key.tier,
        })
    }
}
