use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at
/// startup and shared immutably through the application state, so every
/// service (auth, rate limiting, webhook delivery) sees the same values.
#[derive(Clone)]
pub struct AppConfig {
    // Runtime environment marker. Controls the dev auth bypass and log format.
    pub env: Env,
    // Address the HTTP server binds, e.g. "0.0.0.0:3000".
    pub bind_addr: String,
    // Email of the bootstrap platform admin account.
    pub admin_email: String,
    // Secret of the bootstrap admin API key. Must be explicitly set in production.
    pub admin_api_key: String,
    // Fixed rate-limit window length in seconds.
    pub rate_window_secs: u64,
    // Per-window request quotas by key tier.
    pub quota_free: u32,
    pub quota_pro: u32,
    pub quota_enterprise: u32,
}

/// Env
///
/// Defines the runtime context, used to switch between development
/// conveniences (header auth bypass, pretty logs) and hardened production
/// behavior (mandatory secrets, JSON logs).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Provides a safe, non-panicking AppConfig instance primarily used for
    /// test setup, without requiring any environment variables.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "127.0.0.1:3000".to_string(),
            admin_email: "admin@gameverse.local".to_string(),
            admin_api_key: "gv_local_admin_key".to_string(),
            rate_window_secs: 60,
            quota_free: 60,
            quota_pro: 600,
            quota_enterprise: 6000,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical startup initializer. Reads everything from environment
    /// variables and fails fast: a production boot with a missing admin
    /// secret panics rather than starting in an insecure state.
    ///
    /// # Panics
    /// Panics if `ADMIN_API_KEY` or `ADMIN_EMAIL` is unset while
    /// `APP_ENV=production`, or if a quota override is not a number.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let (admin_email, admin_api_key) = match env {
            Env::Production => (
                env::var("ADMIN_EMAIL").expect("FATAL: ADMIN_EMAIL must be set in production."),
                env::var("ADMIN_API_KEY")
                    .expect("FATAL: ADMIN_API_KEY must be set in production."),
            ),
            Env::Local => (
                env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@gameverse.local".to_string()),
                env::var("ADMIN_API_KEY").unwrap_or_else(|_| "gv_local_admin_key".to_string()),
            ),
        };

        Self {
            env,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            admin_email,
            admin_api_key,
            rate_window_secs: 60,
            quota_free: quota_var("RATE_QUOTA_FREE", 60),
            quota_pro: quota_var("RATE_QUOTA_PRO", 600),
            quota_enterprise: quota_var("RATE_QUOTA_ENTERPRISE", 6000),
        }
    }

    /// The per-window request quota for a key tier. Unknown tier strings
    /// fall back to the free quota.
    pub fn quota_for(&self, tier: &str) -> u32 {
        match tier {
            "enterprise" => self.quota_enterprise,
            "pro" => self.quota_pro,
            _ => self.quota_free,
        }
    }
}

fn quota_var(name: &str, default: u32) -> u32 {
    match env::var(name) {
        Ok(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("FATAL: {} must be a positive integer", name)),
        Err(_) => default,
    }
}
