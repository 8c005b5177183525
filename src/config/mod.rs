use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub idempotency: IdempotencyConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// When true the identity provider is bypassed entirely and requests get
    /// a fixed synthetic identity. Settable only via config/env, never via
    /// request input.
    pub offline_mode: bool,
}

/// Per-endpoint-class fixed-window ceilings. Reads are cheapest, writes
/// dearer, billing reads dearest; every preset must keep
/// read > write > billing_read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub read_max_requests: u32,
    pub write_max_requests: u32,
    pub billing_read_max_requests: u32,
    pub window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyConfig {
    /// Records lapse after this long whether complete or still in flight, so
    /// an abandoned claim never blocks retries forever.
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_cors: bool,
    pub max_request_size_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Auth overrides
        if let Ok(v) = env::var("AUTH_OFFLINE_MODE") {
            self.auth.offline_mode = v.parse().unwrap_or(self.auth.offline_mode);
        }

        // Rate limit overrides
        if let Ok(v) = env::var("RATE_LIMIT_READ_MAX") {
            self.rate_limit.read_max_requests =
                v.parse().unwrap_or(self.rate_limit.read_max_requests);
        }
        if let Ok(v) = env::var("RATE_LIMIT_WRITE_MAX") {
            self.rate_limit.write_max_requests =
                v.parse().unwrap_or(self.rate_limit.write_max_requests);
        }
        if let Ok(v) = env::var("RATE_LIMIT_BILLING_READ_MAX") {
            self.rate_limit.billing_read_max_requests =
                v.parse().unwrap_or(self.rate_limit.billing_read_max_requests);
        }
        if let Ok(v) = env::var("RATE_LIMIT_WINDOW_SECS") {
            self.rate_limit.window_secs = v.parse().unwrap_or(self.rate_limit.window_secs);
        }

        // Idempotency overrides
        if let Ok(v) = env::var("IDEMPOTENCY_TTL_SECS") {
            self.idempotency.ttl_secs = v.parse().unwrap_or(self.idempotency.ttl_secs);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_CORS") {
            self.api.enable_cors = v.parse().unwrap_or(self.api.enable_cors);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes =
                v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            auth: AuthConfig { offline_mode: false },
            rate_limit: RateLimitConfig {
                read_max_requests: 1000,
                write_max_requests: 500,
                billing_read_max_requests: 100,
                window_secs: 60,
            },
            idempotency: IdempotencyConfig { ttl_secs: 60 * 60 },
            api: ApiConfig {
                enable_cors: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            auth: AuthConfig { offline_mode: false },
            rate_limit: RateLimitConfig {
                read_max_requests: 300,
                write_max_requests: 120,
                billing_read_max_requests: 30,
                window_secs: 60,
            },
            idempotency: IdempotencyConfig { ttl_secs: 24 * 60 * 60 },
            api: ApiConfig {
                enable_cors: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            auth: AuthConfig { offline_mode: false },
            rate_limit: RateLimitConfig {
                read_max_requests: 60,
                write_max_requests: 30,
                billing_read_max_requests: 10,
                window_secs: 60,
            },
            idempotency: IdempotencyConfig { ttl_secs: 24 * 60 * 60 },
            api: ApiConfig {
                enable_cors: true,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
