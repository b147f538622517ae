use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Service configuration, built once at startup and carried in the router
/// state. There is no global singleton; the gate and pipeline receive this
/// by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub limits: LimitsConfig,
    pub optimize: OptimizeConfig,
    pub temp_store: TempStoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Shared secret expected in the X-API-Key header.
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
    /// Requests allowed per client within one rate-limit window.
    pub rate_limit_max_requests: u32,
    /// Rate-limit window length in seconds.
    pub rate_limit_window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeConfig {
    pub default_quality: u8,
    pub default_format: String,
    pub default_max_width: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempStoreConfig {
    /// Directory holding url-mode artifacts, created at startup if missing.
    pub dir: PathBuf,
    /// Artifact retention in seconds; 0 disables the background sweep.
    pub ttl_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::defaults().with_env_overrides()
    }

    fn defaults() -> Self {
        Self {
            server: ServerConfig { port: 3000 },
            security: SecurityConfig {
                api_key: "your-default-api-key-change-me".to_string(),
            },
            limits: LimitsConfig {
                max_upload_bytes: 5 * 1024 * 1024,
                rate_limit_max_requests: 100,
                rate_limit_window_secs: 15 * 60,
            },
            optimize: OptimizeConfig {
                default_quality: 75,
                default_format: "webp".to_string(),
                default_max_width: 2000,
            },
            temp_store: TempStoreConfig {
                dir: PathBuf::from("temp"),
                ttl_secs: 0,
            },
        }
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("API_KEY") {
            self.security.api_key = v;
        }
        if let Ok(v) = env::var("MAX_UPLOAD_BYTES") {
            self.limits.max_upload_bytes = v.parse().unwrap_or(self.limits.max_upload_bytes);
        }
        if let Ok(v) = env::var("RATE_LIMIT_MAX_REQUESTS") {
            self.limits.rate_limit_max_requests =
                v.parse().unwrap_or(self.limits.rate_limit_max_requests);
        }
        if let Ok(v) = env::var("RATE_LIMIT_WINDOW_SECS") {
            self.limits.rate_limit_window_secs =
                v.parse().unwrap_or(self.limits.rate_limit_window_secs);
        }
        if let Ok(v) = env::var("DEFAULT_QUALITY") {
            self.optimize.default_quality = v.parse().unwrap_or(self.optimize.default_quality);
        }
        if let Ok(v) = env::var("DEFAULT_FORMAT") {
            self.optimize.default_format = v;
        }
        if let Ok(v) = env::var("DEFAULT_MAX_WIDTH") {
            self.optimize.default_max_width = v.parse().unwrap_or(self.optimize.default_max_width);
        }
        if let Ok(v) = env::var("TEMP_DIR") {
            self.temp_store.dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("TEMP_TTL_SECS") {
            self.temp_store.ttl_secs = v.parse().unwrap_or(self.temp_store.ttl_secs);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.limits.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.limits.rate_limit_max_requests, 100);
        assert_eq!(config.limits.rate_limit_window_secs, 900);
        assert_eq!(config.optimize.default_quality, 75);
        assert_eq!(config.optimize.default_format, "webp");
        assert_eq!(config.optimize.default_max_width, 2000);
        assert_eq!(config.temp_store.ttl_secs, 0);
    }

    #[test]
    fn test_temp_store_defaults() {
        let config = AppConfig::defaults();
        assert_eq!(config.temp_store.dir, PathBuf::from("temp"));
    }
}
