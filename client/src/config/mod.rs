//! Configuration management for the workout music client
//!
//! Configuration is loaded hierarchically:
//! 1. Default values (in code)
//! 2. TOML config files (config/development.toml or config/production.toml)
//! 3. Environment variables (prefix: WM__)

use crate::error::ConfigError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use workout_music_shared::WorkoutPhase;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Scoring service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    /// Upper bound for every scoring-service round trip
    pub request_timeout_secs: u64,
    pub telemetry_enabled: bool,
}

/// Session timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Playback position tick
    pub tick_interval_ms: u64,
    /// Health snapshot cadence
    pub snapshot_interval_ms: u64,
    /// Periodic recommendation refresh
    pub refresh_interval_secs: u64,
    /// Duration assumed for tracks that report none
    pub fallback_track_duration_secs: f64,
    pub initial_phase: WorkoutPhase,
}

/// Prometheus exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub listen_addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1:9000".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                base_url: "http://localhost:5000".to_string(),
                request_timeout_secs: 10,
                telemetry_enabled: true,
            },
            session: SessionConfig {
                tick_interval_ms: 1000,
                snapshot_interval_ms: 2000,
                refresh_interval_secs: 30,
                fallback_track_duration_secs: 180.0,
                initial_phase: WorkoutPhase::Warmup,
            },
            metrics: MetricsConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Parsed base URL; only http and https are accepted
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::InvalidUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme '{}'", other),
            }),
        }
    }

    #[inline]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SessionConfig {
    #[inline]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    #[inline]
    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_millis(self.snapshot_interval_ms)
    }

    #[inline]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Loading order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file based on RUST_ENV (development.toml or production.toml)
    /// 3. Environment variables with WM__ prefix
    pub fn load() -> Result<Self, ConfigError> {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let config_file = format!("config/{}.toml", env);

        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Load from environment-specific config file
            .add_source(config::File::with_name(&config_file).required(false))
            // Override with environment variables (WM__ prefix)
            // e.g., WM__SERVICE__BASE_URL=http://10.0.0.2:5000
            .add_source(config::Environment::with_prefix("WM").separator("__"))
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the session cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.service.parsed_base_url()?;

        let positive = [
            ("service.request_timeout_secs", self.service.request_timeout_secs),
            ("session.tick_interval_ms", self.session.tick_interval_ms),
            ("session.snapshot_interval_ms", self.session.snapshot_interval_ms),
            ("session.refresh_interval_secs", self.session.refresh_interval_secs),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }

        let fallback = self.session.fallback_track_duration_secs;
        if !fallback.is_finite() || fallback <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "session.fallback_track_duration_secs".to_string(),
                message: "must be a positive number of seconds".to_string(),
            });
        }

        if self.metrics.enabled {
            self.metrics_addr()?;
        }
        Ok(())
    }

    /// Socket address for the Prometheus listener
    pub fn metrics_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.metrics
            .listen_addr
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                field: "metrics.listen_addr".to_string(),
                message: format!("'{}' is not a socket address", self.metrics.listen_addr),
            })
    }

    /// Check if running in production mode
    pub fn is_production() -> bool {
        env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    }
}
