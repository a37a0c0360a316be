//! Application state management
//!
//! [`AppState`] bundles the long-lived collaborators a client process needs
//! and starts workout sessions from them.
//!
//! # Design Principles
//!
//! 1. **Build once**: The HTTP client and config are created at startup
//! 2. **Cheap cloning**: All fields are Arc'd
//! 3. **Immutable after creation**: Sessions own all mutable state

use crate::config::AppConfig;
use crate::scoring::{HttpScoringClient, ScoringService};
use crate::services::{HealthSampler, LogNotifier, Notifier, SnapshotProducer};
use crate::session::{SessionDeps, SessionHandle, SessionManager, SessionSettings};
use std::sync::Arc;
use workout_music_shared::{RequestError, WorkoutPhase};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Scoring service client
    pub scoring: Arc<dyn ScoringService>,
    /// Local notification sink
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(config: AppConfig, scoring: Arc<dyn ScoringService>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config: Arc::new(config),
            scoring,
            notifier,
        }
    }

    /// Build state with the HTTP scoring client and log notifications
    ///
    /// Fails with a configuration error when the service URL is malformed.
    pub fn from_config(config: AppConfig) -> Result<Self, RequestError> {
        config.validate()?;
        let scoring = HttpScoringClient::new(&config.service.base_url, config.service.request_timeout())?;
        Ok(Self::new(config, Arc::new(scoring), Arc::new(LogNotifier)))
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Start a workout session sampling health data from `sampler`
    pub fn start_session(&self, sampler: Arc<dyn HealthSampler>, phase: WorkoutPhase) -> SessionHandle {
        let deps = SessionDeps {
            scoring: Arc::clone(&self.scoring),
            producer: SnapshotProducer::new(sampler),
            notifier: Arc::clone(&self.notifier),
        };
        SessionManager::start(deps, SessionSettings::from_config(&self.config), phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_rejects_bad_url() {
        let mut config = AppConfig::default();
        config.service.base_url = "::::".to_string();
        let err = AppState::from_config(config).err().unwrap();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_state_clone_is_cheap() {
        let state = AppState::from_config(AppConfig::default()).unwrap();
        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.config, &cloned.config));
    }
}
