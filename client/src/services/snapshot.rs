//! HealthSnapshot producer
//!
//! Samplers supply raw readings; the producer stamps them into immutable
//! [`HealthSnapshot`]s, deriving the performance zone from heart rate.

use crate::scoring::ScoringService;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::debug;
use workout_music_shared::types::RealTimeData;
use workout_music_shared::{fatigue_from_recovery, HealthReading, HealthSnapshot, RequestError};

/// Source of raw physiological readings
#[async_trait]
pub trait HealthSampler: Send + Sync {
    async fn sample(&self) -> Result<HealthReading, RequestError>;
}

/// Sampler backed by the scoring service's real-time endpoint
///
/// Fields the endpoint does not report fall back to the last value seen,
/// and fatigue is derived from the recovery index when absent.
pub struct RealTimeSampler {
    scoring: Arc<dyn ScoringService>,
    last: Mutex<Option<HealthReading>>,
}

impl RealTimeSampler {
    pub fn new(scoring: Arc<dyn ScoringService>) -> Self {
        Self {
            scoring,
            last: Mutex::new(None),
        }
    }

    fn merge(data: &RealTimeData, previous: Option<&HealthReading>) -> HealthReading {
        HealthReading {
            heart_rate: data.heart_rate,
            hrv: data.hrv,
            cadence: data
                .cadence
                .or(previous.map(|p| p.cadence))
                .unwrap_or_default(),
            recovery_index: data.recovery_index,
            training_load: data
                .training_load
                .or(previous.map(|p| p.training_load))
                .unwrap_or_default(),
            intensity_score: data.intensity_score,
            fatigue_index: data
                .fatigue_index
                .unwrap_or_else(|| fatigue_from_recovery(data.recovery_index)),
        }
    }
}

#[async_trait]
impl HealthSampler for RealTimeSampler {
    async fn sample(&self) -> Result<HealthReading, RequestError> {
        let data = self.scoring.real_time_data().await?;
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let reading = Self::merge(&data, last.as_ref());
        *last = Some(reading);
        Ok(reading)
    }
}

/// Sampler replaying a fixed script of readings
///
/// Each sample consumes the next reading; once the script is exhausted the
/// final reading repeats.
pub struct ScriptedSampler {
    script: Mutex<VecDeque<HealthReading>>,
    last: Mutex<Option<HealthReading>>,
}

impl ScriptedSampler {
    pub fn new(readings: impl IntoIterator<Item = HealthReading>) -> Self {
        Self {
            script: Mutex::new(readings.into_iter().collect()),
            last: Mutex::new(None),
        }
    }

    /// Sampler that always returns the same reading
    pub fn constant(reading: HealthReading) -> Self {
        Self::new([reading])
    }
}

#[async_trait]
impl HealthSampler for ScriptedSampler {
    async fn sample(&self) -> Result<HealthReading, RequestError> {
        let next = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(reading) = next {
            *last = Some(reading);
        }
        (*last).ok_or_else(|| RequestError::Config("scripted sampler has no readings".to_string()))
    }
}

/// Produces snapshots on demand; the session drives the periodic cadence
#[derive(Clone)]
pub struct SnapshotProducer {
    sampler: Arc<dyn HealthSampler>,
}

impl SnapshotProducer {
    pub fn new(sampler: Arc<dyn HealthSampler>) -> Self {
        Self { sampler }
    }

    /// Sample and capture a fresh snapshot
    pub async fn produce(&self) -> Result<HealthSnapshot, RequestError> {
        let reading = self.sampler.sample().await?;
        let snapshot = HealthSnapshot::capture(reading);
        debug!(
            heart_rate = snapshot.heart_rate(),
            hrv = snapshot.hrv(),
            zone = snapshot.performance_zone().number(),
            "Captured health snapshot"
        );
        Ok(snapshot)
    }
}
