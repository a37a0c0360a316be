//! Scoring-service request and response types
//!
//! These mirror the JSON exchanged with the external scoring service. Domain
//! models are converted into and out of them at the client boundary.

use crate::health_metrics::HealthSnapshot;
use crate::models::{AudioFeatureVector, Rating, TrackRating, TrackRecommendation, WorkoutPhase};
use crate::validation::clamp_unit;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Recommendation Exchange
// ============================================================================

/// Health state as sent in a recommendation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatePayload {
    pub heart_rate: f64,
    pub hrv: f64,
    pub training_load: f64,
    pub cadence: f64,
    pub recovery_index: f64,
    pub intensity_score: f64,
    pub fatigue_index: f64,
    pub performance_zone: u8,
}

impl From<&HealthSnapshot> for HealthStatePayload {
    fn from(snapshot: &HealthSnapshot) -> Self {
        Self {
            heart_rate: snapshot.heart_rate(),
            hrv: snapshot.hrv(),
            training_load: snapshot.training_load(),
            cadence: snapshot.cadence(),
            recovery_index: snapshot.recovery_index(),
            intensity_score: snapshot.intensity_score(),
            fatigue_index: snapshot.fatigue_index(),
            performance_zone: snapshot.performance_zone().number(),
        }
    }
}

/// Body of `POST /api/ml-recommendations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub health_state: HealthStatePayload,
    pub workout_phase: WorkoutPhase,
}

impl RecommendationRequest {
    pub fn new(snapshot: &HealthSnapshot, phase: WorkoutPhase) -> Self {
        Self {
            health_state: HealthStatePayload::from(snapshot),
            workout_phase: phase,
        }
    }
}

/// One ranked item of a recommendation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub track_name: String,
    pub artist: String,
    pub track_id: String,
    pub similarity_score: f64,
    pub ml_confidence: f64,
    #[serde(default)]
    pub physiological_reasoning: String,
    pub energy: f64,
    pub tempo: f64,
    pub valence: f64,
    pub danceability: f64,
    #[serde(default)]
    pub acousticness: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl RecommendationItem {
    /// Convert to a domain recommendation, clamping service-provided scores
    pub fn into_recommendation(self, received_at: DateTime<Utc>) -> TrackRecommendation {
        let features = AudioFeatureVector {
            energy: self.energy,
            tempo: self.tempo,
            valence: self.valence,
            danceability: self.danceability,
            acousticness: self.acousticness.unwrap_or_default(),
        }
        .clamped();

        TrackRecommendation {
            track_id: self.track_id,
            name: self.track_name,
            artist: self.artist,
            features,
            similarity_score: clamp_unit(self.similarity_score),
            confidence: clamp_unit(self.ml_confidence),
            reasoning: self.physiological_reasoning,
            received_at,
            duration_secs: self
                .duration_ms
                .filter(|ms| *ms > 0)
                .map(|ms| ms as f64 / 1000.0),
            url: self.url,
            preview_url: self.preview_url,
        }
    }
}

/// Response of `POST /api/ml-recommendations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub status: String,
    pub recommendations: Vec<RecommendationItem>,
    #[serde(default)]
    pub optimal_features: Option<AudioFeatureVector>,
    #[serde(default)]
    pub adaptation_strategy: Option<String>,
    /// Service clock; format is not relied upon
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
}

impl RecommendationResponse {
    /// Whether the service reported a failed scoring run
    pub fn is_error(&self) -> bool {
        self.status.eq_ignore_ascii_case("error")
    }
}

// ============================================================================
// Ratings
// ============================================================================

/// Body of `POST /api/track-rating`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRatingRequest {
    pub track_id: String,
    pub track_name: String,
    pub artist: String,
    pub rating: Rating,
    pub context: String,
    pub audio_features: AudioFeatureVector,
}

impl From<&TrackRating> for TrackRatingRequest {
    fn from(rating: &TrackRating) -> Self {
        Self {
            track_id: rating.track.track_id.clone(),
            track_name: rating.track.name.clone(),
            artist: rating.track.artist.clone(),
            rating: rating.rating,
            context: rating.context.clone(),
            audio_features: rating.track.features,
        }
    }
}

// ============================================================================
// Telemetry
// ============================================================================

/// Event-tagged payloads for `POST /api/health-data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TelemetryEvent {
    WorkoutStarted {
        session_id: Uuid,
        workout_phase: WorkoutPhase,
    },
    WorkoutEnded {
        session_id: Uuid,
        elapsed_secs: f64,
        tracks_played: usize,
    },
    MoodReported {
        mood: String,
    },
    PlaybackStarted {
        track_id: String,
        track_name: String,
        artist: String,
    },
    TrackCompleted {
        track_id: String,
        completed_percentage: f64,
    },
    TrackSkipped {
        track_id: String,
        position_secs: f64,
        duration_secs: f64,
    },
}

impl TelemetryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TelemetryEvent::WorkoutStarted { .. } => "workout_started",
            TelemetryEvent::WorkoutEnded { .. } => "workout_ended",
            TelemetryEvent::MoodReported { .. } => "mood_reported",
            TelemetryEvent::PlaybackStarted { .. } => "playback_started",
            TelemetryEvent::TrackCompleted { .. } => "track_completed",
            TelemetryEvent::TrackSkipped { .. } => "track_skipped",
        }
    }
}

/// Telemetry event with its emission time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEnvelope {
    #[serde(flatten)]
    pub event: TelemetryEvent,
    pub timestamp: DateTime<Utc>,
}

impl TelemetryEnvelope {
    pub fn now(event: TelemetryEvent) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// Real-Time Data
// ============================================================================

/// Response of `GET /api/real-time-data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealTimeData {
    pub heart_rate: f64,
    pub hrv: f64,
    pub recovery_index: f64,
    pub intensity_score: f64,
    pub performance_zone: u8,
    #[serde(default)]
    pub music_energy: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
    #[serde(default)]
    pub cadence: Option<f64>,
    #[serde(default)]
    pub training_load: Option<f64>,
    #[serde(default)]
    pub fatigue_index: Option<f64>,
}
