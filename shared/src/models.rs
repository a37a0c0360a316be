//! Domain models for recommendations, playback history and ratings

use crate::validation::{clamp_tempo, clamp_unit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workout phase, drives the weighting the scoring service applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutPhase {
    #[default]
    Warmup,
    Main,
    Cooldown,
}

impl WorkoutPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutPhase::Warmup => "warmup",
            WorkoutPhase::Main => "main",
            WorkoutPhase::Cooldown => "cooldown",
        }
    }
}

impl fmt::Display for WorkoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warmup" => Ok(WorkoutPhase::Warmup),
            "main" => Ok(WorkoutPhase::Main),
            "cooldown" => Ok(WorkoutPhase::Cooldown),
            other => Err(format!(
                "Invalid workout phase '{}'. Must be one of: warmup, main, cooldown",
                other
            )),
        }
    }
}

/// Audio characteristics of a track (or a target for one)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioFeatureVector {
    pub energy: f64,
    /// Beats per minute
    pub tempo: f64,
    pub valence: f64,
    pub danceability: f64,
    #[serde(default)]
    pub acousticness: f64,
}

impl AudioFeatureVector {
    /// Force every feature into its valid range
    ///
    /// Unit features are clamped to [0, 1], tempo to [0, 300] BPM.
    /// Non-finite values become 0.
    pub fn clamped(self) -> Self {
        Self {
            energy: clamp_unit(self.energy),
            tempo: clamp_tempo(self.tempo),
            valence: clamp_unit(self.valence),
            danceability: clamp_unit(self.danceability),
            acousticness: clamp_unit(self.acousticness),
        }
    }
}

/// A single ranked track suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecommendation {
    pub track_id: String,
    pub name: String,
    pub artist: String,
    pub features: AudioFeatureVector,
    pub similarity_score: f64,
    /// Model confidence, always within [0, 1]
    pub confidence: f64,
    pub reasoning: String,
    pub received_at: DateTime<Utc>,
    /// Track length in seconds, when the service reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

/// Result of one scoring request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationBatch {
    /// Tracks in server rank order
    pub recommendations: Vec<TrackRecommendation>,
    /// What the service currently believes is the optimal audio profile
    pub optimal_features: Option<AudioFeatureVector>,
    pub adaptation_strategy: Option<String>,
    /// Mean confidence of all recommendations, 0.0 for an empty batch
    pub overall_confidence: f64,
    pub received_at: DateTime<Utc>,
}

impl RecommendationBatch {
    pub fn new(
        recommendations: Vec<TrackRecommendation>,
        optimal_features: Option<AudioFeatureVector>,
        adaptation_strategy: Option<String>,
    ) -> Self {
        let overall_confidence = overall_confidence(&recommendations);
        Self {
            recommendations,
            optimal_features,
            adaptation_strategy,
            overall_confidence,
            received_at: Utc::now(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.recommendations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}

/// Arithmetic mean of a set of confidence values (0.0 when empty)
pub fn mean_confidence(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Overall confidence of a set of recommendations
pub fn overall_confidence(recommendations: &[TrackRecommendation]) -> f64 {
    let values: Vec<f64> = recommendations.iter().map(|r| r.confidence).collect();
    mean_confidence(&values)
}

/// Percentage of a track that was played, clamped to [0, 100]
///
/// A non-positive duration counts as fully played.
pub fn completion_percentage(position_secs: f64, duration_secs: f64) -> f64 {
    if duration_secs <= 0.0 || !duration_secs.is_finite() {
        return 100.0;
    }
    (position_secs / duration_secs * 100.0).clamp(0.0, 100.0)
}

/// Append-only record of a track that finished playing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackHistoryEntry {
    pub track: TrackRecommendation,
    pub played_at: DateTime<Utc>,
    pub completed_percentage: f64,
}

impl TrackHistoryEntry {
    pub fn new(track: TrackRecommendation, position_secs: f64, duration_secs: f64) -> Self {
        Self {
            track,
            played_at: Utc::now(),
            completed_percentage: completion_percentage(position_secs, duration_secs),
        }
    }
}

/// User verdict on a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Love,
    Like,
    Neutral,
    Dislike,
    Skip,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Love => "love",
            Rating::Like => "like",
            Rating::Neutral => "neutral",
            Rating::Dislike => "dislike",
            Rating::Skip => "skip",
        }
    }}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "love" => Ok(Rating::Love),
            "like" => Ok(Rating::Like),
            "neutral" => Ok(Rating::Neutral),
            "dislike" => Ok(Rating::Dislike),
            "skip" => Ok(Rating::Skip),
            other => Err(format!("Invalid rating '{}'", other)),
        }
    }
}

/// Append-only user rating of a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRating {
    pub track: TrackRecommendation,
    pub rating: Rating,
    pub rated_at: DateTime<Utc>,
    /// Free-text context, e.g. the workout phase the rating was given in
    pub context: String,
}

impl TrackRating {
    pub fn new(track: TrackRecommendation, rating: Rating, context: impl Into<String>) -> Self {
        Self {
            track,
            rating,
            rated_at: Utc::now(),
            context: context.into(),
        }
    }
}
