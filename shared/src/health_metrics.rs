//! Health snapshot model and derived metrics
//!
//! A [`HealthSnapshot`] is the point-in-time bundle of physiological metrics
//! sent to the scoring service. The performance zone is never supplied by a
//! sensor: it is always derived from heart rate with [`performance_zone`].
//!
//! # Design Principles
//!
//! 1. **Pure Functions**: Derivations have no side effects
//! 2. **Immutable Snapshots**: A snapshot is never changed after capture
//! 3. **Testable Boundaries**: Zone thresholds use strict less-than comparisons

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Performance Zones
// ============================================================================

/// Ascending heart-rate thresholds (bpm) separating zones 1-5
pub const ZONE_THRESHOLDS_BPM: [f64; 4] = [114.0, 133.0, 152.0, 171.0];

/// Heart-rate-derived training intensity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PerformanceZone {
    /// Zone 1, below 114 bpm
    Recovery,
    /// Zone 2, 114 to below 133 bpm
    Endurance,
    /// Zone 3, 133 to below 152 bpm
    Tempo,
    /// Zone 4, 152 to below 171 bpm
    Threshold,
    /// Zone 5, 171 bpm and above
    Maximal,
}

impl PerformanceZone {
    const ALL: [PerformanceZone; 5] = [
        PerformanceZone::Recovery,
        PerformanceZone::Endurance,
        PerformanceZone::Tempo,
        PerformanceZone::Threshold,
        PerformanceZone::Maximal,
    ];

    /// Classify a heart rate into its zone
    pub fn from_heart_rate(heart_rate: f64) -> Self {
        ZONE_THRESHOLDS_BPM
            .iter()
            .position(|&threshold| heart_rate < threshold)
            .map(|index| Self::ALL[index])
            .unwrap_or(PerformanceZone::Maximal)
    }

    /// Zone number, 1-5
    pub fn number(&self) -> u8 {
        match self {
            PerformanceZone::Recovery => 1,
            PerformanceZone::Endurance => 2,
            PerformanceZone::Tempo => 3,
            PerformanceZone::Threshold => 4,
            PerformanceZone::Maximal => 5,
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            PerformanceZone::Recovery => "Recovery",
            PerformanceZone::Endurance => "Aerobic endurance",
            PerformanceZone::Tempo => "Tempo",
            PerformanceZone::Threshold => "Lactate threshold",
            PerformanceZone::Maximal => "Maximal effort",
        }
    }
}

impl From<PerformanceZone> for u8 {
    fn from(zone: PerformanceZone) -> Self {
        zone.number()
    }
}

impl TryFrom<u8> for PerformanceZone {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1..=5 => Ok(Self::ALL[usize::from(value - 1)]),
            _ => Err(format!("Performance zone must be between 1 and 5, got {}", value)),
        }
    }
}

/// Derive the performance zone number (1-5) from heart rate
pub fn performance_zone(heart_rate: f64) -> u8 {
    PerformanceZone::from_heart_rate(heart_rate).number()
}

// ============================================================================
// Snapshots
// ============================================================================

/// Raw physiological readings, before zone derivation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthReading {
    /// Heart rate in bpm
    pub heart_rate: f64,
    /// Heart rate variability in ms
    pub hrv: f64,
    /// Steps per minute
    pub cadence: f64,
    /// Recovery index, 0-100
    pub recovery_index: f64,
    /// Accumulated training load score
    pub training_load: f64,
    pub intensity_score: f64,
    pub fatigue_index: f64,
}

/// Immutable point-in-time health state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    reading: HealthReading,
    performance_zone: PerformanceZone,
    captured_at: DateTime<Utc>,
}

impl HealthSnapshot {
    /// Capture a snapshot now, deriving the performance zone
    pub fn capture(reading: HealthReading) -> Self {
        Self::captured_at(reading, Utc::now())
    }

    /// Capture a snapshot at a given instant
    pub fn captured_at(reading: HealthReading, captured_at: DateTime<Utc>) -> Self {
        Self {
            performance_zone: PerformanceZone::from_heart_rate(reading.heart_rate),
            reading,
            captured_at,
        }
    }

    #[inline]
    pub fn reading(&self) -> &HealthReading {
        &self.reading
    }

    #[inline]
    pub fn heart_rate(&self) -> f64 {
        self.reading.heart_rate
    }

    #[inline]
    pub fn hrv(&self) -> f64 {
        self.reading.hrv
    }

    #[inline]
    pub fn cadence(&self) -> f64 {
        self.reading.cadence
    }

    #[inline]
    pub fn recovery_index(&self) -> f64 {
        self.reading.recovery_index
    }

    #[inline]
    pub fn training_load(&self) -> f64 {
        self.reading.training_load
    }

    #[inline]
    pub fn intensity_score(&self) -> f64 {
        self.reading.intensity_score
    }

    #[inline]
    pub fn fatigue_index(&self) -> f64 {
        self.reading.fatigue_index
    }

    #[inline]
    pub fn performance_zone(&self) -> PerformanceZone {
        self.performance_zone
    }
}

/// Fatigue index implied by a recovery index, when no direct value exists
pub fn fatigue_from_recovery(recovery_index: f64) -> f64 {
    (100.0 - recovery_index).clamp(0.0, 100.0)
}
