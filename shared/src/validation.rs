//! Input validation functions
//!
//! Snapshots are checked before they are sent to the scoring service;
//! values coming back from the service are clamped rather than rejected.

use crate::health_metrics::HealthSnapshot;
use std::fmt;

/// Highest tempo accepted from the scoring service
pub const MAX_TEMPO_BPM: f64 = 300.0;

/// Validate that a value is a finite number
pub fn validate_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_nan() || value.is_infinite() {
        return Err(ValidationError::new(field, "must be a valid number"));
    }
    Ok(())
}

/// Validate that a value is finite and not negative
pub fn validate_non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    validate_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::new(field, "cannot be negative"));
    }
    Ok(())
}

/// Validate percentage-style index (0-100)
pub fn validate_index(field: &str, value: f64) -> Result<(), ValidationError> {
    validate_finite(field, value)?;
    if !(0.0..=100.0).contains(&value) {
        return Err(ValidationError::new(field, "must be between 0 and 100"));
    }
    Ok(())
}

/// Validate a snapshot before it is sent to the scoring service
pub fn validate_snapshot(snapshot: &HealthSnapshot) -> Result<(), ValidationError> {
    validate_non_negative("heart_rate", snapshot.heart_rate())?;
    validate_non_negative("hrv", snapshot.hrv())?;
    validate_non_negative("cadence", snapshot.cadence())?;
    validate_index("recovery_index", snapshot.recovery_index())?;
    validate_finite("training_load", snapshot.training_load())?;
    validate_finite("intensity_score", snapshot.intensity_score())?;
    validate_finite("fatigue_index", snapshot.fatigue_index())?;
    Ok(())
}

/// Clamp a value to [0, 1], mapping non-finite input to 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Clamp a tempo to [0, 300] BPM, mapping non-finite input to 0
pub fn clamp_tempo(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, MAX_TEMPO_BPM)
    } else {
        0.0
    }
}

// ============================================================================
// User-Friendly Field Labels
// ============================================================================

/// Map technical field names to user-friendly display labels
pub fn get_field_display_label(field_name: &str) -> &str {
    match field_name {
        "heart_rate" => "Heart Rate",
        "hrv" => "Heart Rate Variability",
        "cadence" => "Cadence",
        "recovery_index" => "Recovery Index",
        "training_load" => "Training Load",
        "intensity_score" => "Intensity Score",
        "fatigue_index" => "Fatigue Index",
        "workout_phase" => "Workout Phase",
        _ => field_name,
    }
}

/// Validation error with field context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub display_label: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
            display_label: get_field_display_label(field).to_string(),
        }
    }

    /// Format as user-friendly error message
    pub fn user_message(&self) -> String {
        format!("{}: {}", self.display_label, self.message)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}
