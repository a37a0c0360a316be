//! Workout Music WASM Module
//!
//! WebAssembly bindings for the pure session calculations, so a browser
//! player shows the same zones and percentages as the native client.

use wasm_bindgen::prelude::*;
use workout_music_shared::{models, PerformanceZone, WorkoutPhase};

/// Performance zone (1-5) for a heart rate in bpm
#[wasm_bindgen]
pub fn performance_zone(heart_rate: f64) -> u8 {
    workout_music_shared::performance_zone(heart_rate)
}

/// Human-readable description of a zone; empty for an unknown zone
#[wasm_bindgen]
pub fn zone_description(zone: u8) -> String {
    PerformanceZone::try_from(zone)
        .map(|z| z.description().to_string())
        .unwrap_or_default()
}

/// Share of a track played, as a percentage in `[0, 100]`
#[wasm_bindgen]
pub fn completion_percentage(position_secs: f64, duration_secs: f64) -> f64 {
    models::completion_percentage(position_secs, duration_secs)
}

/// Mean of per-track confidences; 0 for an empty batch
#[wasm_bindgen]
pub fn overall_confidence(confidences: &[f64]) -> f64 {
    models::mean_confidence(confidences)
}

/// Normalize a workout phase name, or `None` if it is not recognised
#[wasm_bindgen]
pub fn parse_workout_phase(phase: &str) -> Option<String> {
    phase
        .parse::<WorkoutPhase>()
        .ok()
        .map(|p| p.as_str().to_string())
}
