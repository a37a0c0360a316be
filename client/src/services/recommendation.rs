//! Recommendation client - turns health snapshots into recommendation batches

use crate::scoring::ScoringService;
use chrono::Utc;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use workout_music_shared::types::{RecommendationRequest, RecommendationResponse};
use workout_music_shared::validation::validate_snapshot;
use workout_music_shared::{HealthSnapshot, RecommendationBatch, RequestError, WorkoutPhase};

/// Recommendation client
///
/// Stateless apart from the service handle: every call issues its own
/// request and returns a fresh batch. Whether the batch replaces the active
/// queue is the caller's decision.
#[derive(Clone)]
pub struct RecommendationClient {
    scoring: Arc<dyn ScoringService>,
}

impl RecommendationClient {
    pub fn new(scoring: Arc<dyn ScoringService>) -> Self {
        Self { scoring }
    }

    /// Request recommendations for a snapshot and workout phase
    ///
    /// Snapshots with non-finite fields are rejected before anything is sent.
    pub async fn request_recommendations(
        &self,
        snapshot: &HealthSnapshot,
        phase: WorkoutPhase,
    ) -> Result<RecommendationBatch, RequestError> {
        validate_snapshot(snapshot)?;

        let request = RecommendationRequest::new(snapshot, phase);
        debug!(
            heart_rate = snapshot.heart_rate(),
            zone = snapshot.performance_zone().number(),
            phase = %phase,
            "Requesting recommendations"
        );

        let started = Instant::now();
        let result = self
            .scoring
            .recommendations(&request)
            .await
            .and_then(Self::build_batch);
        histogram!("recommendation_request_seconds").record(started.elapsed().as_secs_f64());

        match &result {
            Ok(batch) => {
                counter!("recommendation_requests_total", "outcome" => "ok").increment(1);
                debug!(
                    count = batch.len(),
                    overall_confidence = batch.overall_confidence,
                    "Received recommendations"
                );
            }
            Err(err) => {
                counter!("recommendation_requests_total", "outcome" => err.kind()).increment(1);
                warn!(error = %err, retryable = err.is_retryable(), "Recommendation request failed");
            }
        }
        result
    }

    /// Convert a service response into a batch
    pub fn build_batch(response: RecommendationResponse) -> Result<RecommendationBatch, RequestError> {
        // HTTP responses are checked against the raw body before decoding;
        // this covers other service implementations
        if response.is_error() {
            return Err(RequestError::Protocol {
                message: "service reported an error status".to_string(),
                status: None,
                raw_payload: serde_json::to_string(&response).unwrap_or_default(),
            });
        }

        let received_at = Utc::now();
        let recommendations = response
            .recommendations
            .into_iter()
            .map(|item| item.into_recommendation(received_at))
            .collect();

        Ok(RecommendationBatch::new(
            recommendations,
            response.optimal_features.map(|f| f.clamped()),
            response.adaptation_strategy,
        ))
    }
}
