//! Boundary to the external scoring service
//!
//! The scoring service owns all model inference. The session only depends on
//! the [`ScoringService`] trait; [`HttpScoringClient`] is the REST
//! implementation used in production.

use async_trait::async_trait;
use workout_music_shared::types::{
    RealTimeData, RecommendationRequest, RecommendationResponse, TelemetryEnvelope,
    TrackRatingRequest,
};
use workout_music_shared::RequestError;

mod http;

pub use http::HttpScoringClient;

/// Operations the session needs from the scoring service
#[async_trait]
pub trait ScoringService: Send + Sync {
    /// Score a health state and return ranked recommendations
    async fn recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse, RequestError>;

    /// Forward a user rating
    async fn submit_rating(&self, rating: &TrackRatingRequest) -> Result<(), RequestError>;

    /// Send a telemetry event
    async fn send_event(&self, event: &TelemetryEnvelope) -> Result<(), RequestError>;

    /// Latest physiological readings known to the service
    async fn real_time_data(&self) -> Result<RealTimeData, RequestError>;

    /// Liveness check
    async fn check_connectivity(&self) -> Result<(), RequestError>;
}
