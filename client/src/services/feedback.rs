//! Feedback recorder - local-first track ratings
//!
//! A rating is appended to the local history before anything touches the
//! network. Forwarding to the scoring service happens on a spawned task and
//! its failure is only logged: the local record is never rolled back, the
//! caller never waits, and nothing is retried.

use crate::scoring::ScoringService;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, warn};
use workout_music_shared::types::TrackRatingRequest;
use workout_music_shared::{Rating, TrackRating, TrackRecommendation};

/// Append-only rating history with best-effort remote forwarding
pub struct FeedbackRecorder {
    scoring: Arc<dyn ScoringService>,
    ratings: Vec<TrackRating>,
}

impl FeedbackRecorder {
    pub fn new(scoring: Arc<dyn ScoringService>) -> Self {
        Self {
            scoring,
            ratings: Vec::new(),
        }
    }

    /// Record a rating and forward it to the scoring service
    pub fn rate(
        &mut self,
        track: TrackRecommendation,
        rating: Rating,
        context: impl Into<String>,
    ) -> &TrackRating {
        let record = TrackRating::new(track, rating, context);
        let request = TrackRatingRequest::from(&record);
        self.ratings.push(record);
        counter!("ratings_recorded_total", "rating" => rating.as_str()).increment(1);

        let scoring = Arc::clone(&self.scoring);
        tokio::spawn(async move {
            match scoring.submit_rating(&request).await {
                Ok(()) => debug!(track_id = %request.track_id, rating = %request.rating, "Rating forwarded"),
                Err(err) => {
                    counter!("rating_forward_failures_total").increment(1);
                    warn!(track_id = %request.track_id, error = %err, "Failed to forward rating");
                }
            }
        });

        &self.ratings[self.ratings.len() - 1]
    }

    /// All ratings recorded so far, oldest first
    pub fn ratings(&self) -> &[TrackRating] {
        &self.ratings
    }

    /// Consume the recorder, returning the rating history
    pub fn into_ratings(self) -> Vec<TrackRating> {
        self.ratings
    }
}
