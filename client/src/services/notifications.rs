//! Local notifications for midpoint check-ins

use tracing::info;
use workout_music_shared::TrackRecommendation;

/// Midpoint check-in prompting the user to rate or skip a track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidpointNotification {
    /// Identifier keyed by track; re-scheduling the same id replaces it
    pub id: String,
    pub track_id: String,
    pub title: String,
    pub body: String,
}

impl MidpointNotification {
    pub fn for_track(track: &TrackRecommendation) -> Self {
        Self {
            id: format!("midpoint-{}", track.track_id),
            track_id: track.track_id.clone(),
            title: "How's this track working?".to_string(),
            body: format!(
                "\"{}\" by {}. Rate it or skip to the next recommendation.",
                track.name, track.artist
            ),
        }
    }
}

/// Delivers local notifications to the user
pub trait Notifier: Send + Sync {
    fn schedule(&self, notification: MidpointNotification);
}

/// Notifier that writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn schedule(&self, notification: MidpointNotification) {
        info!(
            id = %notification.id,
            title = %notification.title,
            "{}",
            notification.body
        );
    }
}
