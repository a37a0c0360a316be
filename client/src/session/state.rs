//! Session state reducer
//!
//! [`SessionState`] is the single owner of everything a workout session
//! mutates. Each input (tick, snapshot, batch, user command) is applied by a
//! method that updates the state and returns the [`Effect`]s the runner must
//! perform. The reducer itself never performs I/O, which keeps every
//! transition deterministic and testable without a runtime.

use super::playback::{PlaybackEvent, PlaybackTracker};
use crate::services::MidpointNotification;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;
use workout_music_shared::types::TelemetryEvent;
use workout_music_shared::{
    AudioFeatureVector, HealthSnapshot, RecommendationBatch, RequestError, TrackHistoryEntry,
    TrackRating, TrackRecommendation, WorkoutPhase,
};

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Paused,
    Ended,
}

/// Work the runner performs on behalf of the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Notify(MidpointNotification),
    Telemetry(TelemetryEvent),
    FetchRecommendations {
        snapshot: HealthSnapshot,
        phase: WorkoutPhase,
    },
}

/// Last error from the recommendation client, as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionErrorInfo {
    pub kind: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl From<&RequestError> for SessionErrorInfo {
    fn from(err: &RequestError) -> Self {
        Self {
            kind: err.kind(),
            message: err.user_message(),
            retryable: err.is_retryable(),
        }
    }
}

/// Observable snapshot of a session, published to subscribers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub phase: WorkoutPhase,
    pub elapsed_secs: f64,
    pub current_track: Option<TrackRecommendation>,
    pub position_secs: f64,
    pub duration_secs: f64,
    pub queue: Vec<TrackRecommendation>,
    pub history: Vec<TrackHistoryEntry>,
    pub ratings_count: usize,
    pub latest_snapshot: Option<HealthSnapshot>,
    pub optimal_features: Option<AudioFeatureVector>,
    pub adaptation_strategy: Option<String>,
    pub overall_confidence: f64,
    pub loading: bool,
    pub last_error: Option<SessionErrorInfo>,
}

/// Final record of an ended session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub phase: WorkoutPhase,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub history: Vec<TrackHistoryEntry>,
    pub ratings: Vec<TrackRating>,
    pub last_error: Option<SessionErrorInfo>,
}

/// Mutable state of one workout session
#[derive(Debug, Clone)]
pub struct SessionState {
    id: Uuid,
    status: SessionStatus,
    phase: WorkoutPhase,
    started_at: DateTime<Utc>,
    elapsed_secs: f64,
    tracker: PlaybackTracker,
    latest_snapshot: Option<HealthSnapshot>,
    optimal_features: Option<AudioFeatureVector>,
    adaptation_strategy: Option<String>,
    overall_confidence: f64,
    loading: bool,
    refresh_pending: bool,
    last_error: Option<SessionErrorInfo>,
}

impl SessionState {
    /// New active session; the first snapshot triggers the first fetch
    pub fn new(phase: WorkoutPhase, fallback_duration_secs: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: SessionStatus::Active,
            phase,
            started_at: Utc::now(),
            elapsed_secs: 0.0,
            tracker: PlaybackTracker::new(fallback_duration_secs),
            latest_snapshot: None,
            optimal_features: None,
            adaptation_strategy: None,
            overall_confidence: 0.0,
            loading: false,
            refresh_pending: true,
            last_error: None,
        }
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[inline]
    pub fn phase(&self) -> WorkoutPhase {
        self.phase
    }

    #[inline]
    pub fn tracker(&self) -> &PlaybackTracker {
        &self.tracker
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Telemetry announcing the session
    pub fn start(&self) -> Vec<Effect> {
        vec![Effect::Telemetry(TelemetryEvent::WorkoutStarted {
            session_id: self.id,
            workout_phase: self.phase,
        })]
    }

    /// Advance session time by one tick
    ///
    /// Ticks while paused or after the end change nothing.
    pub fn tick(&mut self, elapsed_secs: f64) -> Vec<Effect> {
        if self.status != SessionStatus::Active {
            return Vec::new();
        }
        self.elapsed_secs += elapsed_secs;
        let events = self.tracker.advance(elapsed_secs);
        Self::effects_for(events)
    }

    /// Record a fresh snapshot, issuing a deferred refresh if one is waiting
    pub fn apply_snapshot(&mut self, snapshot: HealthSnapshot) -> Vec<Effect> {
        if self.status == SessionStatus::Ended {
            return Vec::new();
        }
        self.latest_snapshot = Some(snapshot);
        if self.refresh_pending {
            return self.request_refresh();
        }
        Vec::new()
    }

    /// Ask for new recommendations
    ///
    /// At most one fetch is outstanding per session: a refresh requested
    /// while one is in flight is folded into it. Without a snapshot the
    /// refresh waits for the next one.
    pub fn request_refresh(&mut self) -> Vec<Effect> {
        if self.status == SessionStatus::Ended {
            return Vec::new();
        }
        if self.loading {
            debug!(session_id = %self.id, "Refresh already in flight");
            return Vec::new();
        }
        let Some(snapshot) = self.latest_snapshot.clone() else {
            self.refresh_pending = true;
            return Vec::new();
        };
        self.refresh_pending = false;
        self.loading = true;
        vec![Effect::FetchRecommendations {
            snapshot,
            phase: self.phase,
        }]
    }

    /// Apply the outcome of a recommendation fetch
    ///
    /// A successful batch replaces the queue and starts playback when idle.
    /// A failure keeps the previous queue. Results arriving after the end of
    /// the session are discarded. A phase change made while the fetch was in
    /// flight is followed up with a fetch for the new phase.
    pub fn apply_batch(&mut self, result: Result<RecommendationBatch, RequestError>) -> Vec<Effect> {
        if self.status == SessionStatus::Ended {
            debug!(session_id = %self.id, "Discarding recommendations for ended session");
            return Vec::new();
        }
        self.loading = false;

        let mut effects = match result {
            Ok(batch) => {
                self.last_error = None;
                self.optimal_features = batch.optimal_features;
                self.adaptation_strategy = batch.adaptation_strategy;
                self.overall_confidence = batch.overall_confidence;
                self.tracker.replace_queue(batch.recommendations);
                let events = self.tracker.play_head_if_idle();
                Self::effects_for(events)
            }
            Err(err) => {
                self.last_error = Some(SessionErrorInfo::from(&err));
                Vec::new()
            }
        };

        if self.refresh_pending && self.latest_snapshot.is_some() {
            effects.extend(self.request_refresh());
        }
        effects
    }

    /// Play a specific recommendation
    pub fn play(&mut self, track: TrackRecommendation) -> Vec<Effect> {
        if self.status == SessionStatus::Ended {
            return Vec::new();
        }
        let events = self.tracker.play(track);
        Self::effects_for(events)
    }

    pub fn skip(&mut self) -> Vec<Effect> {
        if self.status == SessionStatus::Ended {
            return Vec::new();
        }
        let events = self.tracker.skip();
        Self::effects_for(events)
    }

    /// Switch workout phase and refresh recommendations for it
    pub fn set_phase(&mut self, phase: WorkoutPhase) -> Vec<Effect> {
        if self.status == SessionStatus::Ended || self.phase == phase {
            return Vec::new();
        }
        self.phase = phase;
        if self.loading {
            // The in-flight batch is for the old phase
            self.refresh_pending = true;
            return Vec::new();
        }
        self.request_refresh()
    }

    pub fn pause(&mut self) {
        if self.status == SessionStatus::Active {
            self.status = SessionStatus::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.status == SessionStatus::Paused {
            self.status = SessionStatus::Active;
        }
    }

    pub fn report_mood(&self, mood: impl Into<String>) -> Vec<Effect> {
        if self.status == SessionStatus::Ended {
            return Vec::new();
        }
        vec![Effect::Telemetry(TelemetryEvent::MoodReported { mood: mood.into() })]
    }

    /// End the session; the current track is dropped without history
    pub fn end(&mut self) -> Vec<Effect> {
        if self.status == SessionStatus::Ended {
            return Vec::new();
        }
        self.status = SessionStatus::Ended;
        self.loading = false;
        self.refresh_pending = false;
        self.tracker.stop();
        vec![Effect::Telemetry(TelemetryEvent::WorkoutEnded {
            session_id: self.id,
            elapsed_secs: self.elapsed_secs,
            tracks_played: self.tracker.history().len(),
        })]
    }

    /// Current observable state
    pub fn view(&self, ratings_count: usize) -> SessionView {
        let playback = self.tracker.state();
        SessionView {
            session_id: self.id,
            status: self.status,
            phase: self.phase,
            elapsed_secs: self.elapsed_secs,
            current_track: playback.current.clone(),
            position_secs: playback.position_secs,
            duration_secs: playback.duration_secs,
            queue: self.tracker.queue().to_vec(),
            history: self.tracker.history().to_vec(),
            ratings_count,
            latest_snapshot: self.latest_snapshot.clone(),
            optimal_features: self.optimal_features,
            adaptation_strategy: self.adaptation_strategy.clone(),
            overall_confidence: self.overall_confidence,
            loading: self.loading,
            last_error: self.last_error.clone(),
        }
    }

    /// Consume the state into a final report
    pub fn into_report(self, ratings: Vec<TrackRating>) -> SessionReport {
        SessionReport {
            session_id: self.id,
            phase: self.phase,
            started_at: self.started_at,
            elapsed_secs: self.elapsed_secs,
            history: self.tracker.into_history(),
            ratings,
            last_error: self.last_error,
        }
    }

    fn effects_for(events: Vec<PlaybackEvent>) -> Vec<Effect> {
        events
            .into_iter()
            .map(|event| match event {
                PlaybackEvent::Started { track, .. } => {
                    Effect::Telemetry(TelemetryEvent::PlaybackStarted {
                        track_id: track.track_id,
                        track_name: track.name,
                        artist: track.artist,
                    })
                }
                PlaybackEvent::MidpointReached { track } => {
                    Effect::Notify(MidpointNotification::for_track(&track))
                }
                PlaybackEvent::Ended { entry } => Effect::Telemetry(TelemetryEvent::TrackCompleted {
                    track_id: entry.track.track_id,
                    completed_percentage: entry.completed_percentage,
                }),
                PlaybackEvent::Skipped {
                    track,
                    position_secs,
                    duration_secs,
                } => Effect::Telemetry(TelemetryEvent::TrackSkipped {
                    track_id: track.track_id,
                    position_secs,
                    duration_secs,
                }),
            })
            .collect()
    }
}
