//! Common test utilities for integration tests
//!
//! Provides an in-memory scoring service, a recording notifier and helpers
//! for starting sessions under paused tokio time.

#![allow(dead_code)]

use async_trait::async_trait;
use fake::faker::lorem::en::Words;
use fake::faker::name::en::Name;
use fake::Fake;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use workout_music_client::scoring::ScoringService;
use workout_music_client::services::{
    HealthSampler, MidpointNotification, Notifier, ScriptedSampler, SnapshotProducer,
};
use workout_music_client::session::{SessionDeps, SessionHandle, SessionManager, SessionSettings};
use workout_music_shared::types::{
    RealTimeData, RecommendationItem, RecommendationRequest, RecommendationResponse,
    TelemetryEnvelope, TelemetryEvent, TrackRatingRequest,
};
use workout_music_shared::{HealthReading, RequestError, WorkoutPhase};

/// Scoring service double that records everything it receives
#[derive(Default)]
pub struct FakeScoring {
    items: Mutex<Vec<RecommendationItem>>,
    recommendation_error: Mutex<Option<RequestError>>,
    delay: Mutex<Duration>,
    fail_ratings: AtomicBool,
    requests: Mutex<Vec<RecommendationRequest>>,
    ratings: Mutex<Vec<TrackRatingRequest>>,
    events: Mutex<Vec<TelemetryEvent>>,
}

impl FakeScoring {
    pub fn with_items(items: Vec<RecommendationItem>) -> Arc<Self> {
        let fake = Self::default();
        *fake.items.lock().unwrap() = items;
        Arc::new(fake)
    }

    pub fn failing(error: RequestError) -> Arc<Self> {
        let fake = Self::default();
        *fake.recommendation_error.lock().unwrap() = Some(error);
        Arc::new(fake)
    }

    /// Delay every recommendation response by `delay`
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn fail_ratings(&self) {
        self.fail_ratings.store(true, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<RecommendationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn ratings(&self) -> Vec<TrackRatingRequest> {
        self.ratings.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_names(&self) -> Vec<&'static str> {
        self.events().iter().map(TelemetryEvent::name).collect()
    }
}

#[async_trait]
impl ScoringService for FakeScoring {
    async fn recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse, RequestError> {
        self.requests.lock().unwrap().push(request.clone());
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.recommendation_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(RecommendationResponse {
            status: "success".to_string(),
            recommendations: self.items.lock().unwrap().clone(),
            optimal_features: None,
            adaptation_strategy: Some("maintain_intensity".to_string()),
            timestamp: None,
        })
    }

    async fn submit_rating(&self, rating: &TrackRatingRequest) -> Result<(), RequestError> {
        self.ratings.lock().unwrap().push(rating.clone());
        if self.fail_ratings.load(Ordering::SeqCst) {
            return Err(RequestError::Transport {
                message: "connection refused".to_string(),
                timed_out: false,
            });
        }
        Ok(())
    }

    async fn send_event(&self, event: &TelemetryEnvelope) -> Result<(), RequestError> {
        self.events.lock().unwrap().push(event.event.clone());
        Ok(())
    }

    async fn real_time_data(&self) -> Result<RealTimeData, RequestError> {
        Err(RequestError::Config("real-time data not scripted".to_string()))
    }

    async fn check_connectivity(&self) -> Result<(), RequestError> {
        Ok(())
    }
}

/// Notifier that keeps every scheduled notification
#[derive(Default)]
pub struct RecordingNotifier {
    scheduled: Mutex<Vec<MidpointNotification>>,
}

impl RecordingNotifier {
    pub fn scheduled(&self) -> Vec<MidpointNotification> {
        self.scheduled.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn schedule(&self, notification: MidpointNotification) {
        self.scheduled.lock().unwrap().push(notification);
    }
}

/// Sampler that takes `delay` per sample, raising heart rate by one bpm
/// on every call and tracking how many samples overlap
pub struct SlowSampler {
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl SlowSampler {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthSampler for SlowSampler {
    async fn sample(&self) -> Result<HealthReading, RequestError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(reading(120.0 + call as f64, 45.0))
    }
}

/// Recommendation item with a random name and artist
pub fn item(track_id: &str, confidence: f64, duration_ms: Option<u64>) -> RecommendationItem {
    let words: Vec<String> = Words(1..4).fake();
    RecommendationItem {
        track_name: words.join(" "),
        artist: Name().fake(),
        track_id: track_id.to_string(),
        similarity_score: confidence,
        ml_confidence: confidence,
        physiological_reasoning: "matches current zone".to_string(),
        energy: 0.8,
        tempo: 140.0,
        valence: 0.6,
        danceability: 0.7,
        acousticness: Some(0.1),
        url: None,
        preview_url: None,
        duration_ms,
    }
}

/// Three-track batch, 100 s each
pub fn standard_items() -> Vec<RecommendationItem> {
    vec![
        item("A", 0.9, Some(100_000)),
        item("B", 0.7, Some(100_000)),
        item("C", 0.5, Some(100_000)),
    ]
}

pub fn reading(heart_rate: f64, hrv: f64) -> HealthReading {
    HealthReading {
        heart_rate,
        hrv,
        cadence: 165.0,
        recovery_index: 72.0,
        training_load: 210.0,
        intensity_score: 68.0,
        fatigue_index: 28.0,
    }
}

/// Default timings with refreshes pushed out of the way
pub fn settings() -> SessionSettings {
    SessionSettings {
        refresh_interval: Duration::from_secs(3_600),
        ..SessionSettings::default()
    }
}

/// Start a session fed by a constant reading
pub fn start_session(
    scoring: Arc<FakeScoring>,
    notifier: Arc<RecordingNotifier>,
    settings: SessionSettings,
    phase: WorkoutPhase,
) -> SessionHandle {
    let sampler = Arc::new(ScriptedSampler::constant(reading(140.0, 45.0)));
    start_session_with_sampler(scoring, notifier, sampler, settings, phase)
}

pub fn start_session_with_sampler(
    scoring: Arc<FakeScoring>,
    notifier: Arc<RecordingNotifier>,
    sampler: Arc<dyn HealthSampler>,
    settings: SessionSettings,
    phase: WorkoutPhase,
) -> SessionHandle {
    let deps = SessionDeps {
        scoring,
        producer: SnapshotProducer::new(sampler),
        notifier,
    };
    SessionManager::start(deps, settings, phase)
}

/// Let spawned work settle without crossing a tick boundary
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
