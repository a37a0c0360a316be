//! Integration tests for the recommendation session
//!
//! Sessions run under paused tokio time so ticks, snapshots and refreshes
//! fire deterministically.

mod common;

use common::{
    settings, settle, start_session, start_session_with_sampler, FakeScoring, RecordingNotifier,
    SlowSampler,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use workout_music_client::session::SessionStatus;
use workout_music_shared::{Rating, RequestError, WorkoutPhase};

#[tokio::test(start_paused = true)]
async fn test_session_plays_batch_in_rank_order() {
    let scoring = FakeScoring::with_items(common::standard_items());
    let notifier = Arc::new(RecordingNotifier::default());
    let session = start_session(scoring.clone(), notifier.clone(), settings(), WorkoutPhase::Main);

    settle().await;
    let requests = scoring.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].workout_phase, WorkoutPhase::Main);
    assert_eq!(requests[0].health_state.heart_rate, 140.0);
    assert_eq!(requests[0].health_state.hrv, 45.0);
    assert_eq!(requests[0].health_state.performance_zone, 3);

    let view = session.view();
    assert_eq!(view.current_track.as_ref().unwrap().track_id, "A");
    assert_eq!(view.queue.len(), 3);
    assert!((view.overall_confidence - 0.7).abs() < 1e-9);
    assert_eq!(view.duration_secs, 100.0);
    assert!(!view.loading);

    // Past the midpoint of A
    sleep(Duration::from_secs(75)).await;
    let view = session.view();
    assert_eq!(view.current_track.as_ref().unwrap().track_id, "A");
    assert_eq!(view.position_secs, 75.0);
    let scheduled = notifier.scheduled();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].id, "midpoint-A");

    // A has ended and B is playing
    sleep(Duration::from_secs(35)).await;
    let view = session.view();
    assert_eq!(view.history.len(), 1);
    assert_eq!(view.history[0].track.track_id, "A");
    assert_eq!(view.history[0].completed_percentage, 100.0);
    assert_eq!(view.current_track.as_ref().unwrap().track_id, "B");
    assert_eq!(view.position_secs, 10.0);
    assert_eq!(
        view.queue.iter().map(|t| t.track_id.as_str()).collect::<Vec<_>>(),
        vec!["B", "C"]
    );
    assert_eq!(notifier.scheduled().len(), 1);

    let report = session.end().await.unwrap();
    assert_eq!(report.history.len(), 1);
    assert_eq!(report.phase, WorkoutPhase::Main);

    settle().await;
    let names = scoring.event_names();
    assert_eq!(names.first(), Some(&"workout_started"));
    assert!(names.contains(&"playback_started"));
    assert!(names.contains(&"track_completed"));
    assert!(names.contains(&"workout_ended"));
}

#[tokio::test(start_paused = true)]
async fn test_skip_advances_until_one_track_left() {
    let scoring = FakeScoring::with_items(common::standard_items());
    let notifier = Arc::new(RecordingNotifier::default());
    let session = start_session(scoring.clone(), notifier, settings(), WorkoutPhase::Main);
    settle().await;

    session.skip().unwrap();
    settle().await;
    let view = session.view();
    assert_eq!(view.current_track.as_ref().unwrap().track_id, "B");
    assert_eq!(view.queue.len(), 2);
    assert_eq!(view.position_secs, 0.0);

    session.skip().unwrap();
    settle().await;
    assert_eq!(session.view().current_track.unwrap().track_id, "C");

    // Last queued track stays put
    session.skip().unwrap();
    settle().await;
    let view = session.view();
    assert_eq!(view.current_track.as_ref().unwrap().track_id, "C");
    assert_eq!(view.queue.len(), 1);
    assert!(view.history.is_empty());

    settle().await;
    let skipped = scoring
        .event_names()
        .into_iter()
        .filter(|name| *name == "track_skipped")
        .count();
    assert_eq!(skipped, 2);
}

#[tokio::test(start_paused = true)]
async fn test_rating_kept_when_forwarding_fails() {
    let scoring = FakeScoring::with_items(common::standard_items());
    scoring.fail_ratings();
    let notifier = Arc::new(RecordingNotifier::default());
    let session = start_session(scoring.clone(), notifier, settings(), WorkoutPhase::Main);
    settle().await;

    session.rate_current(Rating::Love, "midpoint").unwrap();
    settle().await;

    assert_eq!(scoring.ratings().len(), 1);
    assert_eq!(scoring.ratings()[0].track_id, "A");
    assert_eq!(session.view().ratings_count, 1);

    let report = session.end().await.unwrap();
    assert_eq!(report.ratings.len(), 1);
    assert_eq!(report.ratings[0].rating, Rating::Love);
    assert_eq!(report.ratings[0].context, "midpoint");
}

#[tokio::test(start_paused = true)]
async fn test_failed_fetch_surfaces_retryable_error() {
    let scoring = FakeScoring::failing(RequestError::Transport {
        message: "operation timed out".to_string(),
        timed_out: true,
    });
    let notifier = Arc::new(RecordingNotifier::default());
    let session = start_session(scoring, notifier, settings(), WorkoutPhase::Warmup);
    settle().await;

    let view = session.view();
    assert!(view.current_track.is_none());
    assert!(view.queue.is_empty());
    assert!(!view.loading);
    let error = view.last_error.unwrap();
    assert_eq!(error.kind, "transport");
    assert!(error.retryable);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_while_loading_is_coalesced() {
    let scoring = FakeScoring::with_items(common::standard_items());
    scoring.set_delay(Duration::from_millis(500));
    let notifier = Arc::new(RecordingNotifier::default());
    let session = start_session(scoring.clone(), notifier, settings(), WorkoutPhase::Main);
    settle().await;
    assert!(session.view().loading);

    session.refresh().unwrap();
    session.refresh().unwrap();
    settle().await;
    assert_eq!(scoring.requests().len(), 1);

    sleep(Duration::from_millis(600)).await;
    assert!(!session.view().loading);
    assert_eq!(session.view().queue.len(), 3);

    session.refresh().unwrap();
    settle().await;
    assert_eq!(scoring.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_phase_change_refreshes_for_new_phase() {
    let scoring = FakeScoring::with_items(common::standard_items());
    let notifier = Arc::new(RecordingNotifier::default());
    let session = start_session(scoring.clone(), notifier, settings(), WorkoutPhase::Warmup);
    settle().await;

    session.set_phase(WorkoutPhase::Cooldown).unwrap();
    settle().await;

    let requests = scoring.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].workout_phase, WorkoutPhase::Cooldown);
    assert_eq!(session.view().phase, WorkoutPhase::Cooldown);
}

#[tokio::test(start_paused = true)]
async fn test_phase_change_during_fetch_refetches_for_new_phase() {
    let scoring = FakeScoring::with_items(common::standard_items());
    scoring.set_delay(Duration::from_millis(500));
    let notifier = Arc::new(RecordingNotifier::default());
    let session = start_session(scoring.clone(), notifier, settings(), WorkoutPhase::Warmup);
    settle().await;
    assert!(session.view().loading);

    session.set_phase(WorkoutPhase::Cooldown).unwrap();
    settle().await;
    assert_eq!(scoring.requests().len(), 1);

    // Warmup batch lands and the cooldown fetch goes out right away
    sleep(Duration::from_millis(500)).await;
    let requests = scoring.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].workout_phase, WorkoutPhase::Warmup);
    assert_eq!(requests[1].workout_phase, WorkoutPhase::Cooldown);
    assert!(session.view().loading);

    sleep(Duration::from_millis(600)).await;
    let view = session.view();
    assert!(!view.loading);
    assert_eq!(view.phase, WorkoutPhase::Cooldown);
    assert_eq!(scoring.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_sampling_never_overlaps() {
    let scoring = FakeScoring::with_items(common::standard_items());
    let notifier = Arc::new(RecordingNotifier::default());
    let sampler = SlowSampler::new(Duration::from_secs(5));
    let session = start_session_with_sampler(
        scoring,
        notifier,
        sampler.clone(),
        settings(),
        WorkoutPhase::Main,
    );

    // Samples start at 0 s and 6 s; the ticks at 2, 4, 8 and 10 s are skipped
    sleep(Duration::from_millis(11_500)).await;
    assert_eq!(sampler.calls(), 2);
    assert_eq!(sampler.max_in_flight(), 1);

    let snapshot = session.view().latest_snapshot.unwrap();
    assert_eq!(snapshot.heart_rate(), 121.0);

    session.capture_snapshot().unwrap();
    settle().await;
    assert_eq!(sampler.calls(), 3);
    session.capture_snapshot().unwrap();
    settle().await;
    assert_eq!(sampler.calls(), 3);
    assert_eq!(sampler.max_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pause_freezes_playback() {
    let scoring = FakeScoring::with_items(common::standard_items());
    let notifier = Arc::new(RecordingNotifier::default());
    let session = start_session(scoring, notifier, settings(), WorkoutPhase::Main);
    settle().await;

    sleep(Duration::from_secs(5)).await;
    session.pause().unwrap();
    settle().await;
    assert_eq!(session.view().status, SessionStatus::Paused);
    let position = session.view().position_secs;

    sleep(Duration::from_secs(10)).await;
    assert_eq!(session.view().position_secs, position);

    session.resume().unwrap();
    sleep(Duration::from_secs(3)).await;
    assert_eq!(session.view().status, SessionStatus::Active);
    assert!(session.view().position_secs > position);
}

#[tokio::test(start_paused = true)]
async fn test_end_stops_all_periodic_work() {
    let scoring = FakeScoring::with_items(common::standard_items());
    let notifier = Arc::new(RecordingNotifier::default());
    let mut settings = settings();
    settings.refresh_interval = Duration::from_secs(5);
    let session = start_session(scoring.clone(), notifier, settings, WorkoutPhase::Main);

    sleep(Duration::from_millis(12_500)).await;
    let mut updates = session.subscribe();
    let report = session.end().await.unwrap();
    assert_eq!(report.elapsed_secs, 12.0);
    assert!(report.history.is_empty());

    let requests_at_end = scoring.requests().len();
    assert!(requests_at_end >= 2);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(scoring.requests().len(), requests_at_end);

    let view = updates.borrow_and_update().clone();
    assert_eq!(view.status, SessionStatus::Ended);
    assert_eq!(view.elapsed_secs, 12.0);
    assert!(view.current_track.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_batch_arriving_after_end_is_discarded() {
    let scoring = FakeScoring::with_items(common::standard_items());
    scoring.set_delay(Duration::from_secs(10));
    let notifier = Arc::new(RecordingNotifier::default());
    let session = start_session(scoring.clone(), notifier.clone(), settings(), WorkoutPhase::Main);
    settle().await;
    assert_eq!(scoring.requests().len(), 1);

    let updates = session.subscribe();
    let report = session.end().await.unwrap();
    assert!(report.history.is_empty());

    // The in-flight request completes after the session is gone
    sleep(Duration::from_secs(15)).await;
    let view = updates.borrow().clone();
    assert_eq!(view.status, SessionStatus::Ended);
    assert!(view.queue.is_empty());
    assert!(view.current_track.is_none());
    assert!(notifier.scheduled().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_mood_report_sent_as_telemetry() {
    let scoring = FakeScoring::with_items(common::standard_items());
    let notifier = Arc::new(RecordingNotifier::default());
    let session = start_session(scoring.clone(), notifier, settings(), WorkoutPhase::Main);
    settle().await;

    session.report_mood("energized").unwrap();
    settle().await;
    assert!(scoring.event_names().contains(&"mood_reported"));

    session.end().await.unwrap();
}
