//! Recommendation session manager
//!
//! One spawned task per workout session owns the [`SessionState`] and is the
//! only place it is mutated. The task multiplexes four inputs:
//!
//! - user commands from the [`SessionHandle`]
//! - the playback tick (1 s by default)
//! - the snapshot and refresh intervals
//! - results of network work it spawned (snapshots, recommendation batches)
//!
//! Network work never runs on the session task, so a slow scoring service
//! cannot delay ticking. Results come back over a channel whose receiver is
//! dropped when the session ends, which discards anything still in flight.
//! At most one health sample is outstanding at a time; snapshot ticks that
//! fire while one is running are skipped, so snapshots apply in order.

use super::state::{Effect, SessionReport, SessionState, SessionView};
use crate::config::AppConfig;
use crate::error::SessionError;
use crate::scoring::ScoringService;
use crate::services::{FeedbackRecorder, Notifier, RecommendationClient, SnapshotProducer, Telemetry};
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use workout_music_shared::types::TelemetryEvent;
use workout_music_shared::{
    HealthSnapshot, Rating, RecommendationBatch, RequestError, TrackRecommendation, WorkoutPhase,
};

/// Timing and policy knobs for a session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub tick_interval: Duration,
    pub snapshot_interval: Duration,
    pub refresh_interval: Duration,
    pub fallback_track_duration_secs: f64,
    pub telemetry_enabled: bool,
}

impl SessionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            tick_interval: config.session.tick_interval(),
            snapshot_interval: config.session.snapshot_interval(),
            refresh_interval: config.session.refresh_interval(),
            fallback_track_duration_secs: config.session.fallback_track_duration_secs,
            telemetry_enabled: config.service.telemetry_enabled,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Collaborators a session talks to
#[derive(Clone)]
pub struct SessionDeps {
    pub scoring: Arc<dyn ScoringService>,
    pub producer: SnapshotProducer,
    pub notifier: Arc<dyn Notifier>,
}

enum Command {
    Play(TrackRecommendation),
    Skip,
    Rate {
        track: TrackRecommendation,
        rating: Rating,
        context: String,
    },
    RateCurrent {
        rating: Rating,
        context: String,
    },
    Refresh,
    CaptureSnapshot,
    SetPhase(WorkoutPhase),
    Pause,
    Resume,
    ReportMood(String),
    End(oneshot::Sender<SessionReport>),
}

enum Completion {
    Snapshot(Result<HealthSnapshot, RequestError>),
    Batch(Result<RecommendationBatch, RequestError>),
}

/// Handle to a running session
///
/// Commands are queued to the session task and applied in order. Once the
/// session has ended every command returns [`SessionError::Ended`].
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<SessionView>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    fn send(&self, command: Command) -> Result<(), SessionError> {
        self.commands.send(command).map_err(|_| SessionError::Ended)
    }

    /// Latest published session state
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    pub fn play(&self, track: TrackRecommendation) -> Result<(), SessionError> {
        self.send(Command::Play(track))
    }

    pub fn skip(&self) -> Result<(), SessionError> {
        self.send(Command::Skip)
    }

    /// Rate a track
    pub fn rate(
        &self,
        track: TrackRecommendation,
        rating: Rating,
        context: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.send(Command::Rate {
            track,
            rating,
            context: context.into(),
        })
    }

    /// Rate whatever is playing when the command is applied
    pub fn rate_current(&self, rating: Rating, context: impl Into<String>) -> Result<(), SessionError> {
        self.send(Command::RateCurrent {
            rating,
            context: context.into(),
        })
    }

    pub fn refresh(&self) -> Result<(), SessionError> {
        self.send(Command::Refresh)
    }

    /// Produce a snapshot now instead of waiting for the next interval
    pub fn capture_snapshot(&self) -> Result<(), SessionError> {
        self.send(Command::CaptureSnapshot)
    }

    pub fn set_phase(&self, phase: WorkoutPhase) -> Result<(), SessionError> {
        self.send(Command::SetPhase(phase))
    }

    pub fn pause(&self) -> Result<(), SessionError> {
        self.send(Command::Pause)
    }

    pub fn resume(&self) -> Result<(), SessionError> {
        self.send(Command::Resume)
    }

    pub fn report_mood(&self, mood: impl Into<String>) -> Result<(), SessionError> {
        self.send(Command::ReportMood(mood.into()))
    }

    /// End the session
    ///
    /// Returns once the session task has stopped: no tick, snapshot or
    /// refresh runs after this resolves.
    pub async fn end(self) -> Result<SessionReport, SessionError> {
        let (reply, report) = oneshot::channel();
        self.send(Command::End(reply))?;
        let report = report.await.map_err(|_| SessionError::Ended)?;
        if let Err(err) = self.task.await {
            warn!(error = %err, "Session task did not shut down cleanly");
        }
        Ok(report)
    }
}

/// Starts sessions
pub struct SessionManager;

impl SessionManager {
    /// Spawn a session task and return its handle
    pub fn start(deps: SessionDeps, settings: SessionSettings, phase: WorkoutPhase) -> SessionHandle {
        let state = SessionState::new(phase, settings.fallback_track_duration_secs);
        let (view_tx, view_rx) = watch::channel(state.view(0));
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let runner = SessionRunner {
            recommendations: RecommendationClient::new(Arc::clone(&deps.scoring)),
            feedback: FeedbackRecorder::new(Arc::clone(&deps.scoring)),
            telemetry: Telemetry::new(Arc::clone(&deps.scoring), settings.telemetry_enabled),
            producer: deps.producer,
            notifier: deps.notifier,
            state,
            settings,
            sampling: false,
            view: view_tx,
            completions: completions_tx,
        };

        let task = tokio::spawn(runner.run(commands_rx, completions_rx));
        SessionHandle {
            commands: commands_tx,
            view: view_rx,
            task,
        }
    }
}

struct SessionRunner {
    state: SessionState,
    settings: SessionSettings,
    sampling: bool,
    recommendations: RecommendationClient,
    feedback: FeedbackRecorder,
    telemetry: Telemetry,
    producer: SnapshotProducer,
    notifier: Arc<dyn Notifier>,
    view: watch::Sender<SessionView>,
    completions: mpsc::UnboundedSender<Completion>,
}

impl SessionRunner {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        info!(session_id = %self.state.id(), phase = %self.state.phase(), "Workout session started");
        let effects = self.state.start();
        self.execute(effects);
        self.spawn_snapshot();

        let start = Instant::now();
        let mut tick = interval_at(start + self.settings.tick_interval, self.settings.tick_interval);
        let mut snapshots =
            interval_at(start + self.settings.snapshot_interval, self.settings.snapshot_interval);
        let mut refreshes =
            interval_at(start + self.settings.refresh_interval, self.settings.refresh_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Burst);
        snapshots.set_missed_tick_behavior(MissedTickBehavior::Skip);
        refreshes.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let tick_secs = self.settings.tick_interval.as_secs_f64();

        let reply = loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(Command::End(reply)) => break Some(reply),
                    Some(command) => self.handle_command(command),
                    // Every handle dropped without ending
                    None => break None,
                },
                Some(completion) = completions.recv() => self.handle_completion(completion),
                _ = tick.tick() => {
                    let effects = self.state.tick(tick_secs);
                    self.execute(effects);
                }
                _ = snapshots.tick() => self.spawn_snapshot(),
                _ = refreshes.tick() => {
                    let effects = self.state.request_refresh();
                    self.execute(effects);
                }
            }
            self.publish();
        };

        // Intervals are dropped with this task; nothing ticks past this point
        drop(completions);
        let effects = self.state.end();
        self.execute(effects);
        self.publish();

        let ratings = self.feedback.into_ratings();
        let report = self.state.into_report(ratings);
        info!(
            session_id = %report.session_id,
            elapsed_secs = report.elapsed_secs,
            tracks_played = report.history.len(),
            ratings = report.ratings.len(),
            "Workout session ended"
        );
        if let Some(reply) = reply {
            if reply.send(report).is_err() {
                debug!("Session report receiver dropped");
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        let effects = match command {
            Command::Play(track) => self.state.play(track),
            Command::Skip => self.state.skip(),
            Command::Rate {
                track,
                rating,
                context,
            } => {
                self.feedback.rate(track, rating, context);
                Vec::new()
            }
            Command::RateCurrent { rating, context } => {
                match self.state.tracker().state().current.clone() {
                    Some(track) => {
                        self.feedback.rate(track, rating, context);
                    }
                    None => debug!("Rating ignored, nothing is playing"),
                }
                Vec::new()
            }
            Command::Refresh => self.state.request_refresh(),
            Command::CaptureSnapshot => {
                self.spawn_snapshot();
                Vec::new()
            }
            Command::SetPhase(phase) => {
                info!(phase = %phase, "Workout phase changed");
                self.state.set_phase(phase)
            }
            Command::Pause => {
                self.state.pause();
                Vec::new()
            }
            Command::Resume => {
                self.state.resume();
                Vec::new()
            }
            Command::ReportMood(mood) => self.state.report_mood(mood),
            // Handled by the run loop
            Command::End(_) => Vec::new(),
        };
        self.execute(effects);
    }

    fn handle_completion(&mut self, completion: Completion) {
        let effects = match completion {
            Completion::Snapshot(Ok(snapshot)) => {
                self.sampling = false;
                self.state.apply_snapshot(snapshot)
            }
            Completion::Snapshot(Err(err)) => {
                self.sampling = false;
                warn!(error = %err, "Health sampling failed, keeping last snapshot");
                Vec::new()
            }
            Completion::Batch(result) => self.state.apply_batch(result),
        };
        self.execute(effects);
    }

    fn execute(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Notify(notification) => {
                    counter!("midpoint_notifications_total").increment(1);
                    self.notifier.schedule(notification);
                }
                Effect::Telemetry(event) => {
                    match &event {
                        TelemetryEvent::TrackCompleted { track_id, .. } => {
                            counter!("tracks_completed_total").increment(1);
                            debug!(%track_id, "Track completed");
                        }
                        TelemetryEvent::TrackSkipped { track_id, .. } => {
                            counter!("tracks_skipped_total").increment(1);
                            debug!(%track_id, "Track skipped");
                        }
                        TelemetryEvent::PlaybackStarted { track_name, artist, .. } => {
                            info!(%track_name, %artist, "Now playing");
                        }
                        _ => {}
                    }
                    self.telemetry.emit(event);
                }
                Effect::FetchRecommendations { snapshot, phase } => self.spawn_fetch(snapshot, phase),
            }
        }
    }

    fn spawn_snapshot(&mut self) {
        if self.sampling {
            debug!("Health sample still in flight, skipping");
            return;
        }
        self.sampling = true;
        let producer = self.producer.clone();
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = producer.produce().await;
            // Fails only once the session has ended
            let _ = completions.send(Completion::Snapshot(result));
        });
    }

    fn spawn_fetch(&self, snapshot: HealthSnapshot, phase: WorkoutPhase) {
        let client = self.recommendations.clone();
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = client.request_recommendations(&snapshot, phase).await;
            if completions.send(Completion::Batch(result)).is_err() {
                debug!("Recommendations arrived after session end, discarded");
            }
        });
    }

    fn publish(&self) {
        let view = self.state.view(self.feedback.ratings().len());
        self.view.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }
}
