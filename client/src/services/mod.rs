//! Session services
//!
//! Each service wraps one concern of the recommendation loop and talks to
//! the scoring service through [`crate::scoring::ScoringService`].

pub mod feedback;
pub mod notifications;
pub mod recommendation;
pub mod snapshot;
pub mod telemetry;

pub use feedback::FeedbackRecorder;
pub use notifications::{LogNotifier, MidpointNotification, Notifier};
pub use recommendation::RecommendationClient;
pub use snapshot::{HealthSampler, RealTimeSampler, ScriptedSampler, SnapshotProducer};
pub use telemetry::Telemetry;
