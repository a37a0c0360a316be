//! Workout session: playback tracking, state reduction and the session task

pub mod manager;
pub mod playback;
pub mod state;

pub use manager::{SessionDeps, SessionHandle, SessionManager, SessionSettings};
pub use playback::{
    PlaybackEvent, PlaybackState, PlaybackTracker, RecommendationQueue, FALLBACK_TRACK_DURATION_SECS,
};
pub use state::{Effect, SessionErrorInfo, SessionReport, SessionState, SessionStatus, SessionView};
