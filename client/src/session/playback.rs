//! Playback session tracker
//!
//! Per-track state machine:
//!
//! ```text
//! Idle -> Playing -> (MidpointReached) -> Playing -> Ended -> Idle(next)
//! ```
//!
//! The tracker is driven by [`PlaybackTracker::advance`] from the session
//! tick. It never touches the network or the clock itself; everything it
//! wants done outside is returned as [`PlaybackEvent`]s.

use std::collections::VecDeque;
use workout_music_shared::{TrackHistoryEntry, TrackRecommendation};

/// Duration assumed for tracks that report none
pub const FALLBACK_TRACK_DURATION_SECS: f64 = 180.0;

/// Ranked recommendations waiting to be played
///
/// Consumed front-to-back. Only the head can be removed; otherwise the
/// queue is replaced wholesale by a fresh batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationQueue {
    items: VecDeque<TrackRecommendation>,
}

impl RecommendationQueue {
    /// Replace the whole queue with a fresh ranking
    pub fn replace(&mut self, items: Vec<TrackRecommendation>) {
        self.items = items.into();
    }

    #[inline]
    pub fn head(&self) -> Option<&TrackRecommendation> {
        self.items.front()
    }

    pub fn pop_head(&mut self) -> Option<TrackRecommendation> {
        self.items.pop_front()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_vec(&self) -> Vec<TrackRecommendation> {
        self.items.iter().cloned().collect()
    }

    fn head_is(&self, track: &TrackRecommendation) -> bool {
        self.head().is_some_and(|head| head.track_id == track.track_id)
    }
}

/// Mutable playback position for the current track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    pub current: Option<TrackRecommendation>,
    pub position_secs: f64,
    pub duration_secs: f64,
    pub midpoint_notified: bool,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }
}

/// Something the tracker wants the session to act on
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Started {
        track: TrackRecommendation,
        duration_secs: f64,
    },
    MidpointReached {
        track: TrackRecommendation,
    },
    Ended {
        entry: TrackHistoryEntry,
    },
    Skipped {
        track: TrackRecommendation,
        position_secs: f64,
        duration_secs: f64,
    },
}

/// Owns playback state, the recommendation queue and the play history
#[derive(Debug, Clone)]
pub struct PlaybackTracker {
    state: PlaybackState,
    queue: RecommendationQueue,
    history: Vec<TrackHistoryEntry>,
    fallback_duration_secs: f64,
}

impl Default for PlaybackTracker {
    fn default() -> Self {
        Self::new(FALLBACK_TRACK_DURATION_SECS)
    }
}

impl PlaybackTracker {
    pub fn new(fallback_duration_secs: f64) -> Self {
        Self {
            state: PlaybackState::default(),
            queue: RecommendationQueue::default(),
            history: Vec::new(),
            fallback_duration_secs,
        }
    }

    #[inline]
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    #[inline]
    pub fn queue(&self) -> &RecommendationQueue {
        &self.queue
    }

    #[inline]
    pub fn history(&self) -> &[TrackHistoryEntry] {
        &self.history
    }

    pub fn into_history(self) -> Vec<TrackHistoryEntry> {
        self.history
    }

    /// Replace the queue with a fresh batch
    pub fn replace_queue(&mut self, recommendations: Vec<TrackRecommendation>) {
        self.queue.replace(recommendations);
    }

    /// Start playing a track from the beginning
    pub fn play(&mut self, track: TrackRecommendation) -> Vec<PlaybackEvent> {
        let duration_secs = track
            .duration_secs
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(self.fallback_duration_secs);

        self.state = PlaybackState {
            current: Some(track.clone()),
            position_secs: 0.0,
            duration_secs,
            midpoint_notified: false,
        };

        vec![PlaybackEvent::Started {
            track,
            duration_secs,
        }]
    }

    /// Play the head of the queue if nothing is playing
    pub fn play_head_if_idle(&mut self) -> Vec<PlaybackEvent> {
        if self.state.is_playing() {
            return Vec::new();
        }
        match self.queue.head().cloned() {
            Some(head) => self.play(head),
            None => Vec::new(),
        }
    }

    /// Move the playback position forward
    ///
    /// Negative or non-finite steps are ignored so position never goes
    /// backwards within a track.
    pub fn advance(&mut self, elapsed_secs: f64) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        let Some(track) = self.state.current.clone() else {
            return events;
        };
        if !elapsed_secs.is_finite() || elapsed_secs < 0.0 {
            return events;
        }

        self.state.position_secs += elapsed_secs;

        if !self.state.midpoint_notified && self.state.position_secs >= self.state.duration_secs / 2.0 {
            self.state.midpoint_notified = true;
            events.push(PlaybackEvent::MidpointReached {
                track: track.clone(),
            });
        }

        if self.state.position_secs >= self.state.duration_secs {
            events.extend(self.finish(track));
        }
        events
    }

    /// Skip to the next recommendation
    ///
    /// No-op unless at least two recommendations are queued.
    pub fn skip(&mut self) -> Vec<PlaybackEvent> {
        if self.queue.len() <= 1 {
            return Vec::new();
        }

        let mut events = Vec::new();
        if let Some(track) = self.state.current.clone() {
            events.push(PlaybackEvent::Skipped {
                position_secs: self.state.position_secs,
                duration_secs: self.state.duration_secs,
                track,
            });
        }

        self.queue.pop_head();
        self.state = PlaybackState::default();
        if let Some(next) = self.queue.head().cloned() {
            events.extend(self.play(next));
        }
        events
    }

    /// Stop playback without recording history
    pub fn stop(&mut self) {
        self.state = PlaybackState::default();
    }

    fn finish(&mut self, track: TrackRecommendation) -> Vec<PlaybackEvent> {
        let entry = TrackHistoryEntry::new(
            track.clone(),
            self.state.position_secs,
            self.state.duration_secs,
        );
        self.history.push(entry.clone());
        self.state = PlaybackState::default();

        if self.queue.head_is(&track) {
            self.queue.pop_head();
        }

        let mut events = vec![PlaybackEvent::Ended { entry }];
        if let Some(next) = self.queue.head().cloned() {
            events.extend(self.play(next));
        }
        events
    }
}
