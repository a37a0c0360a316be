//! Best-effort telemetry to the scoring service

use crate::scoring::ScoringService;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, warn};
use workout_music_shared::types::{TelemetryEnvelope, TelemetryEvent};

/// Fire-and-forget telemetry sender
///
/// Events are timestamped when emitted and sent from a spawned task, so the
/// caller never waits on the network. Failures are logged and dropped.
#[derive(Clone)]
pub struct Telemetry {
    scoring: Arc<dyn ScoringService>,
    enabled: bool,
}

impl Telemetry {
    pub fn new(scoring: Arc<dyn ScoringService>, enabled: bool) -> Self {
        Self { scoring, enabled }
    }

    /// Send an event without waiting for delivery
    pub fn emit(&self, event: TelemetryEvent) {
        if !self.enabled {
            return;
        }
        let envelope = TelemetryEnvelope::now(event);
        let scoring = Arc::clone(&self.scoring);
        tokio::spawn(async move {
            let name = envelope.event.name();
            match scoring.send_event(&envelope).await {
                Ok(()) => debug!(event = name, "Telemetry delivered"),
                Err(err) => {
                    counter!("telemetry_failures_total").increment(1);
                    warn!(event = name, error = %err, "Telemetry delivery failed");
                }
            }
        });
    }
}
