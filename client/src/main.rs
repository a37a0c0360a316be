//! Workout Music Client
//!
//! Runs a workout session against the configured scoring service until
//! Ctrl+C or SIGTERM, then prints the session report.
//!
//! ## Architecture
//!
//! - Scoring: REST client for the external recommendation service
//! - Services: recommendation, feedback, snapshot and telemetry concerns
//! - Session: one task per workout owning all mutable session state

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workout_music_client::{config, services::RealTimeSampler, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    // Load configuration
    let config = match config::AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            anyhow::bail!("Invalid configuration");
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if config::AppConfig::is_production() { "production" } else { "development" },
        service = %config.service.base_url,
        "Starting Workout Music Client"
    );

    if config.metrics.enabled {
        let addr = config.metrics_addr()?;
        PrometheusBuilder::new().with_http_listener(addr).install()?;
        info!(address = %addr, "Prometheus exporter listening");
    }

    let state = AppState::from_config(config)?;

    // The session still runs offline; it will keep retrying on its refresh interval
    match state.scoring.check_connectivity().await {
        Ok(()) => info!("Scoring service reachable"),
        Err(e) => warn!("Scoring service unreachable: {}", e),
    }

    let sampler = Arc::new(RealTimeSampler::new(Arc::clone(&state.scoring)));
    let session = state.start_session(sampler, state.config().session.initial_phase);

    let mut updates = session.subscribe();
    let watcher = tokio::spawn(async move {
        let mut last_track: Option<String> = None;
        while updates.changed().await.is_ok() {
            let view = updates.borrow_and_update().clone();
            let current = view.current_track.as_ref().map(|t| t.track_id.clone());
            if current != last_track {
                if let Some(track) = &view.current_track {
                    info!(
                        track = %track.name,
                        artist = %track.artist,
                        confidence = track.confidence,
                        queued = view.queue.len(),
                        "Playing recommendation"
                    );
                }
                last_track = current;
            }
            if let Some(err) = &view.last_error {
                warn!(kind = err.kind, retryable = err.retryable, "{}", err.message);
            }
        }
    });

    shutdown_signal().await;

    let report = session.end().await?;
    watcher.abort();

    info!(
        session_id = %report.session_id,
        elapsed_secs = report.elapsed_secs,
        tracks_played = report.history.len(),
        ratings = report.ratings.len(),
        "Session report"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "workout_music_client=info".into()
        } else {
            "workout_music_client=debug,reqwest=info".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Pretty logging for development
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, ending session");
        }
        _ = terminate => {
            info!("Received SIGTERM, ending session");
        }
    }
}
