//! `stance-live` -- live overlay loop over a directory of stills.
//!
//! Treats the images in `FRAMES_DIR` as a camera, sends one snapshot per
//! interval to the analyzer, and keeps the overlay on the newest
//! response. Stops after `LIVE_DURATION_SECS` or on Ctrl-C, then writes
//! the final overlay layer to `OUTPUT_DIR/live_overlay.png`.
//!
//! See [`stance_worker::config::WorkerConfig::from_env`] for the
//! environment variables.

use std::sync::Arc;

use stance_analyzer::AnalyzerApi;
use stance_core::raster::ImageSurface;
use stance_core::OverlayRenderer;
use stance_events::{EventBus, EventKind};
use stance_live::CaptureAnalyzeLoop;
use stance_worker::config::WorkerConfig;
use stance_worker::source::FrameDirectorySource;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    stance_worker::init_tracing();

    let config = WorkerConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    let Some(frames_dir) = config.frames_dir.clone() else {
        tracing::error!("FRAMES_DIR environment variable is required");
        std::process::exit(1);
    };

    let api = AnalyzerApi::new(config.analyzer_url.clone(), config.request_timeout)
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Could not build analyzer client");
            std::process::exit(1);
        });

    tracing::info!(
        analyzer_url = %config.analyzer_url,
        frames_dir = %frames_dir.display(),
        interval_ms = config.capture_interval.as_millis() as u64,
        max_in_flight = config.max_in_flight,
        "Starting stance-live",
    );

    let events = Arc::new(EventBus::default());
    let log_task = tokio::spawn(log_events(Arc::clone(&events)));

    let source = FrameDirectorySource::new(frames_dir);
    let session = CaptureAnalyzeLoop::new(Arc::new(api), Arc::clone(&events))
        .with_config(config.loop_config())
        .with_renderer(OverlayRenderer::live().with_sizing(config.sizing))
        .with_display_size(config.displayed)
        .start(&source, ImageSurface::new())
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Live mode unavailable");
            std::process::exit(1);
        });

    tokio::select! {
        _ = tokio::time::sleep(config.live_duration) => {
            tracing::info!("Live duration elapsed");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
        }
    }

    if let Err(e) = std::fs::create_dir_all(&config.output_dir) {
        tracing::error!(error = %e, dir = %config.output_dir.display(), "Cannot create output directory");
    } else {
        let path = config.output_dir.join("live_overlay.png");
        match session.with_surface(|surface| surface.save_png(&path)).await {
            Ok(()) => tracing::info!(path = %path.display(), "Final overlay written"),
            Err(e) => tracing::warn!(error = %e, "Final overlay not written"),
        }
    }

    let applied = session.last_applied_seq().await;
    session.shutdown().await;
    log_task.abort();

    tracing::info!(last_applied_seq = applied, "stance-live finished");
}

/// Mirror the status and violation channel into the log.
async fn log_events(events: Arc<EventBus>) {
    let mut rx = events.subscribe();
    loop {
        match rx.recv().await {
            Ok(event) => match event.kind {
                EventKind::Status { level, message } => {
                    tracing::info!(?level, "{message}");
                }
                EventKind::Violations { seq, messages, .. } => {
                    tracing::info!(?seq, violations = ?messages, "Overlay updated");
                }
                EventKind::SessionStarted { session_id } => {
                    tracing::debug!(%session_id, "Session started");
                }
                EventKind::SessionStopped { session_id } => {
                    tracing::debug!(%session_id, "Session stopped");
                }
            },
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event log fell behind");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}
