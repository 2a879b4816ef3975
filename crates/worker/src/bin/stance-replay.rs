//! `stance-replay` -- render the recorded-video overlay to disk.
//!
//! Takes a whole-video analysis either from a saved response
//! (`ANALYSIS_JSON`) or by asking the analyzer to analyze an uploaded
//! video (`VIDEO_FILENAME`), then writes one overlay PNG per annotated
//! frame and `violations.json` into `OUTPUT_DIR`.
//!
//! The media size comes from `NATIVE_WIDTH`/`NATIVE_HEIGHT` and, for
//! `SIZING=displayed`, `DISPLAY_WIDTH`/`DISPLAY_HEIGHT`.

use stance_analyzer::AnalyzerApi;
use stance_core::MediaGeometry;
use stance_events::EventBus;
use stance_worker::config::WorkerConfig;
use stance_worker::replay::{load_analysis, Replayer};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    stance_worker::init_tracing();

    let config = WorkerConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    let feedback = if let Some(path) = &config.analysis_json {
        tracing::info!(path = %path.display(), "Loading saved analysis");
        load_analysis(path).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Could not load analysis");
            std::process::exit(1);
        })
    } else if let Some(filename) = &config.video_filename {
        tracing::info!(analyzer_url = %config.analyzer_url, filename, "Requesting video analysis");
        let api = AnalyzerApi::new(config.analyzer_url.clone(), config.request_timeout)
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Could not build analyzer client");
                std::process::exit(1);
            });
        api.analyze_video(filename).await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Video analysis failed");
            std::process::exit(1);
        })
    } else {
        tracing::error!("Set ANALYSIS_JSON or VIDEO_FILENAME");
        std::process::exit(1);
    };

    let media = MediaGeometry {
        native: config.native,
        displayed: config.displayed,
    };
    let replayer = Replayer::new(media, config.output_dir.clone()).with_sizing(config.sizing);
    let events = EventBus::default();

    match replayer.run(&feedback, &events) {
        Ok(summary) => {
            let with_violations = summary
                .frames
                .iter()
                .filter(|f| !f.violations.is_empty())
                .count();
            tracing::info!(
                frames = summary.frames.len(),
                with_violations,
                total_frames = ?summary.total_frames,
                "stance-replay finished",
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Replay failed");
            std::process::exit(1);
        }
    }
}
