//! Recorded-path renderer.
//!
//! Replays a whole-video analysis through a [`PlaybackOverlay`] the way a
//! video element would (metadata, batch, then time updates) and writes
//! one transparent overlay PNG per annotated frame plus a JSON summary of
//! the violations shown at each frame.

use std::path::{Path, PathBuf};

use serde::Serialize;
use stance_analyzer::{FeedbackEnvelope, VideoFeedback};
use stance_core::raster::ImageSurface;
use stance_core::{
    BatchSummary, CoreError, FrameClock, MediaGeometry, OverlayRenderer, PlaybackOverlay,
    RenderStatus, SizingRule,
};
use stance_events::{EventBus, OverlayEvent};

/// Name of the per-frame violation summary written next to the PNGs.
pub const SUMMARY_FILE: &str = "violations.json";

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid analysis JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("No media size known; set NATIVE_WIDTH/NATIVE_HEIGHT or DISPLAY_WIDTH/DISPLAY_HEIGHT")]
    UnknownGeometry,
}

/// One rendered frame in the summary file.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayedFrame {
    pub frame: u64,
    pub time: f64,
    pub overlay: Option<String>,
    pub violations: Vec<String>,
}

/// What a replay produced.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub total_frames: Option<u64>,
    pub batch: BatchSummary,
    pub frames: Vec<ReplayedFrame>,
}

/// Load a saved `/analyze` response.
///
/// Accepts the response as served (`{"feedback": {...}}`) or the bare
/// payload.
pub fn load_analysis(path: &Path) -> Result<VideoFeedback, ReplayError> {
    let text = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let feedback = if value.get("feedback").is_some() {
        serde_json::from_value::<FeedbackEnvelope<VideoFeedback>>(value)?.feedback
    } else {
        serde_json::from_value(value)?
    };
    Ok(feedback)
}

/// Renders recorded analyses to disk.
pub struct Replayer {
    clock: FrameClock,
    sizing: SizingRule,
    media: MediaGeometry,
    output_dir: PathBuf,
}

impl Replayer {
    pub fn new(media: MediaGeometry, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            clock: FrameClock::default(),
            sizing: SizingRule::default(),
            media,
            output_dir: output_dir.into(),
        }
    }

    pub fn with_sizing(mut self, sizing: SizingRule) -> Self {
        self.sizing = sizing;
        self
    }

    pub fn with_clock(mut self, clock: FrameClock) -> Self {
        self.clock = clock;
        self
    }

    /// Render every annotated frame of `feedback`.
    ///
    /// Violations for each frame are also published on `events`.
    pub fn run(
        &self,
        feedback: &VideoFeedback,
        events: &EventBus,
    ) -> Result<ReplaySummary, ReplayError> {
        if self.media.resolve(self.sizing).is_none() {
            return Err(ReplayError::UnknownGeometry);
        }
        std::fs::create_dir_all(&self.output_dir).map_err(|source| ReplayError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let renderer = OverlayRenderer::recorded().with_sizing(self.sizing);
        let mut session =
            PlaybackOverlay::with_renderer(ImageSurface::new(), renderer, self.clock);
        if let Some(native) = self.media.native {
            session.on_metadata(native);
        }
        if let Some(displayed) = self.media.displayed {
            session.on_resize(displayed);
        }

        let (index, batch) = feedback.to_index();
        let frames = index.frames();
        session.on_batch(index);

        let mut rendered = Vec::with_capacity(frames.len());
        for frame in frames {
            let time = self.mid_frame_time(frame);
            let Some(report) = session.on_time_update(time) else {
                continue;
            };
            let status = report.status;
            let violations = report.violations.clone();

            let overlay = if matches!(status, RenderStatus::Drawn { .. }) {
                let name = format!("frame_{frame:06}.png");
                session.surface().save_png(self.output_dir.join(&name))?;
                Some(name)
            } else {
                None
            };

            tracing::debug!(frame, ?status, violations = violations.len(), "Frame replayed");
            events.publish(OverlayEvent::frame_violations(frame, violations.clone()));
            rendered.push(ReplayedFrame {
                frame,
                time,
                overlay,
                violations,
            });
        }

        let summary = ReplaySummary {
            total_frames: feedback.total_frames,
            batch,
            frames: rendered,
        };
        self.write_summary(&summary)?;

        tracing::info!(
            frames = summary.frames.len(),
            skipped = summary.batch.skipped,
            output_dir = %self.output_dir.display(),
            "Replay finished",
        );
        Ok(summary)
    }

    /// Middle of the frame's time slice, clear of float rounding at the
    /// boundaries.
    fn mid_frame_time(&self, frame: u64) -> f64 {
        (self.clock.frame_start_time(frame) + self.clock.frame_start_time(frame + 1)) / 2.0
    }

    fn write_summary(&self, summary: &ReplaySummary) -> Result<(), ReplayError> {
        let path = self.output_dir.join(SUMMARY_FILE);
        let json = serde_json::to_vec_pretty(summary)?;
        std::fs::write(&path, json).map_err(|source| ReplayError::Io { path, source })
    }
}
