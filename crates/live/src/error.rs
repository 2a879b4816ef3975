//! Error types for the live capture path.

use stance_analyzer::AnalyzerError;

/// Failures from a capture device.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The device could not be opened (missing, busy, or access denied).
    #[error("Capture device unavailable: {0}")]
    Unavailable(String),

    /// The device is open but could not produce a frame.
    #[error("Snapshot failed: {0}")]
    Snapshot(String),
}

/// Errors surfaced by the capture-analyze loop.
#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    /// Live mode cannot start. Not retried.
    #[error("Could not access capture device: {0}")]
    CaptureUnavailable(String),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Frame encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    /// One analysis cycle failed. The loop keeps running.
    #[error("Analysis request failed: {0}")]
    AnalysisRequestFailed(#[from] AnalyzerError),
}
