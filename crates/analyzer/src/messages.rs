//! Analyzer response types.
//!
//! Every analyzer endpoint wraps its payload as `{"feedback": {...}}`.
//! [`FeedbackEnvelope`] strips that wrapper; the payload types are
//! deserialized leniently so a partial response still yields something
//! drawable.

use serde::Deserialize;
use stance_core::{AnnotationIndex, AnnotationRecord, BatchSummary, KeypointSet};

/// The `{"feedback": ...}` wrapper around every analyzer response.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackEnvelope<T> {
    pub feedback: T,
}

/// Payload of `POST /analyze_frame`.
///
/// An image with no detected pose comes back with both fields empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FrameFeedback {
    #[serde(default)]
    pub violations: Vec<String>,
    #[serde(default)]
    pub keypoints: KeypointSet,
}

impl FrameFeedback {
    /// Turn the response into a record for the live slot.
    ///
    /// Live captures have no frame timeline, so the capture's sequence
    /// number stands in for the frame index.
    pub fn into_record(self, seq: u64) -> AnnotationRecord {
        AnnotationRecord::new(seq)
            .with_keypoints(self.keypoints)
            .with_violations(self.violations)
    }
}

/// Payload of `POST /analyze`.
///
/// `violations` is the sparse per-frame batch: only frames with at least
/// one violation appear. Entries stay as raw JSON so a malformed entry is
/// skipped at index time instead of failing the whole response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoFeedback {
    #[serde(default)]
    pub total_frames: Option<u64>,
    #[serde(default)]
    pub violations: Vec<serde_json::Value>,
    /// Set when the analyzer could not open the video.
    #[serde(default)]
    pub error: Option<String>,
}

impl VideoFeedback {
    /// Build the frame index for the recorded overlay.
    pub fn to_index(&self) -> (AnnotationIndex, BatchSummary) {
        AnnotationIndex::from_batch(&self.violations)
    }
}
