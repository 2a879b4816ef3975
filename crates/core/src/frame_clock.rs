//! Playback time to frame index conversion.
//!
//! Annotation batches are keyed by frame index at a fixed sampling rate,
//! while media elements report continuous playback time in seconds.
//! [`FrameClock`] bridges the two. It is stateless, so seeks and
//! non-monotonic time updates need no special handling.

use crate::error::CoreError;
use crate::types::FrameIndex;

/// Sampling rate the analyzer uses when numbering frames.
pub const DEFAULT_SAMPLE_RATE_FPS: u32 = 30;

/// Converts elapsed playback time into a frame index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    sample_rate_fps: u32,
}

impl FrameClock {
    /// Create a clock with a custom sampling rate. The rate must be non-zero.
    pub fn new(sample_rate_fps: u32) -> Result<Self, CoreError> {
        if sample_rate_fps == 0 {
            return Err(CoreError::Validation(
                "sample rate must be at least 1 fps".to_string(),
            ));
        }
        Ok(Self { sample_rate_fps })
    }

    pub fn sample_rate_fps(&self) -> u32 {
        self.sample_rate_fps
    }

    /// `floor(current_time * fps)`.
    ///
    /// Negative and non-finite times clamp to frame 0.
    pub fn to_frame_index(&self, current_time: f64) -> FrameIndex {
        if !current_time.is_finite() || current_time <= 0.0 {
            return 0;
        }
        (current_time * f64::from(self.sample_rate_fps)).floor() as FrameIndex
    }

    /// Playback time (seconds) at which `frame` begins.
    pub fn frame_start_time(&self, frame: FrameIndex) -> f64 {
        frame as f64 / f64::from(self.sample_rate_fps)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            sample_rate_fps: DEFAULT_SAMPLE_RATE_FPS,
        }
    }
}

/// Frame index for `current_time` at [`DEFAULT_SAMPLE_RATE_FPS`].
pub fn to_frame_index(current_time: f64) -> FrameIndex {
    FrameClock::default().to_frame_index(current_time)
}
