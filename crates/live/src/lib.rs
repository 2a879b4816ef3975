//! Live capture path.
//!
//! Opens a capture device, snapshots it on a fixed interval, sends each
//! still to the analyzer, and keeps the overlay showing the newest
//! response. See [`session`] for the ordering and teardown rules.

pub mod capture;
pub mod error;
pub mod session;

pub use capture::{encode_png, FrameSequence, MediaSource, MediaStream};
pub use error::{CaptureError, LiveError};
pub use session::{CaptureAnalyzeLoop, CaptureState, CycleOutcome, LiveSession, LoopConfig};
