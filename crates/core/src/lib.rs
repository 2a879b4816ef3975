//! Frame synchronization and overlay rendering for pose annotations.
//!
//! - [`frame_clock`]: playback time → frame index.
//! - [`annotation`]: per-frame records and the frame → record index.
//! - [`skeleton`]: joints, keypoint sets, and the shared bone topology.
//! - [`projector`]: normalized keypoints → pixel points and bones.
//! - [`surface`] / [`raster`]: overlay targets (display list, RGBA image).
//! - [`overlay`]: the clear-then-draw renderer.
//! - [`playback`]: the recorded-video session driven by media events.

pub mod annotation;
pub mod error;
pub mod frame_clock;
pub mod overlay;
pub mod playback;
pub mod projector;
pub mod raster;
pub mod skeleton;
pub mod surface;
pub mod types;

pub use annotation::{AnnotationIndex, AnnotationRecord, BatchSummary};
pub use error::CoreError;
pub use frame_clock::{to_frame_index, FrameClock, DEFAULT_SAMPLE_RATE_FPS};
pub use overlay::{OverlayMode, OverlayRenderer, RenderReport, RenderStatus};
pub use playback::PlaybackOverlay;
pub use skeleton::{Joint, KeypointSet, NormalizedPoint, BONE_TOPOLOGY};
pub use surface::{DisplayList, MediaGeometry, SizingRule, Surface, SurfaceGeometry};
