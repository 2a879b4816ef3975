//! Overlay rendering: clear, then draw exactly the active annotation.
//!
//! [`OverlayRenderer`] owns the draw-state invariant: after every call the
//! surface shows the annotation for the requested frame, or nothing. The
//! violation list is always returned in the [`RenderReport`]; live overlays
//! additionally draw it as text on the surface.

use crate::annotation::{AnnotationIndex, AnnotationRecord};
use crate::projector::{PixelPoint, SkeletonProjector, SkeletonStyle};
use crate::surface::{MediaGeometry, SizingRule, Surface, SurfaceGeometry};
use crate::types::{palette, FrameIndex};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Left edge of on-surface violation text.
pub const VIOLATION_TEXT_X: f64 = 10.0;

/// Baseline of the first violation line.
pub const VIOLATION_TEXT_TOP: f64 = 30.0;

/// Distance between violation baselines.
pub const VIOLATION_LINE_HEIGHT: f64 = 24.0;

pub const VIOLATION_TEXT_SIZE_PX: f64 = 18.0;

// ---------------------------------------------------------------------------
// Mode and report
// ---------------------------------------------------------------------------

/// Which media the overlay sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayMode {
    /// Pre-recorded video; violations go to the side channel only.
    Recorded,
    /// Live feed; violations are also drawn on the surface.
    Live,
}

impl OverlayMode {
    pub fn style(&self) -> SkeletonStyle {
        match self {
            Self::Recorded => SkeletonStyle::RECORDED,
            Self::Live => SkeletonStyle::LIVE,
        }
    }

    pub fn draws_violations(&self) -> bool {
        matches!(self, Self::Live)
    }
}

/// Outcome of one render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// No usable surface; the render was a no-op.
    Skipped,
    /// Surface cleared, nothing to draw for this instant.
    Empty,
    Drawn { points: usize, segments: usize },
}

/// Result of a render, including the violation side channel.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub status: RenderStatus,
    pub geometry: Option<SurfaceGeometry>,
    pub violations: Vec<String>,
}

impl RenderReport {
    pub fn skipped() -> Self {
        Self::skipped_with(Vec::new())
    }

    /// Nothing was drawn, but the active record's violations still stand.
    pub fn skipped_with(violations: Vec<String>) -> Self {
        Self {
            status: RenderStatus::Skipped,
            geometry: None,
            violations,
        }
    }

    fn empty(geometry: SurfaceGeometry, violations: Vec<String>) -> Self {
        Self {
            status: RenderStatus::Empty,
            geometry: Some(geometry),
            violations,
        }
    }
}

impl Default for RenderReport {
    fn default() -> Self {
        Self::skipped()
    }
}

// ---------------------------------------------------------------------------
// OverlayRenderer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct OverlayRenderer {
    mode: OverlayMode,
    sizing: SizingRule,
    projector: SkeletonProjector,
}

impl OverlayRenderer {
    /// A renderer sized to the media's native resolution.
    pub fn new(mode: OverlayMode) -> Self {
        Self {
            mode,
            sizing: SizingRule::NativeResolution,
            projector: SkeletonProjector::new(mode.style()),
        }
    }

    pub fn recorded() -> Self {
        Self::new(OverlayMode::Recorded)
    }

    pub fn live() -> Self {
        Self::new(OverlayMode::Live)
    }

    pub fn with_sizing(mut self, sizing: SizingRule) -> Self {
        self.sizing = sizing;
        self
    }

    pub fn mode(&self) -> OverlayMode {
        self.mode
    }

    pub fn sizing(&self) -> SizingRule {
        self.sizing
    }

    /// Render the annotation indexed for `frame`.
    pub fn render<S: Surface + ?Sized>(
        &self,
        frame: FrameIndex,
        index: &AnnotationIndex,
        media: &MediaGeometry,
        surface: &mut S,
    ) -> RenderReport {
        self.render_record(index.lookup(frame), media, surface)
    }

    /// Render `record`, or clear when there is none.
    ///
    /// The live path calls this directly with its single "most recent"
    /// slot.
    ///
    /// The report carries the record's violations even when nothing can be
    /// drawn. An unknown media size still clears the surface, so a stale
    /// skeleton never outlives its frame. A surface that refuses `begin` is
    /// left untouched.
    pub fn render_record<S: Surface + ?Sized>(
        &self,
        record: Option<&AnnotationRecord>,
        media: &MediaGeometry,
        surface: &mut S,
    ) -> RenderReport {
        let violations = record.map(|r| r.violations.clone()).unwrap_or_default();

        let Some(geometry) = media.resolve(self.sizing) else {
            surface.clear();
            tracing::debug!(sizing = ?self.sizing, "Media size unknown; overlay cleared");
            return RenderReport::skipped_with(violations);
        };

        if let Err(e) = surface.begin(geometry) {
            tracing::debug!(error = %e, "Overlay surface unavailable; skipping render");
            return RenderReport::skipped_with(violations);
        }

        let Some(record) = record else {
            return RenderReport::empty(geometry, violations);
        };

        let Some(keypoints) = record.drawable_keypoints() else {
            return RenderReport::empty(geometry, violations);
        };

        let counts = self.projector.draw(keypoints, geometry, surface);

        if self.mode.draws_violations() {
            for (i, text) in violations.iter().enumerate() {
                let origin = PixelPoint::new(
                    VIOLATION_TEXT_X,
                    VIOLATION_TEXT_TOP + i as f64 * VIOLATION_LINE_HEIGHT,
                );
                surface.fill_text(text, origin, VIOLATION_TEXT_SIZE_PX, palette::YELLOW);
            }
        }

        RenderReport {
            status: RenderStatus::Drawn {
                points: counts.points,
                segments: counts.segments,
            },
            geometry: Some(geometry),
            violations,
        }
    }
}
