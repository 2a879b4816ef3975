//! Recorded-video overlay session.
//!
//! [`PlaybackOverlay`] is the event-facing side of the recorded path. The
//! host forwards media events (time update, metadata, resize) and analysis
//! batches; the session re-renders only when the frame index, the batch,
//! or the media geometry actually changed.

use crate::annotation::{AnnotationIndex, BatchSummary};
use crate::frame_clock::FrameClock;
use crate::overlay::{OverlayRenderer, RenderReport};
use crate::surface::{MediaGeometry, Surface, SurfaceGeometry};
use crate::types::FrameIndex;

pub struct PlaybackOverlay<S> {
    clock: FrameClock,
    renderer: OverlayRenderer,
    index: AnnotationIndex,
    media: MediaGeometry,
    surface: S,
    current_frame: Option<FrameIndex>,
    last_report: RenderReport,
}

impl<S: Surface> PlaybackOverlay<S> {
    /// A session with the recorded renderer and the default 30 fps clock.
    pub fn new(surface: S) -> Self {
        Self::with_renderer(surface, OverlayRenderer::recorded(), FrameClock::default())
    }

    pub fn with_renderer(surface: S, renderer: OverlayRenderer, clock: FrameClock) -> Self {
        Self {
            clock,
            renderer,
            index: AnnotationIndex::default(),
            media: MediaGeometry::default(),
            surface,
            current_frame: None,
            last_report: RenderReport::skipped(),
        }
    }

    /// Replace the annotation source wholesale and redraw.
    pub fn on_batch(&mut self, index: AnnotationIndex) -> &RenderReport {
        self.index = index;
        self.redraw()
    }

    /// Index a raw JSON batch, replace the source, and redraw.
    pub fn on_batch_json(&mut self, entries: &[serde_json::Value]) -> BatchSummary {
        let (index, summary) = AnnotationIndex::from_batch(entries);
        self.on_batch(index);
        summary
    }

    /// Playback time moved. Returns the new report when the frame changed.
    pub fn on_time_update(&mut self, current_time: f64) -> Option<&RenderReport> {
        let frame = self.clock.to_frame_index(current_time);
        if self.current_frame == Some(frame) {
            return None;
        }
        self.current_frame = Some(frame);
        Some(self.redraw())
    }

    /// Native resolution became known.
    pub fn on_metadata(&mut self, native: SurfaceGeometry) -> &RenderReport {
        self.media.native = Some(native);
        self.redraw()
    }

    /// The media element's rendered size changed.
    pub fn on_resize(&mut self, displayed: SurfaceGeometry) -> &RenderReport {
        self.media.displayed = Some(displayed);
        self.redraw()
    }

    pub fn current_frame(&self) -> Option<FrameIndex> {
        self.current_frame
    }

    /// Violations for the active frame (the side channel).
    pub fn violations(&self) -> &[String] {
        &self.last_report.violations
    }

    pub fn last_report(&self) -> &RenderReport {
        &self.last_report
    }

    pub fn index(&self) -> &AnnotationIndex {
        &self.index
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Tear the session down, handing the surface back.
    pub fn into_surface(self) -> S {
        self.surface
    }

    fn redraw(&mut self) -> &RenderReport {
        let frame = self.current_frame.unwrap_or(0);
        self.last_report = self
            .renderer
            .render(frame, &self.index, &self.media, &mut self.surface);
        tracing::trace!(frame, status = ?self.last_report.status, "Overlay redrawn");
        &self.last_report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationRecord;
    use crate::overlay::RenderStatus;
    use crate::skeleton::{Joint, KeypointSet, NormalizedPoint};
    use crate::surface::DisplayList;
    use serde_json::json;

    fn session() -> PlaybackOverlay<DisplayList> {
        let mut s = PlaybackOverlay::new(DisplayList::new());
        s.on_metadata(SurfaceGeometry::new(100, 100));
        s
    }

    fn nose_at(frame: FrameIndex) -> AnnotationRecord {
        let kp: KeypointSet = [(Joint::Nose, NormalizedPoint::new(0.5, 0.5))]
            .into_iter()
            .collect();
        AnnotationRecord::new(frame)
            .with_keypoints(kp)
            .with_violations(["slouching"])
    }

    #[test]
    fn same_frame_does_not_redraw() {
        let mut s = session();
        s.on_batch(AnnotationIndex::build([nose_at(3)]));
        assert!(s.on_time_update(0.1).is_some());
        assert!(s.on_time_update(0.11).is_none());
        assert_eq!(s.current_frame(), Some(3));
        assert_eq!(s.violations(), ["slouching"]);
    }

    #[test]
    fn seek_back_redraws() {
        let mut s = session();
        s.on_batch(AnnotationIndex::build([nose_at(3)]));
        s.on_time_update(2.0);
        assert!(s.violations().is_empty());

        let report = s.on_time_update(0.1).unwrap();
        assert_eq!(report.status, RenderStatus::Drawn { points: 1, segments: 0 });
    }

    #[test]
    fn new_batch_replaces_old() {
        let mut s = session();
        s.on_batch(AnnotationIndex::build([nose_at(0)]));
        s.on_time_update(0.0);
        assert!(!s.surface().is_empty());

        s.on_batch(AnnotationIndex::build([nose_at(5)]));
        assert!(s.surface().is_empty());
        assert!(s.violations().is_empty());
    }

    #[test]
    fn resize_reprojects() {
        let mut s = PlaybackOverlay::with_renderer(
            DisplayList::new(),
            OverlayRenderer::recorded().with_sizing(crate::surface::SizingRule::DisplayedSize),
            FrameClock::default(),
        );
        s.on_batch(AnnotationIndex::build([nose_at(0)]));
        s.on_time_update(0.0);
        assert!(s.surface().is_empty());

        s.on_resize(SurfaceGeometry::new(200, 80));
        let center = s.surface().circles().next().unwrap().0;
        assert_eq!(center, crate::projector::PixelPoint::new(100.0, 40.0));
    }

    #[test]
    fn violations_follow_time_before_metadata() {
        let mut s = PlaybackOverlay::new(DisplayList::new());
        s.on_batch_json(&[json!({
            "frame": 10,
            "keypoints": {"NOSE": [0.5, 0.5]},
            "violations": ["slouching"],
        })]);

        let report = s.on_time_update(10.0 / 30.0 + 0.001).unwrap();
        assert_eq!(report.status, RenderStatus::Skipped);
        assert_eq!(s.violations(), ["slouching"]);
        assert!(s.surface().is_empty());

        s.on_metadata(SurfaceGeometry::new(100, 100));
        assert_eq!(s.violations(), ["slouching"]);
        assert_eq!(s.surface().circles().count(), 1);
    }

    #[test]
    fn detached_surface_still_reports_violations() {
        let mut list = DisplayList::new();
        list.detach();
        let mut s = PlaybackOverlay::new(list);
        s.on_metadata(SurfaceGeometry::new(100, 100));
        s.on_batch(AnnotationIndex::build([nose_at(0)]));
        s.on_time_update(0.0);

        assert_eq!(s.last_report().status, RenderStatus::Skipped);
        assert_eq!(s.violations(), ["slouching"]);

        s.on_time_update(1.0);
        assert!(s.violations().is_empty());
    }

    #[test]
    fn json_batch_reports_skips() {
        let mut s = session();
        let summary = s.on_batch_json(&[json!({"frame": 1}), json!({"keypoints": {}})]);
        assert_eq!(summary.indexed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(s.index().len(), 1);
    }
}
