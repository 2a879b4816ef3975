//! Normalized keypoints → pixel-space skeleton.
//!
//! Coordinates are projected against the geometry of the current render
//! and never cached in pixels, so a resize between renders just works.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::skeleton::{Bone, Joint, KeypointSet, BONE_TOPOLOGY};
use crate::surface::{Surface, SurfaceGeometry};
use crate::types::{palette, Color};

/// Absolute position on a surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A bone in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub from: PixelPoint,
    pub to: PixelPoint,
}

pub type ProjectedPoints = BTreeMap<Joint, PixelPoint>;

/// `px = x * width`, `py = y * height` for every present joint.
pub fn project(keypoints: &KeypointSet, surface: SurfaceGeometry) -> ProjectedPoints {
    let width = f64::from(surface.width);
    let height = f64::from(surface.height);
    keypoints
        .iter()
        .map(|(joint, p)| (joint, PixelPoint::new(p.x * width, p.y * height)))
        .collect()
}

/// Segments for every bone whose two endpoints were projected.
/// Bones with a missing endpoint are skipped.
pub fn edges(topology: &[Bone], points: &ProjectedPoints) -> Vec<Segment> {
    topology
        .iter()
        .filter_map(|(a, b)| {
            let from = *points.get(a)?;
            let to = *points.get(b)?;
            Some(Segment { from, to })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Styling
// ---------------------------------------------------------------------------

/// Point and bone appearance for one overlay mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkeletonStyle {
    pub point_radius: f64,
    pub point_color: Color,
    pub line_width: f64,
    pub line_color: Color,
}

impl SkeletonStyle {
    /// Overlay on a pre-recorded video.
    pub const RECORDED: Self = Self {
        point_radius: 4.0,
        point_color: palette::RED,
        line_width: 2.0,
        line_color: palette::RECORDED_BONE,
    };

    /// Overlay on a live feed.
    pub const LIVE: Self = Self {
        point_radius: 5.0,
        point_color: palette::RED,
        line_width: 2.0,
        line_color: palette::LIVE_BONE,
    };
}

/// What a skeleton draw produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawCounts {
    pub points: usize,
    pub segments: usize,
}

/// Projects keypoints onto a surface and draws them with a fixed topology.
#[derive(Debug, Clone, Copy)]
pub struct SkeletonProjector {
    topology: &'static [Bone],
    style: SkeletonStyle,
}

impl SkeletonProjector {
    /// A projector over [`BONE_TOPOLOGY`].
    pub fn new(style: SkeletonStyle) -> Self {
        Self::with_topology(BONE_TOPOLOGY, style)
    }

    pub fn with_topology(topology: &'static [Bone], style: SkeletonStyle) -> Self {
        Self { topology, style }
    }

    pub fn style(&self) -> &SkeletonStyle {
        &self.style
    }

    /// Draw points, then bones, onto an already-begun surface.
    pub fn draw<S: Surface + ?Sized>(
        &self,
        keypoints: &KeypointSet,
        geometry: SurfaceGeometry,
        surface: &mut S,
    ) -> DrawCounts {
        let points = project(keypoints, geometry);
        for point in points.values() {
            surface.fill_circle(*point, self.style.point_radius, self.style.point_color);
        }

        let segments = edges(self.topology, &points);
        for segment in &segments {
            surface.stroke_line(*segment, self.style.line_width, self.style.line_color);
        }

        DrawCounts {
            points: points.len(),
            segments: segments.len(),
        }
    }
}
