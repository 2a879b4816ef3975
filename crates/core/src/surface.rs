//! Drawing surfaces and their geometry.
//!
//! A [`Surface`] is the overlay target composited above a media element.
//! Its size is not fixed: every render resolves a [`SurfaceGeometry`] from
//! the current [`MediaGeometry`] and a [`SizingRule`], then calls
//! [`Surface::begin`] to size and clear it before drawing.
//!
//! [`DisplayList`] records draw commands instead of pixels. It is what the
//! tests inspect, and what a host UI can replay onto its own canvas.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::projector::{PixelPoint, Segment};
use crate::types::Color;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Pixel size of a drawing surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceGeometry {
    pub width: u32,
    pub height: u32,
}

impl SurfaceGeometry {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both dimensions are non-zero.
    pub fn is_drawable(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn center(&self) -> PixelPoint {
        PixelPoint::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

/// Which media dimension the overlay surface should track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingRule {
    /// The source's native resolution (known after the metadata event).
    #[default]
    NativeResolution,
    /// The element's rendered size, for CSS-relative alignment.
    DisplayedSize,
}

impl SizingRule {
    /// Parse `"native"` / `"displayed"` (config values).
    pub fn from_name(s: &str) -> Result<Self, CoreError> {
        match s {
            "native" | "native_resolution" => Ok(Self::NativeResolution),
            "displayed" | "displayed_size" => Ok(Self::DisplayedSize),
            _ => Err(CoreError::Validation(format!(
                "Invalid sizing rule '{s}'. Must be one of: native, displayed"
            ))),
        }
    }
}

/// Latest known dimensions of the media element under the overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaGeometry {
    /// Native resolution, from the metadata event.
    pub native: Option<SurfaceGeometry>,
    /// Rendered size, from resize events.
    pub displayed: Option<SurfaceGeometry>,
}

impl MediaGeometry {
    pub fn native(geometry: SurfaceGeometry) -> Self {
        Self {
            native: Some(geometry),
            displayed: None,
        }
    }

    /// Surface size under `rule`, or `None` when that dimension is not
    /// yet known or is zero.
    pub fn resolve(&self, rule: SizingRule) -> Option<SurfaceGeometry> {
        let candidate = match rule {
            SizingRule::NativeResolution => self.native,
            SizingRule::DisplayedSize => self.displayed,
        };
        candidate.filter(SurfaceGeometry::is_drawable)
    }
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// A drawable overlay target.
pub trait Surface {
    /// Acquire the drawing context at `geometry`, resizing if needed, and
    /// clear every pixel. Fails when the target is gone.
    fn begin(&mut self, geometry: SurfaceGeometry) -> Result<(), CoreError>;

    /// Clear every pixel at the current size.
    fn clear(&mut self);

    fn geometry(&self) -> SurfaceGeometry;

    fn fill_circle(&mut self, center: PixelPoint, radius: f64, color: Color);

    fn stroke_line(&mut self, segment: Segment, width: f64, color: Color);

    /// Draw `text` with its baseline starting at `origin`.
    fn fill_text(&mut self, text: &str, origin: PixelPoint, size_px: f64, color: Color);
}

// ---------------------------------------------------------------------------
// DisplayList
// ---------------------------------------------------------------------------

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Circle {
        center: PixelPoint,
        radius: f64,
        color: Color,
    },
    Line {
        segment: Segment,
        width: f64,
        color: Color,
    },
    Text {
        text: String,
        origin: PixelPoint,
        size_px: f64,
        color: Color,
    },
}

/// A surface that records draw commands in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayList {
    geometry: SurfaceGeometry,
    commands: Vec<DrawCommand>,
    #[serde(skip)]
    detached: bool,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Simulate the host target going away: later `begin` calls fail.
    pub fn detach(&mut self) {
        self.detached = true;
    }

    pub fn circles(&self) -> impl Iterator<Item = (PixelPoint, f64)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Circle { center, radius, .. } => Some((*center, *radius)),
            _ => None,
        })
    }

    pub fn lines(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Line { segment, .. } => Some(segment),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Surface for DisplayList {
    fn begin(&mut self, geometry: SurfaceGeometry) -> Result<(), CoreError> {
        if self.detached {
            return Err(CoreError::SurfaceUnavailable(
                "display list is detached".to_string(),
            ));
        }
        self.geometry = geometry;
        self.commands.clear();
        Ok(())
    }

    fn clear(&mut self) {
        self.commands.clear();
    }

    fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    fn fill_circle(&mut self, center: PixelPoint, radius: f64, color: Color) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn stroke_line(&mut self, segment: Segment, width: f64, color: Color) {
        self.commands.push(DrawCommand::Line {
            segment,
            width,
            color,
        });
    }

    fn fill_text(&mut self, text: &str, origin: PixelPoint, size_px: f64, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            origin,
            size_px,
            color,
        });
    }
}
