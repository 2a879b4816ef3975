//! RGBA raster surface backed by an [`image::RgbaImage`].
//!
//! Points and bones are rasterized with `imageproc`. Pixels are written,
//! not blended, so the buffer is a transparent layer ready to be composited
//! over a video frame. Text is kept as [`Caption`]s because glyph
//! rasterization needs a font the overlay does not ship.

use std::path::Path;

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::error::CoreError;
use crate::projector::{PixelPoint, Segment};
use crate::surface::{Surface, SurfaceGeometry};
use crate::types::Color;

/// Minimum segment length (pixels) worth rasterizing.
const MIN_SEGMENT_LEN: f64 = 0.001;

/// A text draw that was not rasterized.
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub text: String,
    pub origin: PixelPoint,
    pub size_px: f64,
    pub color: Color,
}

/// A transparent RGBA overlay layer.
#[derive(Debug, Clone)]
pub struct ImageSurface {
    image: RgbaImage,
    captions: Vec<Caption>,
}

impl Default for ImageSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageSurface {
    /// An empty 0×0 surface; the first `begin` sizes it.
    pub fn new() -> Self {
        Self {
            image: RgbaImage::new(0, 0),
            captions: Vec::new(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn captions(&self) -> &[Caption] {
        &self.captions
    }

    /// Write the layer as a PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), CoreError> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(CoreError::from)
    }

    /// Alpha-composite the layer over `frame`, anchored at the top-left.
    pub fn composite_onto(&self, frame: &mut RgbaImage) {
        image::imageops::overlay(frame, &self.image, 0, 0);
    }
}

fn to_pixel(color: Color) -> Rgba<u8> {
    Rgba(color.to_rgba8())
}

impl Surface for ImageSurface {
    fn begin(&mut self, geometry: SurfaceGeometry) -> Result<(), CoreError> {
        if !geometry.is_drawable() {
            return Err(CoreError::SurfaceUnavailable(format!(
                "cannot raster a {}x{} surface",
                geometry.width, geometry.height
            )));
        }
        if self.image.dimensions() == (geometry.width, geometry.height) {
            self.clear();
        } else {
            self.image = RgbaImage::new(geometry.width, geometry.height);
            self.captions.clear();
        }
        Ok(())
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
        self.captions.clear();
    }

    fn geometry(&self) -> SurfaceGeometry {
        let (width, height) = self.image.dimensions();
        SurfaceGeometry::new(width, height)
    }

    fn fill_circle(&mut self, center: PixelPoint, radius: f64, color: Color) {
        draw_filled_circle_mut(
            &mut self.image,
            (center.x.round() as i32, center.y.round() as i32),
            radius.round() as i32,
            to_pixel(color),
        );
    }

    fn stroke_line(&mut self, segment: Segment, width: f64, color: Color) {
        let dx = segment.to.x - segment.from.x;
        let dy = segment.to.y - segment.from.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len < MIN_SEGMENT_LEN {
            return;
        }

        // Thick line as parallel one-pixel strokes along the normal.
        let (nx, ny) = (-dy / len, dx / len);
        let strokes = width.ceil().max(1.0) as i32;
        let pixel = to_pixel(color);
        for i in 0..strokes {
            let offset = f64::from(i) - f64::from(strokes - 1) / 2.0;
            let (ox, oy) = (nx * offset, ny * offset);
            draw_line_segment_mut(
                &mut self.image,
                ((segment.from.x + ox) as f32, (segment.from.y + oy) as f32),
                ((segment.to.x + ox) as f32, (segment.to.y + oy) as f32),
                pixel,
            );
        }
    }

    fn fill_text(&mut self, text: &str, origin: PixelPoint, size_px: f64, color: Color) {
        self.captions.push(Caption {
            text: text.to_string(),
            origin,
            size_px,
            color,
        });
    }
}
