use serde::Serialize;

/// Discrete frame index at the fixed sampling rate.
pub type FrameIndex = u64;

/// Straight (non-premultiplied) RGBA colour. Alpha is in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// Pack into 8-bit channels, alpha scaled to `0..=255`.
    pub fn to_rgba8(self) -> [u8; 4] {
        let alpha = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
        [self.r, self.g, self.b, alpha]
    }
}

pub mod palette {
    use super::Color;

    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    /// Bones on a recorded-video overlay.
    pub const RECORDED_BONE: Color = Color::rgba(255, 0, 0, 0.5);
    /// Bones on a live-analysis overlay.
    pub const LIVE_BONE: Color = Color::rgba(0, 255, 0, 0.7);
}
