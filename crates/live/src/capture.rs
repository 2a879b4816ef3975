//! Capture devices and still-frame encoding.
//!
//! A [`MediaSource`] opens a [`MediaStream`], which the live loop owns
//! exclusively until teardown releases it.

use std::io::Cursor;

use async_trait::async_trait;
use image::{ImageFormat, RgbaImage};
use stance_analyzer::EncodedFrame;
use stance_core::SurfaceGeometry;

use crate::error::{CaptureError, LiveError};

/// A capture device that can be opened once per live session.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn open(&self) -> Result<Box<dyn MediaStream>, CaptureError>;
}

/// An open capture stream.
pub trait MediaStream: Send {
    /// Grab the current frame.
    fn snapshot(&mut self) -> Result<RgbaImage, CaptureError>;

    /// Native resolution of the stream, once known.
    fn geometry(&self) -> Option<SurfaceGeometry>;

    /// Stop the stream's tracks. Must be idempotent.
    fn release(&mut self);
}

/// Encode a still frame as PNG for upload.
pub fn encode_png(frame: &RgbaImage) -> Result<EncodedFrame, LiveError> {
    let mut bytes = Vec::new();
    frame.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(EncodedFrame {
        bytes,
        mime: "image/png",
        width: frame.width(),
        height: frame.height(),
    })
}

// ---------------------------------------------------------------------------
// FrameSequence
// ---------------------------------------------------------------------------

/// A stream that cycles through preloaded frames.
///
/// Stands in for a camera when replaying captured stills.
pub struct FrameSequence {
    frames: Vec<RgbaImage>,
    next: usize,
    released: bool,
}

impl FrameSequence {
    pub fn new(frames: Vec<RgbaImage>) -> Result<Self, CaptureError> {
        if frames.is_empty() {
            return Err(CaptureError::Unavailable("no frames to play".into()));
        }
        Ok(Self {
            frames,
            next: 0,
            released: false,
        })
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl MediaStream for FrameSequence {
    fn snapshot(&mut self) -> Result<RgbaImage, CaptureError> {
        if self.released {
            return Err(CaptureError::Snapshot("stream released".into()));
        }
        let frame = self.frames[self.next].clone();
        self.next = (self.next + 1) % self.frames.len();
        Ok(frame)
    }

    fn geometry(&self) -> Option<SurfaceGeometry> {
        let frame = self.frames.get(self.next)?;
        Some(SurfaceGeometry::new(frame.width(), frame.height()))
    }

    fn release(&mut self) {
        if !self.released {
            tracing::debug!(frames = self.frames.len(), "Frame sequence released");
        }
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn solid(w: u32, h: u32, v: u8) -> RgbaImage {
        RgbaImage::from_pixel(w, h, image::Rgba([v, v, v, 255]))
    }

    #[test]
    fn encodes_png_with_dimensions() {
        let frame = encode_png(&solid(6, 4, 10)).unwrap();
        assert_eq!(frame.mime, "image/png");
        assert_eq!((frame.width, frame.height), (6, 4));
        assert_eq!(&frame.bytes[1..4], b"PNG");

        let decoded = image::load_from_memory(&frame.bytes).unwrap();
        assert_eq!(decoded.width(), 6);
    }

    #[test]
    fn sequence_cycles_frames() {
        let mut seq = FrameSequence::new(vec![solid(2, 2, 1), solid(2, 2, 2)]).unwrap();
        assert_eq!(seq.snapshot().unwrap().get_pixel(0, 0).0[0], 1);
        assert_eq!(seq.snapshot().unwrap().get_pixel(0, 0).0[0], 2);
        assert_eq!(seq.snapshot().unwrap().get_pixel(0, 0).0[0], 1);
        assert_eq!(seq.geometry(), Some(SurfaceGeometry::new(2, 2)));
    }

    #[test]
    fn released_sequence_refuses_snapshots() {
        let mut seq = FrameSequence::new(vec![solid(2, 2, 1)]).unwrap();
        seq.release();
        seq.release();
        assert!(seq.is_released());
        assert_matches!(seq.snapshot(), Err(CaptureError::Snapshot(_)));
    }

    #[test]
    fn empty_sequence_is_unavailable() {
        assert_matches!(
            FrameSequence::new(Vec::new()).err(),
            Some(CaptureError::Unavailable(_))
        );
    }
}
