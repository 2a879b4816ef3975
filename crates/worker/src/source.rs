//! A directory of still images standing in for a live camera.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use stance_live::{CaptureError, FrameSequence, MediaSource, MediaStream};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Loops over the images in a directory, in file-name order.
pub struct FrameDirectorySource {
    dir: PathBuf,
}

impl FrameDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn image_paths(&self) -> Result<Vec<PathBuf>, CaptureError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            CaptureError::Unavailable(format!("cannot read {}: {e}", self.dir.display()))
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            })
            .collect();
        paths.sort();
        Ok(paths)
    }
}

#[async_trait]
impl MediaSource for FrameDirectorySource {
    async fn open(&self) -> Result<Box<dyn MediaStream>, CaptureError> {
        let paths = self.image_paths()?;

        let mut frames = Vec::with_capacity(paths.len());
        for path in &paths {
            match image::open(path) {
                Ok(img) => frames.push(img.to_rgba8()),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable frame");
                }
            }
        }

        tracing::info!(dir = %self.dir.display(), frames = frames.len(), "Frame directory opened");
        Ok(Box::new(FrameSequence::new(frames)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use image::{Rgba, RgbaImage};
    use stance_core::SurfaceGeometry;

    #[tokio::test]
    async fn opens_images_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(4, 2, Rgba([2, 0, 0, 255]))
            .save(dir.path().join("b.png"))
            .unwrap();
        RgbaImage::from_pixel(4, 2, Rgba([1, 0, 0, 255]))
            .save(dir.path().join("a.png"))
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let source = FrameDirectorySource::new(dir.path());
        let mut stream = source.open().await.unwrap();
        assert_eq!(stream.geometry(), Some(SurfaceGeometry::new(4, 2)));
        assert_eq!(stream.snapshot().unwrap().get_pixel(0, 0).0[0], 1);
        assert_eq!(stream.snapshot().unwrap().get_pixel(0, 0).0[0], 2);
    }

    #[tokio::test]
    async fn empty_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = FrameDirectorySource::new(dir.path());
        assert_matches!(source.open().await.err(), Some(CaptureError::Unavailable(_)));
    }

    #[tokio::test]
    async fn missing_directory_is_unavailable() {
        let source = FrameDirectorySource::new("/definitely/not/here");
        assert_matches!(source.open().await.err(), Some(CaptureError::Unavailable(_)));
    }
}
