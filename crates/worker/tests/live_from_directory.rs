//! The live loop fed from a frame directory, rendering to a raster layer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use stance_analyzer::{Analyzer, AnalyzerError, EncodedFrame, FrameFeedback};
use stance_core::raster::ImageSurface;
use stance_core::{Joint, NormalizedPoint, Surface, SurfaceGeometry};
use stance_events::EventBus;
use stance_live::{CaptureAnalyzeLoop, LoopConfig};
use stance_worker::source::FrameDirectorySource;

/// Puts the nose wherever the frame's red channel says, in tenths.
struct RedChannelAnalyzer;

#[async_trait]
impl Analyzer for RedChannelAnalyzer {
    async fn analyze_frame(&self, frame: EncodedFrame) -> Result<FrameFeedback, AnalyzerError> {
        let decoded = image::load_from_memory(&frame.bytes)
            .map_err(|e| AnalyzerError::Analysis(e.to_string()))?
            .to_rgba8();
        let x = f64::from(decoded.get_pixel(0, 0).0[0]) / 10.0;
        Ok(FrameFeedback {
            violations: vec![format!("nose at {x}")],
            keypoints: [(Joint::Nose, NormalizedPoint::new(x, 0.5))]
                .into_iter()
                .collect(),
        })
    }
}

#[tokio::test(start_paused = true)]
async fn overlay_follows_the_latest_frame() {
    let dir = tempfile::tempdir().unwrap();
    RgbaImage::from_pixel(40, 20, Rgba([2, 0, 0, 255]))
        .save(dir.path().join("000.png"))
        .unwrap();
    RgbaImage::from_pixel(40, 20, Rgba([7, 0, 0, 255]))
        .save(dir.path().join("001.png"))
        .unwrap();

    let source = FrameDirectorySource::new(dir.path());
    let session = CaptureAnalyzeLoop::new(Arc::new(RedChannelAnalyzer), Arc::new(EventBus::default()))
        .with_config(LoopConfig {
            interval: Duration::from_millis(100),
            max_in_flight: 2,
        })
        .start(&source, ImageSurface::new())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;

    assert_eq!(session.last_applied_seq().await, 2);
    let current = session.current_annotation().await.unwrap();
    assert_eq!(current.violations, vec!["nose at 0.7"]);

    let (geometry, nose, left_edge, captions) = session
        .with_surface(|s| {
            (
                s.geometry(),
                s.image().get_pixel(28, 10).0,
                s.image().get_pixel(8, 10).0,
                s.captions().len(),
            )
        })
        .await;
    assert_eq!(geometry, SurfaceGeometry::new(40, 20));
    assert_eq!(nose, [255, 0, 0, 255]);
    assert_eq!(left_edge[3], 0);
    assert_eq!(captions, 1);

    session.shutdown().await;
}
