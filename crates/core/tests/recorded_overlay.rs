//! End-to-end tests for the recorded-video overlay path.
//!
//! Drives a [`PlaybackOverlay`] the way a video element would: metadata,
//! an analysis batch, then time updates.

use serde_json::json;
use stance_core::projector::PixelPoint;
use stance_core::raster::ImageSurface;
use stance_core::{
    to_frame_index, DisplayList, PlaybackOverlay, RenderStatus, Surface, SurfaceGeometry,
};

// ---------------------------------------------------------------------------
// Test: a single annotated frame shows at its instant only
// ---------------------------------------------------------------------------

#[test]
fn annotated_frame_shows_point_and_violation() {
    let batch = vec![json!({
        "frame": 10,
        "keypoints": {"NOSE": [0.5, 0.5]},
        "violations": ["slouching"]
    })];

    let mut session = PlaybackOverlay::new(DisplayList::new());
    session.on_metadata(SurfaceGeometry::new(640, 480));
    session.on_batch_json(&batch);

    assert_eq!(to_frame_index(10.0 / 30.0), 10);
    let report = session.on_time_update(10.0 / 30.0).expect("frame changed");
    assert_eq!(report.status, RenderStatus::Drawn { points: 1, segments: 0 });

    let circles: Vec<_> = session.surface().circles().collect();
    assert_eq!(circles.len(), 1);
    assert_eq!(circles[0].0, PixelPoint::new(320.0, 240.0));
    assert_eq!(session.violations(), ["slouching"]);

    session.on_time_update(11.0 / 30.0 + 0.001);
    assert_eq!(session.current_frame(), Some(11));
    assert!(session.surface().is_empty());
    assert!(session.violations().is_empty());
}

// ---------------------------------------------------------------------------
// Test: out-of-order batch with duplicates
// ---------------------------------------------------------------------------

#[test]
fn out_of_order_batch_resolves_last_duplicate() {
    let batch = vec![
        json!({"frame": 90, "violations": ["late"], "keypoints": {"LEFT_HIP": [0.1, 0.2]}}),
        json!({"frame": 3, "violations": ["early"]}),
        json!({"frame": 90, "violations": ["later"], "keypoints": {"LEFT_HIP": [0.3, 0.4]}}),
        json!({"violations": ["orphan"]}),
    ];

    let mut session = PlaybackOverlay::new(DisplayList::new());
    session.on_metadata(SurfaceGeometry::new(100, 100));
    let summary = session.on_batch_json(&batch);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.overwritten, 1);

    session.on_time_update(3.0);
    assert_eq!(session.violations(), ["later"]);
    let (center, _) = session.surface().circles().next().unwrap();
    assert!((center.x - 30.0).abs() < 1e-9);
    assert!((center.y - 40.0).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// Test: the raster surface produces a composited frame
// ---------------------------------------------------------------------------

#[test]
fn raster_overlay_composites_over_frame() {
    let batch = vec![json!({
        "frame": 0,
        "keypoints": {"LEFT_SHOULDER": [0.25, 0.5], "RIGHT_SHOULDER": [0.75, 0.5]},
        "violations": []
    })];

    let mut session = PlaybackOverlay::new(ImageSurface::new());
    session.on_metadata(SurfaceGeometry::new(64, 32));
    session.on_batch_json(&batch);
    session.on_time_update(0.0);

    let surface = session.into_surface();
    assert_eq!(surface.geometry(), SurfaceGeometry::new(64, 32));

    let mut frame = image::RgbaImage::from_pixel(64, 32, image::Rgba([0, 0, 255, 255]));
    surface.composite_onto(&mut frame);
    assert_eq!(frame.get_pixel(16, 13).0, [255, 0, 0, 255]);
    assert_eq!(frame.get_pixel(0, 0).0, [0, 0, 255, 255]);
}
