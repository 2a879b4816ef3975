//! Integration tests for [`AnalyzerApi`] against an in-process stub server.

use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::{Json, Multipart};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};
use stance_analyzer::{AnalyzerApi, AnalyzerError, EncodedFrame};
use stance_core::Joint;

/// Serve `app` on an ephemeral port and return its base URL.
async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn png_frame() -> EncodedFrame {
    EncodedFrame {
        bytes: vec![0x89, b'P', b'N', b'G', 1, 2, 3],
        mime: "image/png",
        width: 4,
        height: 3,
    }
}

/// Echoes what it received as violations so the test can inspect the upload.
async fn echo_frame(mut multipart: Multipart) -> Json<Value> {
    let field = multipart.next_field().await.unwrap().unwrap();
    let name = field.name().unwrap_or_default().to_string();
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().unwrap_or_default().to_string();
    let len = field.bytes().await.unwrap().len();

    Json(json!({
        "feedback": {
            "violations": [name, file_name, content_type, len.to_string()],
            "keypoints": {"NOSE": [0.5, 0.5], "NOT_A_JOINT": [0.1, 0.1]}
        }
    }))
}

async fn analyze_video(Json(body): Json<Value>) -> Json<Value> {
    if body["filename"] == "missing.mp4" {
        return Json(json!({"feedback": {"error": "Could not open video"}}));
    }
    Json(json!({
        "feedback": {
            "total_frames": 90,
            "violations": [
                {"frame": 12, "violations": ["Knee is ahead of ankle"], "keypoints": {"LEFT_KNEE": [0.4, 0.7]}}
            ]
        }
    }))
}

fn stub_app() -> Router {
    Router::new()
        .route("/analyze_frame", post(echo_frame))
        .route("/analyze", post(analyze_video))
}

#[tokio::test]
async fn analyze_frame_uploads_png_part() {
    let url = spawn_stub(stub_app()).await;
    let api = AnalyzerApi::new(url, Duration::from_secs(5)).unwrap();

    let feedback = api.analyze_frame(png_frame()).await.unwrap();

    assert_eq!(feedback.violations, vec!["frame", "frame.png", "image/png", "7"]);
    assert_eq!(feedback.keypoints.len(), 1);
    assert!(feedback.keypoints.contains(Joint::Nose));
}

#[tokio::test]
async fn analyze_video_returns_sparse_batch() {
    let url = spawn_stub(stub_app()).await;
    let api = AnalyzerApi::new(format!("{url}/"), Duration::from_secs(5)).unwrap();

    let feedback = api.analyze_video("clip.mp4").await.unwrap();
    assert_eq!(feedback.total_frames, Some(90));

    let (index, summary) = feedback.to_index();
    assert_eq!(summary.indexed, 1);
    assert_eq!(index.lookup(12).unwrap().violations, vec!["Knee is ahead of ankle"]);
}

#[tokio::test]
async fn analyze_video_error_payload_is_an_error() {
    let url = spawn_stub(stub_app()).await;
    let api = AnalyzerApi::new(url, Duration::from_secs(5)).unwrap();

    let result = api.analyze_video("missing.mp4").await;
    assert_matches!(result, Err(AnalyzerError::Analysis(msg)) if msg == "Could not open video");
}

#[tokio::test]
async fn non_success_status_surfaces_body() {
    let app = Router::new().route(
        "/analyze_frame",
        post(|| async { (StatusCode::BAD_REQUEST, "Unsupported file type") }),
    );
    let url = spawn_stub(app).await;
    let api = AnalyzerApi::new(url, Duration::from_secs(5)).unwrap();

    let result = api.analyze_frame(png_frame()).await;
    assert_matches!(
        result,
        Err(AnalyzerError::Api { status: 400, body }) if body == "Unsupported file type"
    );
}

#[tokio::test]
async fn unreachable_analyzer_is_a_request_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = AnalyzerApi::new(format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let result = api.analyze_frame(png_frame()).await;
    assert_matches!(result, Err(AnalyzerError::Request(_)));
}
