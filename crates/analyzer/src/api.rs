//! HTTP client for the analyzer service.
//!
//! Wraps the two analyzer endpoints (single-frame and whole-video
//! analysis) using [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;

use crate::messages::{FeedbackEnvelope, FrameFeedback, VideoFeedback};

/// Multipart field name `/analyze_frame` reads the image from.
const FRAME_FIELD: &str = "frame";

/// Errors from the analyzer API layer.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The analyzer returned a non-2xx status code.
    #[error("Analyzer API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The analyzer answered but reported that it could not analyze.
    #[error("Analysis failed: {0}")]
    Analysis(String),
}

/// An encoded still image ready for upload.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
}

impl EncodedFrame {
    /// Upload filename matching the mime type.
    pub fn file_name(&self) -> &'static str {
        match self.mime {
            "image/jpeg" => "frame.jpg",
            _ => "frame.png",
        }
    }
}

/// Single-frame pose analysis.
///
/// The live loop only depends on this seam, so tests can substitute a
/// scripted analyzer for the HTTP client.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze_frame(&self, frame: EncodedFrame) -> Result<FrameFeedback, AnalyzerError>;
}

/// HTTP client for a single analyzer instance.
#[derive(Clone)]
pub struct AnalyzerApi {
    client: reqwest::Client,
    api_url: String,
}

impl AnalyzerApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://localhost:8000`.
    /// * `timeout` - Per-request timeout.
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, AnalyzerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_url))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Analyze one still image.
    ///
    /// Sends a `POST /analyze_frame` multipart request with the image in
    /// the `frame` field.
    pub async fn analyze_frame(&self, frame: EncodedFrame) -> Result<FrameFeedback, AnalyzerError> {
        let size = frame.bytes.len();
        let file_name = frame.file_name();
        let part = multipart::Part::bytes(frame.bytes)
            .file_name(file_name)
            .mime_str(frame.mime)?;
        let form = multipart::Form::new().part(FRAME_FIELD, part);

        tracing::debug!(
            bytes = size,
            width = frame.width,
            height = frame.height,
            "Submitting frame",
        );

        let response = self
            .client
            .post(format!("{}/analyze_frame", self.api_url))
            .multipart(form)
            .send()
            .await?;

        let envelope: FeedbackEnvelope<FrameFeedback> = Self::parse_response(response).await?;
        Ok(envelope.feedback)
    }

    /// Analyze a previously uploaded video.
    ///
    /// Sends a `POST /analyze` request with `{"filename": ...}`. Returns
    /// the sparse per-frame violation batch.
    pub async fn analyze_video(&self, filename: &str) -> Result<VideoFeedback, AnalyzerError> {
        let body = serde_json::json!({ "filename": filename });

        let response = self
            .client
            .post(format!("{}/analyze", self.api_url))
            .json(&body)
            .send()
            .await?;

        let envelope: FeedbackEnvelope<VideoFeedback> = Self::parse_response(response).await?;
        if let Some(error) = envelope.feedback.error {
            return Err(AnalyzerError::Analysis(error));
        }
        Ok(envelope.feedback)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, or return an
    /// [`AnalyzerError::Api`] carrying the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, AnalyzerError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(AnalyzerError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AnalyzerError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl Analyzer for AnalyzerApi {
    async fn analyze_frame(&self, frame: EncodedFrame) -> Result<FrameFeedback, AnalyzerError> {
        AnalyzerApi::analyze_frame(self, frame).await
    }
}
