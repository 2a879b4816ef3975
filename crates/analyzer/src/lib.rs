//! Client library for the pose analyzer service.
//!
//! Provides typed response messages, the HTTP API wrapper, and the
//! [`Analyzer`] seam the live loop calls through.

pub mod api;
pub mod messages;

pub use api::{Analyzer, AnalyzerApi, AnalyzerError, EncodedFrame};
pub use messages::{FeedbackEnvelope, FrameFeedback, VideoFeedback};
