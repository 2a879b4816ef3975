//! `stance-worker` -- runnable front ends for the overlay engine.
//!
//! Two binaries share this library:
//!
//! - `stance-live` replays a directory of stills as a camera through the
//!   live capture loop and writes the final overlay.
//! - `stance-replay` renders a whole-video analysis frame by frame.

pub mod config;
pub mod replay;
pub mod source;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "stance_worker=info,stance_live=info,stance_core=warn";

/// Install the `fmt` subscriber with an env-driven filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
