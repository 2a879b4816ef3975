//! Overlay status and violation channel.
//!
//! - [`EventBus`] is the in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`OverlayEvent`] is a timestamped status, violation, or session event.

pub mod bus;

pub use bus::{EventBus, EventKind, OverlayEvent, StatusLevel};
