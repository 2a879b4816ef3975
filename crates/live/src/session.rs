//! The live capture → analyze → render loop.
//!
//! A fixed-interval timer starts one cycle per tick. Each cycle snapshots
//! the stream, encodes the still, and sends it to the analyzer without
//! blocking the timer, so several requests may be in flight at once (up
//! to [`LoopConfig::max_in_flight`]). Responses can arrive in any order.
//! Every capture takes the next sequence number, and a response is only
//! applied when its number is greater than the last applied one.
//!
//! All state lives behind one mutex. Teardown cancels the timer and every
//! in-flight cycle, releases the stream, and from then on no response can
//! touch the overlay.

use std::sync::Arc;
use std::time::Duration;

use stance_analyzer::{Analyzer, FrameFeedback};
use stance_core::{
    AnnotationRecord, MediaGeometry, OverlayRenderer, RenderReport, Surface, SurfaceGeometry,
};
use stance_events::bus::{
    EventKind, OverlayEvent, StatusLevel, STATUS_ANALYZING, STATUS_CAPTURE_UNAVAILABLE,
    STATUS_FAILED, STATUS_UPDATED,
};
use stance_events::EventBus;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use crate::capture::{encode_png, MediaSource, MediaStream};
use crate::error::LiveError;

/// Default time between capture cycles.
pub const DEFAULT_CAPTURE_INTERVAL: Duration = Duration::from_millis(1000);

/// Default cap on concurrent analyzer requests.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// How long teardown waits for the timer and in-flight cycles to wind down.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    /// Time between capture cycles. The first capture happens one interval
    /// after start.
    pub interval: Duration,
    /// Ticks that find this many requests outstanding are skipped.
    pub max_in_flight: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_CAPTURE_INTERVAL,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle outcome
// ---------------------------------------------------------------------------

/// How one capture cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The response now drives the overlay.
    Applied { seq: u64 },
    /// A newer response was already applied; this one was dropped.
    Superseded { seq: u64 },
    /// Capture or analysis failed; the overlay was left as it was.
    Failed { seq: u64 },
    /// The session was torn down before the cycle finished.
    Cancelled,
}

/// Lifecycle of a [`LiveSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Running,
    Stopped,
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

struct LiveState<S> {
    stream: Option<Box<dyn MediaStream>>,
    surface: S,
    media: MediaGeometry,
    current: Option<AnnotationRecord>,
    next_seq: u64,
    last_applied: u64,
    last_report: RenderReport,
    state: CaptureState,
}

impl<S: Surface> LiveState<S> {
    fn redraw(&mut self, renderer: &OverlayRenderer) {
        self.last_report =
            renderer.render_record(self.current.as_ref(), &self.media, &mut self.surface);
    }
}

impl<S> LiveState<S> {
    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
        }
        self.state = CaptureState::Stopped;
    }
}

impl<S> Drop for LiveState<S> {
    // Last owner gone: covers a session dropped while a cycle held the lock.
    fn drop(&mut self) {
        self.release_stream();
    }
}

struct Shared<S> {
    state: Mutex<LiveState<S>>,
    renderer: OverlayRenderer,
    analyzer: Arc<dyn Analyzer>,
    events: Arc<EventBus>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl<S: Surface + Send + 'static> Shared<S> {
    /// One cycle: capture, analyze, apply.
    async fn run_cycle(&self) -> CycleOutcome {
        // Capturing
        let (seq, frame) = {
            let mut state = self.state.lock().await;
            if self.cancel.is_cancelled() {
                return CycleOutcome::Cancelled;
            }
            let Some(stream) = state.stream.as_mut() else {
                return CycleOutcome::Cancelled;
            };
            let snapshot = stream.snapshot();
            state.next_seq += 1;
            let seq = state.next_seq;
            match snapshot {
                Ok(frame) => (seq, frame),
                Err(e) => {
                    tracing::warn!(seq, error = %e, "Snapshot failed");
                    self.events.publish_status(StatusLevel::Error, STATUS_FAILED);
                    return CycleOutcome::Failed { seq };
                }
            }
        };

        let encoded = match encode_png(&frame) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(seq, error = %e, "Could not encode frame");
                self.events.publish_status(StatusLevel::Error, STATUS_FAILED);
                return CycleOutcome::Failed { seq };
            }
        };
        drop(frame);

        // AwaitingResponse
        self.events.publish_status(StatusLevel::Info, STATUS_ANALYZING);
        tracing::debug!(seq, bytes = encoded.bytes.len(), "Frame submitted for analysis");

        let result = tokio::select! {
            _ = self.cancel.cancelled() => return CycleOutcome::Cancelled,
            result = self.analyzer.analyze_frame(encoded) => result,
        };

        match result {
            Ok(feedback) => self.apply(seq, feedback).await,
            Err(e) => {
                if self.cancel.is_cancelled() {
                    return CycleOutcome::Cancelled;
                }
                let e = LiveError::from(e);
                tracing::warn!(seq, error = %e, "Frame analysis failed");
                self.events.publish_status(StatusLevel::Error, STATUS_FAILED);
                CycleOutcome::Failed { seq }
            }
        }
    }

    /// Apply a response if it is the newest one seen so far.
    async fn apply(&self, seq: u64, feedback: FrameFeedback) -> CycleOutcome {
        let mut state = self.state.lock().await;
        if self.cancel.is_cancelled() {
            return CycleOutcome::Cancelled;
        }
        if seq <= state.last_applied {
            tracing::debug!(seq, last_applied = state.last_applied, "Discarding stale response");
            return CycleOutcome::Superseded { seq };
        }

        state.last_applied = seq;
        let record = feedback.into_record(seq);
        let violations = record.violations.clone();
        state.current = Some(record);
        state.redraw(&self.renderer);

        tracing::debug!(seq, status = ?state.last_report.status, "Live overlay updated");
        self.events.publish(OverlayEvent::live_violations(seq, violations));
        self.events.publish_status(StatusLevel::Success, STATUS_UPDATED);
        CycleOutcome::Applied { seq }
    }
}

/// Drive ticks until cancelled, spawning one tracked cycle per tick.
async fn run_timer<S: Surface + Send + 'static>(
    shared: Arc<Shared<S>>,
    interval: Duration,
    tracker: TaskTracker,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shared.cancel.cancelled() => {
                tracing::debug!("Capture timer stopping");
                break;
            }
            _ = ticker.tick() => {
                let Ok(permit) = Arc::clone(&shared.permits).try_acquire_owned() else {
                    tracing::debug!("Too many analyses in flight; skipping tick");
                    continue;
                };
                let shared = Arc::clone(&shared);
                tracker.spawn(async move {
                    let _permit = permit;
                    let outcome = shared.run_cycle().await;
                    tracing::trace!(?outcome, "Capture cycle finished");
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureAnalyzeLoop
// ---------------------------------------------------------------------------

/// Builder for live sessions.
#[derive(Clone)]
pub struct CaptureAnalyzeLoop {
    analyzer: Arc<dyn Analyzer>,
    events: Arc<EventBus>,
    config: LoopConfig,
    renderer: OverlayRenderer,
    displayed: Option<SurfaceGeometry>,
}

impl CaptureAnalyzeLoop {
    pub fn new(analyzer: Arc<dyn Analyzer>, events: Arc<EventBus>) -> Self {
        Self {
            analyzer,
            events,
            config: LoopConfig::default(),
            renderer: OverlayRenderer::live(),
            displayed: None,
        }
    }

    pub fn with_config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_renderer(mut self, renderer: OverlayRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Rendered size of the live view at start. Required for
    /// [`stance_core::SizingRule::DisplayedSize`] until the first
    /// [`LiveSession::on_resize`].
    pub fn with_display_size(mut self, displayed: Option<SurfaceGeometry>) -> Self {
        self.displayed = displayed;
        self
    }

    pub fn config(&self) -> LoopConfig {
        self.config
    }

    /// Open the capture device and start ticking.
    ///
    /// A device that cannot be opened ends live mode: the failure is
    /// published and returned, and nothing is retried.
    pub async fn start<S>(
        &self,
        source: &dyn MediaSource,
        surface: S,
    ) -> Result<LiveSession<S>, LiveError>
    where
        S: Surface + Send + 'static,
    {
        let stream = match source.open().await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(error = %e, "Could not open capture device");
                self.events
                    .publish_status(StatusLevel::Error, STATUS_CAPTURE_UNAVAILABLE);
                return Err(LiveError::CaptureUnavailable(e.to_string()));
            }
        };

        let media = MediaGeometry {
            native: stream.geometry(),
            displayed: self.displayed,
        };
        if media.resolve(self.renderer.sizing()).is_none() {
            tracing::warn!(
                sizing = ?self.renderer.sizing(),
                "Overlay size unknown; nothing is drawn until a resize",
            );
        }
        let session_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let shared = Arc::new(Shared {
            state: Mutex::new(LiveState {
                stream: Some(stream),
                surface,
                media,
                current: None,
                next_seq: 0,
                last_applied: 0,
                last_report: RenderReport::skipped(),
                state: CaptureState::Running,
            }),
            renderer: self.renderer,
            analyzer: Arc::clone(&self.analyzer),
            events: Arc::clone(&self.events),
            permits: Arc::new(Semaphore::new(self.config.max_in_flight.max(1))),
            cancel: cancel.clone(),
        });

        let tracker = TaskTracker::new();
        let timer = tokio::spawn(run_timer(
            Arc::clone(&shared),
            self.config.interval,
            tracker.clone(),
        ));

        tracing::info!(
            session_id = %session_id,
            interval_ms = self.config.interval.as_millis() as u64,
            max_in_flight = self.config.max_in_flight,
            "Live session started",
        );
        self.events.publish(OverlayEvent::new(EventKind::SessionStarted {
            session_id: session_id.to_string(),
        }));

        Ok(LiveSession {
            id: session_id,
            shared,
            cancel,
            timer: Some(timer),
            tracker,
        })
    }
}

// ---------------------------------------------------------------------------
// LiveSession
// ---------------------------------------------------------------------------

/// Handle to a running live loop. Dropping it cancels the loop.
pub struct LiveSession<S> {
    id: Uuid,
    shared: Arc<Shared<S>>,
    cancel: CancellationToken,
    timer: Option<JoinHandle<()>>,
    tracker: TaskTracker,
}

impl<S: Surface + Send + 'static> LiveSession<S> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn state(&self) -> CaptureState {
        self.shared.state.lock().await.state
    }

    /// The annotation currently driving the overlay.
    pub async fn current_annotation(&self) -> Option<AnnotationRecord> {
        self.shared.state.lock().await.current.clone()
    }

    /// Sequence number of the applied response, 0 before the first one.
    pub async fn last_applied_seq(&self) -> u64 {
        self.shared.state.lock().await.last_applied
    }

    pub async fn last_report(&self) -> RenderReport {
        self.shared.state.lock().await.last_report.clone()
    }

    /// Inspect the overlay surface under the session lock.
    pub async fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let state = self.shared.state.lock().await;
        f(&state.surface)
    }

    /// The live view's rendered size changed; redraw the current slot.
    pub async fn on_resize(&self, displayed: SurfaceGeometry) {
        let mut state = self.shared.state.lock().await;
        if state.state == CaptureState::Stopped {
            return;
        }
        state.media.displayed = Some(displayed);
        state.redraw(&self.shared.renderer);
    }

    /// Stop the timer, cancel in-flight cycles, and release the stream.
    ///
    /// Once this returns no response can change the overlay.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();

        if let Some(timer) = self.timer.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, timer).await.is_err() {
                tracing::warn!(session_id = %self.id, "Capture timer did not stop in time");
            }
        }
        self.tracker.close();
        if tokio::time::timeout(SHUTDOWN_GRACE, self.tracker.wait())
            .await
            .is_err()
        {
            tracing::warn!(session_id = %self.id, "In-flight cycles did not stop in time");
        }

        let mut state = self.shared.state.lock().await;
        state.release_stream();
        let last_applied = state.last_applied;
        drop(state);

        tracing::info!(session_id = %self.id, last_applied, "Live session stopped");
        self.shared
            .events
            .publish(OverlayEvent::new(EventKind::SessionStopped {
                session_id: self.id.to_string(),
            }));
    }
}

impl<S> Drop for LiveSession<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
        // A busy lock defers the release to `LiveState`'s drop.
        if let Ok(mut state) = self.shared.state.try_lock() {
            state.release_stream();
        }
    }
}
