use anyhow::{Context, Result};
use std::sync::{Arc, Mutex, TryLockError};
use tokio::sync::watch;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::camera::{Frame, FrameSource};
use crate::gesture::{GestureClassifier, GestureEvent, GestureKind, PointerMapper};
use crate::pointer::{MouseButton, PointerSink};
use crate::settings::Config;
use crate::tracking::{HandObservation, LandmarkDetector};

use super::state::{EnginePhase, EngineState, SessionSummary, StopReason};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

// Import the logging macros (exported at crate root)
use crate::{log_debug, log_info, log_warn};

const FRAME_WAIT: Duration = Duration::from_millis(20);
const IDLE_PAUSE: Duration = Duration::from_millis(10);

/// Drives frames through the detector and classifier and applies the
/// resulting gestures to a pointer sink.
pub struct Engine {
    config: Config,
    source: Box<dyn FrameSource>,
    detector: Arc<Mutex<Box<dyn LandmarkDetector>>>,
    sink: Box<dyn PointerSink>,
    classifier: GestureClassifier,
    state: EngineState,
    phase_tx: watch::Sender<EnginePhase>,
}

impl Engine {
    pub fn new(
        config: Config,
        source: Box<dyn FrameSource>,
        detector: Box<dyn LandmarkDetector>,
        sink: Box<dyn PointerSink>,
    ) -> Self {
        let classifier = GestureClassifier::new(config.gesture.clone());
        let (phase_tx, _) = watch::channel(EnginePhase::Idle);
        Self {
            config,
            source,
            detector: Arc::new(Mutex::new(detector)),
            sink,
            classifier,
            state: EngineState::new(),
            phase_tx,
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Follows phase transitions while a session runs.
    pub fn subscribe_phase(&self) -> watch::Receiver<EnginePhase> {
        self.phase_tx.subscribe()
    }

    /// Runs one session until `stop` fires or the hand stays away longer
    /// than `max_inactive_seconds`.
    ///
    /// Only startup failures are returned as errors. Once the loop is
    /// running, a held button is always released before this returns.
    pub async fn run(&mut self, stop: CancellationToken) -> Result<SessionSummary> {
        self.source.start().context("failed to start frame source")?;

        let (width, height) = match self.sink.screen_size() {
            Ok(size) => size,
            Err(err) => {
                self.source.stop();
                return Err(err.context("failed to query screen size"));
            }
        };
        let mapper = PointerMapper::new(width, height);

        let mut summary = SessionSummary::begin();
        self.state = EngineState::new();
        log_info!(
            "engine session {} started (screen {}x{})",
            summary.id,
            width,
            height
        );

        let reason = self.tick_loop(&stop, &mapper, &mut summary).await;

        self.cleanup(&mut summary);
        summary.finish(reason);
        match serde_json::to_string(&summary) {
            Ok(json) => log_info!("engine session ended: {json}"),
            Err(err) => log_warn!("failed to serialize session summary: {err}"),
        }
        Ok(summary)
    }

    /// Releases detector resources. Call once the engine will not run again.
    pub fn shutdown(&mut self) {
        match self.detector.try_lock() {
            Ok(mut detector) => detector.close(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().close(),
            Err(TryLockError::WouldBlock) => {
                log_warn!("landmark detector still busy; skipping close")
            }
        }
        log_info!("engine shut down");
    }

    async fn tick_loop(
        &mut self,
        stop: &CancellationToken,
        mapper: &PointerMapper,
        summary: &mut SessionSummary,
    ) -> StopReason {
        let fps = f64::from(self.config.camera.fps.max(1));
        let frame_interval = Duration::from_secs_f64(1.0 / fps);

        loop {
            if stop.is_cancelled() {
                return StopReason::Stopped;
            }
            let tick_start = Instant::now();

            let Some(frame) = self.source.latest() else {
                if self.absence_expired() {
                    return StopReason::IdleTimeout;
                }
                if !pause(stop, FRAME_WAIT).await {
                    return StopReason::Stopped;
                }
                continue;
            };
            summary.frames += 1;

            let detector = Arc::clone(&self.detector);
            let Some(observation) = detect(detector, frame, stop).await else {
                return StopReason::Stopped;
            };

            match observation {
                None => {
                    self.on_hand_lost(summary);
                    if self.absence_expired() {
                        return StopReason::IdleTimeout;
                    }
                    if !pause(stop, IDLE_PAUSE).await {
                        return StopReason::Stopped;
                    }
                }
                Some(observation) => {
                    summary.observations += 1;
                    self.on_observation(&observation, mapper, summary);
                    let remaining = frame_interval.saturating_sub(tick_start.elapsed());
                    if !pause(stop, remaining).await {
                        return StopReason::Stopped;
                    }
                }
            }
        }
    }

    fn on_hand_lost(&mut self, summary: &mut SessionSummary) {
        self.classifier.reset();
        if self.state.dragging {
            self.release(summary);
        }
        self.set_phase(EnginePhase::Idle);

        if !self.state.source_idle {
            self.source.set_idle(true);
            self.state.source_idle = true;
        }
    }

    fn on_observation(
        &mut self,
        observation: &HandObservation,
        mapper: &PointerMapper,
        summary: &mut SessionSummary,
    ) {
        if self.state.source_idle {
            self.source.set_idle(false);
            self.state.source_idle = false;
        }
        self.state.last_seen = Instant::now();

        let event = self.classifier.process(observation);
        self.apply_gesture(&event, mapper, summary);

        let phase = if self.state.dragging {
            EnginePhase::Dragging
        } else if event.pointer.is_some() {
            EnginePhase::Tracking
        } else {
            EnginePhase::Idle
        };
        self.set_phase(phase);
    }

    fn apply_gesture(
        &mut self,
        event: &GestureEvent,
        mapper: &PointerMapper,
        summary: &mut SessionSummary,
    ) {
        if let Some(pointer) = event.pointer {
            let (x, y) = mapper.to_screen(pointer);
            let result = self.sink.move_to(x, y);
            report(result, "move", summary);
        }

        match event.kind {
            GestureKind::Click if event.is_click => {
                if self.state.dragging {
                    self.release(summary);
                }
                let result = self.sink.click(MouseButton::Left);
                if report(result, "click", summary) {
                    summary.clicks += 1;
                }
            }
            GestureKind::Drag => {
                if !self.state.dragging {
                    let result = self.sink.press(MouseButton::Left);
                    if report(result, "press", summary) {
                        self.state.dragging = true;
                        summary.drags += 1;
                    }
                }
            }
            _ => {
                if self.state.dragging || event.drag_released {
                    self.release(summary);
                }
            }
        }

        if event.kind == GestureKind::Scroll && event.scroll_delta != 0.0 {
            let amount = mapper.scroll_amount(event.scroll_delta);
            let result = self.sink.scroll(amount, 0.0);
            if report(result, "scroll", summary) {
                summary.scrolls += 1;
            }
        }
    }

    /// Issues a single release and forgets the held button either way.
    fn release(&mut self, summary: &mut SessionSummary) {
        let result = self.sink.release(MouseButton::Left);
        report(result, "release", summary);
        self.state.dragging = false;
    }

    fn absence_expired(&self) -> bool {
        let limit = self.config.app.max_inactive_seconds;
        limit > 0.0 && self.state.last_seen.elapsed().as_secs_f64() > limit
    }

    fn set_phase(&mut self, phase: EnginePhase) {
        if self.state.phase != phase {
            log_debug!("engine phase {:?} -> {:?}", self.state.phase, phase);
            self.state.phase = phase;
            self.phase_tx.send_replace(phase);
        }
    }

    fn cleanup(&mut self, summary: &mut SessionSummary) {
        if self.state.dragging {
            log_info!("releasing held button before teardown");
            self.release(summary);
        }
        if self.state.source_idle {
            self.source.set_idle(false);
            self.state.source_idle = false;
        }
        self.source.stop();
        self.classifier.reset();
        self.set_phase(EnginePhase::Idle);
    }
}

/// Logs a failed sink call; returns whether the call succeeded.
fn report(result: Result<()>, command: &str, summary: &mut SessionSummary) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            summary.sink_errors += 1;
            log_warn!("pointer sink {command} failed: {err:?}");
            false
        }
    }
}

/// Runs the detector on the blocking pool so a stalled detector cannot
/// hold up `stop`. Returns `None` when `stop` fires first.
async fn detect(
    detector: Arc<Mutex<Box<dyn LandmarkDetector>>>,
    frame: Frame,
    stop: &CancellationToken,
) -> Option<Option<HandObservation>> {
    let task = tokio::task::spawn_blocking(move || {
        let mut detector = detector
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        detector.detect(&frame)
    });

    tokio::select! {
        _ = stop.cancelled() => {
            log_debug!("stop requested during landmark detection");
            None
        }
        joined = task => Some(match joined {
            Ok(Ok(observation)) => observation,
            Ok(Err(err)) => {
                log_warn!("landmark detection failed: {err:?}");
                None
            }
            Err(err) => {
                log_warn!("landmark detection task failed: {err}");
                None
            }
        }),
    }
}

/// Sleeps for `duration` unless `stop` fires first; returns false on stop.
async fn pause(stop: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = stop.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
