//! Recording Suspicion Detector
//!
//! Owns the whole pipeline: one-shot baseline calibration, per-tick
//! sampling, adaptive aggregation, temporal confirmation, cooldown and the
//! reactor. Every piece of mutable state lives on the instance and is
//! touched only by detection passes; `start()`/`stop()` bound its lifetime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use chrono::Utc;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::DetectorConfig;
use crate::constants::{BLACKSCREEN_ELEMENT_ID, WARNING_ELEMENT_ID};
use crate::error::{CaptureError, DetectorError, DetectorResult};
use crate::host::{CaptureBackend, CaptureSession, Host};
use crate::logic::baseline::{self, PerformanceBaseline};
use crate::logic::confirm::{ConfirmationGate, DetectionCooldown, SuspicionHistory};
use crate::logic::events::{EventBus, OS_RECORDING_DETECTED};
use crate::logic::overlay::OverlayReactor;
use crate::logic::score;
use crate::logic::signals::{self, DrawLatencyMonitor, FrameTimingAnalyzer, SuspicionMetrics};

/// Metrics summary is logged every Nth pass
const DEBUG_LOG_EVERY: u64 = 30;

// ============================================================================
// SAMPLER STATE
// ============================================================================

struct TickState {
    frame: FrameTimingAnalyzer,
    draw: DrawLatencyMonitor,
    history: SuspicionHistory,
    cooldown: DetectionCooldown,
    ticks: u64,
    last_metrics: Option<SuspicionMetrics>,
}

struct DetectorInner {
    config: DetectorConfig,
    host: Host,
    capture: Arc<DisplayCaptureAdapter>,
    baseline: OnceCell<PerformanceBaseline>,
    gate: ConfirmationGate,
    state: Mutex<TickState>,
    events: EventBus,
    reactor: OverlayReactor,
    running: AtomicBool,
    loop_task: Mutex<Option<JoinHandle<()>>>,
}

// ============================================================================
// DETECTOR
// ============================================================================

/// Handle to one detector instance; clones share the same state
#[derive(Clone)]
pub struct RecordingDetector {
    inner: Arc<DetectorInner>,
}

impl RecordingDetector {
    pub fn new(config: DetectorConfig, host: Host, capture: Arc<DisplayCaptureAdapter>) -> Self {
        let state = TickState {
            frame: FrameTimingAnalyzer::new(
                config.frame_window,
                config.variance_window,
                config.tick_interval_ms as f32,
            ),
            draw: DrawLatencyMonitor::new(config.draw_latency_window),
            history: SuspicionHistory::new(config.history_capacity),
            cooldown: DetectionCooldown::new(Duration::from_millis(config.cooldown_ms)),
            ticks: 0,
            last_metrics: None,
        };

        let inner = DetectorInner {
            gate: ConfirmationGate::from_config(&config),
            reactor: OverlayReactor::new(Arc::clone(&host.overlay), &config),
            config,
            host,
            capture,
            baseline: OnceCell::new(),
            state: Mutex::new(state),
            events: EventBus::new(),
            running: AtomicBool::new(false),
            loop_task: Mutex::new(None),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Calibrate (once), install the capture guard and launch the tick loop.
    pub fn start(&self) -> DetectorResult<()> {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return Err(DetectorError::AlreadyRunning);
        }

        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                self.inner.running.store(false, Ordering::SeqCst);
                return Err(DetectorError::NoRuntime);
            }
        };

        // sweep artifacts left by a previous session before creating anything
        self.inner.host.overlay.remove(WARNING_ELEMENT_ID);
        self.inner.host.overlay.remove(BLACKSCREEN_ELEMENT_ID);

        self.inner.reactor.bind_runtime(runtime.clone());
        self.inner.baseline();
        self.inner.capture.install_guard(&self.inner);

        let inner = Arc::clone(&self.inner);
        let task = runtime.spawn(async move {
            let mut ticker =
                tokio::time::interval(Duration::from_millis(inner.config.tick_interval_ms));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            while inner.running.load(Ordering::SeqCst) {
                ticker.tick().await;
                inner.run_pass(0.0);
            }
        });
        *self.inner.loop_task.lock() = Some(task);

        log::info!(
            "🔍 recording detection started ({}ms cadence)",
            self.inner.config.tick_interval_ms
        );
        Ok(())
    }

    /// Halt the loop, uninstall the capture guard and remove all artifacts.
    pub fn stop(&self) -> DetectorResult<()> {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return Err(DetectorError::NotRunning);
        }

        if let Some(task) = self.inner.loop_task.lock().take() {
            task.abort();
        }
        self.inner.capture.remove_guard();
        self.inner.reactor.clear();
        self.inner.state.lock().cooldown.clear();

        log::info!("recording detection stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// The calibrated session baseline (calibrating now if needed)
    pub fn baseline(&self) -> PerformanceBaseline {
        self.inner.baseline().clone()
    }

    /// Fresh sampling pass without gate evaluation
    pub fn metrics_snapshot(&self) -> SuspicionMetrics {
        self.inner.sample(0.0)
    }

    /// Most recent evaluated pass, if any
    pub fn last_metrics(&self) -> Option<SuspicionMetrics> {
        self.inner.state.lock().last_metrics.clone()
    }

    /// Force a maximum-confidence detection pass (manual trigger path)
    pub fn trigger_capture_pass(&self) {
        self.inner.run_pass(1.0);
    }

    /// Session visibility transitions. Regaining visibility clears the
    /// cooldown so a confirmable tick may fire immediately.
    pub fn handle_visibility_change(&self, visible: bool) {
        if visible {
            self.inner.state.lock().cooldown.clear();
            log::info!("🔄 visibility regained - detection cooldown cleared");
        } else {
            log::debug!("session hidden");
        }
    }

    /// Subscribe to a named detector event
    pub fn subscribe<F>(&self, event: &str, listener: F)
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        self.inner.events.subscribe(event, listener);
    }

    /// Typed convenience subscription for confirmed detections
    pub fn on_detection<F>(&self, listener: F)
    where
        F: Fn(&SuspicionMetrics) + Send + Sync + 'static,
    {
        self.inner
            .events
            .subscribe(OS_RECORDING_DETECTED, move |value| {
                match serde_json::from_value::<SuspicionMetrics>(value.clone()) {
                    Ok(metrics) => listener(&metrics),
                    Err(e) => log::error!("detection payload decode failed: {}", e),
                }
            });
    }
}

impl DetectorInner {
    fn baseline(&self) -> &PerformanceBaseline {
        self.baseline
            .get_or_init(|| baseline::calibrate(&*self.host.memory, &*self.host.network))
    }

    /// One sampling + aggregation pass
    fn sample(&self, capture_confidence: f32) -> SuspicionMetrics {
        let profile = self.baseline();

        let cpu_contention = signals::cpu_contention(profile);
        let memory_pressure =
            signals::memory_pressure(&*self.host.memory, profile.has_slow_network);

        let now = Instant::now();
        let mut state = self.state.lock();
        let frame_timing_strain = state.frame.sample(now, profile.has_slow_network);
        let draw_latency = state.draw.sample();
        drop(state);

        let mut metrics = SuspicionMetrics {
            frame_timing_strain,
            cpu_contention,
            draw_latency,
            memory_pressure,
            capture_attempt: capture_confidence,
            suspicion_score: 0.0,
            timestamp: Utc::now(),
        };

        let weights = score::resolve_weights(&self.config.weights, profile);
        metrics.suspicion_score = score::aggregate(&metrics, &weights);
        metrics
    }

    /// Full detection pass: sample, record, and escalate if the gate holds
    fn run_pass(&self, capture_confidence: f32) {
        let metrics = self.sample(capture_confidence);
        self.evaluate(metrics);
    }

    /// Push a scored pass through history, cooldown and the gate
    fn evaluate(&self, metrics: SuspicionMetrics) {
        let now = Instant::now();
        let mut state = self.state.lock();

        state.ticks += 1;
        state.history.push(metrics.suspicion_score);
        state.last_metrics = Some(metrics.clone());

        if state.ticks % DEBUG_LOG_EVERY == 0 {
            log::debug!(
                "📊 suspicion {:.2} | avg {:.2} | high {}/{} | ft {:.2} cpu {:.2} draw {:.2} mem {:.2}",
                metrics.suspicion_score,
                state.history.average(),
                state.history.count_above(self.config.high_threshold),
                state.history.len(),
                metrics.frame_timing_strain,
                metrics.cpu_contention,
                metrics.draw_latency,
                metrics.memory_pressure,
            );
        }

        // sampling continues through the cooldown; escalation does not
        if state.cooldown.is_active(now) {
            return;
        }

        if self
            .gate
            .confirms(&state.history, metrics.suspicion_score)
        {
            state.cooldown.arm(now);
            let average = state.history.average();
            drop(state);
            self.fire(metrics, average);
        }
    }

    /// Confirmed detection: event out, overlays up
    fn fire(&self, metrics: SuspicionMetrics, average: f32) {
        log::warn!(
            "🚨 OS-level recording suspected (score {:.0}%, avg {:.0}%)",
            metrics.suspicion_score * 100.0,
            average * 100.0
        );
        log::warn!(
            "metrics: ft {:.2} cpu {:.2} draw {:.2} mem {:.2} cap {:.2}",
            metrics.frame_timing_strain,
            metrics.cpu_contention,
            metrics.draw_latency,
            metrics.memory_pressure,
            metrics.capture_attempt,
        );

        self.events.emit(OS_RECORDING_DETECTED, &metrics);
        self.reactor.fire();
    }
}

// ============================================================================
// DISPLAY CAPTURE ADAPTER
// ============================================================================

/// Decorator over the host's display-capture entry point.
///
/// While a detector guard is installed, every request is refused and scored
/// as a maximum-confidence capture attempt; without one, requests pass
/// through to the backend untouched. The guard is installed by
/// `RecordingDetector::start()` and removed by `stop()`.
pub struct DisplayCaptureAdapter {
    backend: Arc<dyn CaptureBackend>,
    guard: RwLock<Option<Weak<DetectorInner>>>,
}

impl DisplayCaptureAdapter {
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        Self {
            backend,
            guard: RwLock::new(None),
        }
    }

    /// Route a capture request through the guard
    pub fn request_capture(&self) -> Result<CaptureSession, CaptureError> {
        let guard = self.guard.read().clone();
        if let Some(detector) = guard.and_then(|weak| weak.upgrade()) {
            log::warn!("🔴 display capture requested - treating as recording attempt");
            detector.run_pass(1.0);
            return Err(CaptureError::Blocked);
        }

        self.backend.open()
    }

    pub fn is_guarded(&self) -> bool {
        self.guard
            .read()
            .as_ref()
            .map(|weak| weak.strong_count() > 0)
            .unwrap_or(false)
    }

    /// Install the guard; repeated installs keep the first
    fn install_guard(&self, detector: &Arc<DetectorInner>) {
        let mut guard = self.guard.write();
        if guard.is_none() {
            *guard = Some(Arc::downgrade(detector));
        }
    }

    fn remove_guard(&self) {
        *self.guard.write() = None;
    }
}
