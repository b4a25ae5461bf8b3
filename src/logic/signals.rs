//! Signal Samplers
//!
//! Five independent suspicion contributions, each normalized to [0,1] from a
//! distinct runtime observation. Samplers stay cheap (sub-millisecond to a
//! few milliseconds) so they do not perturb the timing they measure.

use std::collections::VecDeque;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::host::MemoryProbe;
use crate::logic::baseline::{self, DevicePerformanceLevel, PerformanceBaseline};

// ============================================================================
// CONSTANTS
// ============================================================================

/// 60Hz frame budget (ms); inter-tick deltas are rebased onto this scale
const FRAME_BUDGET_MS: f32 = 16.7;

/// Variance above this marks deltas intermittent (jank, not recording)
const INTERMITTENT_VARIANCE: f32 = 20.0;

/// Sustained mean above this indicates recording strain (ms)
const SUSTAINED_FRAME_MS: f32 = 30.0;

/// Strain floor under network jitter (ms)
const JITTER_FLOOR_MS: f32 = 40.0;

/// Strain floor for normal variation (ms)
const NORMAL_FLOOR_MS: f32 = 25.0;

/// CPU re-measurement window per tick (ms)
const CPU_RECHECK_WINDOW_MS: u64 = 2;

/// Contention gain on low-end devices, where loss is expected noise
const LOW_END_CPU_GAIN: f32 = 1.5;

/// Contention gain on medium/high-end devices
const DEFAULT_CPU_GAIN: f32 = 2.5;

/// Probe surface edge for the synchronous draw sampler (pixels)
const DRAW_SURFACE_EDGE: usize = 128;

/// Sustained draw latency above this starts to count (ms)
const DRAW_DELAY_FLOOR_MS: f32 = 1.5;

/// Draw latency excess mapped onto [0,1] over this range (ms)
const DRAW_DELAY_RANGE_MS: f32 = 10.0;

/// Heap utilization threshold
const HEAP_THRESHOLD: f32 = 0.60;

/// Raised heap threshold when the network is slow (GC churn tracks stalls)
const HEAP_THRESHOLD_SLOW_NET: f32 = 0.70;

/// Heap excess mapped onto [0,1] over this range
const HEAP_RANGE: f32 = 0.2;

// ============================================================================
// METRICS SNAPSHOT
// ============================================================================

/// One tick's worth of sampler outputs plus the aggregate score.
///
/// Recreated fresh on every pass; this is also the detection event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspicionMetrics {
    pub frame_timing_strain: f32,
    pub cpu_contention: f32,
    pub draw_latency: f32,
    pub memory_pressure: f32,
    pub capture_attempt: f32,
    pub suspicion_score: f32,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// FRAME TIMING STRAIN
// ============================================================================

/// Classifies tick cadence drift as sustained (recording-like) or
/// intermittent (jank-like) and scores the sustained excess.
pub struct FrameTimingAnalyzer {
    expected_interval_ms: f32,
    deltas: VecDeque<f32>,
    variances: VecDeque<f32>,
    last_tick: Option<Instant>,
    window: usize,
    variance_window: usize,
}

impl FrameTimingAnalyzer {
    pub fn new(window: usize, variance_window: usize, expected_interval_ms: f32) -> Self {
        Self {
            expected_interval_ms,
            deltas: VecDeque::with_capacity(window + 1),
            variances: VecDeque::with_capacity(variance_window + 1),
            last_tick: None,
            window,
            variance_window,
        }
    }

    /// Record a tick arrival and return the normalized strain.
    ///
    /// Deltas are measured against the expected cadence and rebased onto the
    /// 60Hz frame budget, so a tick arriving on schedule scores as a clean
    /// frame regardless of the configured interval.
    pub fn sample(&mut self, now: Instant, slow_network: bool) -> f32 {
        let delta_ms = match self.last_tick {
            Some(prev) => now.saturating_duration_since(prev).as_secs_f32() * 1000.0,
            None => self.expected_interval_ms,
        };
        self.last_tick = Some(now);

        let normalized = (FRAME_BUDGET_MS + (delta_ms - self.expected_interval_ms)).max(0.0);
        self.deltas.push_back(normalized);
        if self.deltas.len() > self.window {
            self.deltas.pop_front();
        }

        let avg = mean(&self.deltas);

        if self.deltas.len() >= 3 {
            let variance = self
                .deltas
                .iter()
                .map(|d| (d - avg).powi(2))
                .sum::<f32>()
                / self.deltas.len() as f32;
            self.variances.push_back(variance);
            if self.variances.len() > self.variance_window {
                self.variances.pop_front();
            }
        }

        let avg_variance = if self.variances.is_empty() {
            0.0
        } else {
            mean(&self.variances)
        };

        let intermittent = avg_variance > INTERMITTENT_VARIANCE;
        let sustained = avg > SUSTAINED_FRAME_MS && avg_variance < INTERMITTENT_VARIANCE;

        let strain = if intermittent || slow_network {
            ((avg - JITTER_FLOOR_MS) / 50.0).max(0.0) * 0.3
        } else if sustained {
            ((avg - SUSTAINED_FRAME_MS) / 40.0).max(0.0)
        } else {
            ((avg - NORMAL_FLOOR_MS) / 50.0).max(0.0) * 0.1
        };

        strain.clamp(0.0, 1.0)
    }
}

fn mean(values: &VecDeque<f32>) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

// ============================================================================
// CPU CONTENTION
// ============================================================================

/// Re-measure the iteration rate and score utilization loss against the
/// calibrated baseline.
pub fn cpu_contention(profile: &PerformanceBaseline) -> f32 {
    if profile.average_cpu_iter_per_ms <= 0.0 {
        return 0.0;
    }

    let current = baseline::measure_iteration_rate(CPU_RECHECK_WINDOW_MS);
    let utilization_loss = (1.0 - current / profile.average_cpu_iter_per_ms) as f32;

    let gain = match profile.device_performance_level {
        DevicePerformanceLevel::Low => LOW_END_CPU_GAIN,
        _ => DEFAULT_CPU_GAIN,
    };

    (utilization_loss * gain).clamp(0.0, 1.0)
}

// ============================================================================
// SYNCHRONOUS DRAW LATENCY
// ============================================================================

/// Times a trivial synchronous fill of a small in-memory surface.
///
/// Capture pipelines that hook composition stretch this from microseconds
/// into the millisecond range; a rolling average demands the delay be
/// sustained, not a one-off spike.
pub struct DrawLatencyMonitor {
    surface: Vec<u8>,
    history: VecDeque<f32>,
    window: usize,
}

impl DrawLatencyMonitor {
    pub fn new(window: usize) -> Self {
        Self {
            surface: vec![0u8; DRAW_SURFACE_EDGE * DRAW_SURFACE_EDGE * 4],
            history: VecDeque::with_capacity(window + 1),
            window,
        }
    }

    fn draw_once(&mut self) -> f32 {
        let start = Instant::now();
        for pixel in self.surface.chunks_exact_mut(4) {
            pixel[0] = 0;
            pixel[1] = 0;
            pixel[2] = 0;
            pixel[3] = 0xff;
        }
        std::hint::black_box(&self.surface);
        start.elapsed().as_secs_f32() * 1000.0
    }

    pub fn sample(&mut self) -> f32 {
        let delay_ms = self.draw_once();
        self.history.push_back(delay_ms);
        if self.history.len() > self.window {
            self.history.pop_front();
        }

        let avg = mean(&self.history);
        ((avg - DRAW_DELAY_FLOOR_MS) / DRAW_DELAY_RANGE_MS).clamp(0.0, 1.0)
    }
}

// ============================================================================
// MEMORY PRESSURE
// ============================================================================

/// Heap utilization excess over a baseline threshold; zero when the host
/// exposes no introspection.
pub fn memory_pressure(probe: &dyn MemoryProbe, slow_network: bool) -> f32 {
    let Some(heap) = probe.heap_usage() else {
        return 0.0;
    };
    if heap.limit_bytes == 0 {
        return 0.0;
    }

    let utilization = heap.used_bytes as f32 / heap.limit_bytes as f32;
    let threshold = if slow_network {
        HEAP_THRESHOLD_SLOW_NET
    } else {
        HEAP_THRESHOLD
    };

    ((utilization - threshold) / HEAP_RANGE).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HeapUsage, NullMemoryProbe};
    use crate::logic::baseline::EffectiveConnectionType;
    use std::time::Duration;

    struct FixedHeap {
        used: u64,
        limit: u64,
    }

    impl MemoryProbe for FixedHeap {
        fn heap_usage(&self) -> Option<HeapUsage> {
            Some(HeapUsage {
                used_bytes: self.used,
                limit_bytes: self.limit,
            })
        }
    }

    fn profile(level: DevicePerformanceLevel) -> PerformanceBaseline {
        PerformanceBaseline {
            average_cpu_iter_per_ms: 10_000.0,
            peak_memory_limit: None,
            network_effective_type: EffectiveConnectionType::Unknown,
            network_rtt_ms: 0,
            has_slow_network: false,
            device_performance_level: level,
        }
    }

    #[test]
    fn test_on_schedule_ticks_produce_no_strain() {
        let mut analyzer = FrameTimingAnalyzer::new(10, 5, 300.0);
        let t0 = Instant::now();
        for k in 0..10 {
            let strain = analyzer.sample(t0 + Duration::from_millis(300 * k), false);
            assert_eq!(strain, 0.0, "tick {} should be clean", k);
        }
    }

    #[test]
    fn test_sustained_overshoot_scores_strain() {
        let mut analyzer = FrameTimingAnalyzer::new(10, 5, 300.0);
        let t0 = Instant::now();
        let mut at = t0;
        let mut last = 0.0;
        // run past the window so the synthetic first delta rolls out and the
        // cadence settles to a steady 25ms overshoot with no variance
        for _ in 0..15 {
            at += Duration::from_millis(325);
            last = analyzer.sample(at, false);
        }
        assert!(last > 0.0, "sustained 25ms overshoot must register");
        assert!(last <= 1.0);
    }

    #[test]
    fn test_slow_network_downweights_strain() {
        let mut fast = FrameTimingAnalyzer::new(10, 5, 300.0);
        let mut slow = FrameTimingAnalyzer::new(10, 5, 300.0);
        let t0 = Instant::now();
        let mut at = t0;
        let mut on_fast = 0.0;
        let mut on_slow = 0.0;
        for _ in 0..15 {
            at += Duration::from_millis(330);
            on_fast = fast.sample(at, false);
            on_slow = slow.sample(at, true);
        }
        assert!(on_slow < on_fast);
    }

    #[test]
    fn test_cpu_contention_bounded() {
        let contention = cpu_contention(&profile(DevicePerformanceLevel::High));
        assert!((0.0..=1.0).contains(&contention));
    }

    #[test]
    fn test_cpu_contention_zero_without_baseline_rate() {
        let mut p = profile(DevicePerformanceLevel::High);
        p.average_cpu_iter_per_ms = 0.0;
        assert_eq!(cpu_contention(&p), 0.0);
    }

    #[test]
    fn test_draw_latency_bounded() {
        let mut monitor = DrawLatencyMonitor::new(5);
        for _ in 0..10 {
            let value = monitor.sample();
            assert!((0.0..=1.0).contains(&value));
        }
        assert!(monitor.history.len() <= 5);
    }

    #[test]
    fn test_memory_pressure_without_introspection() {
        assert_eq!(memory_pressure(&NullMemoryProbe, false), 0.0);
    }

    #[test]
    fn test_memory_pressure_threshold() {
        let half = FixedHeap {
            used: 50,
            limit: 100,
        };
        assert_eq!(memory_pressure(&half, false), 0.0);

        let hot = FixedHeap {
            used: 80,
            limit: 100,
        };
        let pressure = memory_pressure(&hot, false);
        assert!(pressure > 0.9 && pressure <= 1.0);
    }

    #[test]
    fn test_memory_pressure_relaxed_on_slow_network() {
        let warm = FixedHeap {
            used: 65,
            limit: 100,
        };
        assert!(memory_pressure(&warm, false) > 0.0);
        assert_eq!(memory_pressure(&warm, true), 0.0);
    }
}
