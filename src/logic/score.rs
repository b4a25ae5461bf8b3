//! Suspicion Aggregator
//!
//! Folds the five sampler outputs into one weighted score. Weights adapt to
//! the calibrated baseline at runtime; the result is compared against fixed
//! thresholds, never read as a probability.

use crate::config::WeightTable;
use crate::logic::baseline::{DevicePerformanceLevel, PerformanceBaseline};
use crate::logic::signals::SuspicionMetrics;

/// Cap for the adapted CPU weight on low-end devices
const LOW_END_CPU_WEIGHT_CAP: f32 = 0.35;

/// Adapt the base weight table to the measured baseline.
///
/// On a slow network, frame timing and memory are the dominant false-positive
/// sources, so their trust drops and the CPU/draw samplers pick up the
/// difference. Low-end devices additionally halve the frame-timing weight.
pub fn resolve_weights(base: &WeightTable, profile: &PerformanceBaseline) -> WeightTable {
    let mut weights = base.clone();

    if profile.has_slow_network {
        weights.frame_timing *= 0.5;
        weights.memory *= 0.8;
        weights.cpu += 0.05;
        weights.draw_latency += 0.05;
    }

    if profile.device_performance_level == DevicePerformanceLevel::Low {
        weights.frame_timing *= 0.5;
        weights.cpu = (weights.cpu + 0.10).min(LOW_END_CPU_WEIGHT_CAP);
    }

    weights
}

/// Weighted sum of the five signal values, clamped to [0,1].
///
/// Deterministic: identical metrics and weights always produce an identical
/// score.
pub fn aggregate(metrics: &SuspicionMetrics, weights: &WeightTable) -> f32 {
    let score = metrics.frame_timing_strain * weights.frame_timing
        + metrics.cpu_contention * weights.cpu
        + metrics.draw_latency * weights.draw_latency
        + metrics.memory_pressure * weights.memory
        + metrics.capture_attempt * weights.capture;

    score.clamp(0.0, 1.0)
}
