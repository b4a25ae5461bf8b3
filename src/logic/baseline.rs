//! Performance Baseline Calibrator
//!
//! One-shot, device-specific measurement of CPU speed and network class.
//! Sampler normalization and weight adaptation key off this profile for the
//! rest of the session.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::constants::{HIGH_DEVICE_ITER_RATE, MEDIUM_DEVICE_ITER_RATE, SLOW_NETWORK_RTT_MS};
use crate::host::{MemoryProbe, NetworkProbe};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Busy-loop window per CPU sample (ms)
const CPU_SAMPLE_WINDOW_MS: u64 = 10;

/// Busy-loop samples averaged into the baseline
const CPU_SAMPLE_COUNT: usize = 3;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Coarse device class derived from the calibrated iteration rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePerformanceLevel {
    Low,
    Medium,
    High,
}

/// Effective connection type, four tiers plus unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectiveConnectionType {
    #[serde(rename = "slow-2g")]
    Slow2g,
    #[serde(rename = "2g")]
    TwoG,
    #[serde(rename = "3g")]
    ThreeG,
    #[serde(rename = "4g")]
    FourG,
    #[serde(rename = "unknown")]
    Unknown,
}

impl EffectiveConnectionType {
    /// slow-2g through 4g sit at or below the slow tier; only an
    /// unclassified link escapes the flag
    pub fn is_slow_tier(self) -> bool {
        !matches!(self, EffectiveConnectionType::Unknown)
    }
}

/// One reading from the host's network-information capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSample {
    pub effective_type: EffectiveConnectionType,
    pub rtt_ms: u32,
}

/// Per-session performance profile, measured once and never mutated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceBaseline {
    pub average_cpu_iter_per_ms: f64,
    pub peak_memory_limit: Option<u64>,
    pub network_effective_type: EffectiveConnectionType,
    pub network_rtt_ms: u32,
    pub has_slow_network: bool,
    pub device_performance_level: DevicePerformanceLevel,
}

// ============================================================================
// CALIBRATION
// ============================================================================

/// Count busy-loop iterations completed in `window_ms` of wall-clock time.
///
/// `black_box` keeps the loop body from being optimized away.
pub(crate) fn measure_iteration_rate(window_ms: u64) -> f64 {
    let window = Duration::from_millis(window_ms);
    let start = Instant::now();
    let mut iterations: u64 = 0;

    while start.elapsed() < window {
        iterations = std::hint::black_box(iterations + 1);
    }

    iterations as f64 / window_ms as f64
}

/// Classify a device from its calibrated iteration rate
pub(crate) fn classify_device(iter_per_ms: f64) -> DevicePerformanceLevel {
    if iter_per_ms > HIGH_DEVICE_ITER_RATE {
        DevicePerformanceLevel::High
    } else if iter_per_ms > MEDIUM_DEVICE_ITER_RATE {
        DevicePerformanceLevel::Medium
    } else {
        DevicePerformanceLevel::Low
    }
}

/// Measure the session baseline.
///
/// Capability absence degrades to defaults: an unreadable network stays
/// `Unknown` and un-slow, missing heap introspection leaves the limit unset.
/// Idempotence is owned by the caller (the detector holds the result in a
/// once-cell).
pub fn calibrate(memory: &dyn MemoryProbe, network: &dyn NetworkProbe) -> PerformanceBaseline {
    let mut samples = [0f64; CPU_SAMPLE_COUNT];
    for sample in &mut samples {
        *sample = measure_iteration_rate(CPU_SAMPLE_WINDOW_MS);
    }
    let average_cpu_iter_per_ms = samples.iter().sum::<f64>() / CPU_SAMPLE_COUNT as f64;
    let device_performance_level = classify_device(average_cpu_iter_per_ms);

    let (network_effective_type, network_rtt_ms) = match network.sample() {
        Some(reading) => (reading.effective_type, reading.rtt_ms),
        None => (EffectiveConnectionType::Unknown, 0),
    };
    let has_slow_network =
        network_effective_type.is_slow_tier() || network_rtt_ms > SLOW_NETWORK_RTT_MS;

    let peak_memory_limit = memory.heap_usage().map(|heap| heap.limit_bytes);

    log::info!(
        "📡 Network: {:?} (RTT: {}ms)",
        network_effective_type,
        network_rtt_ms
    );
    log::info!(
        "⚙️ System performance: {:?} ({:.0} iter/ms, network {})",
        device_performance_level,
        average_cpu_iter_per_ms,
        if has_slow_network { "SLOW" } else { "FAST" }
    );

    PerformanceBaseline {
        average_cpu_iter_per_ms,
        peak_memory_limit,
        network_effective_type,
        network_rtt_ms,
        has_slow_network,
        device_performance_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{NullMemoryProbe, NullNetworkProbe};

    #[test]
    fn test_iteration_rate_positive() {
        assert!(measure_iteration_rate(1) > 0.0);
    }

    #[test]
    fn test_classify_device_cutoffs() {
        assert_eq!(classify_device(0.0), DevicePerformanceLevel::Low);
        assert_eq!(
            classify_device(MEDIUM_DEVICE_ITER_RATE + 1.0),
            DevicePerformanceLevel::Medium
        );
        assert_eq!(
            classify_device(HIGH_DEVICE_ITER_RATE + 1.0),
            DevicePerformanceLevel::High
        );
    }

    #[test]
    fn test_slow_tiers() {
        assert!(EffectiveConnectionType::Slow2g.is_slow_tier());
        assert!(EffectiveConnectionType::FourG.is_slow_tier());
        assert!(!EffectiveConnectionType::Unknown.is_slow_tier());
    }

    #[test]
    fn test_calibrate_degrades_without_capabilities() {
        let baseline = calibrate(&NullMemoryProbe, &NullNetworkProbe);
        assert_eq!(
            baseline.network_effective_type,
            EffectiveConnectionType::Unknown
        );
        assert!(!baseline.has_slow_network);
        assert_eq!(baseline.peak_memory_limit, None);
        assert!(baseline.average_cpu_iter_per_ms > 0.0);
    }

    #[test]
    fn test_high_rtt_flags_slow_network() {
        struct SlowLink;
        impl crate::host::NetworkProbe for SlowLink {
            fn sample(&self) -> Option<NetworkSample> {
                Some(NetworkSample {
                    effective_type: EffectiveConnectionType::Unknown,
                    rtt_ms: SLOW_NETWORK_RTT_MS + 50,
                })
            }
        }

        let baseline = calibrate(&NullMemoryProbe, &SlowLink);
        assert!(baseline.has_slow_network);
    }
}
