//! Detector configuration
//!
//! The source history of this engine carried three near-identical detector
//! copies with diverging thresholds and weight tables. They are collapsed
//! here: every window, threshold, weight and duration is configuration, so a
//! tuning variant is a `DetectorConfig` value rather than a fork of the
//! detector.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TICK_INTERVAL_MS;

/// Base contribution weights for the five suspicion signals.
///
/// These are relative trust levels, not probabilities; after runtime
/// adaptation they need not sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    pub frame_timing: f32,
    pub cpu: f32,
    pub draw_latency: f32,
    pub memory: f32,
    pub capture: f32,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            frame_timing: 0.10,
            cpu: 0.25,
            draw_latency: 0.25,
            memory: 0.25,
            capture: 0.15,
        }
    }
}

/// Full tuning table for one detector instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Sampling cadence (ms)
    pub tick_interval_ms: u64,

    /// Inter-tick frame deltas held for strain analysis
    pub frame_window: usize,

    /// Frame variance samples held
    pub variance_window: usize,

    /// Draw-latency samples held
    pub draw_latency_window: usize,

    /// Aggregate scores held for confirmation
    pub history_capacity: usize,

    /// Gate (a): the history average must strictly exceed this
    pub avg_threshold: f32,

    /// Gate (b): per-score bar for a "high" reading
    pub high_threshold: f32,

    /// Gate (b): high readings required among the held scores
    pub high_count_required: usize,

    /// Gate (c): floor for the current tick's score
    pub fire_threshold: f32,

    /// Minimum interval between confirmed detections (ms)
    pub cooldown_ms: u64,

    /// Warning overlay lifetime (ms)
    pub warning_duration_ms: u64,

    /// Obscuring overlay lifetime (ms)
    pub blackout_duration_ms: u64,

    /// Base signal weights before baseline adaptation
    pub weights: WeightTable,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            frame_window: 10,
            variance_window: 5,
            draw_latency_window: 5,
            history_capacity: 4,
            avg_threshold: 0.50,
            high_threshold: 0.55,
            high_count_required: 2,
            fire_threshold: 0.60,
            cooldown_ms: 1000,
            warning_duration_ms: 8000,
            blackout_duration_ms: 10_000,
            weights: WeightTable::default(),
        }
    }
}

impl DetectorConfig {
    /// High sensitivity (lower thresholds, faster escalation)
    pub fn high_sensitivity() -> Self {
        Self {
            avg_threshold: 0.40,
            high_threshold: 0.45,
            fire_threshold: 0.50,
            ..Default::default()
        }
    }

    /// Low sensitivity (higher thresholds, longer cooldown)
    pub fn low_sensitivity() -> Self {
        Self {
            avg_threshold: 0.60,
            high_threshold: 0.65,
            high_count_required: 3,
            fire_threshold: 0.75,
            cooldown_ms: 3000,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DetectorConfig::default();
        assert_eq!(config.history_capacity, 4);
        assert_eq!(config.high_count_required, 2);
        assert!(config.avg_threshold < config.high_threshold);
        assert!(config.high_threshold < config.fire_threshold);
    }

    #[test]
    fn test_sensitivity_presets_ordered() {
        let high = DetectorConfig::high_sensitivity();
        let low = DetectorConfig::low_sensitivity();
        assert!(high.fire_threshold < low.fire_threshold);
        assert!(high.avg_threshold < low.avg_threshold);
        assert!(low.cooldown_ms >= high.cooldown_ms);
    }

    #[test]
    fn test_default_weights_match_base_table() {
        let w = WeightTable::default();
        assert_eq!(w.frame_timing, 0.10);
        assert_eq!(w.cpu, 0.25);
        assert_eq!(w.draw_latency, 0.25);
        assert_eq!(w.memory, 0.25);
        assert_eq!(w.capture, 0.15);
    }
}
