//! Temporal Confirmation Filter
//!
//! A single hot tick must never fire the reactor. Scores accumulate in a
//! short rolling history and three gates must all agree before a detection
//! is confirmed; a cooldown then blanks the gate entirely for a minimum
//! interval. GC pauses and momentary tab contention spike one sample, real
//! recording elevates several.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::DetectorConfig;

// ============================================================================
// SUSPICION HISTORY
// ============================================================================

/// Bounded FIFO of recent aggregate scores
#[derive(Debug, Clone)]
pub struct SuspicionHistory {
    scores: VecDeque<f32>,
    capacity: usize,
}

impl SuspicionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            scores: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a score, evicting the oldest when full
    pub fn push(&mut self, score: f32) {
        self.scores.push_back(score);
        while self.scores.len() > self.capacity {
            self.scores.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn average(&self) -> f32 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.iter().sum::<f32>() / self.scores.len() as f32
    }

    /// Held scores strictly above `threshold`
    pub fn count_above(&self, threshold: f32) -> usize {
        self.scores.iter().filter(|s| **s > threshold).count()
    }
}

// ============================================================================
// CONFIRMATION GATE
// ============================================================================

/// Three-way escalation gate over the held history
#[derive(Debug, Clone)]
pub struct ConfirmationGate {
    avg_threshold: f32,
    high_threshold: f32,
    high_count_required: usize,
    fire_threshold: f32,
}

impl ConfirmationGate {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            avg_threshold: config.avg_threshold,
            high_threshold: config.high_threshold,
            high_count_required: config.high_count_required,
            fire_threshold: config.fire_threshold,
        }
    }

    /// Evaluate the gate. `history` already contains `current`.
    ///
    /// The average must strictly exceed its threshold: a window balancing on
    /// the boundary (two isolated spikes against two quiet samples) is not
    /// yet sustained suspicion.
    pub fn confirms(&self, history: &SuspicionHistory, current: f32) -> bool {
        if history.is_empty() {
            return false;
        }

        history.average() > self.avg_threshold
            && history.count_above(self.high_threshold) >= self.high_count_required
            && current >= self.fire_threshold
    }
}

// ============================================================================
// DETECTION COOLDOWN
// ============================================================================

/// Minimum interval between confirmed detections.
///
/// While active, sampling continues but the gate is not evaluated. Cleared
/// on visibility regain and on shutdown.
#[derive(Debug, Clone)]
pub struct DetectionCooldown {
    last_confirmed: Option<Instant>,
    min_interval: Duration,
}

impl DetectionCooldown {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_confirmed: None,
            min_interval,
        }
    }

    pub fn is_active(&self, now: Instant) -> bool {
        match self.last_confirmed {
            Some(at) => now.saturating_duration_since(at) < self.min_interval,
            None => false,
        }
    }

    pub fn arm(&mut self, now: Instant) {
        self.last_confirmed = Some(now);
    }

    pub fn clear(&mut self) {
        self.last_confirmed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> ConfirmationGate {
        ConfirmationGate::from_config(&DetectorConfig::default())
    }

    fn history_of(scores: &[f32]) -> SuspicionHistory {
        let mut history = SuspicionHistory::new(4);
        for s in scores {
            history.push(*s);
        }
        history
    }

    #[test]
    fn test_history_capacity_invariant() {
        let mut history = SuspicionHistory::new(4);
        for k in 0..100 {
            history.push(k as f32 / 100.0);
            assert!(history.len() <= 4);
        }
        assert_eq!(history.len(), 4);
        // oldest evicted first
        assert!((history.average() - 0.975).abs() < 1e-4);
    }

    #[test]
    fn test_spiky_window_does_not_confirm() {
        // prior [0.9, 0.1, 0.1, 0.9], current 0.9 pushed on top: the window
        // becomes [0.1, 0.1, 0.9, 0.9], averaging on the 0.50 boundary
        let mut history = history_of(&[0.9, 0.1, 0.1, 0.9]);
        history.push(0.9);
        assert!(!gate().confirms(&history, 0.9));
    }

    #[test]
    fn test_one_qualifying_entry_does_not_confirm() {
        let mut history = history_of(&[0.5, 0.5, 0.5]);
        history.push(0.9);
        // average 0.6 clears, but only one held score exceeds 0.55
        assert!(!gate().confirms(&history, 0.9));
    }

    #[test]
    fn test_two_qualifying_entries_confirm() {
        let mut history = history_of(&[0.52, 0.54, 0.9]);
        history.push(0.9);
        assert!(gate().confirms(&history, 0.9));
    }

    #[test]
    fn test_current_below_fire_threshold_blocks() {
        let mut history = history_of(&[0.9, 0.9, 0.9]);
        history.push(0.59);
        assert!(!gate().confirms(&history, 0.59));
    }

    #[test]
    fn test_empty_history_never_confirms() {
        assert!(!gate().confirms(&SuspicionHistory::new(4), 1.0));
    }

    #[test]
    fn test_cooldown_window() {
        let mut cooldown = DetectionCooldown::new(Duration::from_millis(1000));
        let t0 = Instant::now();
        assert!(!cooldown.is_active(t0));

        cooldown.arm(t0);
        assert!(cooldown.is_active(t0 + Duration::from_millis(500)));
        assert!(!cooldown.is_active(t0 + Duration::from_millis(1000)));
    }

    #[test]
    fn test_cooldown_clear_allows_immediate_fire() {
        let mut cooldown = DetectionCooldown::new(Duration::from_millis(1000));
        let t0 = Instant::now();
        cooldown.arm(t0);
        assert!(cooldown.is_active(t0 + Duration::from_millis(10)));

        cooldown.clear();
        assert!(!cooldown.is_active(t0 + Duration::from_millis(10)));
    }
}
