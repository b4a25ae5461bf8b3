//! Manual test hooks
//!
//! Process-global entry points so an embedder (or a human at a debug
//! console) can trigger the detection path and read live metrics without
//! waiting for real signal drift.

use parking_lot::RwLock;

use crate::logic::detector::RecordingDetector;
use crate::logic::signals::SuspicionMetrics;

/// Detector currently exposed through the global hooks
static ACTIVE: RwLock<Option<RecordingDetector>> = RwLock::new(None);

/// Expose `detector` through the global hooks
pub fn install(detector: &RecordingDetector) {
    *ACTIVE.write() = Some(detector.clone());
    log::info!("manual detection hooks installed");
}

/// Detach the global hooks
pub fn uninstall() {
    *ACTIVE.write() = None;
}

/// Force a maximum-confidence detection pass; still subject to the
/// confirmation gate and cooldown. Returns false when no detector is
/// installed.
pub fn trigger_recording_warning() -> bool {
    match ACTIVE.read().as_ref() {
        Some(detector) => {
            log::info!("🧪 manual recording warning trigger");
            detector.trigger_capture_pass();
            true
        }
        None => {
            log::warn!("trigger_recording_warning: no detector installed");
            false
        }
    }
}

/// Fresh metrics snapshot from the installed detector
pub fn get_detection_metrics() -> Option<SuspicionMetrics> {
    ACTIVE.read().as_ref().map(|d| d.metrics_snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorConfig;
    use crate::host::{DeniedCaptureBackend, Host};
    use crate::logic::detector::DisplayCaptureAdapter;
    use std::sync::Arc;

    #[test]
    fn test_hooks_lifecycle() {
        uninstall();
        assert!(!trigger_recording_warning());
        assert!(get_detection_metrics().is_none());

        let capture = Arc::new(DisplayCaptureAdapter::new(Arc::new(DeniedCaptureBackend)));
        let detector = RecordingDetector::new(DetectorConfig::default(), Host::detached(), capture);
        install(&detector);

        assert!(trigger_recording_warning());
        let metrics = get_detection_metrics().expect("detector installed");
        assert!((0.0..=1.0).contains(&metrics.suspicion_score));

        uninstall();
        assert!(get_detection_metrics().is_none());
    }
}
