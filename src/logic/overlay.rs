//! Warning Overlay Reactor
//!
//! Transient, self-expiring UI artifacts raised on a confirmed detection: a
//! centered warning card and a full-viewport obscuring layer. Elements are
//! addressed by fixed ids so creation is idempotent, and everything is
//! removable on shutdown.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::DetectorConfig;
use crate::constants::{
    BLACKSCREEN_ELEMENT_ID, BLACKSCREEN_OPACITY, WARNING_ELEMENT_ID, WARNING_MESSAGE,
};
use crate::host::OverlaySink;

pub struct OverlayReactor {
    sink: Arc<dyn OverlaySink>,
    warning_duration: Duration,
    blackout_duration: Duration,
    runtime: RwLock<Option<Handle>>,
    expiry_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl OverlayReactor {
    pub fn new(sink: Arc<dyn OverlaySink>, config: &DetectorConfig) -> Self {
        Self {
            sink,
            warning_duration: Duration::from_millis(config.warning_duration_ms),
            blackout_duration: Duration::from_millis(config.blackout_duration_ms),
            runtime: RwLock::new(None),
            expiry_tasks: Mutex::new(Vec::new()),
        }
    }

    /// Remember the runtime driving expiry timers; set at detector start
    pub fn bind_runtime(&self, handle: Handle) {
        *self.runtime.write() = Some(handle);
    }

    /// Raise both overlays and schedule their expiry
    pub fn fire(&self) {
        self.sink.show_warning(WARNING_ELEMENT_ID, WARNING_MESSAGE);
        self.sink
            .show_blackout(BLACKSCREEN_ELEMENT_ID, BLACKSCREEN_OPACITY);

        let handle = Handle::try_current()
            .ok()
            .or_else(|| self.runtime.read().clone());
        let Some(handle) = handle else {
            log::warn!("no async runtime bound; overlays will not auto-expire");
            return;
        };

        let mut tasks = self.expiry_tasks.lock();
        tasks.retain(|task| !task.is_finished());

        let sink = Arc::clone(&self.sink);
        let warning_duration = self.warning_duration;
        tasks.push(handle.spawn(async move {
            tokio::time::sleep(warning_duration).await;
            sink.remove(WARNING_ELEMENT_ID);
        }));

        let sink = Arc::clone(&self.sink);
        let blackout_duration = self.blackout_duration;
        tasks.push(handle.spawn(async move {
            tokio::time::sleep(blackout_duration).await;
            sink.remove(BLACKSCREEN_ELEMENT_ID);
        }));
    }

    /// Remove both overlays and cancel pending expiries (unload path)
    pub fn clear(&self) {
        for task in self.expiry_tasks.lock().drain(..) {
            task.abort();
        }
        self.sink.remove(WARNING_ELEMENT_ID);
        self.sink.remove(BLACKSCREEN_ELEMENT_ID);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Warning(String),
        Blackout(String),
        Removed(String),
    }

    #[derive(Default)]
    struct RecordingSink {
        calls: PlMutex<Vec<Call>>,
    }

    impl OverlaySink for RecordingSink {
        fn show_warning(&self, id: &str, _message: &str) {
            self.calls.lock().push(Call::Warning(id.to_string()));
        }

        fn show_blackout(&self, id: &str, _opacity: f32) {
            self.calls.lock().push(Call::Blackout(id.to_string()));
        }

        fn remove(&self, id: &str) {
            self.calls.lock().push(Call::Removed(id.to_string()));
        }
    }

    #[test]
    fn test_fire_without_runtime_still_shows_overlays() {
        let sink = Arc::new(RecordingSink::default());
        let reactor = OverlayReactor::new(sink.clone(), &DetectorConfig::default());

        reactor.fire();

        let calls = sink.calls.lock();
        assert!(calls.contains(&Call::Warning(WARNING_ELEMENT_ID.to_string())));
        assert!(calls.contains(&Call::Blackout(BLACKSCREEN_ELEMENT_ID.to_string())));
    }

    #[test]
    fn test_clear_removes_both_elements() {
        let sink = Arc::new(RecordingSink::default());
        let reactor = OverlayReactor::new(sink.clone(), &DetectorConfig::default());

        reactor.clear();

        let calls = sink.calls.lock();
        assert!(calls.contains(&Call::Removed(WARNING_ELEMENT_ID.to_string())));
        assert!(calls.contains(&Call::Removed(BLACKSCREEN_ELEMENT_ID.to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlays_auto_expire() {
        let sink = Arc::new(RecordingSink::default());
        let reactor = OverlayReactor::new(sink.clone(), &DetectorConfig::default());

        reactor.fire();

        // warning expires at 8s, blackout at 10s
        tokio::time::sleep(Duration::from_millis(8100)).await;
        tokio::task::yield_now().await;
        assert!(sink
            .calls
            .lock()
            .contains(&Call::Removed(WARNING_ELEMENT_ID.to_string())));
        assert!(!sink
            .calls
            .lock()
            .contains(&Call::Removed(BLACKSCREEN_ELEMENT_ID.to_string())));

        tokio::time::sleep(Duration::from_millis(2000)).await;
        tokio::task::yield_now().await;
        assert!(sink
            .calls
            .lock()
            .contains(&Call::Removed(BLACKSCREEN_ELEMENT_ID.to_string())));
    }
}
