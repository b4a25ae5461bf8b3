//! System-backed host capabilities

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use sysinfo::System;

use super::{HeapUsage, MemoryProbe, NetworkProbe, OverlaySink};
use crate::logic::baseline::{EffectiveConnectionType, NetworkSample};

/// Probe timeout for the startup RTT measurement
const PROBE_TIMEOUT_SECS: u64 = 2;

/// Heap introspection via sysinfo
pub struct SysinfoMemoryProbe {
    system: Mutex<System>,
}

impl SysinfoMemoryProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SysinfoMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SysinfoMemoryProbe {
    fn heap_usage(&self) -> Option<HeapUsage> {
        let mut system = self.system.lock();
        system.refresh_memory();

        let limit_bytes = system.total_memory();
        if limit_bytes == 0 {
            return None;
        }

        Some(HeapUsage {
            used_bytes: system.used_memory(),
            limit_bytes,
        })
    }
}

/// Network classification from one timed HTTP round trip.
///
/// Effective-type bands follow the Network Information API RTT table.
pub struct HttpNetworkProbe {
    url: String,
}

impl HttpNetworkProbe {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

impl NetworkProbe for HttpNetworkProbe {
    fn sample(&self) -> Option<NetworkSample> {
        let started = Instant::now();
        let result = ureq::head(&self.url)
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .call();

        match result {
            Ok(_) => {
                let rtt_ms = started.elapsed().as_millis() as u32;
                Some(NetworkSample {
                    effective_type: classify_rtt(rtt_ms),
                    rtt_ms,
                })
            }
            Err(e) => {
                log::debug!("network probe failed ({}): {}", self.url, e);
                None
            }
        }
    }
}

/// Map a measured round-trip time onto an effective connection type
pub(crate) fn classify_rtt(rtt_ms: u32) -> EffectiveConnectionType {
    match rtt_ms {
        0..=270 => EffectiveConnectionType::FourG,
        271..=1400 => EffectiveConnectionType::ThreeG,
        1401..=2700 => EffectiveConnectionType::TwoG,
        _ => EffectiveConnectionType::Slow2g,
    }
}

/// Overlay sink that renders through the log.
///
/// Embedders with a real surface provide their own `OverlaySink`; this one
/// keeps headless deployments observable.
pub struct LogOverlay;

impl OverlaySink for LogOverlay {
    fn show_warning(&self, id: &str, message: &str) {
        let headline = message.lines().next().unwrap_or(message);
        log::warn!("overlay [{}] shown: {}", id, headline);
    }

    fn show_blackout(&self, id: &str, opacity: f32) {
        log::warn!("overlay [{}] shown at opacity {:.1}", id, opacity);
    }

    fn remove(&self, id: &str) {
        log::debug!("overlay [{}] removed", id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rtt_bands() {
        assert_eq!(classify_rtt(0), EffectiveConnectionType::FourG);
        assert_eq!(classify_rtt(270), EffectiveConnectionType::FourG);
        assert_eq!(classify_rtt(271), EffectiveConnectionType::ThreeG);
        assert_eq!(classify_rtt(1400), EffectiveConnectionType::ThreeG);
        assert_eq!(classify_rtt(2700), EffectiveConnectionType::TwoG);
        assert_eq!(classify_rtt(9999), EffectiveConnectionType::Slow2g);
    }

    #[test]
    fn test_sysinfo_probe_reports_heap() {
        let probe = SysinfoMemoryProbe::new();
        let usage = probe.heap_usage().expect("host exposes memory");
        assert!(usage.limit_bytes > 0);
        assert!(usage.used_bytes <= usage.limit_bytes);
    }
}
