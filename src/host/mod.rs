//! Host capability seams
//!
//! The engine observes its environment only through these traits, so every
//! capability can be absent (its sampler degrades to a zero contribution) or
//! stubbed out in tests. The high-resolution timer (`std::time::Instant`) is
//! the one capability assumed always present.

pub mod system;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::CaptureError;
use crate::logic::baseline::NetworkSample;
use crate::logic::shield::NoiseFrame;

/// Snapshot of heap occupancy
#[derive(Debug, Clone, Copy)]
pub struct HeapUsage {
    pub used_bytes: u64,
    pub limit_bytes: u64,
}

/// Read-only heap introspection
pub trait MemoryProbe: Send + Sync {
    /// `None` when the host exposes no heap introspection
    fn heap_usage(&self) -> Option<HeapUsage>;
}

/// Read-only network-information capability
pub trait NetworkProbe: Send + Sync {
    /// `None` when the link cannot be classified
    fn sample(&self) -> Option<NetworkSample>;
}

/// Handle returned by a granted display-capture request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl CaptureSession {
    pub fn begin() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }
}

/// The platform's display-capture entry point
pub trait CaptureBackend: Send + Sync {
    fn open(&self) -> Result<CaptureSession, CaptureError>;
}

/// Backend for hosts with no capture source at all
pub struct DeniedCaptureBackend;

impl CaptureBackend for DeniedCaptureBackend {
    fn open(&self) -> Result<CaptureSession, CaptureError> {
        Err(CaptureError::Unavailable)
    }
}

/// Render target for transient detection artifacts
pub trait OverlaySink: Send + Sync {
    /// Create or reveal the warning element for `id` (reuse if present)
    fn show_warning(&self, id: &str, message: &str);

    /// Create or reveal the obscuring element for `id` (reuse if present)
    fn show_blackout(&self, id: &str, opacity: f32);

    /// Remove the element for `id` if present
    fn remove(&self, id: &str);

    /// Apply one frame of shield noise
    fn apply_noise(&self, _frame: &NoiseFrame) {}
}

/// Memory probe for hosts without heap introspection
pub struct NullMemoryProbe;

impl MemoryProbe for NullMemoryProbe {
    fn heap_usage(&self) -> Option<HeapUsage> {
        None
    }
}

/// Network probe for hosts without a network-information capability
pub struct NullNetworkProbe;

impl NetworkProbe for NullNetworkProbe {
    fn sample(&self) -> Option<NetworkSample> {
        None
    }
}

/// Bundle of host capabilities handed to a detector
#[derive(Clone)]
pub struct Host {
    pub memory: Arc<dyn MemoryProbe>,
    pub network: Arc<dyn NetworkProbe>,
    pub overlay: Arc<dyn OverlaySink>,
}

impl Host {
    /// Production wiring: sysinfo heap probe, HTTP round-trip network probe,
    /// log-backed overlay sink.
    pub fn system() -> Self {
        let network: Arc<dyn NetworkProbe> = if crate::constants::is_network_probe_enabled() {
            Arc::new(system::HttpNetworkProbe::new(
                crate::constants::get_network_probe_url(),
            ))
        } else {
            Arc::new(NullNetworkProbe)
        };

        Self {
            memory: Arc::new(system::SysinfoMemoryProbe::new()),
            network,
            overlay: Arc::new(system::LogOverlay),
        }
    }

    /// Wiring with every optional capability absent
    pub fn detached() -> Self {
        Self {
            memory: Arc::new(NullMemoryProbe),
            network: Arc::new(NullNetworkProbe),
            overlay: Arc::new(system::LogOverlay),
        }
    }
}
