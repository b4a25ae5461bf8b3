//! RecGuard - screen recording suspicion detection engine.
//!
//! A continuously sampled, multi-signal scoring system estimating whether
//! the current session is being screen-captured. Five samplers feed an
//! adaptively weighted aggregate; a rolling history plus a three-way gate
//! suppress one-off spikes; a confirmed detection emits an event and raises
//! transient warning overlays. Host capabilities are traits, so the engine
//! runs anywhere a high-resolution timer exists.

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod host;
pub mod logic;

pub use config::{DetectorConfig, WeightTable};
pub use error::{CaptureError, DetectorError, DetectorResult};
pub use host::{
    CaptureBackend, CaptureSession, DeniedCaptureBackend, Host, MemoryProbe, NetworkProbe,
    OverlaySink,
};
pub use logic::baseline::{DevicePerformanceLevel, EffectiveConnectionType, PerformanceBaseline};
pub use logic::detector::{DisplayCaptureAdapter, RecordingDetector};
pub use logic::events::OS_RECORDING_DETECTED;
pub use logic::shield::{NoiseFrame, NoiseShield};
pub use logic::signals::SuspicionMetrics;
