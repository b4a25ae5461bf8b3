//! Central Configuration Constants
//!
//! Single source of truth for operational defaults. Tuning knobs that vary
//! between deployments live in `DetectorConfig`; everything here is either a
//! fixed identifier or an env-overridable runtime setting.

/// App name
pub const APP_NAME: &str = "RecGuard";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default detection tick interval (milliseconds)
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 300;

/// Default URL probed once at startup to estimate network round-trip time
pub const DEFAULT_NETWORK_PROBE_URL: &str = "https://www.gstatic.com/generate_204";

/// Warning overlay element id
pub const WARNING_ELEMENT_ID: &str = "os-recording-warning";

/// Obscuring overlay element id
pub const BLACKSCREEN_ELEMENT_ID: &str = "os-recording-blackscreen";

/// Opacity of the obscuring overlay
pub const BLACKSCREEN_OPACITY: f32 = 0.8;

/// Warning shown in the warning overlay (EN / FR / AR)
pub const WARNING_MESSAGE: &str = "SCREEN RECORDING DETECTED - this activity has been logged and reported. Unauthorized screen recording is strictly prohibited.\n\
ENREGISTREMENT D'ECRAN DETECTE - cette activite a ete journalisee et signalee. L'enregistrement d'ecran non autorise est strictement interdit.\n\
تم اكتشاف تسجيل الشاشة - تم تسجيل هذا النشاط والإبلاغ عنه. يمنع منعا باتا تسجيل الشاشة غير المصرح به.";

/// Iterations/ms above which a device is classified `High`
pub const HIGH_DEVICE_ITER_RATE: f64 = 20_000.0;

/// Iterations/ms above which a device is classified `Medium`
pub const MEDIUM_DEVICE_ITER_RATE: f64 = 5_000.0;

/// Round-trip time above which the network is flagged slow (ms)
pub const SLOW_NETWORK_RTT_MS: u32 = 100;

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get tick interval from environment or use default
pub fn get_tick_interval_ms() -> u64 {
    std::env::var("RECGUARD_TICK_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TICK_INTERVAL_MS)
}

/// Get network probe URL from environment or use default
pub fn get_network_probe_url() -> String {
    std::env::var("RECGUARD_NETWORK_PROBE_URL")
        .unwrap_or_else(|_| DEFAULT_NETWORK_PROBE_URL.to_string())
}

/// Check if the startup network probe is enabled
pub fn is_network_probe_enabled() -> bool {
    std::env::var("RECGUARD_NETWORK_PROBE")
        .map(|s| s.to_lowercase() != "false" && s != "0")
        .unwrap_or(true)
}
