//! RecGuard daemon - wires system capabilities to the detection engine.

use std::sync::Arc;

use recguard::api::hooks;
use recguard::constants::{self, APP_NAME, APP_VERSION};
use recguard::{
    DeniedCaptureBackend, DetectorConfig, DisplayCaptureAdapter, Host, NoiseShield,
    RecordingDetector,
};

/// Shield frame cadence for the headless renderer
const SHIELD_FPS: u32 = 30;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{}...", APP_NAME, APP_VERSION);

    let host = Host::system();
    let overlay = Arc::clone(&host.overlay);
    let capture = Arc::new(DisplayCaptureAdapter::new(Arc::new(DeniedCaptureBackend)));

    let config = DetectorConfig {
        tick_interval_ms: constants::get_tick_interval_ms(),
        ..DetectorConfig::default()
    };

    let detector = RecordingDetector::new(config, host, capture);
    detector.on_detection(|metrics| {
        log::warn!(
            "🚨 os-recording-detected event: score {:.0}%",
            metrics.suspicion_score * 100.0
        );
    });

    if let Err(e) = detector.start() {
        log::error!("failed to start detector: {}", e);
        return;
    }
    hooks::install(&detector);

    // passive degradation layer alongside active detection
    let shield = NoiseShield::new(1920, 1080);
    let shield_task = tokio::spawn(shield.run(overlay, SHIELD_FPS));

    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("shutdown signal received"),
        Err(e) => log::error!("failed to listen for shutdown signal: {}", e),
    }

    shield_task.abort();
    hooks::uninstall();
    if let Err(e) = detector.stop() {
        log::warn!("detector stop: {}", e);
    }
}
