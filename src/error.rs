//! Error handling

use thiserror::Error;

pub type DetectorResult<T> = Result<T, DetectorError>;

/// Detector lifecycle errors
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("detector is already running")]
    AlreadyRunning,

    #[error("detector is not running")]
    NotRunning,

    #[error("no tokio runtime available to drive the detection loop")]
    NoRuntime,
}

/// Errors surfaced to callers of the display-capture adapter
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CaptureError {
    /// Request short-circuited by an installed detection guard
    #[error("display capture blocked")]
    Blocked,

    /// No capture source exists on this host
    #[error("display capture unavailable")]
    Unavailable,
}
