use thiserror::Error;

/// Error identifiers that mean the platform will not recover without user action
pub const FATAL_PLATFORM_ERRORS: [&str; 2] = ["not-allowed", "service-not-allowed"];

/// Error reported to the caller's error handler
///
/// `Display` yields the bare identifier so callers can match on it the same
/// way for platform and controller errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    /// Identifier reported by the platform, passed through as-is
    #[error("{0}")]
    Platform(String),

    /// The recognizer could not be started
    #[error("failed-to-start")]
    FailedToStart,

    /// Start failed again after the stale recognizer was replaced
    #[error("failed-to-restart")]
    FailedToRestart,

    /// No recognizer instance could be obtained
    #[error("not-available")]
    NotAvailable,
}

impl SpeechError {
    pub fn code(&self) -> &str {
        match self {
            SpeechError::Platform(code) => code,
            SpeechError::FailedToStart => "failed-to-start",
            SpeechError::FailedToRestart => "failed-to-restart",
            SpeechError::NotAvailable => "not-available",
        }
    }

    /// Whether listening must end immediately
    pub fn is_fatal(&self) -> bool {
        matches!(self, SpeechError::Platform(code) if FATAL_PLATFORM_ERRORS.contains(&code.as_str()))
    }
}
