use super::platform::RecognizerConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for speech capture
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Recognition language tag
    pub language: String,

    /// Keep listening across pauses
    pub continuous: bool,

    /// Ask the recognizer for interim hypotheses (they are logged, never delivered)
    pub interim_results: bool,

    /// Pause between aborting a stale recognizer and retrying start
    pub restart_delay_ms: u64,

    /// Upper bound on a single voice answer before capture is stopped
    pub max_listen_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            continuous: true,
            interim_results: true,
            restart_delay_ms: 100,
            max_listen_secs: 30,
        }
    }
}

impl SpeechConfig {
    pub fn recognizer_config(&self) -> RecognizerConfig {
        RecognizerConfig {
            lang: self.language.clone(),
            continuous: self.continuous,
            interim_results: self.interim_results,
        }
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    pub fn max_listen(&self) -> Duration {
        Duration::from_secs(self.max_listen_secs)
    }
}
