use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Names under which a host may expose its speech recognizer, in probe order
pub const RECOGNITION_CAPABILITY_NAMES: [&str; 2] = ["SpeechRecognition", "webkitSpeechRecognition"];

/// Error raised synchronously by a platform recognizer operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The recognizer is already running (a stale instance holds the microphone)
    #[error("recognizer is in an invalid state: {0}")]
    InvalidState(String),

    #[error("recognizer operation failed: {0}")]
    Failed(String),
}

/// Recognizer settings applied at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// BCP 47 language tag, e.g. "en-US"
    pub lang: String,

    /// Keep listening across pauses instead of stopping after one utterance
    pub continuous: bool,

    /// Emit non-final hypotheses while the user is still speaking
    pub interim_results: bool,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            lang: "en-US".to_string(),
            continuous: true,
            interim_results: true,
        }
    }
}

/// One recognition hypothesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionAlternative {
    pub transcript: String,
    #[serde(default)]
    pub confidence: f32,
}

/// One segment of a result list, with its alternatives best-first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub is_final: bool,
    pub alternatives: Vec<RecognitionAlternative>,
}

impl RecognitionResult {
    pub fn final_text(text: impl Into<String>) -> Self {
        Self::single(text, true)
    }

    pub fn interim_text(text: impl Into<String>) -> Self {
        Self::single(text, false)
    }

    fn single(text: impl Into<String>, is_final: bool) -> Self {
        Self {
            is_final,
            alternatives: vec![RecognitionAlternative {
                transcript: text.into(),
                confidence: 1.0,
            }],
        }
    }

    /// Transcript of the best alternative, empty when there is none
    pub fn transcript(&self) -> &str {
        self.alternatives
            .first()
            .map(|alt| alt.transcript.as_str())
            .unwrap_or("")
    }
}

/// Event emitted by a platform recognizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RecognitionEvent {
    /// The full result list so far; entries before `result_index` were
    /// already reported in earlier events
    Result {
        result_index: usize,
        results: Vec<RecognitionResult>,
    },

    /// Platform error, identifiers like "not-allowed" or "network"
    Error {
        error: String,
        #[serde(default)]
        message: String,
    },

    /// Recognition ended (naturally, or after stop)
    End,

    Start,
    AudioStart,
    AudioEnd,
    SpeechStart,
    SpeechEnd,
}

/// Concatenate the final segments of `results[result_index..]`
///
/// Returns `None` when no final text is present in the new range.
pub fn final_transcript(result_index: usize, results: &[RecognitionResult]) -> Option<String> {
    let fresh = results.get(result_index..).unwrap_or(&[]);

    let mut text = String::new();
    for result in fresh {
        if result.is_final {
            text.push_str(result.transcript());
            debug!("Final transcript: {:?}", text);
        } else {
            debug!("Interim transcript: {:?}", result.transcript());
        }
    }

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Handle through which a platform recognizer reports events
///
/// Events are delivered in emission order to the single listener registered
/// by the controller. Once the controller detaches, emits are dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<RecognitionEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RecognitionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emit an event; returns false when no listener is attached any more
    pub fn emit(&self, event: RecognitionEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn is_attached(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// A live recognizer instance
pub trait Recognizer: Send {
    /// Begin capturing; fails with `InvalidState` if already running
    fn start(&mut self) -> Result<(), PlatformError>;

    /// Stop capturing and flush pending results, then emit `End`
    fn stop(&mut self) -> Result<(), PlatformError>;

    /// Stop immediately, discarding pending results
    fn abort(&mut self) -> Result<(), PlatformError>;
}

/// Constructor for recognizer instances (the host's recognizer class)
pub trait RecognizerFactory: Send + Sync {
    fn create(
        &self,
        config: &RecognizerConfig,
        sink: EventSink,
    ) -> Result<Box<dyn Recognizer>, PlatformError>;

    /// Implementation name for logging
    fn name(&self) -> &str;
}

/// Host environment that may expose speech-recognition capabilities by name
pub trait SpeechHost: Send + Sync {
    fn capability(&self, name: &str) -> Option<Arc<dyn RecognizerFactory>>;
}

/// Host with no speech capability at all
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSpeechHost;

impl SpeechHost for NoSpeechHost {
    fn capability(&self, _name: &str) -> Option<Arc<dyn RecognizerFactory>> {
        None
    }
}

/// Probe the host under each known capability name
pub fn detect_recognizer(host: &dyn SpeechHost) -> Option<Arc<dyn RecognizerFactory>> {
    for name in RECOGNITION_CAPABILITY_NAMES {
        if let Some(factory) = host.capability(name) {
            info!("Speech recognition supported via {} ({})", name, factory.name());
            return Some(factory);
        }
    }

    info!("Speech recognition is not supported by this host");
    None
}
