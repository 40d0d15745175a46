//! Speech capture
//!
//! This module wraps a host-provided continuous speech recognizer:
//! - Capability probing under the standard and vendor-prefixed names
//! - Recognizer and event contracts (`RecognizerFactory`, `Recognizer`, `EventSink`)
//! - `SpeechCaptureController`, the start/stop toggle delivering final text only
//! - `ScriptedHost`, which replays recorded recognition events

mod config;
mod controller;
mod error;
mod platform;
mod scripted;

pub use config::SpeechConfig;
pub use controller::{ErrorCallback, ResultCallback, SpeechCaptureController};
pub use error::{SpeechError, FATAL_PLATFORM_ERRORS};
pub use platform::{
    detect_recognizer, final_transcript, EventSink, NoSpeechHost, PlatformError,
    RecognitionAlternative, RecognitionEvent, RecognitionResult, Recognizer, RecognizerConfig,
    RecognizerFactory, SpeechHost, RECOGNITION_CAPABILITY_NAMES,
};
pub use scripted::{parse_script, ScriptStep, ScriptedHost};
