use super::platform::{
    EventSink, PlatformError, RecognitionEvent, Recognizer, RecognizerConfig, RecognizerFactory,
    SpeechHost, RECOGNITION_CAPABILITY_NAMES,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// One step of a recorded recognition session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Wait before emitting the event
    #[serde(default)]
    pub delay_ms: u64,

    pub event: RecognitionEvent,
}

/// Host that replays recorded recognition events
///
/// Stands in for a live speech engine on the terminal: each recognizer plays
/// the script from the top when started, then emits `End`.
#[derive(Clone)]
pub struct ScriptedHost {
    exposed_as: String,
    factory: Arc<ScriptedRecognizerFactory>,
}

impl ScriptedHost {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            exposed_as: RECOGNITION_CAPABILITY_NAMES[0].to_string(),
            factory: Arc::new(ScriptedRecognizerFactory {
                steps: Arc::new(steps),
            }),
        }
    }

    /// Load a JSON-lines script; blank lines and `#` comments are skipped
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read voice script {}", path.display()))?;

        let steps = parse_script(&raw)
            .with_context(|| format!("Invalid voice script {}", path.display()))?;

        info!("Loaded voice script {} ({} steps)", path.display(), steps.len());
        Ok(Self::new(steps))
    }

    /// Expose the recognizer under a different capability name
    pub fn exposed_as(mut self, name: impl Into<String>) -> Self {
        self.exposed_as = name.into();
        self
    }

    pub fn steps(&self) -> &[ScriptStep] {
        &self.factory.steps
    }
}

impl SpeechHost for ScriptedHost {
    fn capability(&self, name: &str) -> Option<Arc<dyn RecognizerFactory>> {
        if name == self.exposed_as {
            Some(self.factory.clone() as Arc<dyn RecognizerFactory>)
        } else {
            None
        }
    }
}

/// Parse JSON-lines script text
pub fn parse_script(raw: &str) -> Result<Vec<ScriptStep>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(n, line)| {
            serde_json::from_str::<ScriptStep>(line).with_context(|| format!("line {}", n + 1))
        })
        .collect()
}

struct ScriptedRecognizerFactory {
    steps: Arc<Vec<ScriptStep>>,
}

impl RecognizerFactory for ScriptedRecognizerFactory {
    fn create(
        &self,
        config: &RecognizerConfig,
        sink: EventSink,
    ) -> Result<Box<dyn Recognizer>, PlatformError> {
        Ok(Box::new(ScriptedRecognizer {
            steps: Arc::clone(&self.steps),
            config: config.clone(),
            sink,
            running: Arc::new(AtomicBool::new(false)),
            playback: None,
        }))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct ScriptedRecognizer {
    steps: Arc<Vec<ScriptStep>>,
    config: RecognizerConfig,
    sink: EventSink,
    running: Arc<AtomicBool>,
    playback: Option<JoinHandle<()>>,
}

impl ScriptedRecognizer {
    fn halt(&mut self) {
        if let Some(playback) = self.playback.take() {
            playback.abort();
        }
        if self.running.swap(false, Ordering::SeqCst) {
            self.sink.emit(RecognitionEvent::End);
        }
    }
}

impl Recognizer for ScriptedRecognizer {
    fn start(&mut self) -> Result<(), PlatformError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(PlatformError::InvalidState(
                "recognition has already started".to_string(),
            ));
        }

        let steps = Arc::clone(&self.steps);
        let sink = self.sink.clone();
        let running = Arc::clone(&self.running);
        let continuous = self.config.continuous;
        let interim_results = self.config.interim_results;

        debug!("Playing {} scripted steps (lang={})", steps.len(), self.config.lang);

        self.playback = Some(tokio::spawn(async move {
            sink.emit(RecognitionEvent::Start);

            for step in steps.iter() {
                if step.delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(step.delay_ms)).await;
                }

                let interim_only = matches!(
                    &step.event,
                    RecognitionEvent::Result { results, .. } if results.iter().all(|r| !r.is_final)
                );
                if interim_only && !interim_results {
                    continue;
                }
                let event = step.event.clone();

                let single_utterance_done = !continuous
                    && matches!(&event, RecognitionEvent::Result { results, .. } if results.iter().any(|r| r.is_final));

                if !sink.emit(event) {
                    break;
                }
                if single_utterance_done {
                    break;
                }
            }

            if running.swap(false, Ordering::SeqCst) {
                sink.emit(RecognitionEvent::End);
            }
        }));

        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlatformError> {
        self.halt();
        Ok(())
    }

    fn abort(&mut self) -> Result<(), PlatformError> {
        self.halt();
        Ok(())
    }
}

impl Drop for ScriptedRecognizer {
    fn drop(&mut self) {
        if let Some(playback) = self.playback.take() {
            playback.abort();
        }
    }
}
