use super::config::SpeechConfig;
use super::error::SpeechError;
use super::platform::{
    detect_recognizer, final_transcript, EventSink, PlatformError, RecognitionEvent, Recognizer,
    RecognizerFactory, SpeechHost,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Receives each finalized transcript
pub type ResultCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Receives platform and controller errors
pub type ErrorCallback = Arc<dyn Fn(&SpeechError) + Send + Sync>;

/// Start/stop toggle over a continuous speech recognizer
///
/// Only finalized text reaches `on_result`. Once the controller is told to
/// stop (or shut down, or switch language), no callback of the previous
/// recognizer runs again.
///
/// Recognizers are wired to a dispatch task, so `start_listening` and
/// `set_language` must be called from within a Tokio runtime.
pub struct SpeechCaptureController {
    /// Capture session identifier for logging
    capture_id: String,

    /// Recognizer constructor found on the host, probed once
    factory: Option<Arc<dyn RecognizerFactory>>,

    config: SpeechConfig,

    on_result: ResultCallback,

    on_error: Option<ErrorCallback>,

    /// Shared with the dispatch task so end/error events can clear it
    is_listening: Arc<AtomicBool>,

    /// Current recognizer instance, kept for reuse after a natural end
    active: Option<ActiveRecognizer>,
}

/// A recognizer together with its registered handlers
struct ActiveRecognizer {
    recognizer: Box<dyn Recognizer>,
    attached: Arc<AtomicBool>,
    dispatch: JoinHandle<()>,
}

impl ActiveRecognizer {
    /// Unregister handlers; nothing emitted afterwards reaches the callbacks
    fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
        self.dispatch.abort();
    }
}

impl SpeechCaptureController {
    pub fn new(
        host: &dyn SpeechHost,
        config: SpeechConfig,
        on_result: impl Fn(String) + Send + Sync + 'static,
    ) -> Self {
        let capture_id = format!("capture-{}", uuid::Uuid::new_v4());
        let factory = detect_recognizer(host);

        debug!(
            "Created speech capture {} (lang={}, supported={})",
            capture_id,
            config.language,
            factory.is_some()
        );

        Self {
            capture_id,
            factory,
            config,
            on_result: Arc::new(on_result),
            on_error: None,
            is_listening: Arc::new(AtomicBool::new(false)),
            active: None,
        }
    }

    /// Register the error handler
    pub fn with_error_handler(
        mut self,
        on_error: impl Fn(&SpeechError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(on_error));
        self
    }

    pub fn capture_id(&self) -> &str {
        &self.capture_id
    }

    pub fn has_recognition_support(&self) -> bool {
        self.factory.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.is_listening.load(Ordering::SeqCst)
    }

    pub fn language(&self) -> &str {
        &self.config.language
    }

    /// Start capturing; a no-op while already listening
    ///
    /// If the platform reports the recognizer is already active, the stale
    /// instance is aborted and replaced once before `failed-to-restart` is
    /// reported.
    pub async fn start_listening(&mut self) {
        if self.is_listening() {
            debug!("Capture {} already listening", self.capture_id);
            return;
        }

        let Some(factory) = self.factory.clone() else {
            warn!("Cannot start capture {}: no recognizer available", self.capture_id);
            self.report(SpeechError::NotAvailable);
            return;
        };

        if self.active.is_none() {
            match self.attach(&factory) {
                Ok(active) => self.active = Some(active),
                Err(e) => {
                    error!("Failed to create recognizer: {}", e);
                    self.report(SpeechError::NotAvailable);
                    return;
                }
            }
        }

        // Set before the platform call: an end event raised while starting must win
        self.is_listening.store(true, Ordering::SeqCst);
        let started = match self.active.as_mut() {
            Some(active) => active.recognizer.start(),
            None => Err(PlatformError::Failed("recognizer missing".to_string())),
        };

        match started {
            Ok(()) => {
                info!("Capture {} listening ({})", self.capture_id, self.config.language);
            }
            Err(PlatformError::InvalidState(reason)) => {
                self.is_listening.store(false, Ordering::SeqCst);
                warn!("Recognizer already active ({}), resetting instance", reason);
                self.restart(&factory).await;
            }
            Err(e) => {
                self.is_listening.store(false, Ordering::SeqCst);
                error!("Failed to start recognition: {}", e);
                self.report(SpeechError::FailedToStart);
            }
        }
    }

    /// Stop capturing; always ends with `is_listening() == false`
    pub fn stop_listening(&mut self) {
        match self.active.take() {
            Some(mut active) => {
                active.detach();
                match active.recognizer.stop() {
                    Ok(()) => info!("Capture {} stopped", self.capture_id),
                    Err(e) => {
                        warn!("Error stopping recognition, aborting instead: {}", e);
                        if let Err(e) = active.recognizer.abort() {
                            error!("Error aborting recognition: {}", e);
                        }
                    }
                }
            }
            None => debug!("Capture {} has no recognizer to stop", self.capture_id),
        }

        self.is_listening.store(false, Ordering::SeqCst);
    }

    /// Switch the recognition language
    ///
    /// An existing recognizer is torn down and rebuilt; if it was listening
    /// the new one is started straight away.
    pub fn set_language(&mut self, language: impl Into<String>) {
        let language = language.into();
        if language == self.config.language {
            return;
        }

        info!(
            "Capture {} language {} -> {}",
            self.capture_id, self.config.language, language
        );
        self.config.language = language;

        let Some(mut previous) = self.active.take() else {
            return;
        };
        let was_listening = self.is_listening();

        previous.detach();
        if was_listening {
            if let Err(e) = previous.recognizer.stop() {
                warn!("Error stopping recognition before recreating: {}", e);
            }
        }
        drop(previous);

        let Some(factory) = self.factory.clone() else {
            self.is_listening.store(false, Ordering::SeqCst);
            return;
        };

        match self.attach(&factory) {
            Ok(mut active) => {
                if was_listening {
                    self.is_listening.store(true, Ordering::SeqCst);
                    if let Err(e) = active.recognizer.start() {
                        error!("Error restarting recognition after language change: {}", e);
                        self.is_listening.store(false, Ordering::SeqCst);
                    }
                }
                self.active = Some(active);
            }
            Err(e) => {
                error!("Failed to recreate recognizer: {}", e);
                self.is_listening.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Release the recognizer; called automatically on drop
    pub fn shutdown(&mut self) {
        if let Some(mut active) = self.active.take() {
            debug!("Cleaning up capture {}", self.capture_id);
            active.detach();
            if self.is_listening() {
                if let Err(e) = active.recognizer.stop() {
                    warn!("Error stopping recognition during cleanup: {}", e);
                }
            }
        }
        self.is_listening.store(false, Ordering::SeqCst);
    }

    async fn restart(&mut self, factory: &Arc<dyn RecognizerFactory>) {
        if let Some(mut stale) = self.active.take() {
            stale.detach();
            if let Err(e) = stale.recognizer.abort() {
                warn!("Error aborting stale recognizer: {}", e);
            }
        }

        tokio::time::sleep(self.config.restart_delay()).await;

        let mut active = match self.attach(factory) {
            Ok(active) => active,
            Err(e) => {
                error!("Error recreating recognizer: {}", e);
                self.is_listening.store(false, Ordering::SeqCst);
                self.report(SpeechError::FailedToRestart);
                return;
            }
        };

        self.is_listening.store(true, Ordering::SeqCst);
        match active.recognizer.start() {
            Ok(()) => {
                info!("Capture {} listening after restart", self.capture_id);
            }
            Err(e) => {
                self.is_listening.store(false, Ordering::SeqCst);
                error!("Error restarting recognition: {}", e);
                self.report(SpeechError::FailedToRestart);
            }
        }
        self.active = Some(active);
    }

    /// Build a recognizer and register its handlers
    fn attach(&self, factory: &Arc<dyn RecognizerFactory>) -> Result<ActiveRecognizer, PlatformError> {
        let (sink, events) = EventSink::channel();
        let recognizer = factory.create(&self.config.recognizer_config(), sink)?;
        let attached = Arc::new(AtomicBool::new(true));

        let dispatch = tokio::spawn(dispatch_events(
            events,
            Arc::clone(&attached),
            Arc::clone(&self.is_listening),
            Arc::clone(&self.on_result),
            self.on_error.clone(),
            self.capture_id.clone(),
        ));

        debug!("Initialized {} recognizer for {}", factory.name(), self.capture_id);

        Ok(ActiveRecognizer {
            recognizer,
            attached,
            dispatch,
        })
    }

    fn report(&self, err: SpeechError) {
        if let Some(on_error) = &self.on_error {
            on_error(&err);
        }
    }
}

impl Drop for SpeechCaptureController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Consume one recognizer's events in order and invoke the callbacks
async fn dispatch_events(
    mut events: mpsc::UnboundedReceiver<RecognitionEvent>,
    attached: Arc<AtomicBool>,
    is_listening: Arc<AtomicBool>,
    on_result: ResultCallback,
    on_error: Option<ErrorCallback>,
    capture_id: String,
) {
    while let Some(event) = events.recv().await {
        if !attached.load(Ordering::SeqCst) {
            break;
        }

        match event {
            RecognitionEvent::Result {
                result_index,
                results,
            } => {
                if let Some(text) = final_transcript(result_index, &results) {
                    on_result(text);
                }
            }
            RecognitionEvent::Error { error, message } => {
                error!("Recognition error on {}: {} {}", capture_id, error, message);
                let err = SpeechError::Platform(error);
                if let Some(on_error) = &on_error {
                    on_error(&err);
                }
                if err.is_fatal() {
                    is_listening.store(false, Ordering::SeqCst);
                }
            }
            RecognitionEvent::End => {
                info!("Recognition ended on {}", capture_id);
                is_listening.store(false, Ordering::SeqCst);
            }
            RecognitionEvent::Start => debug!("Recognition started"),
            RecognitionEvent::AudioStart => debug!("Audio capturing started"),
            RecognitionEvent::AudioEnd => debug!("Audio capturing ended"),
            RecognitionEvent::SpeechStart => debug!("Speech detected"),
            RecognitionEvent::SpeechEnd => debug!("Speech ended"),
        }
    }

    debug!("Event dispatch for {} finished", capture_id);
}
