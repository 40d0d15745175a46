//! Answer composition shared by the practice commands
//!
//! Voice input is merged into an [`AnswerDraft`] the same way typed input is,
//! so the rest of a command does not care where the answer came from.

use crate::speech::{SpeechCaptureController, SpeechConfig, SpeechError, SpeechHost};
use anyhow::{bail, Result};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// How often the capture loop checks whether the recognizer ended on its own
const LISTEN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The answer being composed before it is submitted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerDraft {
    text: String,
}

impl AnswerDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the draft with typed text
    pub fn set_typed(&mut self, text: &str) {
        self.text = text.trim().to_string();
    }

    /// Merge one finalized transcript; utterances are joined with a space
    pub fn apply_transcript(&mut self, transcript: &str) {
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(transcript);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// The answer, or `None` if nothing was entered
    pub fn into_answer(self) -> Option<String> {
        if self.is_blank() {
            None
        } else {
            Some(self.text)
        }
    }
}

/// Listen on `host` until the recognizer ends, an unrecoverable error is
/// reported, or `config.max_listen_secs` passes
pub async fn capture_voice_answer(host: &dyn SpeechHost, config: SpeechConfig) -> Result<Option<String>> {
    let (text_tx, mut text_rx) = mpsc::unbounded_channel::<String>();
    let (err_tx, mut err_rx) = mpsc::unbounded_channel::<SpeechError>();
    let max_listen = config.max_listen();

    let mut controller = SpeechCaptureController::new(host, config, move |text| {
        let _ = text_tx.send(text);
    })
    .with_error_handler(move |err| {
        let _ = err_tx.send(err.clone());
    });

    if !controller.has_recognition_support() {
        bail!("Speech recognition is not available on this host");
    }

    controller.start_listening().await;

    let mut draft = AnswerDraft::new();
    let deadline = tokio::time::sleep(max_listen);
    tokio::pin!(deadline);
    let mut poll = tokio::time::interval(LISTEN_POLL_INTERVAL);

    loop {
        tokio::select! {
            Some(text) = text_rx.recv() => {
                info!("Heard: {}", text);
                draft.apply_transcript(&text);
            }
            Some(err) = err_rx.recv() => {
                warn!("Speech recognition error: {}", err);
                if !matches!(err, SpeechError::Platform(_)) || err.is_fatal() {
                    break;
                }
            }
            _ = &mut deadline => {
                info!("Listening limit of {:?} reached", max_listen);
                break;
            }
            _ = poll.tick() => {
                if !controller.is_listening() {
                    break;
                }
            }
        }
    }

    controller.stop_listening();

    // Transcripts dispatched before the stop are still queued
    while let Ok(text) = text_rx.try_recv() {
        draft.apply_transcript(&text);
    }

    Ok(draft.into_answer())
}
