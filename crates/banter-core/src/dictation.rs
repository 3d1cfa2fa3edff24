// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
//! Dictation capture: an `Idle ⇄ Listening` toggle over a pluggable speech
//! recognizer.
//!
//! The recognizer is a seam — whatever platform facility provides speech to
//! text sits behind [`SpeechRecognizer`] and reports
//! [`RecognitionEvent`]s over a channel.  Recognition is non-continuous: the
//! backend auto-stops after one utterance and reports `Ended`.
//!
//! While listening, the input-field text captured at start (captured once,
//! not re-read) is recomposed on every result event: finalized fragments
//! accumulate, the interim fragment is replaced until it finalizes.

use tokio::sync::mpsc;
use tracing::debug;

/// An event from the speech backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// The backend started capturing audio.
    Started,
    /// A recognition update.  `finalized` is committed text; `interim` is
    /// the current provisional tail and will be re-sent (possibly changed)
    /// until it finalizes.
    Result { interim: String, finalized: String },
    /// Recognition failed; capture stops.
    Error(String),
    /// The utterance finished; capture stops.
    Ended,
}

/// One-utterance speech capture.  `listen` starts a capture and returns the
/// event channel; the backend closes the channel after `Ended`.
pub trait SpeechRecognizer: Send + Sync {
    fn listen(&self, locale: &str) -> anyhow::Result<mpsc::Receiver<RecognitionEvent>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictationState {
    Idle,
    Listening,
}

/// Accumulates one dictation pass into the input field.
pub struct DictationCapture {
    state: DictationState,
    /// Input-field text at the moment dictation started.
    base: String,
    finalized: String,
    interim: String,
}

impl Default for DictationCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl DictationCapture {
    pub fn new() -> Self {
        Self {
            state: DictationState::Idle,
            base: String::new(),
            finalized: String::new(),
            interim: String::new(),
        }
    }

    pub fn is_listening(&self) -> bool {
        self.state == DictationState::Listening
    }

    /// Begin a pass, capturing the current input-field text once.
    pub fn start(&mut self, current_input: &str) {
        self.base = current_input.to_string();
        self.finalized.clear();
        self.interim.clear();
        self.state = DictationState::Listening;
    }

    /// Toggle off before the utterance ends.
    pub fn stop(&mut self) {
        self.state = DictationState::Idle;
    }

    /// Fold one backend event into the capture.  Returns the recomposed
    /// input-field text when it changed, `None` otherwise.
    pub fn apply(&mut self, event: &RecognitionEvent) -> Option<String> {
        if self.state != DictationState::Listening {
            return None;
        }
        match event {
            RecognitionEvent::Started => None,
            RecognitionEvent::Result { interim, finalized } => {
                self.finalized.push_str(finalized);
                self.interim = interim.clone();
                Some(self.composed())
            }
            RecognitionEvent::Error(e) => {
                debug!(error = %e, "speech recognition error");
                self.state = DictationState::Idle;
                None
            }
            RecognitionEvent::Ended => {
                // The final text already reached the input via the last
                // Result event.
                self.state = DictationState::Idle;
                None
            }
        }
    }

    /// Base text + space (when appending to existing text) + finalized
    /// fragments + current interim fragment.
    fn composed(&self) -> String {
        let prefix = if self.base.is_empty() {
            String::new()
        } else {
            format!("{} ", self.base)
        };
        format!("{prefix}{}{}", self.finalized, self.interim)
    }
}

/// A recognizer that shells out to a configured transcription command and
/// yields its stdout as one final transcript.  The locale is exported as
/// `BANTER_DICTATION_LOCALE` for the command to pick up.  Dropping the
/// event receiver kills the command.
pub struct CommandRecognizer {
    command: String,
}

impl CommandRecognizer {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn listen(&self, locale: &str) -> anyhow::Result<mpsc::Receiver<RecognitionEvent>> {
        let (tx, rx) = mpsc::channel(8);
        let command = self.command.clone();
        let locale = locale.to_string();
        tokio::spawn(async move {
            let _ = tx.send(RecognitionEvent::Started).await;
            let child = tokio::process::Command::new("sh")
                .arg("-c")
                .arg(&command)
                .env("BANTER_DICTATION_LOCALE", &locale)
                .stdin(std::process::Stdio::null())
                .stdout(std::process::Stdio::piped())
                .stderr(std::process::Stdio::piped())
                .kill_on_drop(true)
                .spawn();
            let child = match child {
                Ok(c) => c,
                Err(e) => {
                    let _ = tx.send(RecognitionEvent::Error(e.to_string())).await;
                    let _ = tx.send(RecognitionEvent::Ended).await;
                    return;
                }
            };
            // When the caller drops the receiver (dictation toggled off),
            // dropping the unfinished future kills the child.
            let result = tokio::select! {
                out = child.wait_with_output() => out,
                _ = tx.closed() => return,
            };
            match result {
                Ok(out) if out.status.success() => {
                    let transcript = String::from_utf8_lossy(&out.stdout).trim().to_string();
                    let _ = tx
                        .send(RecognitionEvent::Result {
                            interim: String::new(),
                            finalized: transcript,
                        })
                        .await;
                }
                Ok(out) => {
                    let _ = tx
                        .send(RecognitionEvent::Error(format!(
                            "transcriber exited with {}",
                            out.status
                        )))
                        .await;
                }
                Err(e) => {
                    let _ = tx.send(RecognitionEvent::Error(e.to_string())).await;
                }
            }
            let _ = tx.send(RecognitionEvent::Ended).await;
        });
        Ok(rx)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
