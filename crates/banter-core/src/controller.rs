// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
//! The conversation controller and its streaming-merge policy.
//!
//! One model turn moves through `Pending → Streaming → {Completed, Errored}`.
//! Chunks are merged by concatenating onto an accumulation buffer and
//! overwriting the placeholder message's text with the *full* buffer — never
//! appending to the field — which matches the formatter's always-re-parse-
//! the-whole-string contract.

use tracing::warn;

use banter_model::Attachment;

use crate::{Message, MessageId, Role};

/// Fixed user-facing text shown when a turn fails.
pub const FAILURE_TEXT: &str = "Sorry, I encountered an error processing your request.";

/// The session-lifetime message list plus the state of the in-flight turn.
#[derive(Default)]
pub struct Conversation {
    messages: Vec<Message>,
    /// Accumulated reply text for the in-flight turn.
    buffer: String,
    /// Placeholder id of the in-flight turn, if one is streaming.
    streaming: Option<MessageId>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.is_some()
    }

    /// Text accumulated so far for the in-flight turn.
    pub fn partial_reply(&self) -> &str {
        &self.buffer
    }

    /// Seed the session-opening model message.
    pub fn push_welcome(&mut self, text: impl Into<String>) {
        self.messages.push(Message::model(text));
    }

    /// Start a model turn: append the user message and the empty streaming
    /// placeholder, and return the placeholder's id.
    ///
    /// Exactly one turn may be in flight; while one is streaming this
    /// returns `None` and changes nothing.  The UI also disables the send
    /// affordance, but the rule lives here so it holds regardless of the
    /// front end.
    pub fn begin_turn(
        &mut self,
        text: impl Into<String>,
        attachments: Vec<Attachment>,
    ) -> Option<MessageId> {
        if self.streaming.is_some() {
            warn!("send rejected: a turn is already streaming");
            return None;
        }
        self.messages.push(Message::user(text, attachments));
        let placeholder = Message::model_placeholder();
        let id = placeholder.id;
        self.messages.push(placeholder);
        self.buffer.clear();
        self.streaming = Some(id);
        Some(id)
    }

    /// Merge one stream chunk: concatenate onto the buffer, then overwrite
    /// the placeholder's text with the full accumulated value.
    ///
    /// Chunks addressed to anything but the in-flight turn are dropped —
    /// this is what makes late deltas after a stop harmless.
    pub fn apply_delta(&mut self, id: MessageId, chunk: &str) {
        if self.streaming != Some(id) {
            return;
        }
        self.buffer.push_str(chunk);
        let full = self.buffer.clone();
        if let Some(msg) = self.find_mut(id) {
            msg.text = full;
        }
    }

    /// The stream finished normally.
    pub fn complete_turn(&mut self, id: MessageId) {
        if self.streaming != Some(id) {
            return;
        }
        self.streaming = None;
        if let Some(msg) = self.find_mut(id) {
            msg.is_streaming = false;
        }
    }

    /// The stream failed: replace the text with the fixed failure string and
    /// flag the message.  Session-initialization failures land here too.
    pub fn fail_turn(&mut self, id: MessageId) {
        if self.streaming == Some(id) {
            self.streaming = None;
        }
        if let Some(msg) = self.find_mut(id) {
            msg.text = FAILURE_TEXT.into();
            msg.is_error = true;
            msg.is_streaming = false;
        }
    }

    /// User-initiated stop.  Clears the streaming flag on the trailing model
    /// message only if it is the one currently streaming; accumulated text
    /// is kept.  Returns whether anything changed — `false` means no turn
    /// was in flight and the message list is untouched.
    pub fn stop(&mut self) -> bool {
        let Some(id) = self.streaming else {
            return false;
        };
        let trailing_is_streaming = matches!(
            self.messages.last(),
            Some(m) if m.id == id && m.role == Role::Model && m.is_streaming
        );
        if !trailing_is_streaming {
            return false;
        }
        self.streaming = None;
        if let Some(msg) = self.find_mut(id) {
            msg.is_streaming = false;
        }
        true
    }

    fn find_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
