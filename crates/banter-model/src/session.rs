// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
//! A chat session with an explicit lifecycle: construct it, pass it where it
//! is used, drop it when the conversation ends.  No module-level state.

use crate::{Attachment, ChatProvider, ChunkStream, Turn};

/// Owns one conversation context with a provider: the system instruction and
/// the ordered turn history.  The session records the user turn on send; the
/// caller commits the accumulated model reply with [`ChatSession::record_reply`]
/// once its stream has been fully consumed.
pub struct ChatSession {
    provider: Box<dyn ChatProvider>,
    system_instruction: Option<String>,
    history: Vec<Turn>,
}

impl ChatSession {
    pub fn new(provider: Box<dyn ChatProvider>, system_instruction: Option<String>) -> Self {
        Self { provider, system_instruction, history: Vec::new() }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Record the user turn and open a response stream for it.
    ///
    /// The returned stream is finite and not restartable.  On `Err` the user
    /// turn is still part of the history; the caller surfaces the failure as
    /// an errored conversation turn.
    pub async fn send_stream(
        &mut self,
        text: &str,
        attachments: &[Attachment],
    ) -> anyhow::Result<ChunkStream> {
        let turn = if attachments.is_empty() {
            Turn::user(text)
        } else {
            Turn::user_with_attachments(text, attachments)
        };
        self.history.push(turn);
        self.provider
            .send_stream(self.system_instruction.as_deref(), &self.history)
            .await
    }

    /// Commit a completed model reply to the history.
    pub fn record_reply(&mut self, text: &str) {
        self.history.push(Turn::model(text));
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
