// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

// ─── Attachment ──────────────────────────────────────────────────────────────

/// An image payload attached to an outbound message.
///
/// Serialises in the Gemini inline-data wire casing
/// (`{"mimeType": ..., "data": ...}`).  `data` is the bare base64 string,
/// never a `data:` URL.  Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub mime_type: String,
    pub data: String,
}

impl Attachment {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self { mime_type: mime_type.into(), data: data.into() }
    }
}

// ─── Conversation turns ──────────────────────────────────────────────────────

/// One content part of a turn: plain text or inline image data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Attachment,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn inline_data(att: Attachment) -> Self {
        Self::InlineData { inline_data: att }
    }

    /// The text content, if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::InlineData { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

/// A single turn in the session history, in the multimodal wire shape:
/// the text part first, then one inline-data part per attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: TurnRole::User, parts: vec![Part::text(text)] }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: TurnRole::Model, parts: vec![Part::text(text)] }
    }

    /// A user turn carrying text plus inline attachments, text part first.
    pub fn user_with_attachments(text: impl Into<String>, attachments: &[Attachment]) -> Self {
        let mut parts = vec![Part::text(text)];
        parts.extend(attachments.iter().cloned().map(Part::inline_data));
        Self { role: TurnRole::User, parts }
    }

    /// Concatenated text of all text parts.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(Part::as_text).collect()
    }
}

// ─── Stream events ───────────────────────────────────────────────────────────

/// A single streamed event from the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// An incremental text fragment.
    TextDelta(String),
    /// The stream finished normally.
    Done,
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
