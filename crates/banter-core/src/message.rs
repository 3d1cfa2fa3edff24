// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
use banter_model::Attachment;
use chrono::{DateTime, Utc};

/// Opaque message identity.  Stable for the lifetime of the session; stream
/// chunks are routed to their message by id, never by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(uuid::Uuid);

impl MessageId {
    fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

/// One entry in the conversation display list.
///
/// `text` grows during streaming (the controller overwrites it with the full
/// accumulated buffer on every chunk); messages are never deleted within a
/// session.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub attachments: Vec<Attachment>,
    pub is_streaming: bool,
    pub is_error: bool,
}

impl Message {
    pub fn user(text: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
            attachments,
            is_streaming: false,
            is_error: false,
        }
    }

    /// A completed model message (welcome text, tests).
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Model,
            text: text.into(),
            timestamp: Utc::now(),
            attachments: Vec::new(),
            is_streaming: false,
            is_error: false,
        }
    }

    /// The empty placeholder appended before a model reply starts streaming.
    pub fn model_placeholder() -> Self {
        Self { is_streaming: true, ..Self::model("") }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = Message::user("a", Vec::new());
        let b = Message::user("a", Vec::new());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn placeholder_is_empty_and_streaming() {
        let m = Message::model_placeholder();
        assert_eq!(m.role, Role::Model);
        assert!(m.text.is_empty());
        assert!(m.is_streaming);
        assert!(!m.is_error);
    }

    #[test]
    fn user_message_carries_attachments() {
        let att = Attachment::new("image/png", "QQ==");
        let m = Message::user("look", vec![att.clone()]);
        assert_eq!(m.attachments, vec![att]);
        assert!(!m.is_streaming);
    }
}
