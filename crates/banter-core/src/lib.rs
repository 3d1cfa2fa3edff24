// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
//! Conversation state for banter: the message list and its streaming-merge
//! policy, the incremental markdown formatter, and dictation capture.

mod message;
mod formatter;
mod controller;
mod dictation;

pub use message::{Message, MessageId, Role};
pub use formatter::{format_text, Segment};
pub use controller::{Conversation, FAILURE_TEXT};
pub use dictation::{
    CommandRecognizer, DictationCapture, DictationState, RecognitionEvent, SpeechRecognizer,
};
