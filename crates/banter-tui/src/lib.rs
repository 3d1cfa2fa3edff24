// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
//! Terminal front end: the chat view, the input line, slash commands and the
//! event loop that drives a [`banter_model::ChatSession`].
mod app;
mod commands;
mod render;

pub use app::App;
pub use render::{conversation_lines, message_lines};
