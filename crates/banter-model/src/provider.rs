// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::{StreamEvent, Turn};

/// A finite, non-restartable stream of model output events.
pub type ChunkStream = Pin<Box<dyn Stream<Item = anyhow::Result<StreamEvent>> + Send>>;

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Human-readable provider name for status display.
    fn name(&self) -> &str;

    /// Model identifier as reported to users.
    fn model_name(&self) -> &str;

    /// Send the session so far and return a streaming response.
    ///
    /// `history` is the full ordered turn list, the last entry being the
    /// user turn to answer.  Failures surface as an `Err` return (request
    /// construction, session initialization) or as `Err` items mid-stream;
    /// both are caught at the controller boundary.
    async fn send_stream(
        &self,
        system_instruction: Option<&str>,
        history: &[Turn],
    ) -> anyhow::Result<ChunkStream>;
}
