// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("could not read file '{0}': {1}")]
    Io(String, #[source] std::io::Error),

    #[error("file too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("'{0}' is not an image file")]
    NotAnImage(String),
}
