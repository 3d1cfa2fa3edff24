// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
//! Attachment encoding for banter.
//!
//! Converts a selected image file into the base64 payload + MIME type pair
//! that is embedded inline in multimodal API requests.  Validation happens
//! here, before anything reaches the conversation: files over the size cap
//! and files that are not images are rejected, and the caller reports the
//! error as a user-facing notice without touching the message list.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};

pub use error::AttachmentError;

mod error;

/// Default attachment size cap: 10 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// An image file validated and encoded for inline transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAttachment {
    /// MIME type, e.g. `"image/png"` or `"image/jpeg"`.
    pub mime_type: String,
    /// Base64 payload, without any `data:` URL prefix.
    pub data: String,
}

/// Validate and encode the image file at `path`.
///
/// Rejects files larger than `max_bytes` and files whose content is not a
/// recognised image format.  Format detection sniffs the bytes first and
/// falls back to the file extension, so a `.png` that is really a JPEG is
/// still tagged correctly.
pub fn encode_file(path: &Path, max_bytes: u64) -> Result<EncodedAttachment, AttachmentError> {
    let meta = std::fs::metadata(path)
        .map_err(|e| AttachmentError::Io(path.display().to_string(), e))?;
    if meta.len() > max_bytes {
        return Err(AttachmentError::TooLarge { size: meta.len(), max: max_bytes });
    }

    let raw = std::fs::read(path).map_err(|e| AttachmentError::Io(path.display().to_string(), e))?;

    let fmt = image::guess_format(&raw)
        .ok()
        .or_else(|| {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            image::ImageFormat::from_extension(ext)
        })
        .ok_or_else(|| AttachmentError::NotAnImage(path.display().to_string()))?;

    Ok(EncodedAttachment {
        mime_type: fmt.to_mime_type().to_string(),
        data: B64.encode(&raw),
    })
}

/// Return whether the given file extension belongs to a supported image format.
pub fn is_image_extension(ext: &str) -> bool {
    matches!(
        ext.to_lowercase().as_str(),
        "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" | "tiff" | "tif"
    )
}

// ─── Tests ────────────────────────────────────────────────────────────────────
