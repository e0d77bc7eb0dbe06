// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Evidence Blob Store
//!
//! Uploads evidence bytes and hands back a URL for the report to keep.
//! Two backends exist:
//!
//! - [`CloudinaryBlobStore`] when `CLOUDINARY_*` is fully configured
//! - [`LocalBlobStore`] otherwise, keeping the bytes under `uploads/` and
//!   returning a `local://uploads/...` reference
//!
//! A failed upload is an `Err`; the caller decides whether to skip the file.

pub mod cloudinary;
pub mod local;

pub use cloudinary::{CloudinaryBlobStore, CloudinaryConfig};
pub use local::LocalBlobStore;

/// Folder evidence is grouped under.
pub const EVIDENCE_FOLDER: &str = "evidence";

/// Errors raised by blob store backends.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// Writing to local storage failed
    #[error("local storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level failure talking to the remote store
    #[error("upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote store answered but refused the upload
    #[error("upload rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The remote store answered with something unexpected
    #[error("unexpected upload response: {0}")]
    InvalidResponse(String),
}

/// Storage for evidence files.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload one file and return the URL to record.
    async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, BlobError>;

    /// Backend name, for logs and health output.
    fn backend(&self) -> &'static str;
}

/// Reduce a client-supplied filename to a safe single path component.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// File stem used as the remote public id.
pub fn file_stem(filename: &str) -> &str {
    filename.split('.').next().unwrap_or(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories_and_odd_characters() {
        assert_eq!(sanitize_filename("photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\scan 1.pdf"), "scan_1.pdf");
        assert_eq!(sanitize_filename(".hidden.png"), "hidden.png");
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename("..."), "file");
    }

    #[test]
    fn stem_is_text_before_first_dot() {
        assert_eq!(file_stem("clip.final.mp4"), "clip");
        assert_eq!(file_stem("noext"), "noext");
    }
}
