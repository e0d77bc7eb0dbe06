// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local fallback blob store.

use std::path::PathBuf;

use chrono::Utc;
use tokio::io::AsyncWriteExt;

use super::{sanitize_filename, BlobError, BlobStore};

/// URL scheme prefix recorded for locally kept evidence.
pub const LOCAL_URL_PREFIX: &str = "local://uploads/";

/// Attempts at finding a free `{millis}-{name}` slot.
const MAX_NAME_ATTEMPTS: i64 = 16;

/// Keeps evidence under the data directory's `uploads/` folder.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    uploads_dir: PathBuf,
}

impl LocalBlobStore {
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(
        &self,
        filename: &str,
        _content_type: &str,
        data: &[u8],
    ) -> Result<String, BlobError> {
        tokio::fs::create_dir_all(&self.uploads_dir).await?;

        let name = sanitize_filename(filename);
        let millis = Utc::now().timestamp_millis();

        for offset in 0..MAX_NAME_ATTEMPTS {
            let stored_name = format!("{}-{name}", millis + offset);
            let path = self.uploads_dir.join(&stored_name);

            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            file.write_all(data).await?;
            file.flush().await?;

            tracing::debug!(stored_name = %stored_name, size = data.len(), "Evidence stored locally");
            return Ok(format!("{LOCAL_URL_PREFIX}{stored_name}"));
        }

        Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "no free upload slot",
        )
        .into())
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn upload_writes_bytes_and_returns_local_reference() {
        let temp = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp.path().join("uploads"));

        let url = store.upload("scan.pdf", "application/pdf", b"%PDF-1.4").await.unwrap();
        assert!(url.starts_with(LOCAL_URL_PREFIX));
        assert!(url.ends_with("-scan.pdf"));

        let stored_name = url.trim_start_matches(LOCAL_URL_PREFIX);
        let bytes = std::fs::read(temp.path().join("uploads").join(stored_name)).unwrap();
        assert_eq!(bytes, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn same_name_twice_gets_distinct_slots() {
        let temp = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp.path());

        let first = store.upload("a.png", "image/png", b"1").await.unwrap();
        let second = store.upload("a.png", "image/png", b"2").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn hostile_filename_stays_inside_uploads() {
        let temp = TempDir::new().unwrap();
        let uploads = temp.path().join("uploads");
        let store = LocalBlobStore::new(&uploads);

        let url = store.upload("../../escape.png", "image/png", b"x").await.unwrap();
        let stored_name = url.trim_start_matches(LOCAL_URL_PREFIX);
        assert!(uploads.join(stored_name).exists());
        assert!(!temp.path().join("escape.png").exists());
    }
}
