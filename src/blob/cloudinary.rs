// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cloudinary blob store (signed upload API).

use std::time::Duration;

use chrono::Utc;
use reqwest::{multipart, Client};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::{file_stem, sanitize_filename, BlobError, BlobStore, EVIDENCE_FOLDER};

const DEFAULT_API_BASE_URL: &str = "https://api.cloudinary.com";

/// Placeholder cloud name used in sample env files; never a real account.
const PLACEHOLDER_CLOUD_NAME: &str = "dummy";

/// Cloudinary account credentials.
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base_url: String,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_base_url", &self.api_base_url)
            .finish_non_exhaustive()
    }
}

impl CloudinaryConfig {
    /// Build a config only when all three credentials are present and the
    /// cloud name is not the sample placeholder.
    pub fn from_parts(
        cloud_name: Option<String>,
        api_key: Option<String>,
        api_secret: Option<String>,
    ) -> Option<Self> {
        let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let cloud_name = non_empty(cloud_name)?;
        if cloud_name == PLACEHOLDER_CLOUD_NAME {
            return None;
        }

        Some(Self {
            cloud_name,
            api_key: non_empty(api_key)?,
            api_secret: non_empty(api_secret)?,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        })
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/auto/upload",
            self.api_base_url.trim_end_matches('/'),
            self.cloud_name
        )
    }
}

/// Sign upload parameters: `k=v` pairs sorted by key, joined with `&`,
/// followed by the API secret, hashed with SHA-256.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    hex::encode(Sha256::digest(format!("{to_sign}{api_secret}").as_bytes()))
}

/// Uploads evidence to Cloudinary.
#[derive(Debug, Clone)]
pub struct CloudinaryBlobStore {
    config: CloudinaryConfig,
    http: Client,
}

impl CloudinaryBlobStore {
    pub fn new(config: CloudinaryConfig) -> Result<Self, BlobError> {
        let http = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self { config, http })
    }
}

/// Public id inside the shared evidence folder. The random prefix keeps two
/// uploads of the same filename from overwriting each other.
fn evidence_public_id(filename: &str) -> String {
    format!("{}-{}", uuid::Uuid::new_v4().simple(), file_stem(filename))
}

#[async_trait::async_trait]
impl BlobStore for CloudinaryBlobStore {
    async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, BlobError> {
        let filename = sanitize_filename(filename);
        let timestamp = Utc::now().timestamp().to_string();
        let params = [
            ("folder", EVIDENCE_FOLDER.to_string()),
            ("public_id", evidence_public_id(&filename)),
            ("timestamp", timestamp),
        ];
        let signature = sign_params(&params, &self.config.api_secret);

        let file_part = multipart::Part::bytes(data.to_vec())
            .file_name(filename.clone())
            .mime_str(content_type)?;

        let mut form = multipart::Form::new()
            .part("file", file_part)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .http
            .post(self.config.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("no error message")
                .to_string();
            return Err(BlobError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        body.get("secure_url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BlobError::InvalidResponse("missing secure_url".to_string()))
    }

    fn backend(&self) -> &'static str {
        "cloudinary"
    }
}
