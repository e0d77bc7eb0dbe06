// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Incident-type classification.
//!
//! A remote ML service maps free text to a coarse label such as
//! `harassment` or `domestic_violence`. Classification is best-effort: the
//! report service falls back to [`DEFAULT_INCIDENT_TYPE`] on any error.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Label used when no classification is available.
pub const DEFAULT_INCIDENT_TYPE: &str = "General";

/// Upper bound on one classification call.
const CLASSIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised by classifiers.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("classifier returned status {0}")]
    Status(u16),

    #[error("classifier returned no label")]
    EmptyLabel,
}

/// Maps report text to an incident-type label.
#[async_trait::async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<String, ClassifierError>;
}

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

/// Accepts both `{"incidentType": ...}` and `{"reply": ...}` bodies.
#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    #[serde(rename = "incidentType", alias = "reply")]
    incident_type: Option<String>,
}

/// Classifier backed by the ML service's `POST {base}/classify`.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    endpoint: String,
    http: Client,
}

impl HttpClassifier {
    pub fn new(base_url: &str) -> Result<Self, ClassifierError> {
        let http = Client::builder().timeout(CLASSIFY_TIMEOUT).build()?;
        Ok(Self {
            endpoint: format!("{}/classify", base_url.trim_end_matches('/')),
            http,
        })
    }
}

#[async_trait::async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<String, ClassifierError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&ClassifyRequest { text })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClassifierError::Status(response.status().as_u16()));
        }

        let body: ClassifyResponse = response.json().await?;
        body.incident_type
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .ok_or(ClassifierError::EmptyLabel)
    }
}

/// Classify `text`, falling back to [`DEFAULT_INCIDENT_TYPE`].
pub async fn classify_or_default(classifier: Option<&dyn Classifier>, text: &str) -> String {
    let Some(classifier) = classifier else {
        return DEFAULT_INCIDENT_TYPE.to_string();
    };

    match classifier.classify(text).await {
        Ok(label) => {
            tracing::info!(incident_type = %label, "Report classified");
            label
        }
        Err(e) => {
            tracing::warn!(error = %e, "Classification failed, using default incident type");
            DEFAULT_INCIDENT_TYPE.to_string()
        }
    }
}
