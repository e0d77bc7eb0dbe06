// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::blob::BlobStore;
use crate::cipher::FieldCipher;
use crate::classifier::Classifier;
use crate::service::{NgoService, ReportService};
use crate::storage::DocumentStore;

/// Shared application state.
///
/// Everything is built once at startup from `AppConfig` and shared
/// read-only between requests.
#[derive(Clone)]
pub struct AppState {
    storage: Arc<DocumentStore>,
    pub reports: ReportService,
    pub ngos: NgoService,
    pub tokens: Arc<TokenIssuer>,
    blob_backend: &'static str,
}

impl AppState {
    pub fn new(
        storage: DocumentStore,
        cipher: FieldCipher,
        blobs: Arc<dyn BlobStore>,
        classifier: Option<Arc<dyn Classifier>>,
        tokens: TokenIssuer,
    ) -> Self {
        let storage = Arc::new(storage);
        let blob_backend = blobs.backend();
        Self {
            reports: ReportService::new(storage.clone(), Arc::new(cipher), blobs, classifier),
            ngos: NgoService::new(storage.clone()),
            tokens: Arc::new(tokens),
            storage,
            blob_backend,
        }
    }

    /// Get a reference to the document store.
    pub fn storage(&self) -> &DocumentStore {
        &self.storage
    }

    /// Name of the active evidence backend.
    pub fn blob_backend(&self) -> &'static str {
        self.blob_backend
    }
}
