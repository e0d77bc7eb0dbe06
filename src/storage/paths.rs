// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the document store layout.

use std::path::{Path, PathBuf};

/// Default base directory for persistent storage.
pub const DATA_ROOT: &str = "./data";

/// Whether `id` is safe to use as a document file stem.
///
/// Ids come from URLs, so anything beyond `[A-Za-z0-9_-]` is refused.
pub fn is_valid_document_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Storage path utilities.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Report Paths ==========

    /// Directory containing all report documents.
    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("reports")
    }

    /// Path to a specific report document.
    pub fn report(&self, report_id: &str) -> PathBuf {
        self.reports_dir().join(format!("{report_id}.json"))
    }

    // ========== NGO Paths ==========

    /// Directory containing all NGO accounts.
    pub fn ngos_dir(&self) -> PathBuf {
        self.root.join("ngos")
    }

    /// Path to a specific NGO account document.
    pub fn ngo(&self, ngo_id: &str) -> PathBuf {
        self.ngos_dir().join(format!("{ngo_id}.json"))
    }

    /// Uniqueness marker for an NGO email (keyed by the email's hex digest).
    pub fn ngo_email_index(&self, email_digest: &str) -> PathBuf {
        self.ngos_dir()
            .join("emails")
            .join(format!("{email_digest}.json"))
    }

    // ========== Upload Paths ==========

    /// Directory holding locally stored evidence files.
    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    // ========== Audit Log Paths ==========

    /// Directory containing audit logs.
    pub fn audit_dir(&self) -> PathBuf {
        self.root.join("audit")
    }

    /// Directory for a specific date's audit logs.
    pub fn audit_date_dir(&self, date: &str) -> PathBuf {
        self.audit_dir().join(date)
    }

    /// Path to the audit events file for a date.
    pub fn audit_events_file(&self, date: &str) -> PathBuf {
        self.audit_date_dir(date).join("events.jsonl")
    }
}
