// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Document Storage Module
//!
//! Persistent storage as one JSON document per entity under `DATA_DIR`.
//! Report documents only ever hold sensitive fields in encrypted form; the
//! cipher is applied by the service layer before anything reaches this
//! module.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   reports/
//!     {reportId}.json        # Encrypted report + plaintext metadata
//!   ngos/
//!     {ngoId}.json           # NGO account
//!     emails/{sha256}.json   # Email uniqueness marker
//!   uploads/                 # Local evidence files (no blob store configured)
//!   audit/
//!     {date}/events.jsonl    # Daily audit logs
//! ```
//!
//! ## Consistency
//!
//! - Single-document writes are atomic (temp file + rename)
//! - Creation is exclusive, which is what makes ids and emails unique
//! - Concurrent updates to the same document are last-write-wins

pub mod audit;
pub mod document_store;
pub mod paths;
pub mod repository;
pub mod visibility;

pub use audit::{AuditEvent, AuditEventType, AuditRepository};
pub use document_store::{DocumentStore, StorageError, StorageResult};
pub use paths::{is_valid_document_id, StoragePaths};
pub use repository::{
    normalize_email, DeletionScope, NgoRepository, ReportFilter, ReportPage, ReportRepository,
    ReportStatus, StoredNgo, StoredReport, UrgencyLevel,
};
pub use visibility::{ConsentGated, VisibilityCheck, VisibilityEnforcer};
