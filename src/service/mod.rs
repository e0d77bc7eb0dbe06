// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Service Layer
//!
//! Orchestration between the HTTP handlers and storage:
//!
//! - [`ReportService`]: encryption on the way in, decryption on the way out,
//!   consent gating, soft delete and restore, listing and statistics
//! - [`NgoService`]: NGO registration, login and admin verification
//!
//! Services return [`ServiceError`]; the API layer maps it to HTTP statuses.

pub mod ngos;
pub mod reports;

pub use ngos::NgoService;
pub use reports::{EvidenceFile, NewReport, ReportService};

use crate::cipher::CipherError;
use crate::storage::StorageError;

/// Message shown to clients when the report was withheld by its reporter.
pub const CONSENT_WITHHELD_MESSAGE: &str = "Access denied. Report not shared with NGOs.";

/// Errors raised by the service layer.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Bad or missing input
    #[error("{0}")]
    Validation(String),

    /// Absent or soft-deleted
    #[error("{0}")]
    NotFound(String),

    /// The reporter did not consent to NGO access
    #[error("{CONSENT_WITHHELD_MESSAGE}")]
    ConsentWithheld(String),

    /// Uniqueness violation visible to the caller (duplicate email)
    #[error("{0}")]
    Conflict(String),

    /// Bad credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Cipher self-test failed or similar misconfiguration
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    #[error("storage error: {0}")]
    Storage(StorageError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(what) => ServiceError::NotFound(format!("{what} not found")),
            StorageError::ConsentWithheld(id) => ServiceError::ConsentWithheld(id),
            other => ServiceError::Storage(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
