// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Consent and soft-delete visibility for NGO-facing reads.
//!
//! Every NGO path that touches a single report goes through these checks:
//! absent or soft-deleted reports are `NotFound`, reports whose reporter did
//! not consent are `ConsentWithheld`.

use super::{StorageError, StorageResult};

/// Trait for records gated by reporter consent and soft deletion.
pub trait ConsentGated {
    /// External report id.
    fn report_id(&self) -> &str;
    /// Whether the reporter agreed to share the report with NGOs.
    fn consent_granted(&self) -> bool;
    /// Whether the report is soft-deleted.
    fn is_deleted(&self) -> bool;
}

/// Trait for enforcing NGO visibility on a loaded record.
pub trait VisibilityEnforcer {
    /// Verify that an NGO may see this (live) record.
    ///
    /// # Errors
    /// `StorageError::NotFound` if soft-deleted,
    /// `StorageError::ConsentWithheld` if consent was not given.
    fn verify_visible(&self) -> StorageResult<()>;
}

impl<T: ConsentGated> VisibilityEnforcer for T {
    fn verify_visible(&self) -> StorageResult<()> {
        if self.is_deleted() {
            return Err(StorageError::NotFound(format!("Report {}", self.report_id())));
        }
        if !self.consent_granted() {
            return Err(StorageError::ConsentWithheld(self.report_id().to_string()));
        }
        Ok(())
    }
}

/// Extension trait for lookups that may have found nothing.
pub trait VisibilityCheck<T> {
    /// Verify visibility and return the record if an NGO may see it.
    fn visible_to_ngo(self, report_id: &str) -> StorageResult<T>;
}

impl<T: ConsentGated> VisibilityCheck<T> for StorageResult<T> {
    fn visible_to_ngo(self, _report_id: &str) -> StorageResult<T> {
        let record = self?;
        record.verify_visible()?;
        Ok(record)
    }
}

impl<T: ConsentGated> VisibilityCheck<T> for Option<T> {
    fn visible_to_ngo(self, report_id: &str) -> StorageResult<T> {
        match self {
            Some(record) => {
                record.verify_visible()?;
                Ok(record)
            }
            None => Err(StorageError::NotFound(format!("Report {report_id}"))),
        }
    }
}
