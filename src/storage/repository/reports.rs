// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Report repository.
//!
//! Each report is one JSON document under `reports/{reportId}.json`. Only the
//! encrypted form of sensitive fields ever reaches disk; everything plaintext
//! here is operational metadata.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{is_valid_document_id, DocumentStore, StorageError, StorageResult};

/// Report lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Freshly submitted or restored
    #[default]
    Pending,
    /// An NGO is looking into it
    UnderReview,
    /// Action has been taken
    ActionTaken,
    /// Case closed
    Resolved,
    /// Soft-deleted
    Archived,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::UnderReview => "under_review",
            ReportStatus::ActionTaken => "action_taken",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Archived => "archived",
        }
    }

    /// Position along `pending -> under_review -> action_taken -> resolved`.
    fn stage(&self) -> Option<u8> {
        match self {
            ReportStatus::Pending => Some(0),
            ReportStatus::UnderReview => Some(1),
            ReportStatus::ActionTaken => Some(2),
            ReportStatus::Resolved => Some(3),
            ReportStatus::Archived => None,
        }
    }

    /// Whether a case-management update may move a live report to `target`.
    ///
    /// Moves only go forward (skipping stages is allowed). `archived` is only
    /// entered by soft delete and only left by restore.
    pub fn can_transition_to(&self, target: ReportStatus) -> bool {
        match (self.stage(), target.stage()) {
            (Some(from), Some(to)) => to >= from,
            _ => false,
        }
    }
}

impl FromStr for ReportStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "under_review" => Ok(ReportStatus::UnderReview),
            "action_taken" => Ok(ReportStatus::ActionTaken),
            "resolved" => Ok(ReportStatus::Resolved),
            "archived" => Ok(ReportStatus::Archived),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reporter-chosen urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum UrgencyLevel {
    #[default]
    Normal,
    Emergency,
}

impl UrgencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Normal => "Normal",
            UrgencyLevel::Emergency => "Emergency",
        }
    }
}

impl FromStr for UrgencyLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Normal" => Ok(UrgencyLevel::Normal),
            "Emergency" => Ok(UrgencyLevel::Emergency),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredReport {
    /// External identifier (also the document name)
    pub report_id: String,
    pub encrypted_incident_title: String,
    pub encrypted_description: String,
    pub encrypted_location: String,
    pub encrypted_date_time: String,
    /// Empty when no phone number was given
    #[serde(default)]
    pub encrypted_phone_number: String,
    /// One package per uploaded file, in upload order
    #[serde(default)]
    pub encrypted_evidence_urls: Vec<String>,
    pub incident_type: String,
    pub urgency_level: UrgencyLevel,
    #[serde(rename = "consentToShareWithNGO")]
    pub consent_to_share_with_ngo: bool,
    pub status: ReportStatus,
    /// NGO id
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    /// NGO id
    #[serde(default)]
    pub deleted_by: Option<String>,
}

impl super::super::ConsentGated for StoredReport {
    fn report_id(&self) -> &str {
        &self.report_id
    }

    fn consent_granted(&self) -> bool {
        self.consent_to_share_with_ngo
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}

/// Which side of the soft-delete line a query looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletionScope {
    #[default]
    Active,
    Deleted,
}

/// Filter over NGO-visible reports.
///
/// Only consent-granted reports ever match.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub scope: DeletionScope,
    pub status: Option<ReportStatus>,
    pub incident_type: Option<String>,
    pub urgency_level: Option<UrgencyLevel>,
    /// Inclusive lower bound on `created_at`
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`
    pub created_to: Option<DateTime<Utc>>,
}

impl ReportFilter {
    /// Active (not deleted) shared reports.
    pub fn active() -> Self {
        Self::default()
    }

    /// Soft-deleted shared reports.
    pub fn deleted() -> Self {
        Self {
            scope: DeletionScope::Deleted,
            ..Self::default()
        }
    }

    pub fn matches(&self, report: &StoredReport) -> bool {
        if !report.consent_to_share_with_ngo {
            return false;
        }
        let wants_deleted = self.scope == DeletionScope::Deleted;
        if report.is_deleted != wants_deleted {
            return false;
        }
        if self.status.is_some_and(|s| s != report.status) {
            return false;
        }
        if self
            .incident_type
            .as_deref()
            .is_some_and(|t| t != report.incident_type)
        {
            return false;
        }
        if self.urgency_level.is_some_and(|u| u != report.urgency_level) {
            return false;
        }
        if self.created_from.is_some_and(|from| report.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| report.created_at > to) {
            return false;
        }
        true
    }
}

/// One page of query results.
#[derive(Debug, Clone)]
pub struct ReportPage {
    pub reports: Vec<StoredReport>,
    /// Number of matching reports before paging
    pub total: usize,
}

/// Repository for report documents.
pub struct ReportRepository<'a> {
    storage: &'a DocumentStore,
}

impl<'a> ReportRepository<'a> {
    /// Create a new ReportRepository.
    pub fn new(storage: &'a DocumentStore) -> Self {
        Self { storage }
    }

    /// Check if a report document exists.
    pub fn exists(&self, report_id: &str) -> bool {
        self.storage.exists(self.storage.paths().report(report_id))
    }

    /// Get a report by id, deleted or not.
    pub fn get(&self, report_id: &str) -> StorageResult<StoredReport> {
        if !is_valid_document_id(report_id) {
            return Err(StorageError::NotFound(format!("Report {report_id}")));
        }
        let path = self.storage.paths().report(report_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Report {report_id}")));
        }
        self.storage.read_json(path)
    }

    /// Persist a new report.
    ///
    /// Fails with `StorageError::AlreadyExists` if the id is taken.
    pub fn create(&self, report: &StoredReport) -> StorageResult<()> {
        let report_id = &report.report_id;
        if !is_valid_document_id(report_id) {
            return Err(StorageError::IntegrityViolation(format!(
                "Invalid report id {report_id}"
            )));
        }
        match self
            .storage
            .create_json(self.storage.paths().report(report_id), report)
        {
            Err(StorageError::AlreadyExists(_)) => {
                Err(StorageError::AlreadyExists(format!("Report {report_id}")))
            }
            other => other,
        }
    }

    /// Replace an existing report document. Last write wins.
    pub fn update(&self, report: &StoredReport) -> StorageResult<()> {
        self.modify(&report.report_id, |current| {
            *current = report.clone();
            Ok::<_, StorageError>(())
        })
    }

    /// Change a report in place under its document lock.
    ///
    /// `apply` runs against the latest stored version and should re-check
    /// any precondition (not deleted, consent) there. Returning `Err` aborts
    /// without writing.
    pub fn modify<R, E>(
        &self,
        report_id: &str,
        apply: impl FnOnce(&mut StoredReport) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<StorageError>,
    {
        if !is_valid_document_id(report_id) {
            return Err(StorageError::NotFound(format!("Report {report_id}")).into());
        }

        self.storage
            .modify_json(self.storage.paths().report(report_id), apply)
    }

    /// Get a report that is not soft-deleted.
    pub fn find_active(&self, report_id: &str) -> StorageResult<Option<StoredReport>> {
        match self.get(report_id) {
            Ok(report) if !report.is_deleted => Ok(Some(report)),
            Ok(_) | Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Get a report that is soft-deleted.
    pub fn find_deleted(&self, report_id: &str) -> StorageResult<Option<StoredReport>> {
        match self.get(report_id) {
            Ok(report) if report.is_deleted => Ok(Some(report)),
            Ok(_) | Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Load every report document.
    ///
    /// Documents that cannot be parsed are logged and skipped.
    pub fn list_all(&self) -> StorageResult<Vec<StoredReport>> {
        let ids = self
            .storage
            .list_files(self.storage.paths().reports_dir(), "json")?;

        let mut reports = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get(&id) {
                Ok(report) => reports.push(report),
                Err(e) => tracing::warn!(report_id = %id, error = %e, "Skipping unreadable report"),
            }
        }
        Ok(reports)
    }

    /// All reports matching `filter`, newest created first.
    pub fn list_matching(&self, filter: &ReportFilter) -> StorageResult<Vec<StoredReport>> {
        let mut reports: Vec<StoredReport> = self
            .list_all()?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    /// Filter, sort newest first, then skip/limit.
    pub fn query(
        &self,
        filter: &ReportFilter,
        skip: usize,
        limit: usize,
    ) -> StorageResult<ReportPage> {
        let matching = self.list_matching(filter)?;
        let total = matching.len();
        let reports = matching.into_iter().skip(skip).take(limit).collect();
        Ok(ReportPage { reports, total })
    }

    /// Soft-deleted shared reports, most recently deleted first.
    pub fn list_deleted(&self) -> StorageResult<Vec<StoredReport>> {
        let mut reports = self.list_matching(&ReportFilter::deleted())?;
        reports.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at));
        Ok(reports)
    }
}
