// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. JSON keys are camelCase to
//! match the web front ends; every success body carries `"success": true`.
//!
//! ## Model Categories
//!
//! - **Reports**: submission confirmation, decrypted views for verified NGOs,
//!   metadata-only views for the deleted-reports audit list
//! - **Statistics**: metadata aggregates, no decryption involved
//! - **NGO accounts**: registration, login, profile, admin verification

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::Role;
use crate::storage::{ReportStatus, StoredNgo, UrgencyLevel};

// =============================================================================
// References
// =============================================================================

/// An NGO referenced from a report (`assignedTo`, `deletedBy`).
///
/// A reference to an account that no longer exists carries only the id.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NgoSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ngo_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl NgoSummary {
    pub fn dangling(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ngo_name: None,
            email: None,
        }
    }
}

impl From<&StoredNgo> for NgoSummary {
    fn from(ngo: &StoredNgo) -> Self {
        Self {
            id: ngo.id.clone(),
            ngo_name: Some(ngo.ngo_name.clone()),
            email: Some(ngo.email.clone()),
        }
    }
}

// =============================================================================
// Report Submission
// =============================================================================

/// Text fields of a report submission.
///
/// Sent as `multipart/form-data` together with up to 10 `evidence` files.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportForm {
    pub incident_title: String,
    pub description: String,
    /// Free-form date/time of the incident as entered by the reporter
    pub date_time: String,
    pub location: String,
    /// Optional contact number (form key `PhoneNumber`)
    #[serde(rename = "PhoneNumber", default)]
    pub phone_number: Option<String>,
    /// `Normal` (default) or `Emergency`
    #[serde(default)]
    pub urgency_level: Option<String>,
    /// `true`, `1` or `on` grants consent
    #[serde(rename = "consentToShareWithNGO", default)]
    pub consent_to_share_with_ngo: Option<String>,
}

/// Confirmation returned to an anonymous reporter.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportResponse {
    pub success: bool,
    pub message: String,
    pub report_id: String,
    pub note: String,
    pub urgency_level: UrgencyLevel,
}

// =============================================================================
// Report Views
// =============================================================================

/// A report with all sensitive fields decrypted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecryptedReport {
    pub report_id: String,
    pub incident_title: String,
    pub description: String,
    pub location: String,
    pub date_time: String,
    #[serde(rename = "PhoneNumber")]
    pub phone_number: String,
    pub evidence_urls: Vec<String>,
    #[serde(rename = "consentToShareWithNGO")]
    pub consent_to_share_with_ngo: bool,
    pub incident_type: String,
    pub urgency_level: UrgencyLevel,
    pub status: ReportStatus,
    pub assigned_to: Option<NgoSummary>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters of the report listing.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListReportsQuery {
    pub status: Option<String>,
    pub incident_type: Option<String>,
    pub urgency_level: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD` (whole day)
    pub end_date: Option<String>,
    /// 1-based page number (default 1)
    pub page: Option<String>,
    /// Page size, 1..=100 (default 20)
    pub limit: Option<String>,
}

/// One page of decrypted reports.
///
/// `count` only includes reports that decrypted cleanly, `totalCount` is the
/// number of stored matches, so `count` can be smaller than the page size.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListReportsResponse {
    pub success: bool,
    pub count: usize,
    pub total_count: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub reports: Vec<DecryptedReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResponse {
    pub success: bool,
    pub report: DecryptedReport,
}

// =============================================================================
// Report Case Management
// =============================================================================

/// Fields an NGO may change. Unrecognized `status`/`urgencyLevel` values are
/// ignored and echoed back in `ignoredFields`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportRequest {
    pub status: Option<String>,
    /// NGO id to assign the case to
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
    pub urgency_level: Option<String>,
    pub incident_type: Option<String>,
}

/// Operational fields after an update (no sensitive fields).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedReport {
    pub report_id: String,
    pub status: ReportStatus,
    pub assigned_to: Option<NgoSummary>,
    pub notes: String,
    pub urgency_level: UrgencyLevel,
    pub incident_type: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportResponse {
    pub success: bool,
    pub message: String,
    pub report: UpdatedReport,
    /// Provided fields that were not applied
    pub ignored_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReportResponse {
    pub success: bool,
    pub message: String,
    pub report_id: String,
    pub deleted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReportResponse {
    pub success: bool,
    pub message: String,
    pub report_id: String,
    pub status: ReportStatus,
}

/// Metadata-only view of a soft-deleted report.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedReportSummary {
    pub report_id: String,
    pub incident_type: String,
    pub urgency_level: UrgencyLevel,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<NgoSummary>,
    pub assigned_to: Option<NgoSummary>,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeletedReportsResponse {
    pub success: bool,
    pub count: usize,
    pub reports: Vec<DeletedReportSummary>,
}

// =============================================================================
// Statistics
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StatisticsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct MonthlyCount {
    #[serde(rename = "_id")]
    pub period: YearMonth,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportStatistics {
    pub total_reports: usize,
    pub status_stats: BTreeMap<String, usize>,
    pub type_stats: BTreeMap<String, usize>,
    pub urgency_stats: BTreeMap<String, usize>,
    /// Up to 12 most recent non-empty months, newest first
    pub monthly_stats: Vec<MonthlyCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatisticsResponse {
    pub success: bool,
    pub statistics: ReportStatistics,
}

// =============================================================================
// NGO Accounts
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterNgoRequest {
    #[serde(default)]
    pub ngo_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Public view of an NGO account (never the password hash).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NgoProfile {
    pub id: String,
    pub ngo_name: String,
    pub email: String,
    pub verification_status: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&StoredNgo> for NgoProfile {
    fn from(ngo: &StoredNgo) -> Self {
        Self {
            id: ngo.id.clone(),
            ngo_name: ngo.ngo_name.clone(),
            email: ngo.email.clone(),
            verification_status: ngo.verification_status,
            role: ngo.role,
            created_at: ngo.created_at,
        }
    }
}

/// Session token plus profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub ngo: NgoProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NgoProfileResponse {
    pub success: bool,
    pub ngo: NgoProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NgoListResponse {
    pub success: bool,
    pub count: usize,
    pub ngos: Vec<NgoProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrypted_report_keeps_legacy_key_names() {
        let now = Utc::now();
        let report = DecryptedReport {
            report_id: "r1".to_string(),
            incident_title: "Illegal Dumping".to_string(),
            description: "Bags of waste".to_string(),
            location: "City Park".to_string(),
            date_time: "2024-01-15T14:30".to_string(),
            phone_number: String::new(),
            evidence_urls: vec![],
            consent_to_share_with_ngo: true,
            incident_type: "General".to_string(),
            urgency_level: UrgencyLevel::Normal,
            status: ReportStatus::Pending,
            assigned_to: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["reportId"], "r1");
        assert_eq!(json["incidentTitle"], "Illegal Dumping");
        assert_eq!(json["PhoneNumber"], "");
        assert_eq!(json["consentToShareWithNGO"], true);
        assert!(json["assignedTo"].is_null());
    }

    #[test]
    fn dangling_reference_serializes_id_only() {
        let json = serde_json::to_value(NgoSummary::dangling("n1")).unwrap();
        assert_eq!(json, serde_json::json!({ "id": "n1" }));
    }

    #[test]
    fn monthly_count_uses_group_key_shape() {
        let json = serde_json::to_value(MonthlyCount {
            period: YearMonth {
                year: 2024,
                month: 1,
            },
            count: 3,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "_id": { "year": 2024, "month": 1 }, "count": 3 })
        );
    }

    #[test]
    fn update_request_accepts_partial_body() {
        let req: UpdateReportRequest =
            serde_json::from_str(r#"{"status":"bogus_value","notes":""}"#).unwrap();
        assert_eq!(req.status.as_deref(), Some("bogus_value"));
        assert_eq!(req.notes.as_deref(), Some(""));
        assert!(req.assigned_to.is_none());
    }
}
