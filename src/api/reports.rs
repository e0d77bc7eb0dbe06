// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Incident report endpoints.
//!
//! Submission is anonymous. Everything else requires a verified NGO and only
//! ever sees reports whose reporter consented to sharing.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};

use super::run_blocking;
use crate::{
    auth::VerifiedNgo,
    error::ApiError,
    models::{
        CreateReportForm, CreateReportResponse, DeleteReportResponse, DeletedReportsResponse,
        ListReportsQuery, ListReportsResponse, ReportResponse, RestoreReportResponse,
        StatisticsQuery, StatisticsResponse, UpdateReportRequest, UpdateReportResponse,
    },
    service::{reports::ListParams, EvidenceFile, NewReport},
    state::AppState,
};

/// Multipart field carrying evidence files.
pub const EVIDENCE_FIELD: &str = "evidence";

/// Maximum number of evidence files per submission.
pub const MAX_EVIDENCE_FILES: usize = 10;

/// Accepted media kinds. Both the file name and the MIME type must mention one.
const ALLOWED_MEDIA: [&str; 10] = [
    "jpeg", "jpg", "png", "gif", "pdf", "mp4", "mov", "avi", "mpeg", "mpg",
];

const FILE_TYPE_REJECTED: &str =
    "File type not allowed. Only images, videos, and PDFs are accepted.";

fn is_allowed_media(filename: &str, content_type: &str) -> bool {
    let mentions_allowed = |s: &str| {
        let s = s.to_ascii_lowercase();
        ALLOWED_MEDIA.iter().any(|kind| s.contains(kind))
    };
    mentions_allowed(filename) && mentions_allowed(content_type)
}

/// Split a submission into its text fields and evidence files.
///
/// Files are validated here, before anything is encrypted or persisted.
async fn read_submission(
    mut multipart: Multipart,
) -> Result<(CreateReportForm, Vec<EvidenceFile>), ApiError> {
    let mut form = CreateReportForm::default();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == EVIDENCE_FIELD {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await?;

            // Browsers send an empty part when no file was picked
            if filename.is_empty() && data.is_empty() {
                continue;
            }
            if files.len() == MAX_EVIDENCE_FILES {
                return Err(ApiError::bad_request(format!(
                    "Too many files. At most {MAX_EVIDENCE_FILES} evidence files are accepted."
                )));
            }
            if !is_allowed_media(&filename, &content_type) {
                tracing::info!(content_type = %content_type, "Evidence file rejected");
                return Err(ApiError::bad_request(FILE_TYPE_REJECTED));
            }

            files.push(EvidenceFile {
                filename,
                content_type,
                data: data.to_vec(),
            });
            continue;
        }

        let value = field.text().await?;
        match name.as_str() {
            "incidentTitle" => form.incident_title = value,
            "description" => form.description = value,
            "dateTime" => form.date_time = value,
            "location" => form.location = value,
            "PhoneNumber" => form.phone_number = Some(value),
            "urgencyLevel" => form.urgency_level = Some(value),
            "consentToShareWithNGO" => form.consent_to_share_with_ngo = Some(value),
            other => tracing::debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    Ok((form, files))
}

/// Submit an anonymous incident report.
///
/// All sensitive fields, the phone number and evidence URLs are encrypted
/// before storage. Evidence files are optional and best-effort.
#[utoipa::path(
    post,
    path = "/v1/report",
    tag = "Reports",
    request_body(
        content = CreateReportForm,
        content_type = "multipart/form-data",
        description = "Report fields plus up to 10 `evidence` files (images, videos, PDFs)"
    ),
    responses(
        (status = 201, description = "Report stored encrypted", body = CreateReportResponse),
        (status = 400, description = "Missing fields or rejected file"),
        (status = 500, description = "Encryption unavailable")
    )
)]
pub async fn create_report(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreateReportResponse>), ApiError> {
    let (form, files) = read_submission(multipart).await?;
    let input = NewReport::from_form(form)?;

    let created = state.reports.create(input, files).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateReportResponse {
            success: true,
            message: "Report submitted successfully. All data is securely encrypted.".to_string(),
            report_id: created.report_id,
            note: "Save this report ID for future reference".to_string(),
            urgency_level: created.urgency_level,
        }),
    ))
}

/// List shared reports, newest first.
///
/// `count` can be lower than the page size when stored records fail to
/// decrypt; `totalCount` counts every stored match.
#[utoipa::path(
    get,
    path = "/v1/report",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(ListReportsQuery),
    responses(
        (status = 200, description = "One page of decrypted reports", body = ListReportsResponse),
        (status = 400, description = "Invalid filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "NGO not verified")
    )
)]
pub async fn list_reports(
    VerifiedNgo(_ngo): VerifiedNgo,
    State(state): State<AppState>,
    Query(query): Query<ListReportsQuery>,
) -> Result<Json<ListReportsResponse>, ApiError> {
    let params = ListParams::from_query(&query)?;
    let reports = state.reports.clone();
    let listing = run_blocking(move || reports.list(&params)).await?;

    Ok(Json(ListReportsResponse {
        success: true,
        count: listing.reports.len(),
        total_count: listing.total_count,
        total_pages: listing.total_pages,
        current_page: listing.current_page,
        reports: listing.reports,
    }))
}

/// Get one shared report, decrypted.
#[utoipa::path(
    get,
    path = "/v1/report/{report_id}",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(("report_id" = String, Path, description = "Report identifier")),
    responses(
        (status = 200, description = "Decrypted report", body = ReportResponse),
        (status = 403, description = "Not shared with NGOs, or NGO not verified"),
        (status = 404, description = "Report not found")
    )
)]
pub async fn get_report(
    VerifiedNgo(ngo): VerifiedNgo,
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Result<Json<ReportResponse>, ApiError> {
    let reports = state.reports.clone();
    let report = run_blocking(move || reports.get_by_id(&report_id, &ngo.ngo_id)).await?;
    Ok(Json(ReportResponse {
        success: true,
        report,
    }))
}

/// Update case-management fields.
///
/// Unrecognized `status` or `urgencyLevel` values are ignored and reported
/// in `ignoredFields`.
#[utoipa::path(
    patch,
    path = "/v1/report/{report_id}",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(("report_id" = String, Path, description = "Report identifier")),
    request_body = UpdateReportRequest,
    responses(
        (status = 200, description = "Report updated", body = UpdateReportResponse),
        (status = 400, description = "Unknown assignee"),
        (status = 403, description = "Not shared with NGOs, or NGO not verified"),
        (status = 404, description = "Report not found")
    )
)]
pub async fn update_report(
    VerifiedNgo(ngo): VerifiedNgo,
    State(state): State<AppState>,
    Path(report_id): Path<String>,
    Json(request): Json<UpdateReportRequest>,
) -> Result<Json<UpdateReportResponse>, ApiError> {
    let reports = state.reports.clone();
    let outcome =
        run_blocking(move || reports.update(&report_id, request, &ngo.ngo_id)).await?;
    Ok(Json(UpdateReportResponse {
        success: true,
        message: "Report updated successfully".to_string(),
        report: outcome.report,
        ignored_fields: outcome.ignored_fields,
    }))
}

/// Soft-delete a report. It can be restored later.
#[utoipa::path(
    delete,
    path = "/v1/report/{report_id}",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(("report_id" = String, Path, description = "Report identifier")),
    responses(
        (status = 200, description = "Report soft-deleted", body = DeleteReportResponse),
        (status = 403, description = "Not shared with NGOs, or NGO not verified"),
        (status = 404, description = "Report not found or already deleted")
    )
)]
pub async fn delete_report(
    VerifiedNgo(ngo): VerifiedNgo,
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Result<Json<DeleteReportResponse>, ApiError> {
    let reports = state.reports.clone();
    let id = report_id.clone();
    let deleted_at = run_blocking(move || reports.soft_delete(&id, &ngo.ngo_id)).await?;
    Ok(Json(DeleteReportResponse {
        success: true,
        message: "Report deleted successfully".to_string(),
        report_id,
        deleted_at,
    }))
}

/// Restore a soft-deleted report. Its status goes back to `pending`.
#[utoipa::path(
    post,
    path = "/v1/report/{report_id}/restore",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(("report_id" = String, Path, description = "Report identifier")),
    responses(
        (status = 200, description = "Report restored", body = RestoreReportResponse),
        (status = 404, description = "Deleted report not found")
    )
)]
pub async fn restore_report(
    VerifiedNgo(ngo): VerifiedNgo,
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Result<Json<RestoreReportResponse>, ApiError> {
    let reports = state.reports.clone();
    let id = report_id.clone();
    let status = run_blocking(move || reports.restore(&id, &ngo.ngo_id)).await?;
    Ok(Json(RestoreReportResponse {
        success: true,
        message: "Report restored successfully".to_string(),
        report_id,
        status,
    }))
}

/// Soft-deleted shared reports (metadata only, nothing decrypted).
#[utoipa::path(
    get,
    path = "/v1/report/deleted/all",
    tag = "Reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Deleted reports, most recent first", body = DeletedReportsResponse),
        (status = 403, description = "NGO not verified")
    )
)]
pub async fn list_deleted_reports(
    VerifiedNgo(_ngo): VerifiedNgo,
    State(state): State<AppState>,
) -> Result<Json<DeletedReportsResponse>, ApiError> {
    let service = state.reports.clone();
    let reports = run_blocking(move || service.list_deleted()).await?;
    Ok(Json(DeletedReportsResponse {
        success: true,
        count: reports.len(),
        reports,
    }))
}

/// Aggregate counts over shared, live reports.
#[utoipa::path(
    get,
    path = "/v1/report/statistics/overview",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(StatisticsQuery),
    responses(
        (status = 200, description = "Report statistics", body = StatisticsResponse),
        (status = 400, description = "Invalid date range")
    )
)]
pub async fn report_statistics(
    VerifiedNgo(_ngo): VerifiedNgo,
    State(state): State<AppState>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let reports = state.reports.clone();
    let statistics = run_blocking(move || reports.statistics(&query)).await?;
    Ok(Json(StatisticsResponse {
        success: true,
        statistics,
    }))
}
