// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{AuthenticatedNgo, Role},
    error::ApiError,
    models::{
        AuthResponse, CreateReportForm, CreateReportResponse, DecryptedReport,
        DeleteReportResponse, DeletedReportSummary, DeletedReportsResponse, ListReportsResponse,
        LoginRequest, MonthlyCount, NgoListResponse, NgoProfile, NgoProfileResponse, NgoSummary,
        RegisterNgoRequest, ReportResponse, ReportStatistics, RestoreReportResponse,
        StatisticsResponse, UpdateReportRequest, UpdateReportResponse, UpdatedReport, YearMonth,
    },
    service::ServiceResult,
    state::AppState,
    storage::{ReportStatus, UrgencyLevel},
};

pub mod admin;
pub mod health;
pub mod ngos;
pub mod reports;

/// Request body limit of a report submission (all evidence files together).
pub const MAX_SUBMISSION_BYTES: usize = 50 * 1024 * 1024;

/// Run service work that touches the document store or hashes passwords on
/// the blocking thread pool.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(&e.to_string()))?;
    Ok(outcome?)
}

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/report",
            post(reports::create_report)
                .layer(DefaultBodyLimit::max(MAX_SUBMISSION_BYTES))
                .get(reports::list_reports),
        )
        .route("/report/deleted/all", get(reports::list_deleted_reports))
        .route(
            "/report/statistics/overview",
            get(reports::report_statistics),
        )
        .route(
            "/report/{report_id}",
            get(reports::get_report)
                .patch(reports::update_report)
                .put(reports::update_report)
                .delete(reports::delete_report),
        )
        .route("/report/{report_id}/restore", post(reports::restore_report))
        .route("/ngo/register", post(ngos::register_ngo))
        .route("/ngo/login", post(ngos::login_ngo))
        .route("/ngo/me", get(ngos::current_ngo))
        .route("/admin/ngos", get(admin::list_ngos))
        .route("/admin/ngos/{ngo_id}/verify", post(admin::verify_ngo));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        reports::create_report,
        reports::list_reports,
        reports::get_report,
        reports::update_report,
        reports::delete_report,
        reports::restore_report,
        reports::list_deleted_reports,
        reports::report_statistics,
        ngos::register_ngo,
        ngos::login_ngo,
        ngos::current_ngo,
        admin::list_ngos,
        admin::verify_ngo
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            ReportStatus,
            UrgencyLevel,
            Role,
            AuthenticatedNgo,
            NgoSummary,
            CreateReportForm,
            CreateReportResponse,
            DecryptedReport,
            ListReportsResponse,
            ReportResponse,
            UpdateReportRequest,
            UpdatedReport,
            UpdateReportResponse,
            DeleteReportResponse,
            RestoreReportResponse,
            DeletedReportSummary,
            DeletedReportsResponse,
            YearMonth,
            MonthlyCount,
            ReportStatistics,
            StatisticsResponse,
            RegisterNgoRequest,
            LoginRequest,
            NgoProfile,
            AuthResponse,
            NgoProfileResponse,
            NgoListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Reports", description = "Anonymous submission and consent-gated case management"),
        (name = "NGOs", description = "NGO registration and login"),
        (name = "Admin", description = "NGO verification")
    )
)]
struct ApiDoc;
