// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only endpoints for NGO account management.
//!
//! These endpoints require a verified NGO with the `admin` role.

use axum::{
    extract::{Path, State},
    Json,
};

use super::run_blocking;
use crate::{
    auth::AdminOnly,
    error::ApiError,
    models::{NgoListResponse, NgoProfile, NgoProfileResponse},
    state::AppState,
};

/// List every NGO account, oldest first.
#[utoipa::path(
    get,
    path = "/v1/admin/ngos",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All NGO accounts", body = NgoListResponse),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_ngos(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<NgoListResponse>, ApiError> {
    let service = state.ngos.clone();
    let ngos: Vec<NgoProfile> = run_blocking(move || service.list())
        .await?
        .iter()
        .map(NgoProfile::from)
        .collect();
    Ok(Json(NgoListResponse {
        success: true,
        count: ngos.len(),
        ngos,
    }))
}

/// Verify an NGO account, granting it access to shared reports.
#[utoipa::path(
    post,
    path = "/v1/admin/ngos/{ngo_id}/verify",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("ngo_id" = String, Path, description = "NGO identifier")),
    responses(
        (status = 200, description = "NGO verified", body = NgoProfileResponse),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "NGO not found")
    )
)]
pub async fn verify_ngo(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(ngo_id): Path<String>,
) -> Result<Json<NgoProfileResponse>, ApiError> {
    let ngos = state.ngos.clone();
    let ngo = run_blocking(move || ngos.verify(&ngo_id, &admin.ngo_id)).await?;
    Ok(Json(NgoProfileResponse {
        success: true,
        ngo: NgoProfile::from(&ngo),
    }))
}
