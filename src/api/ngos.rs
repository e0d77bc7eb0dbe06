// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! NGO account endpoints: register, login and current profile.

use axum::{extract::State, http::StatusCode, Json};

use super::run_blocking;
use crate::{
    auth::Auth,
    error::ApiError,
    models::{AuthResponse, LoginRequest, NgoProfile, NgoProfileResponse, RegisterNgoRequest},
    state::AppState,
    storage::StoredNgo,
};

fn session_response(
    state: &AppState,
    ngo: &StoredNgo,
    message: &str,
) -> Result<AuthResponse, ApiError> {
    let token = state
        .tokens
        .issue(&ngo.id, ngo.role)
        .map_err(|e| ApiError::internal(&e.to_string()))?;

    Ok(AuthResponse {
        success: true,
        message: message.to_string(),
        token,
        ngo: NgoProfile::from(ngo),
    })
}

/// Register a new NGO account.
///
/// The account starts unverified: it can log in but cannot access reports
/// until an administrator verifies it.
#[utoipa::path(
    post,
    path = "/v1/ngo/register",
    tag = "NGOs",
    request_body = RegisterNgoRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid registration data"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_ngo(
    State(state): State<AppState>,
    Json(request): Json<RegisterNgoRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let ngos = state.ngos.clone();
    let ngo = run_blocking(move || ngos.register(request)).await?;
    let response = session_response(
        &state,
        &ngo,
        "NGO registered successfully. Your account is pending verification.",
    )?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Log in with email and password.
#[utoipa::path(
    post,
    path = "/v1/ngo/login",
    tag = "NGOs",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login_ngo(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let ngos = state.ngos.clone();
    let ngo = run_blocking(move || ngos.login(&request.email, &request.password)).await?;
    Ok(Json(session_response(&state, &ngo, "Login successful")?))
}

/// Profile of the calling NGO, verified or not.
#[utoipa::path(
    get,
    path = "/v1/ngo/me",
    tag = "NGOs",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current NGO profile", body = NgoProfileResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn current_ngo(
    Auth(ngo): Auth,
    State(state): State<AppState>,
) -> Result<Json<NgoProfileResponse>, ApiError> {
    let ngos = state.ngos.clone();
    let account = run_blocking(move || ngos.get(&ngo.ngo_id)).await?;
    Ok(Json(NgoProfileResponse {
        success: true,
        ngo: NgoProfile::from(&account),
    }))
}
