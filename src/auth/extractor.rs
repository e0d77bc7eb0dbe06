// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated NGOs.
//!
//! Use the `Auth` extractor in handlers to require a valid session, and
//! `VerifiedNgo` for anything that touches report data:
//!
//! ```rust,ignore
//! async fn my_handler(VerifiedNgo(ngo): VerifiedNgo) -> impl IntoResponse {
//!     // ngo is AuthenticatedNgo, verified by an admin
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, AuthenticatedNgo};
use crate::service::ServiceError;
use crate::state::AppState;

/// Extractor for any NGO holding a valid session token.
///
/// The account is reloaded on every request; a token whose NGO no longer
/// exists is rejected.
pub struct Auth(pub AuthenticatedNgo);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if an outer layer already authenticated the request
        if let Some(ngo) = parts.extensions.get::<AuthenticatedNgo>().cloned() {
            return Ok(Auth(ngo));
        }

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        let claims = state.tokens.verify(token)?;

        let ngos = state.ngos.clone();
        let account = tokio::task::spawn_blocking(move || ngos.get(&claims.sub))
            .await
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .map_err(|e| match e {
                ServiceError::NotFound(_) => AuthError::UnknownAccount,
                other => AuthError::InternalError(other.to_string()),
            })?;

        let ngo = AuthenticatedNgo::from_account(&account);
        parts.extensions.insert(ngo.clone());
        Ok(Auth(ngo))
    }
}

/// Extractor that requires an admin-verified NGO.
pub struct VerifiedNgo(pub AuthenticatedNgo);

impl FromRequestParts<AppState> for VerifiedNgo {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(ngo) = Auth::from_request_parts(parts, state).await?;

        if !ngo.verified {
            tracing::info!(ngo_id = %ngo.ngo_id, "Unverified NGO denied");
            return Err(AuthError::NgoNotVerified);
        }

        Ok(VerifiedNgo(ngo))
    }
}

/// Extractor that requires a verified admin.
pub struct AdminOnly(pub AuthenticatedNgo);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let VerifiedNgo(ngo) = VerifiedNgo::from_request_parts(parts, state).await?;

        if !ngo.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(ngo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::models::RegisterNgoRequest;
    use crate::state::test_support::test_state;
    use axum::http::Request;

    fn parts_with_token(token: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn register(state: &AppState, email: &str) -> String {
        state
            .ngos
            .register(RegisterNgoRequest {
                ngo_name: "Helping Hands".to_string(),
                email: email.to_string(),
                password: "s3cure-passw0rd".to_string(),
                confirm_password: "s3cure-passw0rd".to_string(),
            })
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let (state, _temp_dir) = test_state();
        let mut parts = parts_with_token(None);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_rejects_non_bearer() {
        let (state, _temp_dir) = test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", "Basic abc")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_succeeds_for_existing_ngo() {
        let (state, _temp_dir) = test_state();
        let ngo_id = register(&state, "help@example.org");
        let token = state.tokens.issue(&ngo_id, Role::Ngo).unwrap();

        let mut parts = parts_with_token(Some(&token));
        let Auth(ngo) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(ngo.ngo_id, ngo_id);
        assert!(!ngo.verified);
    }

    #[tokio::test]
    async fn token_for_missing_account_is_rejected() {
        let (state, _temp_dir) = test_state();
        let token = state.tokens.issue("gone", Role::Ngo).unwrap();

        let mut parts = parts_with_token(Some(&token));
        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::UnknownAccount)));
    }

    #[tokio::test]
    async fn verified_ngo_gate() {
        let (state, _temp_dir) = test_state();
        let ngo_id = register(&state, "help@example.org");
        let token = state.tokens.issue(&ngo_id, Role::Ngo).unwrap();

        let mut parts = parts_with_token(Some(&token));
        let result = VerifiedNgo::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::NgoNotVerified)));

        state.ngos.verify(&ngo_id, "admin").unwrap();
        let mut parts = parts_with_token(Some(&token));
        assert!(VerifiedNgo::from_request_parts(&mut parts, &state).await.is_ok());
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let (state, _temp_dir) = test_state();
        let mut parts = parts_with_token(None);
        parts.extensions.insert(AuthenticatedNgo {
            ngo_id: "ngo-1".to_string(),
            role: Role::Ngo,
            verified: true,
        });

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
    }

    #[tokio::test]
    async fn admin_only_accepts_seeded_admin() {
        let (state, _temp_dir) = test_state();
        state
            .ngos
            .seed_admin("Platform", "admin@example.org", "admin-password")
            .unwrap();
        let admin = state.ngos.login("admin@example.org", "admin-password").unwrap();
        let token = state.tokens.issue(&admin.id, admin.role).unwrap();

        let mut parts = parts_with_token(Some(&token));
        let AdminOnly(ngo) = AdminOnly::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(ngo.role, Role::Admin);
    }
}
