// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session claims and the authenticated NGO representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;
use crate::storage::StoredNgo;

/// Claims carried by an NGO session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject (NGO id)
    pub sub: String,

    /// Role at issue time
    pub role: Role,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Issuer
    pub iss: String,
}

/// The NGO making a request.
///
/// Built from the stored account on every request, so role and verification
/// changes apply to live sessions.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedNgo {
    /// NGO id (token `sub`)
    pub ngo_id: String,

    /// Current role
    pub role: Role,

    /// Whether an admin verified the account
    pub verified: bool,
}

impl AuthenticatedNgo {
    pub fn from_account(ngo: &StoredNgo) -> Self {
        Self {
            ngo_id: ngo.id.clone(),
            role: ngo.role,
            verified: ngo.verification_status,
        }
    }

    /// Check if this NGO is an admin.
    pub fn is_admin(&self) -> bool {
        self.role.has_privilege(Role::Admin)
    }
}
