// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! NGO session authentication for the incident report API.
//!
//! ## Auth Flow
//!
//! 1. An NGO registers or logs in with email and password (Argon2 hashes)
//! 2. The server issues an HS256 session token (`sub` = NGO id)
//! 3. Clients send `Authorization: Bearer <token>`
//! 4. Extractors verify the token and reload the account:
//!    - `Auth`: valid token, account exists (401 otherwise)
//!    - `VerifiedNgo`: plus admin verification (403 `ngo_not_verified`)
//!    - `AdminOnly`: plus admin role (403 `insufficient_permissions`)
//!
//! Anonymous report submission needs none of this. Clock skew tolerance is
//! 60 seconds.

pub mod claims;
pub mod error;
pub mod extractor;
pub mod password;
pub mod roles;
pub mod token;

pub use claims::{AuthenticatedNgo, SessionClaims};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth, VerifiedNgo};
pub use password::{hash_password, verify_password, MIN_PASSWORD_LEN};
pub use roles::Role;
pub use token::TokenIssuer;
