// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! NGO account service: registration, login and admin verification.

use std::sync::Arc;

use chrono::Utc;

use super::{ServiceError, ServiceResult};
use crate::audit_log;
use crate::auth::{hash_password, verify_password, Role, MIN_PASSWORD_LEN};
use crate::models::RegisterNgoRequest;
use crate::storage::{
    normalize_email, AuditEvent, AuditEventType, AuditRepository, DocumentStore, NgoRepository,
    StorageError, StoredNgo,
};

/// Same message for unknown email and wrong password.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

const RESOURCE_NGO: &str = "ngo";

/// NGO account orchestration.
#[derive(Debug, Clone)]
pub struct NgoService {
    storage: Arc<DocumentStore>,
}

impl NgoService {
    pub fn new(storage: Arc<DocumentStore>) -> Self {
        Self { storage }
    }

    fn ngos(&self) -> NgoRepository<'_> {
        NgoRepository::new(&self.storage)
    }

    /// Register a new, unverified NGO account.
    pub fn register(&self, request: RegisterNgoRequest) -> ServiceResult<StoredNgo> {
        let ngo_name = request.ngo_name.trim();
        let email = normalize_email(&request.email);

        if ngo_name.is_empty()
            || email.is_empty()
            || request.password.is_empty()
            || request.confirm_password.is_empty()
        {
            return Err(ServiceError::Validation(
                "All fields are required: ngoName, email, password, confirmPassword".to_string(),
            ));
        }
        if !looks_like_email(&email) {
            return Err(ServiceError::Validation(
                "Please provide a valid email address".to_string(),
            ));
        }
        if request.password != request.confirm_password {
            return Err(ServiceError::Validation("Passwords do not match".to_string()));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ServiceError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }

        let ngo = self.create_account(ngo_name, &email, &request.password, Role::Ngo, false)?;

        tracing::info!(ngo_id = %ngo.id, "NGO registered");
        audit_log!(&self.storage, AuditEventType::NgoRegistered, resource: RESOURCE_NGO, &ngo.id);
        Ok(ngo)
    }

    fn create_account(
        &self,
        ngo_name: &str,
        email: &str,
        password: &str,
        role: Role,
        verified: bool,
    ) -> ServiceResult<StoredNgo> {
        let password_hash = hash_password(password).map_err(ServiceError::Internal)?;
        let ngo = StoredNgo {
            id: uuid::Uuid::new_v4().to_string(),
            ngo_name: ngo_name.to_string(),
            email: email.to_string(),
            password_hash,
            verification_status: verified,
            role,
            created_at: Utc::now(),
        };

        self.ngos().create(&ngo).map_err(|e| match e {
            StorageError::AlreadyExists(_) => ServiceError::Conflict(
                "An NGO with this email is already registered".to_string(),
            ),
            other => other.into(),
        })
    }

    /// Check credentials.
    pub fn login(&self, email: &str, password: &str) -> ServiceResult<StoredNgo> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        match self.ngos().find_by_email(&email)? {
            Some(ngo) if verify_password(password, &ngo.password_hash) => {
                tracing::info!(ngo_id = %ngo.id, "NGO logged in");
                Ok(ngo)
            }
            found => {
                tracing::info!(known_account = found.is_some(), "NGO login failed");
                let mut event = AuditEvent::new(AuditEventType::AuthFailure)
                    .failed(INVALID_CREDENTIALS_MESSAGE);
                if let Some(ngo) = &found {
                    event = event.with_resource(RESOURCE_NGO, &ngo.id);
                }
                AuditRepository::new(&self.storage).record(event);
                Err(ServiceError::Unauthorized(
                    INVALID_CREDENTIALS_MESSAGE.to_string(),
                ))
            }
        }
    }

    pub fn get(&self, ngo_id: &str) -> ServiceResult<StoredNgo> {
        Ok(self.ngos().get(ngo_id)?)
    }

    pub fn list(&self) -> ServiceResult<Vec<StoredNgo>> {
        Ok(self.ngos().list_all()?)
    }

    /// Mark an account as verified. Verifying twice is a no-op.
    pub fn verify(&self, ngo_id: &str, admin_id: &str) -> ServiceResult<StoredNgo> {
        let mut ngo = self.ngos().get(ngo_id).map_err(|e| match e {
            StorageError::NotFound(_) => ServiceError::NotFound("NGO not found".to_string()),
            other => other.into(),
        })?;

        if !ngo.verification_status {
            ngo.verification_status = true;
            self.ngos().update(&ngo)?;
            tracing::info!(ngo_id, verified_by = %admin_id, "NGO verified");
        }

        audit_log!(&self.storage, AuditEventType::NgoVerified, admin_id, RESOURCE_NGO, ngo_id);
        Ok(ngo)
    }

    /// Create the bootstrap admin account unless the email is already taken.
    ///
    /// Returns whether an account was created.
    pub fn seed_admin(&self, ngo_name: &str, email: &str, password: &str) -> ServiceResult<bool> {
        let email = normalize_email(email);
        if let Some(existing) = self.ngos().find_by_email(&email)? {
            if existing.role != Role::Admin {
                tracing::warn!(ngo_id = %existing.id, "Admin seed email belongs to a non-admin account");
            }
            return Ok(false);
        }

        let admin = self.create_account(ngo_name, &email, password, Role::Admin, true)?;
        tracing::info!(ngo_id = %admin.id, "Seeded admin account");
        Ok(true)
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}
