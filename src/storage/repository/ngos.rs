// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! NGO account repository.
//!
//! Accounts live under `ngos/{ngoId}.json`. Email uniqueness is enforced by a
//! marker document per normalized email (`ngos/emails/{sha256}.json`) that is
//! created exclusively before the account itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::super::{is_valid_document_id, DocumentStore, StorageError, StorageResult};
use crate::auth::Role;

/// NGO account as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredNgo {
    pub id: String,
    pub ngo_name: String,
    /// Lowercase, trimmed
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    /// Set by an admin; gates every report operation
    #[serde(default)]
    pub verification_status: bool,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmailIndexEntry {
    ngo_id: String,
}

/// Canonical form of an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn email_digest(email: &str) -> String {
    hex::encode(Sha256::digest(normalize_email(email).as_bytes()))
}

/// Repository for NGO accounts.
pub struct NgoRepository<'a> {
    storage: &'a DocumentStore,
}

impl<'a> NgoRepository<'a> {
    /// Create a new NgoRepository.
    pub fn new(storage: &'a DocumentStore) -> Self {
        Self { storage }
    }

    /// Get an NGO by id.
    pub fn get(&self, ngo_id: &str) -> StorageResult<StoredNgo> {
        if !is_valid_document_id(ngo_id) {
            return Err(StorageError::NotFound(format!("NGO {ngo_id}")));
        }
        let path = self.storage.paths().ngo(ngo_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("NGO {ngo_id}")));
        }
        self.storage.read_json(path)
    }

    /// Look an NGO up by email (case-insensitive).
    pub fn find_by_email(&self, email: &str) -> StorageResult<Option<StoredNgo>> {
        let index_path = self.storage.paths().ngo_email_index(&email_digest(email));
        if !self.storage.exists(&index_path) {
            return Ok(None);
        }
        let entry: EmailIndexEntry = self.storage.read_json(index_path)?;
        match self.get(&entry.ngo_id) {
            Ok(ngo) => Ok(Some(ngo)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a new account.
    ///
    /// The email is normalized before storing. Fails with
    /// `StorageError::AlreadyExists` if the email is already registered.
    pub fn create(&self, ngo: &StoredNgo) -> StorageResult<StoredNgo> {
        if !is_valid_document_id(&ngo.id) {
            return Err(StorageError::IntegrityViolation(format!(
                "Invalid NGO id {}",
                ngo.id
            )));
        }

        let mut ngo = ngo.clone();
        ngo.email = normalize_email(&ngo.email);

        let index_path = self.storage.paths().ngo_email_index(&email_digest(&ngo.email));
        let entry = EmailIndexEntry {
            ngo_id: ngo.id.clone(),
        };
        match self.storage.create_json(&index_path, &entry) {
            Err(StorageError::AlreadyExists(_)) => {
                return Err(StorageError::AlreadyExists(format!("NGO email {}", ngo.email)));
            }
            other => other?,
        }

        if let Err(e) = self.storage.create_json(self.storage.paths().ngo(&ngo.id), &ngo) {
            // Release the email so a retry can succeed
            if let Err(cleanup) = self.storage.delete(&index_path) {
                tracing::error!(ngo_id = %ngo.id, error = %cleanup, "Failed to release email marker");
            }
            return Err(e);
        }

        Ok(ngo)
    }

    /// Replace an existing account. The email cannot change.
    pub fn update(&self, ngo: &StoredNgo) -> StorageResult<()> {
        let existing = self.get(&ngo.id)?;
        if existing.email != ngo.email {
            return Err(StorageError::IntegrityViolation(format!(
                "Email of NGO {} cannot change",
                ngo.id
            )));
        }
        self.storage.write_json(self.storage.paths().ngo(&ngo.id), ngo)
    }

    /// All accounts, oldest first.
    pub fn list_all(&self) -> StorageResult<Vec<StoredNgo>> {
        let ids = self
            .storage
            .list_files(self.storage.paths().ngos_dir(), "json")?;

        let mut ngos = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get(&id) {
                Ok(ngo) => ngos.push(ngo),
                Err(e) => tracing::warn!(ngo_id = %id, error = %e, "Skipping unreadable NGO"),
            }
        }
        ngos.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(ngos)
    }
}
