// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! File-backed JSON document store.
//!
//! Every entity is one JSON document on disk. Writes go to a uniquely named
//! temp file first and are then moved into place, so a reader never sees a
//! half-written document and a single-document update is atomic.
//!
//! Creation uses a hard link from the temp file to the final path, which
//! fails if the target already exists. That is the store's uniqueness
//! constraint for document ids.
//!
//! Read-modify-write cycles go through [`DocumentStore::modify_json`], which
//! holds a per-document lock from the read to the rename. Two cycles on the
//! same document never interleave, so one cannot write back a stale copy
//! over the other's change.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{de::DeserializeOwned, Serialize};

use super::StoragePaths;

/// Error type for document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Entity already exists (uniqueness violation)
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Storage not initialized
    #[error("Storage not initialized")]
    NotInitialized,

    /// The record exists but its reporter did not consent to NGO access
    #[error("Consent withheld: {0}")]
    ConsentWithheld(String),

    /// Stored data failed a consistency check
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    /// Generic serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(e.to_string()),
            io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(e.to_string()),
            _ => StorageError::Io(e),
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Document store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    paths: StoragePaths,
    initialized: bool,
    /// One lock per document path with a read-modify-write in flight
    document_locks: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

/// Lock a mutex, recovering the data if a holder panicked.
///
/// The guarded data is either `()` or the lock table itself, neither of which
/// can be left half-updated.
fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DocumentStore {
    /// Create a new DocumentStore instance.
    ///
    /// Does NOT initialize the directory structure. Call `initialize()` first.
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths,
            initialized: false,
            document_locks: Arc::default(),
        }
    }

    /// Get the storage paths.
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Check if storage is initialized.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Initialize the directory structure.
    ///
    /// Safe to call multiple times (idempotent).
    pub fn initialize(&mut self) -> StorageResult<()> {
        let dirs = [
            self.paths.reports_dir(),
            self.paths.ngos_dir(),
            self.paths.uploads_dir(),
            self.paths.audit_dir(),
        ];

        for dir in dirs {
            fs::create_dir_all(&dir)?;
        }

        self.initialized = true;
        Ok(())
    }

    /// Write-read-delete probe of the data directory.
    pub fn health_check(&self) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let test_file = self.paths.root().join(".health_check");
        let test_data = b"health_check_data";

        fs::write(&test_file, test_data)?;
        let read_data = fs::read(&test_file)?;
        fs::remove_file(&test_file)?;

        if read_data != test_data {
            return Err(StorageError::IntegrityViolation(
                "Health check data mismatch".to_string(),
            ));
        }

        Ok(())
    }

    // ========== Generic JSON Operations ==========

    /// Read a JSON document and deserialize it.
    pub fn read_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> StorageResult<T> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let value = serde_json::from_reader(reader)?;
        Ok(value)
    }

    /// Write a JSON document, replacing any existing one (atomic via rename).
    pub fn write_json<T: Serialize>(&self, path: impl AsRef<Path>, value: &T) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let path = path.as_ref();
        let lock = self.document_lock(path);
        let result = {
            let _guard = lock_ignoring_poison(&lock);
            self.replace_json(path, value)
        };
        self.release_document_lock(path, lock);
        result
    }

    /// Read a document, let `apply` change it, and write it back, all under
    /// the document's lock.
    ///
    /// `apply` sees the latest committed version and may reject it; an `Err`
    /// from `apply` leaves the document untouched. A missing document is
    /// `StorageError::NotFound`.
    pub fn modify_json<T, R, E>(
        &self,
        path: impl AsRef<Path>,
        apply: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Result<R, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<StorageError>,
    {
        if !self.initialized {
            return Err(StorageError::NotInitialized.into());
        }

        let path = path.as_ref();
        let lock = self.document_lock(path);
        let result = {
            let _guard = lock_ignoring_poison(&lock);
            self.read_modify_write(path, apply)
        };
        self.release_document_lock(path, lock);
        result
    }

    fn read_modify_write<T, R, E>(
        &self,
        path: &Path,
        apply: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Result<R, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<StorageError>,
    {
        let mut document: T = self.read_json(path)?;
        let outcome = apply(&mut document)?;
        self.replace_json(path, &document)?;
        Ok(outcome)
    }

    fn document_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        lock_ignoring_poison(&self.document_locks)
            .entry(path.to_path_buf())
            .or_default()
            .clone()
    }

    /// Drop the table entry once nobody else holds or waits on it.
    fn release_document_lock(&self, path: &Path, lock: Arc<Mutex<()>>) {
        let mut locks = lock_ignoring_poison(&self.document_locks);
        // One reference in the table, one here
        if Arc::strong_count(&lock) == 2 {
            locks.remove(path);
        }
    }

    fn replace_json<T: Serialize>(&self, path: &Path, value: &T) -> StorageResult<()> {
        let temp_path = self.write_temp(path, value)?;

        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    /// Write a JSON document only if none exists at `path` yet.
    ///
    /// Returns `StorageError::AlreadyExists` when the path is taken.
    pub fn create_json<T: Serialize>(&self, path: impl AsRef<Path>, value: &T) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let path = path.as_ref();
        let temp_path = self.write_temp(path, value)?;

        let linked = fs::hard_link(&temp_path, path);
        let _ = fs::remove_file(&temp_path);

        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(
                StorageError::AlreadyExists(path.display().to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    fn write_temp<T: Serialize>(&self, path: &Path, value: &T) -> StorageResult<PathBuf> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        Ok(temp_path)
    }

    /// Remove a document.
    pub fn delete(&self, path: impl AsRef<Path>) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }
        fs::remove_file(path.as_ref())?;
        Ok(())
    }

    /// Check if a document exists.
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        File::open(path.as_ref()).is_ok()
    }

    /// List the ids (file stems) of all documents in a directory with the
    /// given extension.
    pub fn list_files(&self, dir: impl AsRef<Path>, extension: &str) -> StorageResult<Vec<String>> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != extension) {
                continue;
            }
            if let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }

    // ========== Raw File Operations ==========

    /// Write raw bytes to a file (uploads, audit logs).
    pub fn write_raw(&self, path: impl AsRef<Path>, data: &[u8]) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.write_all(data)?;
        file.flush()?;
        Ok(())
    }

    /// Append raw bytes to a file, creating it if needed.
    pub fn append_raw(&self, path: impl AsRef<Path>, data: &[u8]) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(data)?;
        file.flush()?;
        Ok(())
    }

    /// Read raw bytes from a file.
    pub fn read_raw(&self, path: impl AsRef<Path>) -> StorageResult<Vec<u8>> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let mut file = File::open(path.as_ref())?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }
}
