// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the document store.
//!
//! Each repository provides CRUD operations for a specific entity type,
//! using the DocumentStore for all file operations.

pub mod ngos;
pub mod reports;

pub use ngos::{normalize_email, NgoRepository, StoredNgo};
pub use reports::{
    DeletionScope, ReportFilter, ReportPage, ReportRepository, ReportStatus, StoredReport,
    UrgencyLevel,
};
