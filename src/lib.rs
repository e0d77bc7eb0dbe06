// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Incident Report Server - Anonymous Incident Reporting API
//!
//! Reporters submit incidents without an account. Sensitive fields are
//! encrypted before they are written, and only verified NGOs can read the
//! reports whose reporter consented to sharing.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - NGO sessions (password login, HS256 JWT)
//! - `blob` - Evidence file storage (Cloudinary or local disk)
//! - `cipher` - Field-level AES-256-GCM encryption
//! - `classifier` - Optional incident type classification service
//! - `service` - Report and NGO business rules
//! - `storage` - JSON document storage and audit log

pub mod api;
pub mod auth;
pub mod blob;
pub mod cipher;
pub mod classifier;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod state;
pub mod storage;
