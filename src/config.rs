// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded once at startup (optionally from a `.env` file)
//! into an immutable [`AppConfig`] and handed to constructors.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Root directory of the document store | `./data` |
//! | `AES_SECRET` | Field-encryption secret | Required |
//! | `JWT_SECRET` | HS256 secret for NGO session tokens | Required |
//! | `JWT_ISSUER` | Session token issuer | `incident-report-server` |
//! | `JWT_TTL_HOURS` | Session token lifetime | `720` |
//! | `CLOUDINARY_CLOUD_NAME` / `_API_KEY` / `_API_SECRET` | Evidence storage | Local fallback |
//! | `ML_SERVICE_URL` | Incident classifier base URL | Disabled |
//! | `ADMIN_EMAIL` / `ADMIN_PASSWORD` / `ADMIN_NAME` | Bootstrap admin account | Not seeded |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;

use crate::blob::CloudinaryConfig;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const AES_SECRET_ENV: &str = "AES_SECRET";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const JWT_TTL_HOURS_ENV: &str = "JWT_TTL_HOURS";
pub const CLOUDINARY_CLOUD_NAME_ENV: &str = "CLOUDINARY_CLOUD_NAME";
pub const CLOUDINARY_API_KEY_ENV: &str = "CLOUDINARY_API_KEY";
pub const CLOUDINARY_API_SECRET_ENV: &str = "CLOUDINARY_API_SECRET";
pub const ML_SERVICE_URL_ENV: &str = "ML_SERVICE_URL";
pub const ADMIN_EMAIL_ENV: &str = "ADMIN_EMAIL";
pub const ADMIN_PASSWORD_ENV: &str = "ADMIN_PASSWORD";
pub const ADMIN_NAME_ENV: &str = "ADMIN_NAME";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_JWT_ISSUER: &str = "incident-report-server";
const DEFAULT_JWT_TTL_HOURS: i64 = 720;
/// Ten years. Also keeps the value well inside `chrono::Duration`'s range.
const MAX_JWT_TTL_HOURS: i64 = 87_600;
const DEFAULT_ADMIN_NAME: &str = "Platform Administrator";

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Credentials of the bootstrap admin account.
#[derive(Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Immutable process configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub aes_secret: String,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_ttl_hours: i64,
    pub cloudinary: Option<CloudinaryConfig>,
    pub ml_service_url: Option<String>,
    pub admin_seed: Option<AdminSeed>,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_ttl_hours", &self.jwt_ttl_hours)
            .field("cloudinary", &self.cloudinary)
            .field("ml_service_url", &self.ml_service_url)
            .field("admin_seed", &self.admin_seed)
            .field("log_format", &self.log_format)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let optional = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        // Secrets are used byte-for-byte, only emptiness is rejected
        let secret = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let port = match optional(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let jwt_ttl_hours = match optional(JWT_TTL_HOURS_ENV) {
            Some(raw) => match raw.parse::<i64>() {
                Ok(hours) if (1..=MAX_JWT_TTL_HOURS).contains(&hours) => hours,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: JWT_TTL_HOURS_ENV,
                        reason: format!(
                            "expected between 1 and {MAX_JWT_TTL_HOURS} hours, got '{raw}'"
                        ),
                    })
                }
            },
            None => DEFAULT_JWT_TTL_HOURS,
        };

        let log_format = match optional(LOG_FORMAT_ENV).as_deref() {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let ml_service_url = match optional(ML_SERVICE_URL_ENV) {
            Some(raw) => {
                url::Url::parse(&raw).map_err(|e| ConfigError::Invalid {
                    name: ML_SERVICE_URL_ENV,
                    reason: e.to_string(),
                })?;
                Some(raw)
            }
            None => None,
        };

        let admin_seed = match (optional(ADMIN_EMAIL_ENV), lookup(ADMIN_PASSWORD_ENV)) {
            (Some(email), Some(password)) if !password.is_empty() => Some(AdminSeed {
                name: optional(ADMIN_NAME_ENV).unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_string()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            host: optional(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            data_dir: PathBuf::from(
                optional(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
            ),
            aes_secret: secret(AES_SECRET_ENV)?,
            jwt_secret: secret(JWT_SECRET_ENV)?,
            jwt_issuer: optional(JWT_ISSUER_ENV).unwrap_or_else(|| DEFAULT_JWT_ISSUER.to_string()),
            jwt_ttl_hours,
            cloudinary: CloudinaryConfig::from_parts(
                optional(CLOUDINARY_CLOUD_NAME_ENV),
                optional(CLOUDINARY_API_KEY_ENV),
                optional(CLOUDINARY_API_SECRET_ENV),
            ),
            ml_service_url,
            admin_seed,
            log_format,
        })
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
