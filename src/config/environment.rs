// ABOUTME: Environment-variable based configuration for the Mealtrack server
// ABOUTME: Loads database, auth, CORS, and upload settings with sensible defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

//! Server configuration loaded from environment variables.
//!
//! Process-wide initialization is limited to this configuration load; every
//! other collaborator (identity verifier, object store, database pool) is
//! constructed from it once at startup and passed into the router explicitly.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Default HTTP port for the API server
const DEFAULT_HTTP_PORT: u16 = 8081;

/// Default maximum upload size: 5 MiB
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the REST API
    pub http_port: u16,
    /// Database settings
    pub database: DatabaseConfig,
    /// Identity verification settings
    pub auth: AuthConfig,
    /// CORS settings
    pub cors: CorsConfig,
    /// Image upload settings
    pub uploads: UploadConfig,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection URL (sqlite file path or `sqlite::memory:`)
    pub url: String,
    /// Maximum pool connections
    pub max_connections: u32,
}

/// Identity service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Base URL of the external identity verification endpoint
    pub verify_url: String,
    /// Timeout for verification calls, in seconds
    pub timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Comma-separated origin list, or "*" for any origin
    pub allowed_origins: String,
}

/// Upload configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory for locally stored images
    pub storage_dir: PathBuf,
    /// Maximum accepted upload size in bytes
    pub max_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable fails to parse.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            http_port: env_var_or("HTTP_PORT", &DEFAULT_HTTP_PORT.to_string())?
                .parse()
                .context("Invalid HTTP_PORT value")?,
            database: DatabaseConfig {
                url: env_var_or("DATABASE_URL", "sqlite:data/mealtrack.db")?,
                max_connections: env_var_or("DATABASE_MAX_CONNECTIONS", "5")?
                    .parse()
                    .context("Invalid DATABASE_MAX_CONNECTIONS value")?,
            },
            auth: AuthConfig {
                verify_url: env_var_or("AUTH_VERIFY_URL", "http://127.0.0.1:8091/verify")?,
                timeout_secs: env_var_or("AUTH_TIMEOUT_SECS", "5")?
                    .parse()
                    .context("Invalid AUTH_TIMEOUT_SECS value")?,
            },
            cors: CorsConfig {
                allowed_origins: env_var_or("CORS_ALLOWED_ORIGINS", "*")?,
            },
            uploads: UploadConfig {
                storage_dir: PathBuf::from(env_var_or("UPLOAD_STORAGE_DIR", "data/images")?),
                max_bytes: env_var_or("UPLOAD_MAX_BYTES", &DEFAULT_MAX_UPLOAD_BYTES.to_string())?
                    .parse()
                    .context("Invalid UPLOAD_MAX_BYTES value")?,
            },
        };

        Ok(config)
    }

    /// Human-readable configuration summary for startup logging
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Mealtrack Server Configuration:\n\
             - HTTP Port: {}\n\
             - Database: {}\n\
             - Identity Service: {}\n\
             - CORS Origins: {}\n\
             - Upload Dir: {} (max {} bytes)",
            self.http_port,
            self.database.url,
            self.auth.verify_url,
            self.cors.allowed_origins,
            self.uploads.storage_dir.display(),
            self.uploads.max_bytes,
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> Result<String> {
    Ok(env::var(key).unwrap_or_else(|_| default.to_string()))
}
