// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides database, resource, and request helpers over in-memory SQLite
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `mealtrack`
//!
//! Each test gets its own in-memory database and a router wired with a
//! static identity verifier so requests authenticate with fixed tokens.

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request};
use mealtrack::auth::{AuthMiddleware, StaticIdentityVerifier};
use mealtrack::config::ServerConfig;
use mealtrack::database::Database;
use mealtrack::server::ServerResources;
use mealtrack::storage::LocalObjectStore;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::{Arc, Once};
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Bearer token the test verifier accepts for [`test_user_id`]
pub const TEST_TOKEN: &str = "test-token-alice";

/// Bearer token the test verifier accepts for [`other_user_id`]
pub const OTHER_TOKEN: &str = "test-token-bob";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .init();
    });
}

/// Fixed primary test user
pub fn test_user_id() -> Uuid {
    Uuid::from_u128(0x1111_2222_3333_4444_5555_6666_7777_8888)
}

/// Fixed secondary test user, for ownership isolation checks
pub fn other_user_id() -> Uuid {
    Uuid::from_u128(0x9999_aaaa_bbbb_cccc_dddd_eeee_ffff_0000)
}

/// Standard test database over in-memory `SQLite`
///
/// The pool is capped at one connection: each in-memory connection is its
/// own database, so a larger pool would scatter the schema.
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    Ok(Database::from_pool(pool).await?)
}

/// Server resources wired for tests: in-memory DB, static tokens, temp storage
pub async fn create_test_resources() -> Result<(Arc<ServerResources>, tempfile::TempDir)> {
    let config = ServerConfig::from_env()?;
    create_test_resources_with_upload_limit(config.uploads.max_bytes).await
}

/// Test resources with a custom upload size limit, for rejection tests
pub async fn create_test_resources_with_upload_limit(
    max_bytes: usize,
) -> Result<(Arc<ServerResources>, tempfile::TempDir)> {
    let database = create_test_database().await?;
    let verifier = StaticIdentityVerifier::new()
        .with_token(TEST_TOKEN, test_user_id())
        .with_token(OTHER_TOKEN, other_user_id());
    let auth = AuthMiddleware::new(Arc::new(verifier));

    let upload_dir = tempfile::tempdir()?;
    let object_store = LocalObjectStore::new(upload_dir.path()).await?;

    let mut config = ServerConfig::from_env()?;
    config.uploads.storage_dir = upload_dir.path().to_path_buf();
    config.uploads.max_bytes = max_bytes;

    let resources = Arc::new(ServerResources::new(
        database,
        auth,
        Arc::new(object_store),
        config,
    ));
    Ok((resources, upload_dir))
}

/// Build an authenticated JSON request
pub fn authed_request(method: &str, uri: &str, token: &str, body: Option<&str>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json");
    match body {
        Some(json) => builder.body(Body::from(json.to_owned())),
        None => builder.body(Body::empty()),
    }
    .unwrap()
}
