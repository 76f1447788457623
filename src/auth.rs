// ABOUTME: Request authentication against the external identity service
// ABOUTME: Resolves bearer tokens and session cookies to an owner identity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealtrack Project

//! Identity resolution for incoming requests.
//!
//! Token issuance and verification belong to an external identity service.
//! This module treats it as an opaque collaborator behind [`IdentityVerifier`]:
//! given request credentials it yields an owner id or an authentication
//! failure. The [`AuthMiddleware`] is request-scoped state handed to every
//! router; nothing here holds process-global mutable state.

use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Result of a successful authentication
#[derive(Debug, Clone, Copy)]
pub struct AuthResult {
    /// The authenticated owner's id
    pub user_id: Uuid,
}

/// Opaque credential verification seam
///
/// Implementations exchange a raw bearer token for the owning user's id.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify a bearer token and return the owner id it belongs to
    ///
    /// # Errors
    ///
    /// Returns an auth error for unknown or expired tokens, and an external
    /// service error when the verification backend is unreachable.
    async fn verify(&self, token: &str) -> AppResult<Uuid>;
}

/// Response shape of the external verification endpoint
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    user_id: Uuid,
}

/// `IdentityVerifier` backed by an HTTP identity service
pub struct HttpIdentityVerifier {
    client: reqwest::Client,
    verify_url: String,
}

impl HttpIdentityVerifier {
    /// Create a verifier for the given verification endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(verify_url: impl Into<String>, timeout_secs: u64) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::config(format!("Failed to build identity client: {e}")))?;
        Ok(Self {
            client,
            verify_url: verify_url.into(),
        })
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, token: &str) -> AppResult<Uuid> {
        let response = self
            .client
            .get(&self.verify_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::external_service("identity", e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AppError::auth_invalid("Token rejected by identity service"));
        }
        if !response.status().is_success() {
            return Err(AppError::external_service(
                "identity",
                format!("Unexpected status {}", response.status()),
            ));
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| AppError::external_service("identity", e.to_string()))?;
        Ok(body.user_id)
    }
}

/// `IdentityVerifier` with a fixed token table, for tests and local runs
#[derive(Debug, Default)]
pub struct StaticIdentityVerifier {
    tokens: HashMap<String, Uuid>,
}

impl StaticIdentityVerifier {
    /// Create an empty verifier
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for a user
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, user_id: Uuid) -> Self {
        self.tokens.insert(token.into(), user_id);
        self
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify(&self, token: &str) -> AppResult<Uuid> {
        self.tokens
            .get(token)
            .copied()
            .ok_or_else(|| AppError::auth_invalid("Unknown token"))
    }
}

/// Authentication middleware resolving request credentials to an owner
#[derive(Clone)]
pub struct AuthMiddleware {
    verifier: Arc<dyn IdentityVerifier>,
}

impl AuthMiddleware {
    /// Create middleware over the given verifier
    #[must_use]
    pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { verifier }
    }

    /// Authenticate a request from its headers
    ///
    /// Tries the `Authorization: Bearer` header first, then the `auth_token`
    /// session cookie. Runs before any domain logic in protected handlers.
    ///
    /// # Errors
    ///
    /// Returns an auth error if credentials are missing or rejected.
    #[tracing::instrument(
        skip(self, headers),
        fields(user_id = tracing::field::Empty, success = tracing::field::Empty)
    )]
    pub async fn authenticate_request(&self, headers: &HeaderMap) -> AppResult<AuthResult> {
        let token = extract_bearer_token(headers)
            .or_else(|| get_cookie_value(headers, "auth_token"))
            .ok_or_else(|| {
                tracing::Span::current().record("success", false);
                AppError::auth_required()
            })?;

        match self.verifier.verify(&token).await {
            Ok(user_id) => {
                tracing::Span::current()
                    .record("user_id", user_id.to_string())
                    .record("success", true);
                Ok(AuthResult { user_id })
            }
            Err(e) => {
                tracing::Span::current().record("success", false);
                tracing::warn!("Authentication failed: {e}");
                Err(e)
            }
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// The scheme name is matched case-insensitively per RFC 7235.
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("authorization")?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty() {
        Some(token.to_owned())
    } else {
        None
    }
}

/// Extract a named cookie value from the `Cookie` header
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get("cookie").and_then(|h| h.to_str().ok())?;
    cookie_header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        if key == name && !value.is_empty() {
            Some(value.to_owned())
        } else {
            None
        }
    })
}
